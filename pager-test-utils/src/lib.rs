//! Remote Pager Test Utilities
//!
//! Centralized test infrastructure for the workspace:
//! - Proptest generators for page geometry and visible ranges
//! - An in-memory remote list that serves pages over a fake URL scheme
//! - A delegate that parses those pages and records what it saw

pub use pager_cache::{PageCache, PageDelegate, PageEvent, PageFetcher, PagedDataSource};
pub use pager_core::{
    FetchFailure, FetchResponse, Generation, PageIndex, PageOutcome, PagerConfig, SlotState,
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Mutex;

// ============================================================================
// GENERATORS
// ============================================================================

pub mod generators {
    use super::*;
    use proptest::prelude::*;

    /// Page geometry with small pages so windows span several pages.
    pub fn arb_pager_config() -> impl Strategy<Value = PagerConfig> {
        (1usize..=50, 0usize..=4).prop_map(|(page_size, radius)| PagerConfig::new(page_size, radius))
    }

    /// Inclusive `(first, last)` visible range.
    pub fn arb_visible_range(max_row: i64) -> impl Strategy<Value = (i64, i64)> {
        (0..max_row, 0i64..200).prop_map(|(first, span)| (first, first + span))
    }

    /// Items for one page, at most `page_size` long.
    pub fn arb_page_items(page_size: usize) -> impl Strategy<Value = Vec<u32>> {
        prop::collection::vec(any::<u32>(), 0..=page_size)
    }
}

// ============================================================================
// IN-MEMORY REMOTE
// ============================================================================

/// Wire body served by [`InMemoryRemote`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryPage {
    pub items: Vec<String>,
    pub total: u64,
}

/// A remote list held in memory, answering `mem://list?page=N` URLs.
///
/// Pages can be made to fail, and every requested URL is logged so tests can
/// count fetches.
pub struct InMemoryRemote {
    items: Vec<String>,
    page_size: usize,
    failing: Mutex<HashSet<PageIndex>>,
    requests: Mutex<Vec<String>>,
}

impl InMemoryRemote {
    pub fn new(total: usize, page_size: usize) -> Self {
        Self {
            items: (0..total).map(|i| format!("item-{}", i)).collect(),
            page_size,
            failing: Mutex::new(HashSet::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn fail_page(&self, page: PageIndex) {
        self.failing.lock().unwrap().insert(page);
    }

    pub fn heal_page(&self, page: PageIndex) {
        self.failing.lock().unwrap().remove(&page);
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    /// Pages requested so far, in request order.
    pub fn requested_pages(&self) -> Vec<PageIndex> {
        self.requests().iter().filter_map(|url| page_from_url(url)).collect()
    }

    fn page_body(&self, page: PageIndex) -> MemoryPage {
        let start = (page * self.page_size).min(self.items.len());
        let end = (start + self.page_size).min(self.items.len());
        MemoryPage {
            items: self.items[start..end].to_vec(),
            total: self.items.len() as u64,
        }
    }
}

pub fn memory_url(page: PageIndex) -> String {
    format!("mem://list?page={}", page)
}

pub fn page_from_url(url: &str) -> Option<PageIndex> {
    url.strip_prefix("mem://list?page=")?.parse().ok()
}

#[async_trait]
impl PageFetcher for InMemoryRemote {
    async fn fetch(&self, url: &str) -> Result<FetchResponse, FetchFailure> {
        self.requests.lock().unwrap().push(url.to_string());
        let page = page_from_url(url)
            .ok_or_else(|| FetchFailure::transport(format!("unknown url {}", url)))?;
        if self.failing.lock().unwrap().contains(&page) {
            return Ok(FetchResponse::new(503, b"unavailable".to_vec()));
        }
        let body = serde_json::to_vec(&self.page_body(page))
            .map_err(|e| FetchFailure::transport(e.to_string()))?;
        Ok(FetchResponse::new(200, body).with_header("content-type", "application/json"))
    }
}

// ============================================================================
// DELEGATE
// ============================================================================

/// Delegate for [`InMemoryRemote`] that records each processed page.
#[derive(Default)]
pub struct MemoryDelegate {
    processed: Mutex<Vec<PageIndex>>,
}

impl MemoryDelegate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn processed(&self) -> Vec<PageIndex> {
        self.processed.lock().unwrap().clone()
    }
}

impl PageDelegate for MemoryDelegate {
    type Item = String;

    fn url_for_page(&self, page: PageIndex) -> String {
        memory_url(page)
    }

    fn process_results(
        &self,
        page: PageIndex,
        _url: &str,
        response: Result<FetchResponse, FetchFailure>,
    ) -> PageOutcome<String> {
        self.processed.lock().unwrap().push(page);
        let response = match response {
            Ok(response) => response,
            Err(failure) => return PageOutcome::failed(failure),
        };
        if !response.is_success() {
            return PageOutcome::failed(FetchFailure::Status {
                status: response.status,
                body: String::from_utf8_lossy(&response.body).into_owned(),
            });
        }
        match serde_json::from_slice::<MemoryPage>(&response.body) {
            Ok(body) => PageOutcome::with_total(body.items, body.total),
            Err(e) => PageOutcome::failed(FetchFailure::parse(e.to_string())),
        }
    }
}

/// A data source over an in-memory remote, with cells rendered as strings.
pub type MemorySource = PagedDataSource<MemoryDelegate, InMemoryRemote, String>;

pub fn memory_source(config: PagerConfig, remote: std::sync::Arc<InMemoryRemote>) -> MemorySource {
    PagedDataSource::new(
        config,
        MemoryDelegate::new(),
        remote,
        Box::new(|cell: &mut String, item: &String| cell.clone_from(item)),
    )
    .expect("valid pager config")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_remote_serves_last_page_short() {
        let remote = InMemoryRemote::new(45, 20);
        let response = remote.fetch(&memory_url(2)).await.unwrap();
        let body: MemoryPage = serde_json::from_slice(&response.body).unwrap();
        assert_eq!(body.items.len(), 5);
        assert_eq!(body.total, 45);
        assert_eq!(remote.requested_pages(), vec![2]);
    }

    #[tokio::test]
    async fn test_failing_page_maps_to_status_failure() {
        let remote = InMemoryRemote::new(10, 5);
        remote.fail_page(1);
        let response = remote.fetch(&memory_url(1)).await;
        let outcome = MemoryDelegate::new().process_results(1, &memory_url(1), response);
        assert!(matches!(
            outcome,
            PageOutcome::Failed(FetchFailure::Status { status: 503, .. })
        ));
    }

    #[test]
    fn test_page_from_url() {
        assert_eq!(page_from_url("mem://list?page=12"), Some(12));
        assert_eq!(page_from_url("http://example.com"), None);
    }
}
