//! Collaborator traits and cache statistics.
//!
//! The cache never talks to the network or parses payloads itself. A
//! [`PageDelegate`] knows the wire format (URL construction and response
//! parsing) and a [`PageFetcher`] performs the transfer.

use async_trait::async_trait;
use pager_core::{FetchFailure, FetchResponse, PageIndex, PageOutcome};

/// Per-use-case knowledge of the remote list.
///
/// Both methods run on the control loop that owns the cache. Implementations
/// must not depend on cache state: the same page index always yields the
/// same URL for a given query.
pub trait PageDelegate {
    /// Item type stored in resident pages.
    type Item;

    /// Build the request target for a page.
    fn url_for_page(&self, page: PageIndex) -> String;

    /// Interpret the transport result for a page.
    ///
    /// Transport errors arrive as `Err`; HTTP-level failures arrive as an
    /// `Ok` response whose status the delegate inspects.
    fn process_results(
        &self,
        page: PageIndex,
        url: &str,
        response: Result<FetchResponse, FetchFailure>,
    ) -> PageOutcome<Self::Item>;
}

/// Transport used to fetch a page URL.
///
/// Implementations run on spawned tasks and must be thread-safe. Timeouts and
/// transport-level retries belong here, not in the cache.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchResponse, FetchFailure>;
}

/// Counters describing cache activity since construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Pages moved from absent to in-flight.
    pub fetches_issued: u64,
    /// Successful results stored as resident pages.
    pub pages_merged: u64,
    /// Failed results that returned a page to absent.
    pub failures: u64,
    /// Results dropped because a reset happened after they were issued.
    pub stale_discarded: u64,
    /// Number of full resets.
    pub resets: u64,
    /// Reads that hit a non-resident page and returned a placeholder.
    pub placeholder_reads: u64,
}

impl CacheStats {
    /// Fraction of settled fetches that failed (0.0 to 1.0).
    pub fn failure_rate(&self) -> f64 {
        let settled = self.pages_merged + self.failures;
        if settled == 0 {
            0.0
        } else {
            self.failures as f64 / settled as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_stats_failure_rate() {
        let stats = CacheStats {
            pages_merged: 3,
            failures: 1,
            ..Default::default()
        };
        assert!((stats.failure_rate() - 0.25).abs() < 0.001);

        let empty_stats = CacheStats::default();
        assert!((empty_stats.failure_rate() - 0.0).abs() < 0.001);
    }
}
