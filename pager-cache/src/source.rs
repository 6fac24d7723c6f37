//! Paged data source: the cache wired to a delegate, a fetcher and a list
//! widget.
//!
//! Fetches run as spawned Tokio tasks. They never touch the cache; each one
//! posts a [`PageMessage`] onto a channel that the owning control loop drains
//! through [`PagedDataSource::drain_completions`] or
//! [`PagedDataSource::next_completion`]. All cache mutation therefore happens
//! on the loop that owns the data source, and no lock guards it.

use std::ops::Range;
use std::sync::Arc;

use pager_core::{
    FetchFailure, FetchResponse, Generation, ItemPosition, PageIndex, PageRequest, PagerConfig,
    PagerResult,
};
use tokio::sync::mpsc;

use crate::page_cache::{MergeOutcome, PageCache};
use crate::traits::{PageDelegate, PageFetcher};

/// Callback that binds an item to a widget cell.
pub type ConfigureCell<C, T> = Box<dyn Fn(&mut C, &T) + Send + Sync>;

/// Completion of a page fetch, posted back to the owning loop.
#[derive(Debug)]
pub struct PageMessage {
    pub page: PageIndex,
    pub generation: Generation,
    pub url: String,
    pub response: Result<FetchResponse, FetchFailure>,
}

/// Notification for the list widget after a completion is processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageEvent {
    /// Rows that switched from placeholder to content.
    RowsChanged { rows: Range<usize> },
    /// Total item count learned or changed; the widget should relayout.
    TotalCountChanged { total: Option<u64> },
    /// A page could not be loaded and is absent again.
    PageFailed {
        page: PageIndex,
        failure: FetchFailure,
    },
    /// A pre-reset result was dropped.
    StaleDiscarded { page: PageIndex },
}

pub struct PagedDataSource<D, F, C>
where
    D: PageDelegate,
{
    cache: PageCache<D::Item>,
    delegate: D,
    fetcher: Arc<F>,
    configure: ConfigureCell<C, D::Item>,
    sender: mpsc::UnboundedSender<PageMessage>,
    receiver: mpsc::UnboundedReceiver<PageMessage>,
}

impl<D, F, C> PagedDataSource<D, F, C>
where
    D: PageDelegate,
    F: PageFetcher + 'static,
{
    pub fn new(
        config: PagerConfig,
        delegate: D,
        fetcher: Arc<F>,
        configure: ConfigureCell<C, D::Item>,
    ) -> PagerResult<Self> {
        let cache = PageCache::new(config)?;
        let (sender, receiver) = mpsc::unbounded_channel();
        Ok(Self {
            cache,
            delegate,
            fetcher,
            configure,
            sender,
            receiver,
        })
    }

    pub fn cache(&self) -> &PageCache<D::Item> {
        &self.cache
    }

    pub fn delegate(&self) -> &D {
        &self.delegate
    }

    /// Report a scroll or layout change. Must be called inside a Tokio
    /// runtime. Returns the number of fetches issued.
    pub fn on_visible_range_changed(
        &mut self,
        first_visible: ItemPosition,
        last_visible: ItemPosition,
    ) -> PagerResult<usize> {
        let requests = self.cache.schedule(first_visible, last_visible)?;
        Ok(self.dispatch(requests))
    }

    /// Re-request absent pages of the last reported range, typically after a
    /// failure. Must be called inside a Tokio runtime.
    pub fn retry(&mut self) -> usize {
        let requests = self.cache.reschedule();
        self.dispatch(requests)
    }

    fn dispatch(&self, requests: Vec<PageRequest>) -> usize {
        let issued = requests.len();
        for request in requests {
            let url = self.delegate.url_for_page(request.page);
            let fetcher = Arc::clone(&self.fetcher);
            let sender = self.sender.clone();
            tokio::spawn(async move {
                let response = fetcher.fetch(&url).await;
                let _ = sender.send(PageMessage {
                    page: request.page,
                    generation: request.generation,
                    url,
                    response,
                });
            });
        }
        issued
    }

    /// Parse and merge one completion.
    pub fn handle_message(&mut self, message: PageMessage) -> Vec<PageEvent> {
        let PageMessage {
            page,
            generation,
            url,
            response,
        } = message;

        if !self.cache.is_current(generation) {
            self.cache.discard_stale(page, generation);
            return vec![PageEvent::StaleDiscarded { page }];
        }

        let outcome = self.delegate.process_results(page, &url, response);
        let merged = self.cache.receive_page_result(page, generation, outcome);
        self.events_for(merged)
    }

    fn events_for(&self, merged: MergeOutcome) -> Vec<PageEvent> {
        match merged {
            MergeOutcome::Merged {
                rows,
                total_changed,
                ..
            } => {
                let mut events = Vec::with_capacity(2);
                if total_changed {
                    events.push(PageEvent::TotalCountChanged {
                        total: self.cache.total_item_count(),
                    });
                }
                events.push(PageEvent::RowsChanged { rows });
                events
            }
            MergeOutcome::Failed { page, failure } => {
                vec![PageEvent::PageFailed { page, failure }]
            }
            MergeOutcome::Stale { page, .. } => vec![PageEvent::StaleDiscarded { page }],
            MergeOutcome::OutOfRange {
                total_changed: true,
                ..
            } => vec![PageEvent::TotalCountChanged {
                total: self.cache.total_item_count(),
            }],
            MergeOutcome::OutOfRange { .. } | MergeOutcome::Ignored { .. } => Vec::new(),
        }
    }

    /// Process every completion already queued, without waiting.
    pub fn drain_completions(&mut self) -> Vec<PageEvent> {
        let mut events = Vec::new();
        while let Ok(message) = self.receiver.try_recv() {
            events.extend(self.handle_message(message));
        }
        events
    }

    /// Wait for the next completion and process it.
    pub async fn next_completion(&mut self) -> Option<Vec<PageEvent>> {
        let message = self.receiver.recv().await?;
        Some(self.handle_message(message))
    }

    /// Store items for a page without a fetch.
    pub fn add_page(&mut self, page: PageIndex, items: Vec<D::Item>) -> Vec<PageEvent> {
        let merged = self.cache.add_page(page, items);
        self.events_for(merged)
    }

    pub fn set_total_count(&mut self, total: u64) -> bool {
        self.cache.set_total_count(total)
    }

    /// Start over for a new query. Outstanding fetches are discarded when
    /// they complete.
    pub fn reset(&mut self) {
        self.cache.reset();
    }

    pub fn item_at(&self, position: ItemPosition) -> PagerResult<Option<&D::Item>> {
        self.cache.item_at(position)
    }

    pub fn total_item_count(&self) -> Option<u64> {
        self.cache.total_item_count()
    }

    pub fn row_count(&self) -> usize {
        self.cache.row_count()
    }

    /// Bind the item at `position` to `cell`. Returns false and leaves the
    /// cell untouched while the row is a placeholder.
    pub fn configure_cell(&self, cell: &mut C, position: ItemPosition) -> PagerResult<bool> {
        match self.cache.item_at(position)? {
            Some(item) => {
                (self.configure)(cell, item);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
