//! Page cache with prefetch scheduling and result merging.
//!
//! The cache is a plain state machine. It never spawns, blocks or locks:
//! the owner drives it from a single control loop, feeding it visible
//! ranges and page results. Every page slot is in exactly one of the states
//! absent, in-flight or resident, and a reset moves all of them back to
//! absent in one step while bumping the generation so that late results are
//! recognisably stale.

use std::cell::Cell;
use std::collections::{HashMap, HashSet};
use std::ops::Range;

use pager_core::{
    FetchFailure, Generation, IndexTranslator, ItemPosition, PageIndex, PageOutcome,
    PageRequest, PagerConfig, PagerResult, SlotState,
};

use crate::scheduler::{desired_window, request_order, VisibleRange};
use crate::traits::CacheStats;

/// What the merger did with a page result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Page stored as resident; `rows` are the flat rows it now backs.
    Merged {
        page: PageIndex,
        rows: Range<usize>,
        total_changed: bool,
    },
    /// Page returned to absent.
    Failed {
        page: PageIndex,
        failure: FetchFailure,
    },
    /// Result belonged to an earlier generation and was dropped.
    Stale {
        page: PageIndex,
        generation: Generation,
    },
    /// Page lies beyond the known total page count; slot returned to absent.
    /// The same result may still have moved the total.
    OutOfRange {
        page: PageIndex,
        total_pages: usize,
        total_changed: bool,
    },
    /// Failure for a page that was not in flight; nothing to undo.
    Ignored { page: PageIndex },
}

/// Client-side cache of fixed-size pages of a remote list.
pub struct PageCache<T> {
    translator: IndexTranslator,
    prefetch_radius: usize,
    resident: HashMap<PageIndex, Vec<T>>,
    in_flight: HashSet<PageIndex>,
    total_count: Option<u64>,
    total_pages: Option<usize>,
    generation: Generation,
    last_visible: Option<VisibleRange>,
    stats: CacheStats,
    /// Counted from `&self` reads.
    placeholder_reads: Cell<u64>,
}

impl<T> PageCache<T> {
    pub fn new(config: PagerConfig) -> PagerResult<Self> {
        let translator = config.translator()?;
        Ok(Self {
            translator,
            prefetch_radius: config.prefetch_radius,
            resident: HashMap::new(),
            in_flight: HashSet::new(),
            total_count: None,
            total_pages: None,
            generation: Generation::initial(),
            last_visible: None,
            stats: CacheStats::default(),
            placeholder_reads: Cell::new(0),
        })
    }

    pub fn translator(&self) -> &IndexTranslator {
        &self.translator
    }

    pub fn page_size(&self) -> usize {
        self.translator.page_size()
    }

    pub fn prefetch_radius(&self) -> usize {
        self.prefetch_radius
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        generation == self.generation
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            placeholder_reads: self.placeholder_reads.get(),
            ..self.stats.clone()
        }
    }

    pub fn last_visible(&self) -> Option<VisibleRange> {
        self.last_visible
    }

    pub fn slot_state(&self, page: PageIndex) -> SlotState {
        if let Some(items) = self.resident.get(&page) {
            SlotState::Resident { len: items.len() }
        } else if self.in_flight.contains(&page) {
            SlotState::InFlight
        } else {
            SlotState::Absent
        }
    }

    pub fn resident_page_count(&self) -> usize {
        self.resident.len()
    }

    /// In-flight page indices in ascending order.
    pub fn in_flight_pages(&self) -> Vec<PageIndex> {
        let mut pages: Vec<PageIndex> = self.in_flight.iter().copied().collect();
        pages.sort_unstable();
        pages
    }

    // ========================================================================
    // SCHEDULER
    // ========================================================================

    /// Report the visible range and mark every absent page of the desired
    /// window as in-flight.
    ///
    /// Returns the pages the caller must now fetch. Calling this again with
    /// the same range returns nothing new.
    pub fn schedule(
        &mut self,
        first_visible: ItemPosition,
        last_visible: ItemPosition,
    ) -> PagerResult<Vec<PageRequest>> {
        let visible = VisibleRange::new(first_visible, last_visible)?;
        self.last_visible = Some(visible);
        Ok(self.schedule_range(visible))
    }

    /// Re-run scheduling for the last reported range, e.g. to retry pages
    /// that failed.
    pub fn reschedule(&mut self) -> Vec<PageRequest> {
        match self.last_visible {
            Some(visible) => self.schedule_range(visible),
            None => Vec::new(),
        }
    }

    fn schedule_range(&mut self, visible: VisibleRange) -> Vec<PageRequest> {
        let window = desired_window(
            &self.translator,
            visible,
            self.prefetch_radius,
            self.total_pages,
        );
        let on_screen = visible.pages(&self.translator);

        let mut requests = Vec::new();
        for page in request_order(window.clone(), on_screen) {
            if self.slot_state(page).is_absent() {
                self.in_flight.insert(page);
                requests.push(PageRequest {
                    page,
                    generation: self.generation,
                });
            }
        }

        if !requests.is_empty() {
            self.stats.fetches_issued += requests.len() as u64;
            tracing::debug!(
                first = visible.first,
                last = visible.last,
                window_start = window.start,
                window_end = window.end,
                requested = ?requests.iter().map(|r| r.page).collect::<Vec<_>>(),
                generation = %self.generation,
                "Scheduled page fetches"
            );
        }
        requests
    }

    // ========================================================================
    // MERGER
    // ========================================================================

    /// Reconcile a page result into the cache.
    ///
    /// Results from an earlier generation are dropped without touching any
    /// state. Pages may resolve in any order.
    pub fn receive_page_result(
        &mut self,
        page: PageIndex,
        generation: Generation,
        outcome: PageOutcome<T>,
    ) -> MergeOutcome {
        if !self.is_current(generation) {
            return self.discard_stale(page, generation);
        }

        match outcome {
            PageOutcome::Loaded { items, total_count } => {
                self.merge_items(page, items, total_count)
            }
            PageOutcome::Failed(failure) => {
                if !self.in_flight.remove(&page) {
                    tracing::debug!(page, %failure, "Ignoring failure for page not in flight");
                    return MergeOutcome::Ignored { page };
                }
                self.stats.failures += 1;
                tracing::warn!(page, generation = %generation, %failure, "Page fetch failed");
                MergeOutcome::Failed { page, failure }
            }
        }
    }

    /// Store items for a page directly, whether or not it was requested.
    pub fn add_page(&mut self, page: PageIndex, items: Vec<T>) -> MergeOutcome {
        self.merge_items(page, items, None)
    }

    pub(crate) fn discard_stale(&mut self, page: PageIndex, generation: Generation) -> MergeOutcome {
        self.stats.stale_discarded += 1;
        tracing::debug!(
            page,
            result_generation = %generation,
            current_generation = %self.generation,
            "Discarding stale page result"
        );
        MergeOutcome::Stale { page, generation }
    }

    fn merge_items(
        &mut self,
        page: PageIndex,
        mut items: Vec<T>,
        total_count: Option<u64>,
    ) -> MergeOutcome {
        self.in_flight.remove(&page);
        let page_size = self.page_size();

        let mut total_changed = match total_count {
            Some(total) => self.update_total(total),
            None => false,
        };

        if let Some(total_pages) = self.total_pages {
            if page >= total_pages {
                tracing::warn!(page, total_pages, "Dropping page beyond total page count");
                return MergeOutcome::OutOfRange {
                    page,
                    total_pages,
                    total_changed,
                };
            }
        }

        if items.len() > page_size {
            tracing::warn!(
                page,
                received = items.len(),
                page_size,
                "Truncating oversized page"
            );
            items.truncate(page_size);
        }

        let start = self.translator.page_rows(page).start;
        if items.len() < page_size {
            match self.total_pages {
                // A short page with no reported total marks the end of the list.
                None => {
                    total_changed |= self.update_total((start + items.len()) as u64);
                }
                Some(total_pages) if page + 1 < total_pages => {
                    tracing::warn!(
                        page,
                        received = items.len(),
                        page_size,
                        "Short page before the final page"
                    );
                }
                Some(_) => {}
            }
        }

        let rows = start..start + items.len();
        if self.total_pages.is_some_and(|total_pages| page >= total_pages) {
            // Empty page past the end: only the total was learned.
            return MergeOutcome::Merged {
                page,
                rows,
                total_changed,
            };
        }
        self.resident.insert(page, items);
        self.stats.pages_merged += 1;
        tracing::debug!(
            page,
            rows_start = rows.start,
            rows_end = rows.end,
            total = ?self.total_count,
            "Merged page"
        );

        MergeOutcome::Merged {
            page,
            rows,
            total_changed,
        }
    }

    // ========================================================================
    // TOTAL COUNT
    // ========================================================================

    /// Record the total result count. Returns true if it changed.
    pub fn set_total_count(&mut self, total: u64) -> bool {
        self.update_total(total)
    }

    fn update_total(&mut self, total: u64) -> bool {
        if self.total_count == Some(total) {
            return false;
        }
        let total_pages = self.translator.page_count(total);
        self.total_count = Some(total);
        self.total_pages = Some(total_pages);

        let before = self.resident.len();
        self.resident.retain(|page, _| *page < total_pages);
        if self.resident.len() != before {
            tracing::debug!(
                dropped = before - self.resident.len(),
                total_pages,
                "Dropped resident pages beyond new total"
            );
        }
        tracing::debug!(total, total_pages, "Total count updated");
        true
    }

    pub fn total_item_count(&self) -> Option<u64> {
        self.total_count
    }

    pub fn total_page_count(&self) -> Option<usize> {
        self.total_pages
    }

    /// Rows a list widget should lay out.
    ///
    /// With a known total this is the total. Otherwise it covers every page
    /// up to the highest resident one plus one page of placeholders, so that
    /// scrolling into the placeholders requests the next page.
    pub fn row_count(&self) -> usize {
        if let Some(total) = self.total_count {
            return usize::try_from(total).unwrap_or(usize::MAX);
        }
        let pages = self
            .resident
            .keys()
            .max()
            .map(|page| page.saturating_add(1))
            .unwrap_or(0);
        pages.saturating_add(1).saturating_mul(self.page_size())
    }

    // ========================================================================
    // READS
    // ========================================================================

    /// Item at a flat position, or `None` as a placeholder while the page is
    /// not resident.
    pub fn item_at(&self, position: ItemPosition) -> PagerResult<Option<&T>> {
        let address = self.translator.to_page_and_offset(position)?;
        if let Some(total) = self.total_count {
            if position as u64 >= total {
                return Ok(None);
            }
        }
        let item = self
            .resident
            .get(&address.page)
            .and_then(|items| items.get(address.offset));
        if item.is_none() {
            self.placeholder_reads.set(self.placeholder_reads.get() + 1);
        }
        Ok(item)
    }

    pub fn page(&self, page: PageIndex) -> Option<&[T]> {
        self.resident.get(&page).map(Vec::as_slice)
    }

    // ========================================================================
    // RESET
    // ========================================================================

    /// Drop every page, forget the total count and start a new generation.
    ///
    /// Fetches still outstanding are not cancelled; their results will carry
    /// the old generation and be discarded.
    pub fn reset(&mut self) {
        let outstanding = self.in_flight.len();
        self.resident.clear();
        self.in_flight.clear();
        self.total_count = None;
        self.total_pages = None;
        self.last_visible = None;
        self.generation = self.generation.next();
        self.stats.resets += 1;
        tracing::info!(
            generation = %self.generation,
            outstanding,
            "Page cache reset"
        );
    }
}
