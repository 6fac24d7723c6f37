//! Desired page window computation.
//!
//! Pure functions; the stateful half of scheduling lives in
//! [`PageCache::schedule`](crate::PageCache::schedule).

use std::ops::Range;

use pager_core::{IndexTranslator, ItemPosition, PageIndex, PagerError, PagerResult};

/// Inclusive range of flat rows currently on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VisibleRange {
    pub first: usize,
    pub last: usize,
}

impl VisibleRange {
    pub fn new(first: ItemPosition, last: ItemPosition) -> PagerResult<Self> {
        if first < 0 {
            return Err(PagerError::invalid_argument(
                "first_visible",
                format!("must be >= 0, got {}", first),
            ));
        }
        if last < first {
            return Err(PagerError::invalid_argument(
                "last_visible",
                format!("{} is before first visible row {}", last, first),
            ));
        }
        let first = usize::try_from(first)
            .map_err(|_| PagerError::invalid_argument("first_visible", "does not fit in usize"))?;
        let last = usize::try_from(last)
            .map_err(|_| PagerError::invalid_argument("last_visible", "does not fit in usize"))?;
        Ok(Self { first, last })
    }

    /// Pages that hold at least one visible row.
    pub fn pages(&self, translator: &IndexTranslator) -> Range<PageIndex> {
        let first = translator.address_of(self.first).page;
        let last = translator.address_of(self.last).page;
        first..last.saturating_add(1)
    }
}

/// `[first_page - radius, last_page + radius]`, clamped at 0 and, when known,
/// at `total_pages - 1`. Returned as a half-open range.
pub fn desired_window(
    translator: &IndexTranslator,
    visible: VisibleRange,
    radius: usize,
    total_pages: Option<usize>,
) -> Range<PageIndex> {
    let pages = visible.pages(translator);
    let start = pages.start.saturating_sub(radius);
    let mut end = pages.end.saturating_add(radius);
    if let Some(total) = total_pages {
        end = end.min(total);
    }
    if end <= start {
        return start..start;
    }
    start..end
}

/// Order in which absent pages of a window are requested: visible pages
/// first, then the prefetch margin, each ascending.
pub fn request_order(window: Range<PageIndex>, visible: Range<PageIndex>) -> Vec<PageIndex> {
    let (mut on_screen, margin): (Vec<PageIndex>, Vec<PageIndex>) =
        window.partition(|page| visible.contains(page));
    on_screen.extend(margin);
    on_screen
}
