//! Flat item positions to page addresses and back.
//!
//! The free functions take a signed page size so that callers handing over
//! raw widget values get an `InvalidArgument` instead of a wrapped number.
//! [`IndexTranslator`] is the validated form the cache keeps around.

use std::ops::Range;

use crate::{ItemPosition, PageIndex, PagerError, PagerResult};

/// A page number plus the offset of an item inside that page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageAddress {
    pub page: PageIndex,
    pub offset: usize,
}

impl PageAddress {
    pub fn new(page: PageIndex, offset: usize) -> Self {
        Self { page, offset }
    }
}

/// Map a flat position to `(position / page_size, position % page_size)`.
pub fn to_page_and_offset(position: ItemPosition, page_size: i64) -> PagerResult<PageAddress> {
    let page_size = checked_page_size(page_size)?;
    let position = checked_position(position)?;
    Ok(PageAddress {
        page: position / page_size,
        offset: position % page_size,
    })
}

/// Map a page address back to its flat position.
pub fn to_item_position(address: PageAddress, page_size: i64) -> PagerResult<ItemPosition> {
    let page_size = checked_page_size(page_size)?;
    let flat = flat_position(address, page_size)?;
    ItemPosition::try_from(flat)
        .map_err(|_| PagerError::invalid_argument("address", "position overflows i64"))
}

fn checked_page_size(page_size: i64) -> PagerResult<usize> {
    if page_size <= 0 {
        return Err(PagerError::invalid_argument(
            "page_size",
            format!("must be > 0, got {}", page_size),
        ));
    }
    usize::try_from(page_size)
        .map_err(|_| PagerError::invalid_argument("page_size", "does not fit in usize"))
}

fn checked_position(position: ItemPosition) -> PagerResult<usize> {
    if position < 0 {
        return Err(PagerError::invalid_argument(
            "position",
            format!("must be >= 0, got {}", position),
        ));
    }
    usize::try_from(position)
        .map_err(|_| PagerError::invalid_argument("position", "does not fit in usize"))
}

fn flat_position(address: PageAddress, page_size: usize) -> PagerResult<usize> {
    if address.offset >= page_size {
        return Err(PagerError::invalid_argument(
            "offset",
            format!("{} is not below page size {}", address.offset, page_size),
        ));
    }
    address
        .page
        .checked_mul(page_size)
        .and_then(|start| start.checked_add(address.offset))
        .ok_or_else(|| PagerError::invalid_argument("page", "position overflows usize"))
}

/// Page geometry for a fixed, validated page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexTranslator {
    page_size: usize,
}

impl IndexTranslator {
    pub fn new(page_size: usize) -> PagerResult<Self> {
        if page_size == 0 {
            return Err(PagerError::invalid_argument("page_size", "must be > 0, got 0"));
        }
        Ok(Self { page_size })
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn to_page_and_offset(&self, position: ItemPosition) -> PagerResult<PageAddress> {
        let position = checked_position(position)?;
        Ok(self.address_of(position))
    }

    pub fn to_item_position(&self, address: PageAddress) -> PagerResult<usize> {
        flat_position(address, self.page_size)
    }

    /// Infallible form for rows that are already known to be non-negative.
    pub fn address_of(&self, row: usize) -> PageAddress {
        PageAddress {
            page: row / self.page_size,
            offset: row % self.page_size,
        }
    }

    /// Flat rows covered by a full page.
    pub fn page_rows(&self, page: PageIndex) -> Range<usize> {
        let start = page.saturating_mul(self.page_size);
        start..start.saturating_add(self.page_size)
    }

    /// `ceil(total / page_size)`.
    pub fn page_count(&self, total: u64) -> usize {
        let page_size = self.page_size as u64;
        let pages = total / page_size + u64::from(total % page_size != 0);
        usize::try_from(pages).unwrap_or(usize::MAX)
    }
}
