//! Configuration types

use crate::index::IndexTranslator;
use crate::{PagerError, PagerResult};
use serde::{Deserialize, Serialize};

/// Page geometry and prefetch policy for a page cache.
///
/// Both values are fixed for the lifetime of the cache built from them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PagerConfig {
    /// Items per page. Must be greater than 0.
    pub page_size: usize,
    /// Pages kept resident beyond the visible pages on each side.
    pub prefetch_radius: usize,
}

impl Default for PagerConfig {
    fn default() -> Self {
        Self {
            page_size: 20,
            prefetch_radius: 1,
        }
    }
}

impl PagerConfig {
    pub fn new(page_size: usize, prefetch_radius: usize) -> Self {
        Self {
            page_size,
            prefetch_radius,
        }
    }

    /// Set the page size.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Set the prefetch radius.
    pub fn with_prefetch_radius(mut self, prefetch_radius: usize) -> Self {
        self.prefetch_radius = prefetch_radius;
        self
    }

    pub fn validate(&self) -> PagerResult<()> {
        if self.page_size == 0 {
            return Err(PagerError::invalid_argument(
                "page_size",
                "page_size must be greater than 0",
            ));
        }
        Ok(())
    }

    /// Build the index translator for this geometry.
    pub fn translator(&self) -> PagerResult<IndexTranslator> {
        self.validate()?;
        IndexTranslator::new(self.page_size)
    }
}
