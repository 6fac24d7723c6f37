//! Remote Pager Core - Page Types
//!
//! Pure data structures shared by the cache, transport and viewer crates.
//! Nothing in this crate performs I/O or owns mutable cache state.

use std::collections::BTreeMap;
use std::fmt;

pub mod config;
pub mod error;
pub mod index;

pub use config::PagerConfig;
pub use error::{FetchFailure, PagerError, PagerResult};
pub use index::{to_item_position, to_page_and_offset, IndexTranslator, PageAddress};

// ============================================================================
// IDENTITY TYPES
// ============================================================================

/// Zero-based page number.
pub type PageIndex = usize;

/// Flat item position as reported by a list widget.
/// Signed so that negative widget offsets are rejected rather than wrapped.
pub type ItemPosition = i64;

/// Monotonically increasing counter that invalidates results issued before a
/// reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    pub const fn initial() -> Self {
        Self(0)
    }

    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gen{}", self.0)
    }
}

// ============================================================================
// SLOTS AND REQUESTS
// ============================================================================

/// State of a single page slot. A page index is in exactly one state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotState {
    /// Never requested, failed, or cleared by a reset.
    Absent,
    /// Fetch issued, no result merged yet.
    InFlight,
    /// Items held in the cache.
    Resident { len: usize },
}

impl SlotState {
    pub fn is_absent(&self) -> bool {
        matches!(self, SlotState::Absent)
    }

    pub fn is_resident(&self) -> bool {
        matches!(self, SlotState::Resident { .. })
    }
}

/// A page the scheduler moved to in-flight and that must now be fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageRequest {
    pub page: PageIndex,
    pub generation: Generation,
}

// ============================================================================
// OUTCOMES
// ============================================================================

/// Parsed result of a page fetch, as reported back by the delegate.
#[derive(Debug, Clone, PartialEq)]
pub enum PageOutcome<T> {
    Loaded {
        items: Vec<T>,
        /// Total result count when the remote reports one.
        total_count: Option<u64>,
    },
    Failed(FetchFailure),
}

impl<T> PageOutcome<T> {
    pub fn loaded(items: Vec<T>) -> Self {
        Self::Loaded {
            items,
            total_count: None,
        }
    }

    pub fn with_total(items: Vec<T>, total_count: u64) -> Self {
        Self::Loaded {
            items,
            total_count: Some(total_count),
        }
    }

    pub fn failed(failure: FetchFailure) -> Self {
        Self::Failed(failure)
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, PageOutcome::Loaded { .. })
    }
}

/// Raw transport response handed to the delegate for parsing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FetchResponse {
    pub status: u16,
    /// Header names are stored lowercased.
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
}

impl FetchResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
