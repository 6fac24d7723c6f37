//! Error types for pager operations

use thiserror::Error;

/// Why a single page could not be loaded.
///
/// Failures are scoped to one page: the page returns to the absent state and
/// every other page stays readable.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchFailure {
    #[error("Transport error: {reason}")]
    Transport { reason: String },

    #[error("Remote returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to parse page response: {reason}")]
    Parse { reason: String },
}

impl FetchFailure {
    pub fn transport(reason: impl Into<String>) -> Self {
        Self::Transport {
            reason: reason.into(),
        }
    }

    pub fn parse(reason: impl Into<String>) -> Self {
        Self::Parse {
            reason: reason.into(),
        }
    }
}

/// Master error type for pager operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PagerError {
    #[error("Invalid argument {field}: {reason}")]
    InvalidArgument { field: &'static str, reason: String },
}

impl PagerError {
    pub fn invalid_argument(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field,
            reason: reason.into(),
        }
    }
}

/// Result type alias for pager operations.
pub type PagerResult<T> = Result<T, PagerError>;

// =============================================================================
// TESTS
// =============================================================================
