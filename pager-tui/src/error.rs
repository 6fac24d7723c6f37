//! Error types for the TUI.

use crate::config::ConfigError;
use pager_core::PagerError;
use pager_http::HttpError;

#[derive(Debug, thiserror::Error)]
pub enum TuiError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Http(#[from] HttpError),
    #[error(transparent)]
    Pager(#[from] PagerError),
    #[error("Failed to initialize logging: {0}")]
    Logging(String),
}
