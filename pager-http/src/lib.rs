//! HTTP collaborators for the remote pager.
//!
//! [`HttpFetcher`] moves bytes with `reqwest`; [`JsonPageDelegate`] turns a
//! URL template and a JSON list endpoint into pages of typed items.

pub mod client;
pub mod json;

pub use client::{HttpConfig, HttpError, HttpFetcher};
pub use json::{JsonPageDelegate, TOTAL_COUNT_HEADER};
