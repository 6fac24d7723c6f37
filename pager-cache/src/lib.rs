//! Page cache and prefetch scheduler for remotely-sourced lists.
//!
//! A list widget sees a flat, logically infinite sequence of rows. Behind it
//! the [`PageCache`] keeps fixed-size pages, decides which ones must be
//! resident for the visible range plus a prefetch radius, issues each fetch
//! exactly once, and merges results that may arrive in any order.
//!
//! # Layers
//!
//! - [`PageCache`]: synchronous state machine (scheduler, merger, reset).
//! - [`PagedDataSource`]: the cache plus a [`PageDelegate`] and a
//!   [`PageFetcher`], with completions delivered as messages to the loop
//!   that owns it.
//!
//! # Example
//!
//! ```ignore
//! let mut source = PagedDataSource::new(config, delegate, fetcher, configure)?;
//! source.on_visible_range_changed(0, 19)?;
//! loop {
//!     tokio::select! {
//!         Some(events) = source.next_completion() => redraw(&events),
//!         // ... widget input
//!     }
//! }
//! ```

pub mod page_cache;
pub mod scheduler;
pub mod source;
pub mod traits;

pub use page_cache::{MergeOutcome, PageCache};
pub use scheduler::{desired_window, request_order, VisibleRange};
pub use source::{ConfigureCell, PageEvent, PageMessage, PagedDataSource};
pub use traits::{CacheStats, PageDelegate, PageFetcher};
