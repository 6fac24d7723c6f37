//! Viewer state: selection, viewport and notifications over a data source.

use crate::notifications::{Notification, NotificationLevel};
use chrono::{DateTime, Duration, Utc};
use pager_cache::{PageDelegate, PageEvent, PageFetcher, PagedDataSource};
use pager_core::ItemPosition;

pub const PLACEHOLDER: &str = "loading...";

const MAX_NOTIFICATIONS: usize = 32;
const NOTIFICATION_TTL_SECS: i64 = 8;

pub struct App<D, F>
where
    D: PageDelegate,
    F: PageFetcher + 'static,
{
    pub source: PagedDataSource<D, F, String>,
    /// Selected row.
    pub selected: usize,
    /// First row drawn in the viewport.
    pub offset: usize,
    pub viewport_height: usize,
    pub notifications: Vec<Notification>,
}

impl<D, F> App<D, F>
where
    D: PageDelegate,
    F: PageFetcher + 'static,
{
    pub fn new(source: PagedDataSource<D, F, String>) -> Self {
        Self {
            source,
            selected: 0,
            offset: 0,
            viewport_height: 0,
            notifications: Vec::new(),
        }
    }

    pub fn notify(&mut self, level: NotificationLevel, message: impl Into<String>) {
        self.notifications.push(Notification::new(level, message));
        if self.notifications.len() > MAX_NOTIFICATIONS {
            let excess = self.notifications.len() - MAX_NOTIFICATIONS;
            self.notifications.drain(..excess);
        }
    }

    pub fn latest_notification(&self) -> Option<&Notification> {
        self.notifications.last()
    }

    pub fn prune_notifications(&mut self, now: DateTime<Utc>) {
        let ttl = Duration::seconds(NOTIFICATION_TTL_SECS);
        self.notifications.retain(|note| !note.is_expired(now, ttl));
    }

    pub fn row_count(&self) -> usize {
        self.source.row_count()
    }

    /// Inclusive `(first, last)` rows currently on screen.
    pub fn visible_range(&self) -> Option<(ItemPosition, ItemPosition)> {
        let rows = self.row_count();
        if rows == 0 || self.viewport_height == 0 || self.offset >= rows {
            return None;
        }
        let last = (self.offset + self.viewport_height).min(rows) - 1;
        Some((self.offset as ItemPosition, last as ItemPosition))
    }

    /// Report the viewport to the data source. Must run inside a Tokio runtime.
    pub fn report_visible(&mut self) {
        let Some((first, last)) = self.visible_range() else {
            return;
        };
        match self.source.on_visible_range_changed(first, last) {
            Ok(0) => {}
            Ok(issued) => tracing::debug!(first, last, issued, "Requested pages"),
            Err(err) => self.notify(NotificationLevel::Error, err.to_string()),
        }
    }

    pub fn set_viewport_height(&mut self, height: usize) {
        self.viewport_height = height;
        self.clamp();
        self.report_visible();
    }

    pub fn select_next(&mut self) {
        self.move_by(1);
    }

    pub fn select_previous(&mut self) {
        self.move_by(-1);
    }

    pub fn page_down(&mut self) {
        self.move_by(self.viewport_height.max(1) as i64);
    }

    pub fn page_up(&mut self) {
        self.move_by(-(self.viewport_height.max(1) as i64));
    }

    pub fn select_top(&mut self) {
        self.selected = 0;
        self.offset = 0;
        self.report_visible();
    }

    /// Jump to the last row. With an unknown total this is the last row the
    /// source currently exposes, so repeated presses walk further down.
    pub fn select_bottom(&mut self) {
        self.selected = self.row_count().saturating_sub(1);
        self.clamp();
        self.report_visible();
    }

    fn move_by(&mut self, delta: i64) {
        let target = self.selected as i64 + delta;
        self.selected = target.max(0) as usize;
        self.clamp();
        self.report_visible();
    }

    /// Keep the selection inside the list and the viewport around it.
    fn clamp(&mut self) {
        let rows = self.row_count();
        if rows == 0 {
            self.selected = 0;
            self.offset = 0;
            return;
        }
        self.selected = self.selected.min(rows - 1);
        let height = self.viewport_height.max(1);
        if self.selected < self.offset {
            self.offset = self.selected;
        } else if self.selected >= self.offset + height {
            self.offset = self.selected + 1 - height;
        }
        self.offset = self.offset.min(rows.saturating_sub(height));
    }

    /// Fold completion events into the view.
    pub fn apply_events(&mut self, events: Vec<PageEvent>) {
        let mut changed = false;
        for event in events {
            match event {
                PageEvent::RowsChanged { .. } => changed = true,
                PageEvent::TotalCountChanged { total } => {
                    changed = true;
                    let message = match total {
                        Some(total) => format!("{} items", total),
                        None => "Item count unknown".to_string(),
                    };
                    self.notify(NotificationLevel::Info, message);
                }
                PageEvent::PageFailed { page, failure } => {
                    self.notify(
                        NotificationLevel::Error,
                        format!("Page {} failed: {} (ctrl-r to retry)", page, failure),
                    );
                }
                PageEvent::StaleDiscarded { .. } => {}
            }
        }
        if changed {
            self.clamp();
            // The row count may have grown into the viewport.
            self.report_visible();
        }
    }

    pub fn retry(&mut self) {
        match self.source.retry() {
            0 => self.notify(NotificationLevel::Warning, "Nothing to retry"),
            n => self.notify(NotificationLevel::Info, format!("Retrying {} page(s)", n)),
        }
    }

    /// Drop everything and reload from the top.
    pub fn reset(&mut self) {
        self.source.reset();
        self.selected = 0;
        self.offset = 0;
        self.notify(NotificationLevel::Success, "Reloading");
        self.report_visible();
    }

    /// Text for a row, or the placeholder while its page is not resident.
    pub fn row_text(&self, row: usize) -> String {
        let mut cell = String::new();
        match self.source.configure_cell(&mut cell, row as ItemPosition) {
            Ok(true) => cell,
            _ => PLACEHOLDER.to_string(),
        }
    }

    /// Header summary of the cache.
    pub fn status_line(&self) -> String {
        let cache = self.source.cache();
        let total = match cache.total_item_count() {
            Some(total) => format!("{} items", total),
            None => "? items".to_string(),
        };
        format!(
            "{} | row {}/{} | pages resident {} in flight {} | {}",
            total,
            self.selected + 1,
            self.row_count(),
            cache.resident_page_count(),
            cache.in_flight_pages().len(),
            cache.generation()
        )
    }
}
