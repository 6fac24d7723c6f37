use std::sync::Arc;

use pager_cache::PageEvent;
use pager_core::{FetchFailure, PagerConfig, SlotState};
use pager_test_utils::{memory_source, InMemoryRemote, MemorySource};

async fn settle(source: &mut MemorySource, completions: usize) -> Vec<PageEvent> {
    let mut events = Vec::new();
    for _ in 0..completions {
        let batch = source
            .next_completion()
            .await
            .expect("completion channel open");
        events.extend(batch);
    }
    events
}

#[tokio::test]
async fn scroll_scenario_fetches_each_page_once() {
    let remote = Arc::new(InMemoryRemote::new(45, 20));
    let mut source = memory_source(PagerConfig::new(20, 1), Arc::clone(&remote));

    assert_eq!(source.on_visible_range_changed(0, 19).unwrap(), 2);
    assert_eq!(source.cache().in_flight_pages(), vec![0, 1]);

    let events = settle(&mut source, 2).await;
    assert!(events.contains(&PageEvent::TotalCountChanged { total: Some(45) }));
    assert!(events.contains(&PageEvent::RowsChanged { rows: 0..20 }));
    assert!(events.contains(&PageEvent::RowsChanged { rows: 20..40 }));

    assert_eq!(source.total_item_count(), Some(45));
    assert_eq!(source.cache().total_page_count(), Some(3));
    assert_eq!(
        source.item_at(5).unwrap().map(String::as_str),
        Some("item-5")
    );

    assert_eq!(source.on_visible_range_changed(40, 44).unwrap(), 1);
    let events = settle(&mut source, 1).await;
    assert_eq!(events, vec![PageEvent::RowsChanged { rows: 40..45 }]);
    assert_eq!(
        source.item_at(44).unwrap().map(String::as_str),
        Some("item-44")
    );

    let mut pages = remote.requested_pages();
    pages.sort_unstable();
    assert_eq!(pages, vec![0, 1, 2]);
}

#[tokio::test]
async fn failed_page_is_retried_on_request() {
    let remote = Arc::new(InMemoryRemote::new(100, 10));
    remote.fail_page(0);
    let mut source = memory_source(PagerConfig::new(10, 0), Arc::clone(&remote));

    source.on_visible_range_changed(0, 9).unwrap();
    let events = settle(&mut source, 1).await;
    assert!(matches!(
        events.as_slice(),
        [PageEvent::PageFailed {
            page: 0,
            failure: FetchFailure::Status { status: 503, .. }
        }]
    ));
    assert_eq!(source.cache().slot_state(0), SlotState::Absent);
    assert_eq!(source.item_at(3).unwrap(), None);

    remote.heal_page(0);
    assert_eq!(source.retry(), 1);
    settle(&mut source, 1).await;
    assert_eq!(source.cache().slot_state(0), SlotState::Resident { len: 10 });
    assert_eq!(remote.requested_pages(), vec![0, 0]);
}

#[tokio::test]
async fn reset_discards_outstanding_fetches() {
    let remote = Arc::new(InMemoryRemote::new(100, 10));
    let mut source = memory_source(PagerConfig::new(10, 1), Arc::clone(&remote));

    source.on_visible_range_changed(0, 9).unwrap();
    source.reset();

    let events = settle(&mut source, 2).await;
    assert!(events
        .iter()
        .all(|e| matches!(e, PageEvent::StaleDiscarded { .. })));
    assert_eq!(source.cache().resident_page_count(), 0);
    assert!(source.cache().in_flight_pages().is_empty());
    assert_eq!(source.total_item_count(), None);
    // Stale bodies never reach the delegate.
    assert!(source.delegate().processed().is_empty());

    // The new generation fetches again from scratch.
    assert_eq!(source.on_visible_range_changed(0, 9).unwrap(), 2);
}

#[tokio::test]
async fn configure_cell_binds_resident_rows_only() {
    let remote = Arc::new(InMemoryRemote::new(30, 10));
    let mut source = memory_source(PagerConfig::new(10, 0), remote);

    let mut cell = String::from("loading...");
    assert!(!source.configure_cell(&mut cell, 12).unwrap());

    source.on_visible_range_changed(10, 19).unwrap();
    settle(&mut source, 1).await;

    assert!(source.configure_cell(&mut cell, 12).unwrap());
    assert_eq!(cell, "item-12");
}

#[tokio::test]
async fn drain_collects_all_ready_completions() {
    let remote = Arc::new(InMemoryRemote::new(200, 10));
    let mut source = memory_source(PagerConfig::new(10, 2), Arc::clone(&remote));

    assert_eq!(source.on_visible_range_changed(50, 59).unwrap(), 5);
    // Let the spawned fetches run to completion.
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    let events = source.drain_completions();
    let rows_changed = events
        .iter()
        .filter(|e| matches!(e, PageEvent::RowsChanged { .. }))
        .count();
    assert_eq!(rows_changed, 5);
    assert_eq!(source.cache().resident_page_count(), 5);
}
