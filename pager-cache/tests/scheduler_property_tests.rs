use pager_cache::{desired_window, MergeOutcome, PageCache, VisibleRange};
use pager_core::{FetchFailure, PageOutcome, PagerConfig, SlotState};
use pager_test_utils::generators::{arb_page_items, arb_pager_config, arb_visible_range};
use proptest::prelude::*;

proptest! {
    // Every page of the clamped window is in-flight or resident after scheduling.
    #[test]
    fn window_never_absent_after_schedule(
        config in arb_pager_config(),
        (first, last) in arb_visible_range(5_000),
        total in proptest::option::of(0u64..6_000),
    ) {
        let mut cache: PageCache<u32> = PageCache::new(config).unwrap();
        if let Some(total) = total {
            cache.set_total_count(total);
        }
        cache.schedule(first, last).unwrap();

        let visible = VisibleRange::new(first, last).unwrap();
        let window = desired_window(
            cache.translator(),
            visible,
            config.prefetch_radius,
            cache.total_page_count(),
        );
        for page in window {
            prop_assert_eq!(cache.slot_state(page), SlotState::InFlight);
        }
    }

    #[test]
    fn repeated_schedule_issues_nothing(
        config in arb_pager_config(),
        (first, last) in arb_visible_range(5_000),
    ) {
        let mut cache: PageCache<u32> = PageCache::new(config).unwrap();
        let first_pass = cache.schedule(first, last).unwrap();
        prop_assert!(!first_pass.is_empty());
        prop_assert!(cache.schedule(first, last).unwrap().is_empty());
    }

    // Overlapping scroll reports never issue a page twice.
    #[test]
    fn overlapping_ranges_never_duplicate(
        config in arb_pager_config(),
        ranges in prop::collection::vec(arb_visible_range(2_000), 1..12),
    ) {
        let mut cache: PageCache<u32> = PageCache::new(config).unwrap();
        let mut seen = std::collections::HashSet::new();
        for (first, last) in ranges {
            for request in cache.schedule(first, last).unwrap() {
                prop_assert!(seen.insert(request.page), "page {} issued twice", request.page);
            }
        }
        prop_assert_eq!(cache.stats().fetches_issued as usize, seen.len());
    }

    #[test]
    fn merged_items_read_back_in_order(
        page_size in 1usize..40,
        page in 0usize..50,
        seed in any::<u32>(),
    ) {
        let mut cache: PageCache<u32> = PageCache::new(PagerConfig::new(page_size, 0)).unwrap();
        let generation = cache.generation();
        let start = (page * page_size) as i64;
        cache.schedule(start, start).unwrap();

        let items: Vec<u32> = (0..page_size as u32).map(|i| seed.wrapping_add(i)).collect();
        let outcome = cache.receive_page_result(page, generation, PageOutcome::loaded(items.clone()));
        let is_merged = matches!(outcome, MergeOutcome::Merged { .. });
        prop_assert!(is_merged);

        for (offset, expected) in items.iter().enumerate() {
            let item = cache.item_at(start + offset as i64).unwrap();
            prop_assert_eq!(item, Some(expected));
        }
    }

    #[test]
    fn failure_then_same_range_refetches_once(
        config in arb_pager_config(),
        (first, last) in arb_visible_range(1_000),
    ) {
        let mut cache: PageCache<u32> = PageCache::new(config).unwrap();
        let generation = cache.generation();
        let requests = cache.schedule(first, last).unwrap();
        let failed = requests[0].page;

        cache.receive_page_result(failed, generation, PageOutcome::failed(FetchFailure::transport("down")));
        prop_assert_eq!(cache.slot_state(failed), SlotState::Absent);

        let retry = cache.schedule(first, last).unwrap();
        prop_assert_eq!(retry.len(), 1);
        prop_assert_eq!(retry[0].page, failed);
    }

    #[test]
    fn stale_results_change_nothing(
        config in arb_pager_config(),
        (first, last) in arb_visible_range(1_000),
        items in arb_page_items(50),
    ) {
        let mut cache: PageCache<u32> = PageCache::new(config).unwrap();
        let old = cache.generation();
        let requests = cache.schedule(first, last).unwrap();
        cache.reset();

        for request in requests {
            let outcome = cache.receive_page_result(request.page, old, PageOutcome::with_total(items.clone(), 10_000));
            let is_stale = matches!(outcome, MergeOutcome::Stale { .. });
            prop_assert!(is_stale);
        }
        prop_assert_eq!(cache.resident_page_count(), 0);
        prop_assert!(cache.in_flight_pages().is_empty());
        prop_assert_eq!(cache.total_item_count(), None);
    }

    // A pre-reset result for a page that was re-requested after the reset
    // must not settle the new request.
    #[test]
    fn stale_result_leaves_rerequested_page_in_flight(
        config in arb_pager_config(),
        (first, last) in arb_visible_range(1_000),
    ) {
        let mut cache: PageCache<u32> = PageCache::new(config).unwrap();
        let old = cache.generation();
        let before = cache.schedule(first, last).unwrap();
        cache.reset();
        let after = cache.schedule(first, last).unwrap();
        let current = cache.generation();

        let pages_before: Vec<_> = before.iter().map(|r| r.page).collect();
        let pages_after: Vec<_> = after.iter().map(|r| r.page).collect();
        prop_assert_eq!(&pages_before, &pages_after);
        prop_assert!(after.iter().all(|r| r.generation == current));

        let full: Vec<u32> = (0..config.page_size as u32).collect();
        for request in &before {
            let outcome = cache.receive_page_result(request.page, old, PageOutcome::loaded(full.clone()));
            let is_stale = matches!(outcome, MergeOutcome::Stale { .. });
            prop_assert!(is_stale);
            prop_assert_eq!(cache.slot_state(request.page), SlotState::InFlight);
        }
        prop_assert_eq!(cache.resident_page_count(), 0);

        let page = after[0].page;
        let outcome = cache.receive_page_result(page, current, PageOutcome::loaded(full.clone()));
        let is_merged = matches!(outcome, MergeOutcome::Merged { .. });
        prop_assert!(is_merged);
        prop_assert_eq!(cache.slot_state(page), SlotState::Resident { len: config.page_size });
    }

    // Any one page of a window can resolve first; the rest stay in flight.
    #[test]
    fn out_of_order_merge_leaves_others_in_flight(
        config in arb_pager_config(),
        (first, last) in arb_visible_range(1_000),
        pick in any::<prop::sample::Index>(),
    ) {
        let mut cache: PageCache<u32> = PageCache::new(config).unwrap();
        let generation = cache.generation();
        let requests = cache.schedule(first, last).unwrap();
        let chosen = requests[pick.index(requests.len())].page;

        let full: Vec<u32> = (0..config.page_size as u32).collect();
        let outcome = cache.receive_page_result(chosen, generation, PageOutcome::loaded(full));
        let is_merged = matches!(outcome, MergeOutcome::Merged { total_changed: false, .. });
        prop_assert!(is_merged);

        for request in &requests {
            let expected = if request.page == chosen {
                SlotState::Resident { len: config.page_size }
            } else {
                SlotState::InFlight
            };
            prop_assert_eq!(cache.slot_state(request.page), expected);
        }
        prop_assert!(cache.schedule(first, last).unwrap().is_empty());
    }
}
