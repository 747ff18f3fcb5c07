//! Property-based tests for the list pipeline.
//!
//! Generates arbitrary row collections and pipeline state and checks the
//! identity, soundness, stability and bounds guarantees of each stage.

use proptest::prelude::*;

use super::filter::{FilterState, filter, search_matches};
use super::paginate::{PageState, paginate};
use super::processor::run;
use super::record::fixtures::Row;
use super::sort::{Direction, SortState, sort};

// ──────────────────── strategies ────────────────────

fn arb_name() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("Alpha".to_string()),
        Just("alpha".to_string()),
        Just("Beta".to_string()),
        Just("gamma ray".to_string()),
        Just(String::new()),
        "[a-zA-Z ]{0,8}",
    ]
}

fn arb_rows() -> impl Strategy<Value = Vec<Row>> {
    prop::collection::vec(
        (arb_name(), prop::option::of(2015u32..2025), any::<bool>()),
        0..40,
    )
    .prop_map(|specs| {
        specs
            .into_iter()
            .enumerate()
            .map(|(i, (name, year, active))| {
                let id = u64::try_from(i).unwrap_or(0) + 1;
                let mut row = Row::new(id, &name, 2000);
                row.year = year;
                row.active = active;
                row
            })
            .collect()
    })
}

fn arb_direction() -> impl Strategy<Value = Direction> {
    prop_oneof![Just(Direction::Ascending), Just(Direction::Descending)]
}

fn arb_sort_key() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just("name"), Just("year"), Just("active"), Just("created_at")]
}

fn ids(rows: &[&Row]) -> Vec<u64> {
    rows.iter().map(|r| r.id).collect()
}

// ──────────────────── properties ────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// A filter whose entries are all empty excludes nothing.
    #[test]
    fn empty_filter_is_identity(rows in arb_rows(), blanks in "[ ]{0,3}") {
        let state = FilterState::new()
            .with("name", blanks.clone())
            .with("search", blanks);
        let kept = filter(&rows, &state);
        prop_assert_eq!(ids(&kept), rows.iter().map(|r| r.id).collect::<Vec<_>>());
    }

    /// Every kept row contains the term in a searchable field; every dropped
    /// row contains it nowhere.
    #[test]
    fn search_is_sound_and_complete(rows in arb_rows(), term in "[a-zA-Z]{1,3}") {
        let kept = filter(&rows, &FilterState::search(term.clone()));
        let kept_ids = ids(&kept);
        let needle = term.to_lowercase();
        for row in &rows {
            let hit = row.name.to_lowercase().contains(&needle)
                || row.status.to_lowercase().contains(&needle);
            prop_assert_eq!(hit, kept_ids.contains(&row.id));
            prop_assert_eq!(hit, search_matches(row, &term));
        }
    }

    /// Rows with equal keys keep their relative input order in either
    /// direction.
    #[test]
    fn sort_is_stable(
        rows in arb_rows(),
        key in arb_sort_key(),
        direction in arb_direction(),
    ) {
        let state = SortState::new(key, direction);
        let sorted = sort(rows.iter().collect(), Some(&state));
        prop_assert_eq!(sorted.len(), rows.len());
        for pair in sorted.windows(2) {
            let equal_keys = match key {
                "year" => pair[0].year.unwrap_or(0) == pair[1].year.unwrap_or(0),
                "active" => pair[0].active == pair[1].active,
                "created_at" => pair[0].created_at == pair[1].created_at,
                _ => pair[0].name == pair[1].name,
            };
            if equal_keys {
                prop_assert!(pair[0].id < pair[1].id, "tie reordered: {} before {}", pair[0].id, pair[1].id);
            }
        }
    }

    /// A page never holds more than `page_size` rows and is empty past the end.
    #[test]
    fn page_is_bounded(
        rows in arb_rows(),
        page_index in 0usize..20,
        page_size in 1usize..15,
    ) {
        let page = PageState::new(page_index, page_size);
        let slice = paginate(&rows, &page);
        prop_assert!(slice.len() <= page_size);
        if page_index * page_size >= rows.len() {
            prop_assert!(slice.is_empty());
        }
    }

    /// Empty filter, identity sort and one page as large as the input returns
    /// the input unchanged.
    #[test]
    fn full_page_round_trip(rows in arb_rows()) {
        let page = PageState::first(rows.len());
        let view = run(&rows, &FilterState::new(), None, &page);
        prop_assert_eq!(ids(&view.rows), rows.iter().map(|r| r.id).collect::<Vec<_>>());
    }

    /// A clamped page index always addresses an existing page (or page 0).
    #[test]
    fn view_clamps_page_index(
        rows in arb_rows(),
        term in "[a-z]{0,2}",
        page_index in 0usize..50,
        page_size in 1usize..10,
    ) {
        let view = run(
            &rows,
            &FilterState::search(term),
            Some(&SortState::by_creation(true)),
            &PageState::new(page_index, page_size),
        );
        prop_assert!(view.page.page_index() <= view.page_count.saturating_sub(1));
        if view.filtered_len > 0 {
            prop_assert!(!view.rows.is_empty());
        }
    }
}
