mod common;

use common::{FakeSource, GatedSource, composition, full_composition, hokkaido_aomori, points, series};
use prefpop::{Category, CategoryOutcome, ErrorKind, SelectionStore, ToggleOutcome};
use std::thread;

fn codes<S: prefpop::PopulationSource>(store: &SelectionStore<S>) -> Vec<u32> {
    store.selected_codes()
}

#[test]
fn select_appends_series_for_active_category() {
    let src = hokkaido_aomori();
    let store = SelectionStore::new(&src);
    assert_eq!(store.category(), Category::Total);

    let out = store.toggle_entity(1, "Hokkaido", true).unwrap();
    assert_eq!(out, ToggleOutcome::Added);

    let sel = store.selection();
    assert_eq!(sel.len(), 1);
    assert_eq!(sel[0].code, 1);
    assert_eq!(sel[0].name, "Hokkaido");
    assert_eq!(sel[0].category, Category::Total);
    assert_eq!(sel[0].points, points(&[(2015, 5_000_000), (2020, 4_900_000)]));
    assert!(!store.loading());
    assert!(store.error().is_none());
}

#[test]
fn selection_order_is_order_of_selection() {
    let src = hokkaido_aomori();
    let store = SelectionStore::new(&src);
    store.toggle_entity(2, "Aomori", true).unwrap();
    store.toggle_entity(1, "Hokkaido", true).unwrap();
    assert_eq!(codes(&store), vec![2, 1]);
}

#[test]
fn deselect_is_synchronous_and_idempotent() {
    let src = hokkaido_aomori();
    let store = SelectionStore::new(&src);
    store.toggle_entity(1, "Hokkaido", true).unwrap();
    let before = store.selection();
    let calls = src.calls();

    assert_eq!(
        store.toggle_entity(2, "Aomori", false).unwrap(),
        ToggleOutcome::Unchanged
    );
    assert_eq!(store.selection(), before);

    assert_eq!(
        store.toggle_entity(1, "Hokkaido", false).unwrap(),
        ToggleOutcome::Removed
    );
    assert!(store.selection().is_empty());
    assert_eq!(
        store.toggle_entity(1, "Hokkaido", false).unwrap(),
        ToggleOutcome::Unchanged
    );
    assert_eq!(src.calls(), calls, "deselecting must not fetch");
}

#[test]
fn selecting_twice_keeps_one_entry() {
    let src = hokkaido_aomori();
    let store = SelectionStore::new(&src);
    store.toggle_entity(1, "Hokkaido", true).unwrap();
    assert_eq!(
        store.toggle_entity(1, "Hokkaido", true).unwrap(),
        ToggleOutcome::Unchanged
    );
    assert_eq!(codes(&store), vec![1]);
    assert_eq!(src.calls(), 1);
}

#[test]
fn failed_fetch_adds_nothing_and_reports_error() {
    let src = hokkaido_aomori();
    src.fail(2);
    let store = SelectionStore::new(&src);
    store.toggle_entity(1, "Hokkaido", true).unwrap();

    let err = store.toggle_entity(2, "Aomori", true).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::FetchSeriesFailed);
    assert_eq!(codes(&store), vec![1]);
    assert!(!store.loading());
    let report = store.error().expect("error surfaced");
    assert_eq!(report.kind, ErrorKind::FetchSeriesFailed);
    assert!(report.message.contains('2'));

    // A later fetch clears the error.
    store.toggle_entity(1, "Hokkaido", false).unwrap();
    src.failing.lock().unwrap().clear();
    store.toggle_entity(2, "Aomori", true).unwrap();
    assert!(store.error().is_none());
    assert_eq!(codes(&store), vec![2]);
}

#[test]
fn missing_category_label_is_distinct_error() {
    let src = FakeSource::default().with(
        5,
        "Akita",
        composition(vec![series(Category::Young, &[(2015, 100)])]),
    );
    let store = SelectionStore::new(&src);
    let err = store.toggle_entity(5, "Akita", true).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CategoryNotFound);
    assert!(store.selection().is_empty());
    assert_eq!(store.error().unwrap().kind, ErrorKind::CategoryNotFound);
}

#[test]
fn category_switch_refreshes_in_prior_order() {
    let src = FakeSource::default()
        .with(1, "Hokkaido", full_composition(&[(2015, 800)]))
        .with(2, "Aomori", full_composition(&[(2015, 400)]))
        .with(3, "Iwate", full_composition(&[(2015, 1600)]));
    let store = SelectionStore::new(&src);
    for (code, name) in [(3, "Iwate"), (1, "Hokkaido"), (2, "Aomori")] {
        store.toggle_entity(code, name, true).unwrap();
    }

    let out = store.change_category(Category::Young).unwrap();
    assert_eq!(out, CategoryOutcome::Refreshed(3));
    assert_eq!(store.category(), Category::Young);

    let sel = store.selection();
    assert_eq!(sel.iter().map(|s| s.code).collect::<Vec<_>>(), vec![3, 1, 2]);
    assert_eq!(sel.iter().map(|s| s.name.as_str()).collect::<Vec<_>>(), vec!["Iwate", "Hokkaido", "Aomori"]);
    assert!(sel.iter().all(|s| s.category == Category::Young));
    assert_eq!(sel[0].points, points(&[(2015, 200)]));
    assert_eq!(sel[1].points, points(&[(2015, 100)]));
    assert_eq!(sel[2].points, points(&[(2015, 50)]));
    assert!(!store.loading());
}

#[test]
fn category_switch_with_empty_selection_is_immediate() {
    let src = hokkaido_aomori();
    let store = SelectionStore::new(&src);
    assert_eq!(
        store.change_category(Category::Elderly).unwrap(),
        CategoryOutcome::Refreshed(0)
    );
    assert_eq!(store.category(), Category::Elderly);
    assert_eq!(src.calls(), 0);

    store.toggle_entity(1, "Hokkaido", true).unwrap();
    assert_eq!(store.selection()[0].category, Category::Elderly);
    assert_eq!(store.selection()[0].points, points(&[(2015, 1_250_000), (2020, 1_225_000)]));
}

#[test]
fn failed_category_switch_is_all_or_nothing() {
    // Aomori has no young series: the switch fails as a whole.
    let src = FakeSource::default()
        .with(1, "Hokkaido", full_composition(&[(2015, 5_000_000), (2020, 4_900_000)]))
        .with(
            2,
            "Aomori",
            composition(vec![series(Category::Total, &[(2015, 1_300_000)])]),
        );
    let store = SelectionStore::new(&src);
    store.toggle_entity(1, "Hokkaido", true).unwrap();
    store.toggle_entity(2, "Aomori", true).unwrap();
    let before = store.selection();

    let err = store.change_category(Category::Young).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CategoryNotFound);

    assert_eq!(store.selection(), before);
    assert_eq!(store.category(), Category::Total, "category reverts to the committed one");
    assert_eq!(store.error().unwrap().kind, ErrorKind::CategoryNotFound);
    assert!(!store.loading());
}

#[test]
fn failed_fetch_during_switch_keeps_previous_series() {
    let src = hokkaido_aomori();
    let store = SelectionStore::new(&src);
    store.toggle_entity(1, "Hokkaido", true).unwrap();
    store.toggle_entity(2, "Aomori", true).unwrap();
    src.fail(1);

    let err = store.change_category(Category::Working).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::FetchSeriesFailed);
    assert!(store.selection().iter().all(|s| s.category == Category::Total));
    assert_eq!(store.category(), Category::Total);
}

#[test]
fn deselect_while_select_in_flight_wins() {
    let src = GatedSource::new(hokkaido_aomori(), 1);
    src.arm();
    let store = SelectionStore::new(&src);

    thread::scope(|s| {
        let pending = s.spawn(|| store.toggle_entity(1, "Hokkaido", true));
        src.started.wait();
        assert!(store.loading());
        assert_eq!(
            store.toggle_entity(1, "Hokkaido", false).unwrap(),
            ToggleOutcome::Unchanged
        );
        src.release.wait();
        assert_eq!(pending.join().unwrap().unwrap(), ToggleOutcome::Discarded);
    });

    assert!(store.selection().is_empty());
    assert!(!store.loading());
}

#[test]
fn select_started_before_category_switch_is_discarded() {
    let src = GatedSource::new(hokkaido_aomori(), 1);
    src.arm();
    let store = SelectionStore::new(&src);

    thread::scope(|s| {
        let pending = s.spawn(|| store.toggle_entity(1, "Hokkaido", true));
        src.started.wait();
        store.change_category(Category::Elderly).unwrap();
        src.release.wait();
        assert_eq!(pending.join().unwrap().unwrap(), ToggleOutcome::Discarded);
    });

    assert!(store.selection().is_empty());
    assert_eq!(store.category(), Category::Elderly);
}

#[test]
fn newer_category_switch_supersedes_older() {
    let src = GatedSource::new(hokkaido_aomori(), 1);
    let store = SelectionStore::new(&src);
    store.toggle_entity(1, "Hokkaido", true).unwrap();
    src.arm();

    thread::scope(|s| {
        let older = s.spawn(|| store.change_category(Category::Young));
        src.started.wait();
        assert_eq!(store.category(), Category::Young, "tab switches immediately");
        assert_eq!(
            store.change_category(Category::Elderly).unwrap(),
            CategoryOutcome::Refreshed(1)
        );
        src.release.wait();
        assert_eq!(older.join().unwrap().unwrap(), CategoryOutcome::Superseded);
    });

    assert_eq!(store.category(), Category::Elderly);
    let sel = store.selection();
    assert_eq!(sel[0].category, Category::Elderly);
    assert_eq!(sel[0].points, points(&[(2015, 1_250_000), (2020, 1_225_000)]));
}

#[test]
fn selection_changes_during_switch_are_kept() {
    let src = GatedSource::new(
        FakeSource::default()
            .with(1, "Hokkaido", full_composition(&[(2015, 800)]))
            .with(2, "Aomori", full_composition(&[(2015, 400)]))
            .with(3, "Iwate", full_composition(&[(2015, 1600)])),
        1,
    );
    let store = SelectionStore::new(&src);
    store.toggle_entity(1, "Hokkaido", true).unwrap();
    store.toggle_entity(2, "Aomori", true).unwrap();
    src.arm();

    thread::scope(|s| {
        let refresh = s.spawn(|| store.change_category(Category::Young));
        src.started.wait();
        store.toggle_entity(2, "Aomori", false).unwrap();
        assert_eq!(
            store.toggle_entity(3, "Iwate", true).unwrap(),
            ToggleOutcome::Added
        );
        src.release.wait();
        assert_eq!(refresh.join().unwrap().unwrap(), CategoryOutcome::Refreshed(1));
    });

    let sel = store.selection();
    assert_eq!(sel.iter().map(|s| s.code).collect::<Vec<_>>(), vec![1, 3]);
    assert!(sel.iter().all(|s| s.category == Category::Young));
    assert_eq!(sel[1].points, points(&[(2015, 200)]));
}

#[test]
fn selection_during_failed_switch_is_refetched_for_committed_category() {
    // Hokkaido has no young series, so the switch below fails.
    let src = GatedSource::new(
        FakeSource::default()
            .with(
                1,
                "Hokkaido",
                composition(vec![series(Category::Total, &[(2015, 5_000_000)])]),
            )
            .with(2, "Aomori", full_composition(&[(2015, 1_300_000)])),
        1,
    );
    let store = SelectionStore::new(&src);
    store.toggle_entity(1, "Hokkaido", true).unwrap();
    src.arm();

    thread::scope(|s| {
        let refresh = s.spawn(|| store.change_category(Category::Young));
        src.started.wait();
        assert_eq!(
            store.toggle_entity(2, "Aomori", true).unwrap(),
            ToggleOutcome::Added
        );
        assert_eq!(store.selection()[1].category, Category::Young);
        src.release.wait();
        let err = refresh.join().unwrap().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CategoryNotFound);
    });

    assert_eq!(store.category(), Category::Total);
    let sel = store.selection();
    assert_eq!(sel.iter().map(|s| s.code).collect::<Vec<_>>(), vec![1, 2]);
    assert!(sel.iter().all(|s| s.category == Category::Total));
    assert_eq!(sel[1].points, points(&[(2015, 1_300_000)]));
    assert_eq!(store.error().unwrap().kind, ErrorKind::CategoryNotFound);
    assert!(!store.loading());
}

#[test]
fn selection_during_failed_switch_is_dropped_if_refetch_fails() {
    let src = GatedSource::new(
        FakeSource::default()
            .with(
                1,
                "Hokkaido",
                composition(vec![series(Category::Total, &[(2015, 5_000_000)])]),
            )
            .with(2, "Aomori", full_composition(&[(2015, 1_300_000)])),
        1,
    );
    let store = SelectionStore::new(&src);
    store.toggle_entity(1, "Hokkaido", true).unwrap();
    src.arm();

    thread::scope(|s| {
        let refresh = s.spawn(|| store.change_category(Category::Young));
        src.started.wait();
        store.toggle_entity(2, "Aomori", true).unwrap();
        src.inner.fail(2);
        src.release.wait();
        refresh.join().unwrap().unwrap_err();
    });

    assert_eq!(codes(&store), vec![1]);
    assert_eq!(store.category(), Category::Total);
    assert!(!store.loading());
}

#[test]
fn snapshot_and_joined_rows_follow_selection() {
    let src = hokkaido_aomori();
    let store = SelectionStore::new(&src);
    store.toggle_entity(1, "Hokkaido", true).unwrap();
    store.toggle_entity(2, "Aomori", true).unwrap();

    let snap = store.snapshot();
    assert_eq!(snap.category, Category::Total);
    assert_eq!(snap.selection.len(), 2);
    assert!(!snap.loading);
    assert!(snap.error.is_none());

    let rows = store.joined_rows();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].get("Aomori"), Some(1_300_000));
    assert!(!rows[1].contains("Aomori"));
}
