//! Behavioral parity between the memory and SQLite stores.
//!
//! The engine treats the two interchangeably, so every observable behavior
//! here runs against both through `dyn LedgerWrite`.

use chrono::NaiveDate;
use herdbook_core::{Category, Movement, MovementKind, Plan, Property, Sex};
use herdbook_store::{LedgerWrite, MemoryStore, SqliteStore};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn stores() -> Vec<(&'static str, Box<dyn LedgerWrite>)> {
    vec![
        ("memory", Box::new(MemoryStore::new())),
        (
            "sqlite",
            Box::new(SqliteStore::open_in_memory().expect("open in-memory sqlite")),
        ),
    ]
}

fn seed(store: &mut dyn LedgerWrite) -> (herdbook_core::PropertyId, herdbook_core::CategoryId) {
    let property = store
        .insert_property(&Property::new("Fazenda Invernada Grande"))
        .unwrap();
    let category = store
        .insert_category(&Category::new("Boi Magro", Sex::Male))
        .unwrap();
    (property, category)
}

#[test]
fn same_date_movements_keep_insertion_order() {
    for (name, mut store) in stores() {
        let (property, category) = seed(store.as_mut());
        let day = date(2023, 6, 1);
        for quantity in [512u32, 40, 7] {
            store
                .insert_movement(&Movement::new(
                    property,
                    category,
                    MovementKind::TransferOut,
                    day,
                    quantity,
                ))
                .unwrap();
        }
        let rows = store
            .movements_in(property, category, None, day)
            .unwrap();
        let quantities: Vec<u32> = rows.iter().map(|m| m.quantity).collect();
        assert_eq!(quantities, vec![512, 40, 7], "store = {name}");
        assert!(rows.windows(2).all(|w| w[0].id < w[1].id), "store = {name}");
    }
}

#[test]
fn upsert_skips_duplicates_in_both_stores() {
    for (name, mut store) in stores() {
        let (property, category) = seed(store.as_mut());
        let movement = Movement::new(
            property,
            category,
            MovementKind::TransferIn,
            date(2023, 6, 1),
            512,
        );
        assert!(store.upsert_movement(&movement).unwrap().created(), "store = {name}");
        assert!(!store.upsert_movement(&movement).unwrap().created(), "store = {name}");
        assert_eq!(
            store
                .movements_in(property, category, None, date(2023, 12, 31))
                .unwrap()
                .len(),
            1,
            "store = {name}"
        );
    }
}

#[test]
fn current_plan_prefers_latest_creation_then_year() {
    for (name, mut store) in stores() {
        seed(store.as_mut());
        store
            .insert_plan(&Plan::new(2022, 1, date(2022, 1, 5)))
            .unwrap();
        store
            .insert_plan(&Plan::new(2024, 1, date(2023, 11, 1)))
            .unwrap();
        // Same creation date as the 2024 plan; higher year wins the tie.
        store
            .insert_plan(&Plan::new(2025, 1, date(2023, 11, 1)))
            .unwrap();
        let current = store.current_plan().unwrap().unwrap();
        assert_eq!(current.year, 2025, "store = {name}");
    }
}

#[test]
fn find_properties_matches_substring_case_insensitively() {
    for (name, mut store) in stores() {
        store
            .insert_property(&Property::new("Fazenda Girassol"))
            .unwrap();
        store
            .insert_property(&Property::new("Fazenda Favo de Mel"))
            .unwrap();
        let hits = store.find_properties("girassol").unwrap();
        assert_eq!(hits.len(), 1, "store = {name}");
        assert_eq!(hits[0].name, "Fazenda Girassol", "store = {name}");
        assert_eq!(store.find_properties("fazenda").unwrap().len(), 2, "store = {name}");
        assert!(store.find_properties("buriti").unwrap().is_empty(), "store = {name}");
    }
}

#[test]
fn movement_window_bounds_are_exclusive_then_inclusive() {
    for (name, mut store) in stores() {
        let (property, category) = seed(store.as_mut());
        for (day, quantity) in [(date(2023, 1, 1), 5u32), (date(2023, 1, 2), 6), (date(2023, 1, 3), 7)] {
            store
                .insert_movement(&Movement::new(
                    property,
                    category,
                    MovementKind::Purchase,
                    day,
                    quantity,
                ))
                .unwrap();
        }
        let rows = store
            .movements_in(property, category, Some(date(2023, 1, 1)), date(2023, 1, 3))
            .unwrap();
        let quantities: Vec<u32> = rows.iter().map(|m| m.quantity).collect();
        // Strictly after the lower bound, at-or-before the upper.
        assert_eq!(quantities, vec![6, 7], "store = {name}");
    }
}
