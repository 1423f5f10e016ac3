//! End-to-end smoke tests that spawn the built binaries.
//!
//! The engine crate's scenario tests cover the semantics; these only
//! verify the binaries wire arguments, exit codes and output together.

use chrono::NaiveDate;
use herdbook_core::{Category, Movement, MovementKind, Property, Sex, Snapshot};
use herdbook_store::{LedgerWrite, SqliteStore};
use std::path::Path;
use std::process::{Command, Output};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Girassol holds 600 Boi Gordo and has sent 512 to Favo de Mel with no
/// entrada recorded on the other side.
fn seed_db(path: &Path) {
    let mut store = SqliteStore::open(path).unwrap();
    let girassol = store
        .insert_property(&Property::new("Fazenda Girassol"))
        .unwrap();
    store
        .insert_property(&Property::new("Fazenda Favo de Mel"))
        .unwrap();
    let boi = store
        .insert_category(&Category::new("Boi Gordo", Sex::Male))
        .unwrap();
    store
        .insert_snapshot(&Snapshot::new(girassol, boi, date(2023, 1, 1), 600))
        .unwrap();
    store
        .insert_movement(&Movement::new(
            girassol,
            boi,
            MovementKind::TransferOut,
            date(2023, 6, 1),
            512,
        ))
        .unwrap();
}

fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

#[test]
fn balance_prints_the_replayed_count() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("herd.db");
    seed_db(&db);

    let output = Command::new(env!("CARGO_BIN_EXE_herd-balance"))
        .args(["--db"])
        .arg(&db)
        .args(["girassol", "Boi Gordo", "--as-of", "2023-06-15"])
        .output()
        .unwrap();

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert_eq!(stdout_of(&output).trim(), "88");
}

#[test]
fn check_exits_one_on_findings_and_reconcile_heals_them() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("herd.db");
    seed_db(&db);

    let check = |db: &Path| {
        Command::new(env!("CARGO_BIN_EXE_herd-check"))
            .args(["--db"])
            .arg(db)
            .args([
                "girassol",
                "favo de mel",
                "--category",
                "Boi Gordo",
                "--from",
                "2023-01-01",
                "--through",
                "2023-12-31",
            ])
            .output()
            .unwrap()
    };

    let before = check(&db);
    assert_eq!(before.status.code(), Some(1));
    let text = stdout_of(&before);
    assert!(text.contains("TRANSFERENCIA_SAIDA"));
    assert!(text.contains("1 unpaired transfer"));

    let reconcile = Command::new(env!("CARGO_BIN_EXE_herd-reconcile"))
        .args(["--db"])
        .arg(&db)
        .args([
            "girassol",
            "favo de mel",
            "--category",
            "Boi Gordo",
            "--from",
            "2023-01-01",
            "--through",
            "2023-12-31",
        ])
        .output()
        .unwrap();
    assert!(
        reconcile.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&reconcile.stderr)
    );
    let text = stdout_of(&reconcile);
    assert!(text.contains("TRANSFERENCIA_ENTRADA"));
    assert!(text.contains("1 created, 0 skipped"));

    let after = check(&db);
    assert_eq!(after.status.code(), Some(0));
    assert!(stdout_of(&after).contains("No unpaired transfers"));

    // The destination herd now carries the transferred head count.
    let balance = Command::new(env!("CARGO_BIN_EXE_herd-balance"))
        .args(["--db"])
        .arg(&db)
        .args(["favo de mel", "Boi Gordo", "--as-of", "2023-06-15"])
        .output()
        .unwrap();
    assert_eq!(stdout_of(&balance).trim(), "512");
}

#[test]
fn spread_is_reproducible_under_a_seed() {
    let run = || {
        Command::new(env!("CARGO_BIN_EXE_herd-spread"))
            .args(["--target", "120000.00", "--seed", "7"])
            .output()
            .unwrap()
    };

    let a = run();
    let b = run();
    assert!(a.status.success());
    assert_eq!(stdout_of(&a), stdout_of(&b));
    assert!(stdout_of(&a).contains("120000.00"));
}

#[test]
fn spread_json_carries_the_seed_and_values() {
    let output = Command::new(env!("CARGO_BIN_EXE_herd-spread"))
        .args(["--target", "120000.00", "--seed", "7", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_str(&stdout_of(&output)).unwrap();
    assert_eq!(json["seed"], 7);
    assert_eq!(json["values"].as_array().unwrap().len(), 12);
}

#[test]
fn missing_database_is_a_hard_error() {
    let output = Command::new(env!("CARGO_BIN_EXE_herd-balance"))
        .args(["--db", "/no/such/herd.db", "girassol", "Boi Gordo"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error:"));
    assert!(stderr.contains("database not found"));
}
