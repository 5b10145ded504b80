// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use nestegg::models::NewTransaction;
use nestegg::store::SqliteStore;
use nestegg::{cli, commands::doctor, commands::exporter};
use rust_decimal::Decimal;
use serde_json::Value;
use tempfile::tempdir;

fn setup() -> (SqliteStore, i64, i64) {
    let store = SqliteStore::in_memory().unwrap();
    let hh = store.add_household("Home").unwrap();
    let expense = store.add_type(hh, "Expense", false).unwrap();
    let cat = store.add_category(hh, "Groceries", expense).unwrap();
    store.set_annual(hh, cat, 2025, Decimal::from(1200)).unwrap();
    store
        .add_transaction(&NewTransaction {
            household_id: hh,
            category_id: Some(cat),
            type_id: Some(expense),
            amount: Decimal::new(-8550, 2),
            date: NaiveDate::from_ymd_opt(2025, 1, 14).unwrap(),
            description: "Corner Shop".into(),
        })
        .unwrap();
    (store, hh, cat)
}

fn run_export(store: &SqliteStore, format: &str, out: &str) -> anyhow::Result<()> {
    let matches = cli::build_cli().get_matches_from([
        "nestegg",
        "--household",
        "Home",
        "export",
        "performance",
        "--month",
        "202501",
        "--format",
        format,
        "--out",
        out,
    ]);
    let (_, export_m) = matches.subcommand().unwrap();
    exporter::handle(store, export_m)
}

#[test]
fn export_performance_csv() {
    let (store, _, _) = setup();
    let dir = tempdir().unwrap();
    let path = dir.path().join("perf.csv");
    run_export(&store, "csv", path.to_str().unwrap()).unwrap();

    let mut rdr = csv::Reader::from_path(&path).unwrap();
    let headers = rdr.headers().unwrap().clone();
    assert_eq!(&headers[0], "year_month");
    assert_eq!(&headers[8], "remaining");
    let rows: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 1);
    assert_eq!(&rows[0][0], "202501");
    assert_eq!(&rows[0][1], "Groceries");
    assert_eq!(&rows[0][7], "85.50");
    assert_eq!(&rows[0][8], "14.50");
    assert_eq!(&rows[0][9], "false");
}

#[test]
fn export_performance_json() {
    let (store, _, cat) = setup();
    let dir = tempdir().unwrap();
    let path = dir.path().join("perf.json");
    run_export(&store, "json", path.to_str().unwrap()).unwrap();

    let v: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let arr = v.as_array().unwrap();
    assert_eq!(arr.len(), 1);
    assert_eq!(arr[0]["category_id"], cat);
    assert_eq!(arr[0]["category_name"], "Groceries");
    assert_eq!(arr[0]["is_over_budget"], false);
}

#[test]
fn export_rejects_unknown_format() {
    let (store, _, _) = setup();
    let dir = tempdir().unwrap();
    let path = dir.path().join("perf.xml");
    let err = run_export(&store, "xml", path.to_str().unwrap()).unwrap_err();
    assert!(err.to_string().contains("Unknown format"));
}

#[test]
fn doctor_reports_orphans_after_category_removal() {
    let (store, hh, cat) = setup();
    assert!(doctor::find_issues(store.conn(), hh).unwrap().is_empty());

    nestegg::rollover::close_month(&store, hh, "202501".parse().unwrap()).unwrap();
    store.remove_category(hh, cat).unwrap();

    let issues = doctor::find_issues(store.conn(), hh).unwrap();
    let kinds: Vec<&str> = issues.iter().map(|r| r[0].as_str()).collect();
    assert_eq!(kinds, vec!["orphaned_transaction", "orphaned_adjustment"]);
}
