// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::cell::Cell;
use std::collections::HashMap;

use chrono::NaiveDate;
use nestegg::alerts::{Severity, evaluate_alerts};
use nestegg::error::{BudgetError, Result};
use nestegg::models::{
    AnnualBudget, Category, MonthlyBudgetAdjustment, NewTransaction, Transaction, TxType,
};
use nestegg::performance::load_performance;
use nestegg::period::YearMonth;
use nestegg::rollover::{close_month, closing_status};
use nestegg::store::{
    AdjustmentStore, AnnualBudgetStore, CategoryStore, SqliteStore, TransactionStore, TypeStore,
};
use rust_decimal::Decimal;

struct Fixture {
    store: SqliteStore,
    hh: i64,
    expense: i64,
}

fn setup() -> Fixture {
    let store = SqliteStore::in_memory().unwrap();
    let hh = store.add_household("Home").unwrap();
    let expense = store.add_type(hh, "Expense", false).unwrap();
    Fixture { store, hh, expense }
}

fn ym(s: &str) -> YearMonth {
    YearMonth::parse(s).unwrap()
}

fn spend(f: &Fixture, cat: i64, date: &str, amount: i64) {
    f.store
        .add_transaction(&NewTransaction {
            household_id: f.hh,
            category_id: Some(cat),
            type_id: Some(f.expense),
            amount: Decimal::from(amount),
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            description: String::new(),
        })
        .unwrap();
}

fn groceries(f: &Fixture) -> i64 {
    let cat = f.store.add_category(f.hh, "Groceries", f.expense).unwrap();
    f.store.set_annual(f.hh, cat, 2025, Decimal::from(1200)).unwrap();
    spend(f, cat, "2025-01-14", -85);
    cat
}

#[test]
fn january_groceries_warn_then_roll_into_february() {
    let f = setup();
    let cat = groceries(&f);

    let perf = load_performance(&f.store, f.hh, ym("202501")).unwrap();
    let g = &perf[&cat];
    assert_eq!(g.monthly_base_goal, Decimal::from(100));
    assert_eq!(g.real_spent, Decimal::from(85));
    assert_eq!(g.remaining, Decimal::from(15));
    assert!(!g.is_over_budget);

    let names = HashMap::from([(cat, "Groceries".to_string())]);
    let lines = evaluate_alerts(&perf, &names);
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].severity, Severity::Warning);
    assert!(lines[0].message.starts_with("Groceries: only $15.00 left"));

    let outcome = close_month(&f.store, f.hh, ym("202501")).unwrap();
    assert_eq!(outcome.next, ym("202502"));
    assert_eq!(outcome.categories_updated, 1);

    let feb = f
        .store
        .get_adjustment(f.hh, cat, ym("202502"))
        .unwrap()
        .unwrap();
    assert_eq!(feb.rollover, Decimal::from(15));
    assert_eq!(feb.adjusted_goal, None);
    assert!(!feb.is_closed);
    assert!(f.store.is_closed(f.hh, ym("202501")).unwrap());

    let feb_perf = load_performance(&f.store, f.hh, ym("202502")).unwrap();
    assert_eq!(feb_perf[&cat].total_available, Decimal::from(115));
}

#[test]
fn second_close_is_rejected_and_changes_nothing() {
    let f = setup();
    let cat = groceries(&f);
    close_month(&f.store, f.hh, ym("202501")).unwrap();

    // A late expense must not leak into the already propagated rollover.
    spend(&f, cat, "2025-01-30", -10);
    let err = close_month(&f.store, f.hh, ym("202501")).unwrap_err();
    assert!(matches!(err, BudgetError::AlreadyClosed { ref year_month } if year_month == "202501"));

    let feb = f
        .store
        .get_adjustment(f.hh, cat, ym("202502"))
        .unwrap()
        .unwrap();
    assert_eq!(feb.rollover, Decimal::from(15));
}

#[test]
fn december_rolls_into_next_january() {
    let f = setup();
    let cat = f.store.add_category(f.hh, "Gifts", f.expense).unwrap();
    f.store.set_annual(f.hh, cat, 2024, Decimal::from(600)).unwrap();
    spend(&f, cat, "2024-12-20", -80);

    let outcome = close_month(&f.store, f.hh, ym("202412")).unwrap();
    assert_eq!(outcome.next, ym("202501"));
    let jan = f
        .store
        .get_adjustment(f.hh, cat, ym("202501"))
        .unwrap()
        .unwrap();
    assert_eq!(jan.rollover, Decimal::from(-30));
}

#[test]
fn manual_goal_in_next_month_survives_close() {
    let f = setup();
    let cat = groceries(&f);
    f.store
        .set_adjusted_goal(f.hh, cat, ym("202502"), Some(Decimal::from(80)))
        .unwrap();

    close_month(&f.store, f.hh, ym("202501")).unwrap();

    let feb = f
        .store
        .get_adjustment(f.hh, cat, ym("202502"))
        .unwrap()
        .unwrap();
    assert_eq!(feb.adjusted_goal, Some(Decimal::from(80)));
    assert_eq!(feb.rollover, Decimal::from(15));
    let perf = load_performance(&f.store, f.hh, ym("202502")).unwrap();
    assert_eq!(perf[&cat].total_available, Decimal::from(95));
}

#[test]
fn income_and_untouched_categories_get_no_rollover() {
    let f = setup();
    let income = f.store.add_type(f.hh, "Income", true).unwrap();
    let salary = f.store.add_category(f.hh, "Salary", income).unwrap();
    let idle = f.store.add_category(f.hh, "Idle", f.expense).unwrap();
    f.store.set_annual(f.hh, salary, 2025, Decimal::from(60000)).unwrap();

    let outcome = close_month(&f.store, f.hh, ym("202503")).unwrap();
    assert_eq!(outcome.categories_updated, 0);
    assert!(f.store.get_adjustment(f.hh, salary, ym("202504")).unwrap().is_none());
    assert!(f.store.get_adjustment(f.hh, idle, ym("202504")).unwrap().is_none());
    assert!(f.store.is_closed(f.hh, ym("202503")).unwrap());
}

#[test]
fn rollover_chains_across_months_without_accumulating() {
    let f = setup();
    let cat = groceries(&f);
    close_month(&f.store, f.hh, ym("202501")).unwrap();
    spend(&f, cat, "2025-02-03", -120);
    close_month(&f.store, f.hh, ym("202502")).unwrap();

    // February had 100 + 15 available and spent 120.
    let mar = f
        .store
        .get_adjustment(f.hh, cat, ym("202503"))
        .unwrap()
        .unwrap();
    assert_eq!(mar.rollover, Decimal::from(-5));
}

/// Delegates to SQLite but fails the n-th rollover write (0 never fails).
/// With `hide_closed` it reports every month as open, like a session that read
/// the closed flag before another one flipped it.
struct FlakyStore<'a> {
    inner: &'a SqliteStore,
    fail_on: usize,
    hide_closed: bool,
    calls: Cell<usize>,
}

impl CategoryStore for FlakyStore<'_> {
    fn list_categories(&self, household_id: i64) -> Result<Vec<Category>> {
        self.inner.list_categories(household_id)
    }
}

impl TypeStore for FlakyStore<'_> {
    fn list_types(&self, household_id: i64) -> Result<Vec<TxType>> {
        self.inner.list_types(household_id)
    }
}

impl TransactionStore for FlakyStore<'_> {
    fn query_transactions(
        &self,
        household_id: i64,
        category_id: Option<i64>,
        year_month: Option<YearMonth>,
    ) -> Result<Vec<Transaction>> {
        self.inner
            .query_transactions(household_id, category_id, year_month)
    }
}

impl AnnualBudgetStore for FlakyStore<'_> {
    fn get_annual(
        &self,
        household_id: i64,
        category_id: i64,
        year: i32,
    ) -> Result<Option<AnnualBudget>> {
        self.inner.get_annual(household_id, category_id, year)
    }

    fn list_annual(&self, household_id: i64, year: i32) -> Result<Vec<AnnualBudget>> {
        self.inner.list_annual(household_id, year)
    }
}

impl AdjustmentStore for FlakyStore<'_> {
    fn get_adjustment(
        &self,
        household_id: i64,
        category_id: i64,
        year_month: YearMonth,
    ) -> Result<Option<MonthlyBudgetAdjustment>> {
        self.inner.get_adjustment(household_id, category_id, year_month)
    }

    fn query_adjustments(
        &self,
        household_id: i64,
        year_month: YearMonth,
    ) -> Result<Vec<MonthlyBudgetAdjustment>> {
        self.inner.query_adjustments(household_id, year_month)
    }

    fn upsert_rollover(
        &self,
        household_id: i64,
        category_id: i64,
        year_month: YearMonth,
        rollover: Decimal,
    ) -> Result<()> {
        let n = self.calls.get() + 1;
        self.calls.set(n);
        if n == self.fail_on {
            return Err(BudgetError::IncompleteData("write timed out".into()));
        }
        self.inner
            .upsert_rollover(household_id, category_id, year_month, rollover)
    }

    fn set_adjusted_goal(
        &self,
        household_id: i64,
        category_id: i64,
        year_month: YearMonth,
        goal: Option<Decimal>,
    ) -> Result<()> {
        self.inner
            .set_adjusted_goal(household_id, category_id, year_month, goal)
    }

    fn delete_adjustment(
        &self,
        household_id: i64,
        category_id: i64,
        year_month: YearMonth,
    ) -> Result<()> {
        self.inner.delete_adjustment(household_id, category_id, year_month)
    }

    fn is_closed(&self, household_id: i64, year_month: YearMonth) -> Result<bool> {
        if self.hide_closed {
            return Ok(false);
        }
        self.inner.is_closed(household_id, year_month)
    }

    fn mark_closed(
        &self,
        household_id: i64,
        year_month: YearMonth,
        categories_updated: usize,
    ) -> Result<bool> {
        self.inner
            .mark_closed(household_id, year_month, categories_updated)
    }
}

#[test]
fn failed_write_leaves_month_open_and_retry_converges() {
    let f = setup();
    let groceries = groceries(&f);
    let fuel = f.store.add_category(f.hh, "Fuel", f.expense).unwrap();
    f.store.set_annual(f.hh, fuel, 2025, Decimal::from(2400)).unwrap();
    spend(&f, fuel, "2025-01-09", -150);

    let flaky = FlakyStore {
        inner: &f.store,
        fail_on: 2,
        hide_closed: false,
        calls: Cell::new(0),
    };
    let err = close_month(&flaky, f.hh, ym("202501")).unwrap_err();
    assert!(err.is_retryable());
    assert!(!f.store.is_closed(f.hh, ym("202501")).unwrap());

    close_month(&f.store, f.hh, ym("202501")).unwrap();
    let feb_groceries = f
        .store
        .get_adjustment(f.hh, groceries, ym("202502"))
        .unwrap()
        .unwrap();
    let feb_fuel = f
        .store
        .get_adjustment(f.hh, fuel, ym("202502"))
        .unwrap()
        .unwrap();
    assert_eq!(feb_groceries.rollover, Decimal::from(15));
    assert_eq!(feb_fuel.rollover, Decimal::from(50));
}

#[test]
fn closing_status_points_at_previous_month() {
    let f = setup();
    let cat = groceries(&f);
    let today = NaiveDate::from_ymd_opt(2025, 2, 10).unwrap();

    let pending = closing_status(&f.store, f.hh, today).unwrap().unwrap();
    assert_eq!(pending.year_month, ym("202501"));
    assert!(!pending.has_data);

    f.store
        .set_adjusted_goal(f.hh, cat, ym("202501"), Some(Decimal::from(90)))
        .unwrap();
    let pending = closing_status(&f.store, f.hh, today).unwrap().unwrap();
    assert!(pending.has_data);

    close_month(&f.store, f.hh, ym("202501")).unwrap();
    assert!(closing_status(&f.store, f.hh, today).unwrap().is_none());
}

#[test]
fn closed_flag_is_mirrored_on_existing_records() {
    let f = setup();
    let cat = groceries(&f);
    f.store
        .set_adjusted_goal(f.hh, cat, ym("202501"), Some(Decimal::from(90)))
        .unwrap();
    close_month(&f.store, f.hh, ym("202501")).unwrap();

    let jan = f
        .store
        .get_adjustment(f.hh, cat, ym("202501"))
        .unwrap()
        .unwrap();
    assert!(jan.is_closed);
    let feb = f
        .store
        .get_adjustment(f.hh, cat, ym("202502"))
        .unwrap()
        .unwrap();
    // Goal of 90 minus 85 spent.
    assert_eq!(feb.rollover, Decimal::from(5));
}

#[test]
fn closing_out_of_order_is_rejected_without_writes() {
    let f = setup();
    let cat = groceries(&f);

    // February closes first and pushes its full 100 into March.
    close_month(&f.store, f.hh, ym("202502")).unwrap();
    let mar_before = f
        .store
        .get_adjustment(f.hh, cat, ym("202503"))
        .unwrap()
        .unwrap();
    assert_eq!(mar_before.rollover, Decimal::from(100));

    let err = close_month(&f.store, f.hh, ym("202501")).unwrap_err();
    assert!(matches!(err, BudgetError::Validation(ref m) if m.contains("202502")));
    assert!(!f.store.is_closed(f.hh, ym("202501")).unwrap());
    assert!(f.store.get_adjustment(f.hh, cat, ym("202502")).unwrap().is_none());

    let perf_feb = load_performance(&f.store, f.hh, ym("202502")).unwrap();
    let mar = f
        .store
        .get_adjustment(f.hh, cat, ym("202503"))
        .unwrap()
        .unwrap();
    assert_eq!(mar.rollover, perf_feb[&cat].remaining);
}

#[test]
fn losing_a_concurrent_close_keeps_the_winners_result() {
    let f = setup();
    let cat = groceries(&f);

    let winner = close_month(&f.store, f.hh, ym("202501")).unwrap();
    assert_eq!(winner.categories_updated, 1);

    let stale = FlakyStore {
        inner: &f.store,
        fail_on: 0,
        hide_closed: true,
        calls: Cell::new(0),
    };
    let err = close_month(&stale, f.hh, ym("202501")).unwrap_err();
    assert!(matches!(err, BudgetError::AlreadyClosed { ref year_month } if year_month == "202501"));
    // The loser got as far as the rollover writes before the marker refused it.
    assert_eq!(stale.calls.get(), 1);

    let recorded: i64 = f
        .store
        .conn()
        .query_row(
            "SELECT categories_updated FROM month_closings WHERE household_id=?1 AND year_month='202501'",
            [f.hh],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(recorded, 1);
    let feb = f
        .store
        .get_adjustment(f.hh, cat, ym("202502"))
        .unwrap()
        .unwrap();
    assert_eq!(feb.rollover, Decimal::from(15));
    assert!(f.store.is_closed(f.hh, ym("202501")).unwrap());
}

#[test]
fn last_representable_month_cannot_close() {
    let f = setup();
    f.store.add_category(f.hh, "Groceries", f.expense).unwrap();
    let err = close_month(&f.store, f.hh, ym("999912")).unwrap_err();
    assert!(matches!(err, BudgetError::Validation(_)));
    assert!(!f.store.is_closed(f.hh, ym("999912")).unwrap());
}
