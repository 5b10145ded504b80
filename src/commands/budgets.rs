// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::balance::load_monthly_balance;
use crate::error::BudgetError;
use crate::goals::{GoalChange, save_goal_adjustment};
use crate::models::PerformanceSnapshot;
use crate::performance::load_performance;
use crate::rollover::{close_month, closing_status};
use crate::store::SqliteStore;
use crate::utils::{
    fmt_money, id_for_category, maybe_print_json, parse_date, parse_decimal, parse_year_month,
    pretty_table, resolve_household,
};
use anyhow::Result;
use rust_decimal::Decimal;

pub fn goal(store: &SqliteStore, m: &clap::ArgMatches) -> Result<()> {
    if let Some(("set", sub)) = m.subcommand() {
        let household_id = resolve_household(store.conn(), sub)?;
        let month = parse_year_month(sub.get_one::<String>("month").unwrap())?;
        let cat = sub.get_one::<String>("category").unwrap().trim();
        let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
        let cat_id = id_for_category(store.conn(), household_id, cat)?;
        match save_goal_adjustment(store, household_id, cat_id, month, amount)? {
            GoalChange::Unchanged => {
                println!("{} / {} already uses the annual base goal", month, cat)
            }
            GoalChange::Cleared | GoalChange::Removed => {
                println!("{} / {} reset to the annual base goal", month, cat)
            }
            GoalChange::Set(v) => println!("Goal set for {} / {} = {}", month, cat, v),
        }
    }
    Ok(())
}

pub fn snapshot_rows(perf: &[&PerformanceSnapshot]) -> Vec<Vec<String>> {
    perf.iter()
        .map(|p| {
            vec![
                p.category_name.clone(),
                if p.is_income { "income" } else { "expense" }.to_string(),
                fmt_money(&p.monthly_base_goal),
                p.adjusted_goal.map(|g| fmt_money(&g)).unwrap_or_default(),
                fmt_money(&p.rollover),
                fmt_money(&p.total_available),
                fmt_money(&p.real_spent),
                fmt_money(&p.remaining),
                if p.is_over_budget { "OVER" } else { "" }.to_string(),
            ]
        })
        .collect()
}

pub const SNAPSHOT_HEADERS: [&str; 9] = [
    "Category",
    "Kind",
    "Base goal",
    "Adjusted",
    "Rollover",
    "Available",
    "Spent",
    "Remaining",
    "",
];

pub fn performance(store: &SqliteStore, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let household_id = resolve_household(store.conn(), sub)?;
    let month = parse_year_month(sub.get_one::<String>("month").unwrap())?;

    let perf = load_performance(store, household_id, month)?;
    let mut items: Vec<&PerformanceSnapshot> = perf.values().collect();
    // Income first, then by name
    items.sort_by(|a, b| {
        b.is_income
            .cmp(&a.is_income)
            .then_with(|| a.category_name.cmp(&b.category_name))
    });
    if !maybe_print_json(json_flag, jsonl_flag, &items)? {
        println!("{}", pretty_table(&SNAPSHOT_HEADERS, snapshot_rows(&items)));
    }
    Ok(())
}

pub fn close(store: &SqliteStore, sub: &clap::ArgMatches) -> Result<()> {
    let household_id = resolve_household(store.conn(), sub)?;
    let month = parse_year_month(sub.get_one::<String>("month").unwrap())?;
    match close_month(store, household_id, month) {
        Ok(outcome) => {
            println!(
                "Closed {}: rollover carried into {} for {} categories",
                outcome.closed, outcome.next, outcome.categories_updated
            );
            Ok(())
        }
        Err(BudgetError::AlreadyClosed { year_month }) => {
            println!("Month {} is already closed; nothing to do", year_month);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

pub fn status(store: &SqliteStore, sub: &clap::ArgMatches) -> Result<()> {
    let household_id = resolve_household(store.conn(), sub)?;
    let today = match sub.get_one::<String>("today") {
        Some(s) => parse_date(s)?,
        None => chrono::Local::now().date_naive(),
    };
    match closing_status(store, household_id, today)? {
        Some(p) if p.has_data => println!(
            "{} is not closed yet; run `nestegg close --month {}`",
            p.year_month, p.year_month
        ),
        Some(p) => println!(
            "{} has never been closed; run `nestegg close --month {}`",
            p.year_month, p.year_month
        ),
        None => println!("All caught up: last month is closed"),
    }
    Ok(())
}

pub fn balance(store: &SqliteStore, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let household_id = resolve_household(store.conn(), sub)?;
    let month = parse_year_month(sub.get_one::<String>("month").unwrap())?;
    let available = match sub.get_one::<String>("available") {
        Some(s) => parse_decimal(s)?,
        None => Decimal::ZERO,
    };

    let b = load_monthly_balance(store, household_id, month, available)?;
    if !maybe_print_json(json_flag, jsonl_flag, &b)? {
        let rows = vec![
            vec!["Available".to_string(), fmt_money(&b.available_funds)],
            vec!["Booked".to_string(), fmt_money(&b.total_effective)],
            vec!["Planned".to_string(), fmt_money(&b.total_planned)],
            vec!["Balance".to_string(), fmt_money(&b.balance)],
        ];
        let title = month.to_string();
        println!("{}", pretty_table(&[title.as_str(), ""], rows));
    }
    Ok(())
}
