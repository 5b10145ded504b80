// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::notify::{NotificationDispatcher, StdoutDispatcher};
use crate::planned::{due_notification, load_due_alerts};
use crate::store::{PlannedPaymentStore, SqliteStore};
use crate::utils::{
    currency_symbol, fmt_money, id_for_category, maybe_print_json, parse_date, parse_decimal,
    pretty_table, resolve_household,
};
use anyhow::{Result, bail};
use chrono::NaiveDate;

pub fn handle(store: &SqliteStore, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(store, sub)?,
        Some(("list", sub)) => list(store, sub)?,
        Some(("pay", sub)) => {
            let household_id = resolve_household(store.conn(), sub)?;
            let id = *sub.get_one::<i64>("id").unwrap();
            let tx_id = store.pay_planned(household_id, id)?;
            println!("Planned payment {} booked as transaction {}", id, tx_id);
        }
        Some(("rm", sub)) => {
            let household_id = resolve_household(store.conn(), sub)?;
            let id = *sub.get_one::<i64>("id").unwrap();
            if store.delete_planned(household_id, id)? == 0 {
                bail!("Planned payment {} not found", id);
            }
            println!("Deleted planned payment {}", id);
        }
        Some(("due", sub)) => due(store, sub, &StdoutDispatcher)?,
        _ => {}
    }
    Ok(())
}

fn add(store: &SqliteStore, sub: &clap::ArgMatches) -> Result<()> {
    let household_id = resolve_household(store.conn(), sub)?;
    let date = parse_date(sub.get_one::<String>("date").unwrap())?;
    let description = sub.get_one::<String>("description").unwrap().trim();
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
    let category_id = match sub.get_one::<String>("category") {
        Some(c) => Some(id_for_category(store.conn(), household_id, c)?),
        None => None,
    };
    store.add_planned(household_id, description, amount, date, category_id)?;
    println!("Planned '{}' ({}) for {}", description, amount, date);
    Ok(())
}

fn list(store: &SqliteStore, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let household_id = resolve_household(store.conn(), sub)?;
    let from = match sub.get_one::<String>("from") {
        Some(s) => parse_date(s)?,
        None => NaiveDate::from_ymd_opt(1, 1, 1).unwrap_or(NaiveDate::MIN),
    };
    let to = match sub.get_one::<String>("to") {
        Some(s) => parse_date(s)?,
        None => NaiveDate::from_ymd_opt(9999, 12, 31).unwrap_or(NaiveDate::MAX),
    };
    let payments = store.list_planned(household_id, from, to)?;
    if !maybe_print_json(json_flag, jsonl_flag, &payments)? {
        let rows = payments
            .iter()
            .map(|p| {
                vec![
                    p.id.to_string(),
                    p.due_date.to_string(),
                    p.description.clone(),
                    fmt_money(&p.amount),
                ]
            })
            .collect();
        println!("{}", pretty_table(&["ID", "Due", "Description", "Amount"], rows));
    }
    Ok(())
}

pub fn due(
    store: &SqliteStore,
    sub: &clap::ArgMatches,
    dispatcher: &dyn NotificationDispatcher,
) -> Result<()> {
    let household_id = resolve_household(store.conn(), sub)?;
    let today = match sub.get_one::<String>("today") {
        Some(s) => parse_date(s)?,
        None => chrono::Local::now().date_naive(),
    };
    let symbol = currency_symbol(store.conn())?;
    let alerts = load_due_alerts(store, household_id, today, &symbol)?;
    if sub.get_flag("notify") {
        if let Some(n) = due_notification(&alerts) {
            dispatcher.dispatch(&n);
        }
    } else if alerts.is_empty() {
        println!("Nothing due today or tomorrow");
    } else {
        for a in &alerts {
            println!("{}", a);
        }
    }
    Ok(())
}
