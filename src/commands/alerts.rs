// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::alerts::{AlertLine, budget_notification, evaluate_alerts_with};
use crate::notify::{NotificationDispatcher, StdoutDispatcher};
use crate::performance::load_performance;
use crate::store::{CategoryStore, SqliteStore};
use crate::utils::{
    alert_options, maybe_print_json, parse_year_month, pretty_table, resolve_household,
};
use anyhow::Result;
use std::collections::HashMap;

pub fn handle(store: &SqliteStore, sub: &clap::ArgMatches) -> Result<()> {
    handle_with(store, sub, &StdoutDispatcher)
}

pub fn handle_with(
    store: &SqliteStore,
    sub: &clap::ArgMatches,
    dispatcher: &dyn NotificationDispatcher,
) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let lines = compute(store, sub)?;

    if sub.get_flag("notify") {
        if let Some(n) = budget_notification(&lines) {
            dispatcher.dispatch(&n);
        }
        return Ok(());
    }
    if !maybe_print_json(json_flag, jsonl_flag, &lines)? {
        if lines.is_empty() {
            println!("No budget alerts");
            return Ok(());
        }
        let rows = lines
            .iter()
            .map(|l| vec![l.severity.to_string(), l.message.clone()])
            .collect();
        println!("{}", pretty_table(&["Severity", "Alert"], rows));
    }
    Ok(())
}

pub fn compute(store: &SqliteStore, sub: &clap::ArgMatches) -> Result<Vec<AlertLine>> {
    let household_id = resolve_household(store.conn(), sub)?;
    let month = parse_year_month(sub.get_one::<String>("month").unwrap())?;
    let opts = alert_options(store.conn())?;
    let perf = load_performance(store, household_id, month)?;
    let names: HashMap<i64, String> = store
        .list_categories(household_id)?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect();
    Ok(evaluate_alerts_with(&perf, &names, &opts))
}
