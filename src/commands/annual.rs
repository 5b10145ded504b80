// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::performance::monthly_base_goal;
use crate::store::{AnnualBudgetStore, CategoryStore, SqliteStore};
use crate::utils::{
    fmt_money, id_for_category, maybe_print_json, parse_decimal, pretty_table, resolve_household,
};
use anyhow::Result;
use std::collections::HashMap;

pub fn handle(store: &SqliteStore, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("set", sub)) => set(store, sub)?,
        Some(("list", sub)) => list(store, sub)?,
        _ => {}
    }
    Ok(())
}

fn set(store: &SqliteStore, sub: &clap::ArgMatches) -> Result<()> {
    let household_id = resolve_household(store.conn(), sub)?;
    let year = *sub.get_one::<i32>("year").unwrap();
    let cat = sub.get_one::<String>("category").unwrap().trim();
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
    let cat_id = id_for_category(store.conn(), household_id, cat)?;
    store.set_annual(household_id, cat_id, year, amount)?;
    println!(
        "Annual estimate for {} / {} = {} ({} per month)",
        year,
        cat,
        amount,
        fmt_money(&monthly_base_goal(amount))
    );
    Ok(())
}

fn list(store: &SqliteStore, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let household_id = resolve_household(store.conn(), sub)?;
    let year = *sub.get_one::<i32>("year").unwrap();

    let estimates: HashMap<i64, _> = store
        .list_annual(household_id, year)?
        .into_iter()
        .map(|a| (a.category_id, a.annual_estimate))
        .collect();
    let mut data = Vec::new();
    for c in store.list_categories(household_id)? {
        let annual = estimates.get(&c.id).copied().unwrap_or_default();
        data.push(vec![
            c.name,
            fmt_money(&annual),
            fmt_money(&monthly_base_goal(annual)),
        ]);
    }
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        println!(
            "{}",
            pretty_table(&["Category", "Annual", "Monthly base"], data)
        );
    }
    Ok(())
}
