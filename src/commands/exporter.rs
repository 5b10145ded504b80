// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::PerformanceSnapshot;
use crate::performance::load_performance;
use crate::store::SqliteStore;
use crate::utils::{parse_year_month, resolve_household};
use anyhow::{Context, Result, bail};

pub fn handle(store: &SqliteStore, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("performance", sub)) => export_performance(store, sub),
        _ => Ok(()),
    }
}

fn export_performance(store: &SqliteStore, sub: &clap::ArgMatches) -> Result<()> {
    let fmt = sub.get_one::<String>("format").unwrap().to_lowercase();
    let out = sub.get_one::<String>("out").unwrap();
    let household_id = resolve_household(store.conn(), sub)?;
    let month = parse_year_month(sub.get_one::<String>("month").unwrap())?;

    let perf = load_performance(store, household_id, month)?;
    let items: Vec<&PerformanceSnapshot> = perf.values().collect();

    match fmt.as_str() {
        "csv" => {
            let mut wtr =
                csv::Writer::from_path(out).with_context(|| format!("Create {}", out))?;
            wtr.write_record([
                "year_month",
                "category",
                "kind",
                "monthly_base_goal",
                "adjusted_goal",
                "rollover",
                "total_available",
                "real_spent",
                "remaining",
                "over_budget",
            ])?;
            for p in &items {
                wtr.write_record([
                    month.to_string(),
                    p.category_name.clone(),
                    if p.is_income { "income" } else { "expense" }.to_string(),
                    p.monthly_base_goal.round_dp(2).to_string(),
                    p.adjusted_goal
                        .map(|g| g.round_dp(2).to_string())
                        .unwrap_or_default(),
                    p.rollover.round_dp(2).to_string(),
                    p.total_available.round_dp(2).to_string(),
                    p.real_spent.round_dp(2).to_string(),
                    p.remaining.round_dp(2).to_string(),
                    p.is_over_budget.to_string(),
                ])?;
            }
            wtr.flush()?;
        }
        "json" => {
            std::fs::write(out, serde_json::to_string_pretty(&items)?)
                .with_context(|| format!("Write {}", out))?;
        }
        _ => bail!("Unknown format: {} (use csv|json)", fmt),
    }
    println!("Exported {} performance to {}", month, out);
    Ok(())
}
