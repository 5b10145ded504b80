// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;

use nestegg::store::SqliteStore;
use nestegg::{cli, commands, db, utils};

fn main() -> Result<()> {
    utils::init_tracing();
    let cli = cli::build_cli();
    let matches = cli.get_matches();

    let store = SqliteStore::open()?;

    match matches.subcommand() {
        Some(("init", _)) => {
            println!("Database initialized at {}", db::db_path()?.display());
        }
        Some(("household", sub)) => commands::households::handle(&store, sub)?,
        Some(("type", sub)) => commands::types::handle(&store, sub)?,
        Some(("category", sub)) => commands::categories::handle(&store, sub)?,
        Some(("tx", sub)) => commands::transactions::handle(&store, sub)?,
        Some(("annual", sub)) => commands::annual::handle(&store, sub)?,
        Some(("goal", sub)) => commands::budgets::goal(&store, sub)?,
        Some(("perf", sub)) => commands::budgets::performance(&store, sub)?,
        Some(("balance", sub)) => commands::budgets::balance(&store, sub)?,
        Some(("close", sub)) => commands::budgets::close(&store, sub)?,
        Some(("status", sub)) => commands::budgets::status(&store, sub)?,
        Some(("alerts", sub)) => commands::alerts::handle(&store, sub)?,
        Some(("planned", sub)) => commands::planned::handle(&store, sub)?,
        Some(("export", sub)) => commands::exporter::handle(&store, sub)?,
        Some(("config", sub)) => commands::config::handle(store.conn(), sub)?,
        Some(("doctor", sub)) => commands::doctor::handle(store.conn(), sub)?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}
