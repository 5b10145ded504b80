// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::store::{SqliteStore, TypeStore};
use crate::utils::{pretty_table, resolve_household};
use anyhow::Result;

pub fn handle(store: &SqliteStore, m: &clap::ArgMatches) -> Result<()> {
    let household_id = resolve_household(store.conn(), m)?;
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap().trim();
            let is_income = sub.get_flag("income");
            store.add_type(household_id, name, is_income)?;
            println!(
                "Added {} type '{}'",
                if is_income { "income" } else { "expense" },
                name
            );
        }
        Some(("list", _)) => {
            let data = store
                .list_types(household_id)?
                .into_iter()
                .map(|t| {
                    vec![
                        t.name,
                        if t.is_income { "income" } else { "expense" }.to_string(),
                    ]
                })
                .collect();
            println!("{}", pretty_table(&["Type", "Kind"], data));
        }
        _ => {}
    }
    Ok(())
}
