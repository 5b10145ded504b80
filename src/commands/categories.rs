// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::store::{CategoryStore, SqliteStore, TypeStore};
use crate::utils::{id_for_category, id_for_type, pretty_table, resolve_household};
use anyhow::Result;
use std::collections::HashMap;

pub fn handle(store: &SqliteStore, m: &clap::ArgMatches) -> Result<()> {
    let household_id = resolve_household(store.conn(), m)?;
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap().trim();
            let type_name = sub.get_one::<String>("type").unwrap();
            let type_id = id_for_type(store.conn(), household_id, type_name)?;
            store.add_category(household_id, name, type_id)?;
            println!("Added category '{}'", name);
        }
        Some(("list", _)) => {
            let types: HashMap<i64, String> = store
                .list_types(household_id)?
                .into_iter()
                .map(|t| (t.id, t.name))
                .collect();
            let data = store
                .list_categories(household_id)?
                .into_iter()
                .map(|c| {
                    let t = types.get(&c.type_id).cloned().unwrap_or_default();
                    vec![c.name, t]
                })
                .collect();
            println!("{}", pretty_table(&["Category", "Type"], data));
        }
        Some(("rm", sub)) => {
            let name = sub.get_one::<String>("name").unwrap().trim();
            let id = id_for_category(store.conn(), household_id, name)?;
            store.remove_category(household_id, id)?;
            tracing::warn!(
                household_id,
                category_id = id,
                "category removed; its transactions and rollovers are orphaned"
            );
            println!("Removed category '{}'", name);
        }
        _ => {}
    }
    Ok(())
}
