// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::store::SqliteStore;
use crate::utils::{
    SETTING_ACTIVE_HOUSEHOLD, get_setting, id_for_household, pretty_table, set_setting,
};
use anyhow::Result;

pub fn handle(store: &SqliteStore, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap().trim();
            let id = store.add_household(name)?;
            if get_setting(store.conn(), SETTING_ACTIVE_HOUSEHOLD)?.is_none() {
                set_setting(store.conn(), SETTING_ACTIVE_HOUSEHOLD, name)?;
            }
            println!("Added household '{}' (id {})", name, id);
        }
        Some(("list", _)) => {
            let active = get_setting(store.conn(), SETTING_ACTIVE_HOUSEHOLD)?;
            let data = store
                .list_households()?
                .into_iter()
                .map(|h| {
                    let mark = if active.as_deref() == Some(h.name.as_str()) {
                        "*"
                    } else {
                        ""
                    };
                    vec![h.id.to_string(), h.name, mark.to_string()]
                })
                .collect();
            println!("{}", pretty_table(&["ID", "Household", "Active"], data));
        }
        Some(("use", sub)) => {
            let name = sub.get_one::<String>("name").unwrap().trim();
            id_for_household(store.conn(), name)?;
            set_setting(store.conn(), SETTING_ACTIVE_HOUSEHOLD, name)?;
            println!("Active household is now '{}'", name);
        }
        _ => {}
    }
    Ok(())
}
