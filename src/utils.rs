// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::sync::Once;

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use comfy_table::{Cell, Table, presets::UTF8_FULL};
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;

use crate::alerts::AlertOptions;
use crate::error::BudgetError;
use crate::period::YearMonth;

pub const SETTING_ACTIVE_HOUSEHOLD: &str = "active_household";
pub const SETTING_CURRENCY_SYMBOL: &str = "currency_symbol";
pub const SETTING_WARNING_RATIO: &str = "alert_warning_ratio";
pub const SETTING_INFO_RATIO: &str = "alert_info_ratio";

pub const KNOWN_SETTINGS: &[&str] = &[
    SETTING_ACTIVE_HOUSEHOLD,
    SETTING_CURRENCY_SYMBOL,
    SETTING_WARNING_RATIO,
    SETTING_INFO_RATIO,
];

static TRACING_INIT: Once = Once::new();

/// Installs the stderr tracing subscriber. `RUST_LOG` overrides the default level.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{EnvFilter, fmt};

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("nestegg=warn"));
        fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    });
}

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

pub fn parse_year_month(s: &str) -> Result<YearMonth> {
    Ok(YearMonth::parse(s)?)
}

pub fn parse_decimal(s: &str) -> Result<Decimal> {
    s.trim()
        .parse::<Decimal>()
        .with_context(|| format!("Invalid decimal '{}'", s))
}

pub fn fmt_money(d: &Decimal) -> String {
    format!("{:.2}", d.round_dp(2))
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        // Arrays stream one element per line
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}

pub fn id_for_household(conn: &Connection, name: &str) -> Result<i64> {
    let mut stmt = conn.prepare("SELECT id FROM households WHERE name=?1")?;
    let id: i64 = stmt
        .query_row(params![name.trim()], |r| r.get(0))
        .with_context(|| format!("Household '{}' not found", name.trim()))?;
    Ok(id)
}

pub fn id_for_category(conn: &Connection, household_id: i64, name: &str) -> Result<i64> {
    let mut stmt = conn.prepare("SELECT id FROM categories WHERE household_id=?1 AND name=?2")?;
    let id: i64 = stmt
        .query_row(params![household_id, name.trim()], |r| r.get(0))
        .with_context(|| format!("Category '{}' not found", name.trim()))?;
    Ok(id)
}

pub fn id_for_type(conn: &Connection, household_id: i64, name: &str) -> Result<i64> {
    let mut stmt = conn.prepare("SELECT id FROM types WHERE household_id=?1 AND name=?2")?;
    let id: i64 = stmt
        .query_row(params![household_id, name.trim()], |r| r.get(0))
        .with_context(|| format!("Type '{}' not found", name.trim()))?;
    Ok(id)
}

pub fn type_for_category(conn: &Connection, category_id: i64) -> Result<i64> {
    let id: i64 = conn
        .query_row(
            "SELECT type_id FROM categories WHERE id=?1",
            params![category_id],
            |r| r.get(0),
        )
        .with_context(|| format!("Category {} not found", category_id))?;
    Ok(id)
}

pub fn get_setting(conn: &Connection, key: &str) -> Result<Option<String>> {
    let v: Option<String> = conn
        .query_row(
            "SELECT value FROM settings WHERE key=?1",
            params![key],
            |r| r.get(0),
        )
        .optional()?;
    Ok(v)
}

pub fn set_setting(conn: &Connection, key: &str, value: &str) -> Result<()> {
    if !KNOWN_SETTINGS.contains(&key) {
        return Err(anyhow!(
            "Unknown setting '{}' (known: {})",
            key,
            KNOWN_SETTINGS.join(", ")
        ));
    }
    if key == SETTING_WARNING_RATIO || key == SETTING_INFO_RATIO {
        check_ratio(key, parse_decimal(value)?)?;
    }
    conn.execute(
        "INSERT INTO settings(key, value) VALUES(?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![key, value],
    )?;
    Ok(())
}

pub fn list_settings(conn: &Connection) -> Result<Vec<(String, String)>> {
    let mut stmt = conn.prepare("SELECT key, value FROM settings ORDER BY key")?;
    let rows = stmt.query_map([], |r| Ok((r.get(0)?, r.get(1)?)))?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn currency_symbol(conn: &Connection) -> Result<String> {
    Ok(get_setting(conn, SETTING_CURRENCY_SYMBOL)?.unwrap_or_else(|| "$".to_string()))
}

fn check_ratio(key: &str, d: Decimal) -> Result<Decimal> {
    if d < Decimal::ZERO || d > Decimal::ONE {
        return Err(anyhow!("Setting '{}' must be between 0 and 1, got {}", key, d));
    }
    Ok(d)
}

fn ratio_setting(conn: &Connection, key: &str, default: Decimal) -> Result<Decimal> {
    match get_setting(conn, key)? {
        Some(v) => {
            let d = parse_decimal(&v).with_context(|| format!("Setting '{}'", key))?;
            check_ratio(key, d)
        }
        None => Ok(default),
    }
}

pub fn alert_options(conn: &Connection) -> Result<AlertOptions> {
    let defaults = AlertOptions::default();
    Ok(AlertOptions {
        warning_ratio: ratio_setting(conn, SETTING_WARNING_RATIO, defaults.warning_ratio)?,
        info_ratio: ratio_setting(conn, SETTING_INFO_RATIO, defaults.info_ratio)?,
        currency_symbol: currency_symbol(conn)?,
    })
}

/// Household from `--household`, falling back to the `active_household` setting.
pub fn resolve_household(conn: &Connection, m: &clap::ArgMatches) -> Result<i64> {
    let explicit = m
        .try_get_one::<String>("household")
        .ok()
        .flatten()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    let name = match explicit {
        Some(n) => n,
        None => get_setting(conn, SETTING_ACTIVE_HOUSEHOLD)?.ok_or_else(|| {
            BudgetError::validation(
                "missing household context: pass --household or run `household use <name>`",
            )
        })?,
    };
    id_for_household(conn, &name)
}
