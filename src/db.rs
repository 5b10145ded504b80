// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rusqlite::Connection;
use std::fs;
use std::path::PathBuf;

static APP: Lazy<(&str, &str, &str)> = Lazy::new(|| ("com.nestegg", "Nestegg", "nestegg"));

pub const DB_ENV: &str = "NESTEGG_DB";

pub fn db_path() -> Result<PathBuf> {
    if let Ok(p) = std::env::var(DB_ENV) {
        let p = p.trim();
        if !p.is_empty() {
            return Ok(PathBuf::from(p));
        }
    }
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")?;
    let data_dir = proj.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data dir")?;
    Ok(data_dir.join("nestegg.sqlite"))
}

pub fn open_or_init() -> Result<Connection> {
    let path = db_path()?;
    let conn =
        Connection::open(&path).with_context(|| format!("Open DB at {}", path.display()))?;
    init_schema(&conn)?;
    tracing::debug!(path = %path.display(), "database ready");
    Ok(conn)
}

pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory().context("Open in-memory DB")?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS settings(
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS households(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    );

    CREATE TABLE IF NOT EXISTS types(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        household_id INTEGER NOT NULL,
        name TEXT NOT NULL,
        is_income INTEGER NOT NULL DEFAULT 0,
        UNIQUE(household_id, name),
        FOREIGN KEY(household_id) REFERENCES households(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS categories(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        household_id INTEGER NOT NULL,
        name TEXT NOT NULL,
        type_id INTEGER NOT NULL,
        UNIQUE(household_id, name),
        FOREIGN KEY(household_id) REFERENCES households(id) ON DELETE CASCADE,
        FOREIGN KEY(type_id) REFERENCES types(id)
    );

    -- category_id is not a foreign key; deleting a category orphans history
    CREATE TABLE IF NOT EXISTS transactions(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        household_id INTEGER NOT NULL,
        date TEXT NOT NULL,
        year_month TEXT NOT NULL,
        amount TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        category_id INTEGER,
        type_id INTEGER,
        installment_group INTEGER,
        installment_current INTEGER NOT NULL DEFAULT 1,
        installment_total INTEGER NOT NULL DEFAULT 1,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        FOREIGN KEY(household_id) REFERENCES households(id) ON DELETE CASCADE
    );
    CREATE INDEX IF NOT EXISTS idx_transactions_month ON transactions(household_id, year_month);

    CREATE TABLE IF NOT EXISTS annual_budgets(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        household_id INTEGER NOT NULL,
        category_id INTEGER NOT NULL,
        year INTEGER NOT NULL,
        annual_estimate TEXT NOT NULL,
        UNIQUE(household_id, category_id, year),
        FOREIGN KEY(category_id) REFERENCES categories(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS monthly_budgets(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        household_id INTEGER NOT NULL,
        category_id INTEGER NOT NULL,
        year_month TEXT NOT NULL,
        adjusted_goal TEXT,
        rollover TEXT NOT NULL DEFAULT '0',
        is_closed INTEGER NOT NULL DEFAULT 0,
        UNIQUE(household_id, category_id, year_month),
        FOREIGN KEY(household_id) REFERENCES households(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS month_closings(
        household_id INTEGER NOT NULL,
        year_month TEXT NOT NULL,
        is_closed INTEGER NOT NULL DEFAULT 0,
        categories_updated INTEGER NOT NULL DEFAULT 0,
        closed_at TEXT,
        PRIMARY KEY(household_id, year_month),
        FOREIGN KEY(household_id) REFERENCES households(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS planned_payments(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        household_id INTEGER NOT NULL,
        description TEXT NOT NULL,
        amount TEXT NOT NULL,
        due_date TEXT NOT NULL,
        category_id INTEGER,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        FOREIGN KEY(household_id) REFERENCES households(id) ON DELETE CASCADE
    );
    CREATE INDEX IF NOT EXISTS idx_planned_due ON planned_payments(household_id, due_date);
    "#,
    )?;
    Ok(())
}
