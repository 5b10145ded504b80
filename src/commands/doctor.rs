// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::utils::pretty_table;
use anyhow::Result;
use rusqlite::{Connection, params};

/// Rows that point at categories which no longer exist.
pub fn find_issues(conn: &Connection, household_id: i64) -> Result<Vec<Vec<String>>> {
    let mut rows = Vec::new();

    let mut stmt = conn.prepare(
        "SELECT t.id, t.date, t.amount FROM transactions t
         WHERE t.household_id=?1 AND t.category_id IS NOT NULL
           AND NOT EXISTS (SELECT 1 FROM categories c WHERE c.id=t.category_id)
         ORDER BY t.date",
    )?;
    let mut cur = stmt.query(params![household_id])?;
    while let Some(r) = cur.next()? {
        let id: i64 = r.get(0)?;
        let date: String = r.get(1)?;
        let amount: String = r.get(2)?;
        rows.push(vec![
            "orphaned_transaction".into(),
            format!("#{} {} {}", id, date, amount),
        ]);
    }

    let mut stmt2 = conn.prepare(
        "SELECT m.year_month, m.category_id, m.rollover FROM monthly_budgets m
         WHERE m.household_id=?1
           AND NOT EXISTS (SELECT 1 FROM categories c WHERE c.id=m.category_id)
         ORDER BY m.year_month",
    )?;
    let mut cur2 = stmt2.query(params![household_id])?;
    while let Some(r) = cur2.next()? {
        let ym: String = r.get(0)?;
        let cat: i64 = r.get(1)?;
        let rollover: String = r.get(2)?;
        rows.push(vec![
            "orphaned_adjustment".into(),
            format!("{} category #{} rollover {}", ym, cat, rollover),
        ]);
    }

    Ok(rows)
}

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    let household_id = crate::utils::resolve_household(conn, m)?;
    let rows = find_issues(conn, household_id)?;
    if rows.is_empty() {
        println!("doctor: no issues found");
    } else {
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}
