// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::{NewTransaction, Transaction, TransactionEdit};
use crate::store::{CategoryStore, SqliteStore, TransactionStore};
use crate::utils::{
    fmt_money, id_for_category, maybe_print_json, parse_date, parse_decimal, parse_year_month,
    pretty_table, resolve_household, type_for_category,
};
use anyhow::{Result, anyhow, bail};
use serde::Serialize;
use std::collections::HashMap;

pub fn handle(store: &SqliteStore, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(store, sub)?,
        Some(("list", sub)) => list(store, sub)?,
        Some(("rm", sub)) => remove(store, sub)?,
        Some(("edit", sub)) => edit(store, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(store: &SqliteStore, sub: &clap::ArgMatches) -> Result<()> {
    let household_id = resolve_household(store.conn(), sub)?;
    let date = parse_date(sub.get_one::<String>("date").unwrap())?;
    let category = sub.get_one::<String>("category").unwrap().trim();
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
    let description = sub
        .get_one::<String>("description")
        .map(|s| s.trim().to_string())
        .unwrap_or_default();
    let installments = sub.get_one::<u32>("installments").copied().unwrap_or(1);

    let category_id = id_for_category(store.conn(), household_id, category)?;
    let type_id = type_for_category(store.conn(), category_id)?;
    let new = NewTransaction {
        household_id,
        category_id: Some(category_id),
        type_id: Some(type_id),
        amount,
        date,
        description,
    };

    if installments > 1 {
        let ids = store.add_installments(&new, installments)?;
        println!(
            "Recorded {} in {} installments starting {} ({})",
            amount,
            ids.len(),
            date,
            category
        );
    } else {
        store.add_transaction(&new)?;
        println!("Recorded {} on {} ({})", amount, date, category);
    }
    Ok(())
}

fn existing(store: &SqliteStore, household_id: i64, id: i64) -> Result<Transaction> {
    store
        .get_transaction(household_id, id)?
        .ok_or_else(|| anyhow!("Transaction {} not found", id))
}

fn remove(store: &SqliteStore, sub: &clap::ArgMatches) -> Result<()> {
    let household_id = resolve_household(store.conn(), sub)?;
    let id = *sub.get_one::<i64>("id").unwrap();
    let tx = existing(store, household_id, id)?;
    match tx.installment_group.filter(|_| sub.get_flag("group")) {
        Some(group) => {
            let n = store.delete_installment_group(household_id, group)?;
            println!("Deleted {} installments of '{}'", n, tx.description);
        }
        None => {
            store.delete_transaction(household_id, id)?;
            println!("Deleted transaction {} ({} on {})", id, tx.amount, tx.date);
        }
    }
    Ok(())
}

fn edit(store: &SqliteStore, sub: &clap::ArgMatches) -> Result<()> {
    let household_id = resolve_household(store.conn(), sub)?;
    let id = *sub.get_one::<i64>("id").unwrap();
    let tx = existing(store, household_id, id)?;

    let (category_id, type_id) = match sub.get_one::<String>("category") {
        Some(name) => {
            let cat = id_for_category(store.conn(), household_id, name)?;
            (Some(cat), Some(type_for_category(store.conn(), cat)?))
        }
        None => (tx.category_id, tx.type_id),
    };
    let amount = match sub.get_one::<String>("amount") {
        Some(s) => Some(parse_decimal(s)?),
        None => None,
    };
    let description = sub
        .get_one::<String>("description")
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| tx.description.clone());

    if sub.get_flag("group") {
        let Some(group) = tx.installment_group else {
            bail!("Transaction {} is not part of an installment group", id);
        };
        let rows = store.list_installment_group(household_id, group)?;
        let Some(first) = rows.first() else {
            bail!("Installment group {} is empty", group);
        };
        let total = amount.unwrap_or_else(|| rows.iter().map(|r| r.amount).sum());
        let count = sub
            .get_one::<u32>("installments")
            .copied()
            .unwrap_or(first.installment_total);
        let new = NewTransaction {
            household_id,
            category_id,
            type_id,
            amount: total,
            date: first.date,
            description,
        };
        let ids = store.update_installment_group(household_id, group, &new, count)?;
        println!("Rebuilt installment group as {} rows totalling {}", ids.len(), total);
    } else {
        let edit = TransactionEdit {
            category_id,
            type_id,
            amount: amount.unwrap_or(tx.amount),
            description,
        };
        store.update_transaction(household_id, id, &edit)?;
        println!("Updated transaction {}", id);
    }
    Ok(())
}

fn list(store: &SqliteStore, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let data = query_rows(store, sub)?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| {
                vec![
                    r.id.to_string(),
                    r.date.clone(),
                    r.year_month.clone(),
                    r.category.clone(),
                    r.description.clone(),
                    r.amount.clone(),
                    r.installment.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["ID", "Date", "Month", "Category", "Description", "Amount", "Inst."],
                rows,
            )
        );
    }
    Ok(())
}

#[derive(Serialize)]
pub struct TransactionRow {
    pub id: i64,
    pub date: String,
    pub year_month: String,
    pub category: String,
    pub description: String,
    pub amount: String,
    pub installment: String,
}

/// Newest first, optionally filtered by month and category and capped by `--limit`.
pub fn query_rows(store: &SqliteStore, sub: &clap::ArgMatches) -> Result<Vec<TransactionRow>> {
    let household_id = resolve_household(store.conn(), sub)?;
    let year_month = match sub.get_one::<String>("month") {
        Some(s) => Some(parse_year_month(s)?),
        None => None,
    };
    let category_id = match sub.get_one::<String>("category") {
        Some(name) => Some(id_for_category(store.conn(), household_id, name)?),
        None => None,
    };
    let names: HashMap<i64, String> = store
        .list_categories(household_id)?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect();

    let mut txs = store.query_transactions(household_id, category_id, year_month)?;
    txs.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
    if let Some(limit) = sub.get_one::<usize>("limit") {
        txs.truncate(*limit);
    }

    Ok(txs
        .into_iter()
        .map(|t| TransactionRow {
            id: t.id,
            date: t.date.to_string(),
            year_month: t.year_month.to_string(),
            category: t
                .category_id
                .and_then(|c| names.get(&c).cloned())
                .unwrap_or_default(),
            description: t.description,
            amount: fmt_money(&t.amount),
            installment: if t.installment_total > 1 {
                format!("{}/{}", t.installment_current, t.installment_total)
            } else {
                String::new()
            },
        })
        .collect())
}
