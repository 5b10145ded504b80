// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::cell::RefCell;
use std::sync::mpsc::{self, Receiver, Sender};

use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, ToSql, params, params_from_iter};
use rust_decimal::Decimal;

use super::{
    AdjustmentStore, AnnualBudgetStore, CategoryStore, ChangeFeed, Collection,
    PlannedPaymentStore, StoreChange, TransactionStore, TypeStore,
};
use crate::error::{BudgetError, Result};
use crate::installments::{InstallmentRow, split_installments};
use crate::models::{
    AnnualBudget, Category, Household, MonthlyBudgetAdjustment, NewTransaction, PlannedPayment,
    Transaction, TransactionEdit, TxType,
};
use crate::period::YearMonth;

/// SQLite-backed implementation of every store trait.
///
/// Decimals are persisted as TEXT so no precision is lost on the way through.
pub struct SqliteStore {
    conn: Connection,
    subscribers: RefCell<Vec<Sender<StoreChange>>>,
}

fn decimal_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    let s: String = row.get(idx)?;
    s.trim()
        .parse::<Decimal>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn opt_decimal_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<Decimal>> {
    let s: Option<String> = row.get(idx)?;
    match s {
        Some(s) => s
            .trim()
            .parse::<Decimal>()
            .map(Some)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))),
        None => Ok(None),
    }
}

fn year_month_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<YearMonth> {
    let s: String = row.get(idx)?;
    YearMonth::parse(&s)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn adjustment_from_row(row: &Row<'_>) -> rusqlite::Result<MonthlyBudgetAdjustment> {
    Ok(MonthlyBudgetAdjustment {
        household_id: row.get(0)?,
        category_id: row.get(1)?,
        year_month: year_month_at(row, 2)?,
        adjusted_goal: opt_decimal_at(row, 3)?,
        rollover: decimal_at(row, 4)?,
        is_closed: row.get::<_, i64>(5)? != 0,
    })
}

fn transaction_from_row(row: &Row<'_>) -> rusqlite::Result<Transaction> {
    Ok(Transaction {
        id: row.get(0)?,
        household_id: row.get(1)?,
        category_id: row.get(2)?,
        type_id: row.get(3)?,
        amount: decimal_at(row, 4)?,
        year_month: year_month_at(row, 5)?,
        date: row.get(6)?,
        description: row.get(7)?,
        installment_group: row.get(8)?,
        installment_current: row.get(9)?,
        installment_total: row.get(10)?,
    })
}

const TRANSACTION_COLUMNS: &str = "id, household_id, category_id, type_id, amount, year_month, date, description,
     installment_group, installment_current, installment_total";

fn planned_from_row(r: &Row<'_>) -> rusqlite::Result<PlannedPayment> {
    Ok(PlannedPayment {
        id: r.get(0)?,
        household_id: r.get(1)?,
        description: r.get(2)?,
        amount: decimal_at(r, 3)?,
        due_date: r.get(4)?,
        category_id: r.get(5)?,
    })
}

/// Inserts installment rows under `group`, or under the first row's id when `group` is `None`.
fn insert_installments(
    conn: &Connection,
    new: &NewTransaction,
    rows: &[InstallmentRow],
    mut group: Option<i64>,
) -> Result<Vec<i64>> {
    let mut ids = Vec::with_capacity(rows.len());
    for row in rows {
        conn.execute(
            "INSERT INTO transactions(household_id, date, year_month, amount, description, category_id, type_id,
                                      installment_group, installment_current, installment_total)
             VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10)",
            params![
                new.household_id,
                row.date,
                row.year_month.to_string(),
                row.amount.to_string(),
                new.description,
                new.category_id,
                new.type_id,
                group,
                row.current,
                row.total
            ],
        )?;
        let id = conn.last_insert_rowid();
        if group.is_none() {
            group = Some(id);
            conn.execute(
                "UPDATE transactions SET installment_group=?1 WHERE id=?1",
                params![id],
            )?;
        }
        ids.push(id);
    }
    Ok(ids)
}

const ADJUSTMENT_COLUMNS: &str =
    "household_id, category_id, year_month, adjusted_goal, rollover, is_closed";

impl SqliteStore {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn,
            subscribers: RefCell::new(Vec::new()),
        }
    }

    pub fn open() -> anyhow::Result<Self> {
        Ok(Self::new(crate::db::open_or_init()?))
    }

    pub fn in_memory() -> anyhow::Result<Self> {
        Ok(Self::new(crate::db::open_in_memory()?))
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    fn publish(&self, change: StoreChange) {
        // Dropped receivers are pruned on the next publish.
        self.subscribers
            .borrow_mut()
            .retain(|tx| tx.send(change.clone()).is_ok());
    }

    fn ensure_category(&self, household_id: i64, category_id: i64) -> Result<()> {
        let owned: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM categories WHERE id=?1 AND household_id=?2",
                params![category_id, household_id],
                |r| r.get(0),
            )
            .optional()?;
        if owned.is_none() {
            return Err(BudgetError::validation(format!(
                "Category {} does not belong to household {}",
                category_id, household_id
            )));
        }
        Ok(())
    }

    pub fn add_household(&self, name: &str) -> Result<i64> {
        self.conn
            .execute("INSERT INTO households(name) VALUES (?1)", params![name])?;
        let id = self.conn.last_insert_rowid();
        self.publish(StoreChange::new(Collection::Households, id));
        Ok(id)
    }

    pub fn list_households(&self) -> Result<Vec<Household>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM households ORDER BY name")?;
        let rows = stmt.query_map([], |r| {
            Ok(Household {
                id: r.get(0)?,
                name: r.get(1)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn add_type(&self, household_id: i64, name: &str, is_income: bool) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO types(household_id, name, is_income) VALUES (?1,?2,?3)",
            params![household_id, name, is_income as i64],
        )?;
        let id = self.conn.last_insert_rowid();
        self.publish(StoreChange::new(Collection::Types, household_id));
        Ok(id)
    }

    pub fn add_category(&self, household_id: i64, name: &str, type_id: i64) -> Result<i64> {
        let owned: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM types WHERE id=?1 AND household_id=?2",
                params![type_id, household_id],
                |r| r.get(0),
            )
            .optional()?;
        if owned.is_none() {
            return Err(BudgetError::validation(format!(
                "Type {} does not belong to household {}",
                type_id, household_id
            )));
        }
        self.conn.execute(
            "INSERT INTO categories(household_id, name, type_id) VALUES (?1,?2,?3)",
            params![household_id, name, type_id],
        )?;
        let id = self.conn.last_insert_rowid();
        self.publish(StoreChange::new(Collection::Categories, household_id));
        Ok(id)
    }

    /// Removes the category and its annual estimates. Transactions and
    /// adjustment rows referencing it are left in place.
    pub fn remove_category(&self, household_id: i64, category_id: i64) -> Result<usize> {
        let n = self.conn.execute(
            "DELETE FROM categories WHERE id=?1 AND household_id=?2",
            params![category_id, household_id],
        )?;
        if n > 0 {
            self.publish(StoreChange::new(Collection::Categories, household_id));
        }
        Ok(n)
    }

    pub fn add_transaction(&self, new: &NewTransaction) -> Result<i64> {
        let ym = YearMonth::from_date(new.date)?;
        self.conn.execute(
            "INSERT INTO transactions(household_id, date, year_month, amount, description, category_id, type_id)
             VALUES (?1,?2,?3,?4,?5,?6,?7)",
            params![
                new.household_id,
                new.date,
                ym.to_string(),
                new.amount.to_string(),
                new.description,
                new.category_id,
                new.type_id
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        self.publish(StoreChange::new(Collection::Transactions, new.household_id).for_month(ym));
        Ok(id)
    }

    /// Splits `new.amount` into `count` monthly rows sharing one installment group.
    pub fn add_installments(&self, new: &NewTransaction, count: u32) -> Result<Vec<i64>> {
        let rows = split_installments(new.amount, new.date, count)?;
        let tx = self.conn.unchecked_transaction()?;
        let ids = insert_installments(&tx, new, &rows, None)?;
        tx.commit()?;
        self.publish_months(new.household_id, rows.iter().map(|r| r.year_month));
        Ok(ids)
    }

    fn publish_months(&self, household_id: i64, months: impl IntoIterator<Item = YearMonth>) {
        let mut months: Vec<YearMonth> = months.into_iter().collect();
        months.sort();
        months.dedup();
        for ym in months {
            self.publish(StoreChange::new(Collection::Transactions, household_id).for_month(ym));
        }
    }

    pub fn get_transaction(&self, household_id: i64, id: i64) -> Result<Option<Transaction>> {
        let sql = format!(
            "SELECT {} FROM transactions WHERE household_id=?1 AND id=?2",
            TRANSACTION_COLUMNS
        );
        Ok(self
            .conn
            .query_row(&sql, params![household_id, id], transaction_from_row)
            .optional()?)
    }

    /// Rows of an installment group in installment order.
    pub fn list_installment_group(&self, household_id: i64, group: i64) -> Result<Vec<Transaction>> {
        let sql = format!(
            "SELECT {} FROM transactions WHERE household_id=?1 AND installment_group=?2
             ORDER BY installment_current, id",
            TRANSACTION_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![household_id, group], transaction_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn group_months(&self, household_id: i64, group: i64) -> Result<Vec<YearMonth>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT year_month FROM transactions WHERE household_id=?1 AND installment_group=?2",
        )?;
        let rows = stmt.query_map(params![household_id, group], |r| year_month_at(r, 0))?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Deletes one ledger row, leaving the rest of its installment group alone.
    pub fn delete_transaction(&self, household_id: i64, id: i64) -> Result<usize> {
        let Some(existing) = self.get_transaction(household_id, id)? else {
            return Ok(0);
        };
        let n = self.conn.execute(
            "DELETE FROM transactions WHERE household_id=?1 AND id=?2",
            params![household_id, id],
        )?;
        self.publish_months(household_id, [existing.year_month]);
        Ok(n)
    }

    pub fn delete_installment_group(&self, household_id: i64, group: i64) -> Result<usize> {
        let months = self.group_months(household_id, group)?;
        let n = self.conn.execute(
            "DELETE FROM transactions WHERE household_id=?1 AND installment_group=?2",
            params![household_id, group],
        )?;
        self.publish_months(household_id, months);
        Ok(n)
    }

    /// Edits one row in place. The date and installment numbering are kept.
    pub fn update_transaction(
        &self,
        household_id: i64,
        id: i64,
        edit: &TransactionEdit,
    ) -> Result<()> {
        if let Some(cat) = edit.category_id {
            self.ensure_category(household_id, cat)?;
        }
        let Some(existing) = self.get_transaction(household_id, id)? else {
            return Err(BudgetError::validation(format!(
                "Transaction {} not found",
                id
            )));
        };
        self.conn.execute(
            "UPDATE transactions SET amount=?1, description=?2, category_id=?3, type_id=?4
             WHERE household_id=?5 AND id=?6",
            params![
                edit.amount.to_string(),
                edit.description,
                edit.category_id,
                edit.type_id,
                household_id,
                id
            ],
        )?;
        self.publish_months(household_id, [existing.year_month]);
        Ok(())
    }

    /// Replaces every row of an installment group with a fresh split of `new`,
    /// keeping the group id. Old and new months are both published.
    pub fn update_installment_group(
        &self,
        household_id: i64,
        group: i64,
        new: &NewTransaction,
        count: u32,
    ) -> Result<Vec<i64>> {
        if new.household_id != household_id {
            return Err(BudgetError::validation(
                "installment group edit must stay within its household",
            ));
        }
        if let Some(cat) = new.category_id {
            self.ensure_category(household_id, cat)?;
        }
        let old_months = self.group_months(household_id, group)?;
        if old_months.is_empty() {
            return Err(BudgetError::validation(format!(
                "Installment group {} not found",
                group
            )));
        }
        let rows = split_installments(new.amount, new.date, count)?;
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "DELETE FROM transactions WHERE household_id=?1 AND installment_group=?2",
            params![household_id, group],
        )?;
        let ids = insert_installments(&tx, new, &rows, Some(group))?;
        tx.commit()?;
        self.publish_months(
            household_id,
            old_months.into_iter().chain(rows.iter().map(|r| r.year_month)),
        );
        Ok(ids)
    }

    pub fn set_annual(
        &self,
        household_id: i64,
        category_id: i64,
        year: i32,
        annual_estimate: Decimal,
    ) -> Result<()> {
        if annual_estimate < Decimal::ZERO {
            return Err(BudgetError::validation(format!(
                "Annual estimate must be non-negative, got {}",
                annual_estimate
            )));
        }
        self.ensure_category(household_id, category_id)?;
        self.conn.execute(
            "INSERT INTO annual_budgets(household_id, category_id, year, annual_estimate) VALUES (?1,?2,?3,?4)
             ON CONFLICT(household_id, category_id, year) DO UPDATE SET annual_estimate=excluded.annual_estimate",
            params![household_id, category_id, year, annual_estimate.to_string()],
        )?;
        self.publish(StoreChange::new(Collection::AnnualBudgets, household_id).for_year(year));
        Ok(())
    }

    pub fn add_planned(
        &self,
        household_id: i64,
        description: &str,
        amount: Decimal,
        due_date: NaiveDate,
        category_id: Option<i64>,
    ) -> Result<i64> {
        if let Some(cat) = category_id {
            self.ensure_category(household_id, cat)?;
        }
        self.conn.execute(
            "INSERT INTO planned_payments(household_id, description, amount, due_date, category_id)
             VALUES (?1,?2,?3,?4,?5)",
            params![
                household_id,
                description,
                amount.to_string(),
                due_date,
                category_id
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        self.publish(StoreChange::new(Collection::PlannedPayments, household_id));
        Ok(id)
    }

    pub fn delete_planned(&self, household_id: i64, id: i64) -> Result<usize> {
        let n = self.conn.execute(
            "DELETE FROM planned_payments WHERE household_id=?1 AND id=?2",
            params![household_id, id],
        )?;
        if n > 0 {
            self.publish(StoreChange::new(Collection::PlannedPayments, household_id));
        }
        Ok(n)
    }

    /// Books a planned payment as a paid transaction on its due date and drops
    /// the plan, in one SQLite transaction. Returns the new transaction id.
    pub fn pay_planned(&self, household_id: i64, id: i64) -> Result<i64> {
        let planned = self
            .conn
            .query_row(
                "SELECT id, household_id, description, amount, due_date, category_id
                 FROM planned_payments WHERE household_id=?1 AND id=?2",
                params![household_id, id],
                planned_from_row,
            )
            .optional()?
            .ok_or_else(|| BudgetError::validation(format!("Planned payment {} not found", id)))?;
        let type_id: Option<i64> = match planned.category_id {
            Some(cat) => self
                .conn
                .query_row(
                    "SELECT type_id FROM categories WHERE id=?1 AND household_id=?2",
                    params![cat, household_id],
                    |r| r.get(0),
                )
                .optional()?,
            None => None,
        };
        let ym = YearMonth::from_date(planned.due_date)?;

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO transactions(household_id, date, year_month, amount, description, category_id, type_id)
             VALUES (?1,?2,?3,?4,?5,?6,?7)",
            params![
                household_id,
                planned.due_date,
                ym.to_string(),
                planned.amount.to_string(),
                planned.description,
                planned.category_id,
                type_id
            ],
        )?;
        let tx_id = tx.last_insert_rowid();
        tx.execute(
            "DELETE FROM planned_payments WHERE household_id=?1 AND id=?2",
            params![household_id, id],
        )?;
        tx.commit()?;

        self.publish_months(household_id, [ym]);
        self.publish(StoreChange::new(Collection::PlannedPayments, household_id));
        tracing::info!(household_id, planned_id = id, transaction_id = tx_id, "planned payment paid");
        Ok(tx_id)
    }
}

impl CategoryStore for SqliteStore {
    fn list_categories(&self, household_id: i64) -> Result<Vec<Category>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT id, household_id, name, type_id FROM categories WHERE household_id=?1 ORDER BY name",
        )?;
        let rows = stmt.query_map(params![household_id], |r| {
            Ok(Category {
                id: r.get(0)?,
                household_id: r.get(1)?,
                name: r.get(2)?,
                type_id: r.get(3)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

impl TypeStore for SqliteStore {
    fn list_types(&self, household_id: i64) -> Result<Vec<TxType>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT id, household_id, name, is_income FROM types WHERE household_id=?1 ORDER BY name",
        )?;
        let rows = stmt.query_map(params![household_id], |r| {
            Ok(TxType {
                id: r.get(0)?,
                household_id: r.get(1)?,
                name: r.get(2)?,
                is_income: r.get::<_, i64>(3)? != 0,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

impl TransactionStore for SqliteStore {
    fn query_transactions(
        &self,
        household_id: i64,
        category_id: Option<i64>,
        year_month: Option<YearMonth>,
    ) -> Result<Vec<Transaction>> {
        let mut sql = format!(
            "SELECT {} FROM transactions WHERE household_id=?",
            TRANSACTION_COLUMNS
        );
        let mut args: Vec<Box<dyn ToSql>> = vec![Box::new(household_id)];
        if let Some(cat) = category_id {
            sql.push_str(" AND category_id=?");
            args.push(Box::new(cat));
        }
        if let Some(ym) = year_month {
            sql.push_str(" AND year_month=?");
            args.push(Box::new(ym.to_string()));
        }
        sql.push_str(" ORDER BY date, id");

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(args.iter()), transaction_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

impl AnnualBudgetStore for SqliteStore {
    fn get_annual(
        &self,
        household_id: i64,
        category_id: i64,
        year: i32,
    ) -> Result<Option<AnnualBudget>> {
        let row = self
            .conn
            .query_row(
                "SELECT household_id, category_id, year, annual_estimate FROM annual_budgets
                 WHERE household_id=?1 AND category_id=?2 AND year=?3",
                params![household_id, category_id, year],
                |r| {
                    Ok(AnnualBudget {
                        household_id: r.get(0)?,
                        category_id: r.get(1)?,
                        year: r.get(2)?,
                        annual_estimate: decimal_at(r, 3)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    fn list_annual(&self, household_id: i64, year: i32) -> Result<Vec<AnnualBudget>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT household_id, category_id, year, annual_estimate FROM annual_budgets
             WHERE household_id=?1 AND year=?2 ORDER BY category_id",
        )?;
        let rows = stmt.query_map(params![household_id, year], |r| {
            Ok(AnnualBudget {
                household_id: r.get(0)?,
                category_id: r.get(1)?,
                year: r.get(2)?,
                annual_estimate: decimal_at(r, 3)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

impl AdjustmentStore for SqliteStore {
    fn get_adjustment(
        &self,
        household_id: i64,
        category_id: i64,
        year_month: YearMonth,
    ) -> Result<Option<MonthlyBudgetAdjustment>> {
        let sql = format!(
            "SELECT {} FROM monthly_budgets WHERE household_id=?1 AND category_id=?2 AND year_month=?3",
            ADJUSTMENT_COLUMNS
        );
        let row = self
            .conn
            .query_row(
                &sql,
                params![household_id, category_id, year_month.to_string()],
                adjustment_from_row,
            )
            .optional()?;
        Ok(row)
    }

    fn query_adjustments(
        &self,
        household_id: i64,
        year_month: YearMonth,
    ) -> Result<Vec<MonthlyBudgetAdjustment>> {
        let sql = format!(
            "SELECT {} FROM monthly_budgets WHERE household_id=?1 AND year_month=?2 ORDER BY category_id",
            ADJUSTMENT_COLUMNS
        );
        let mut stmt = self.conn.prepare_cached(&sql)?;
        let rows = stmt.query_map(
            params![household_id, year_month.to_string()],
            adjustment_from_row,
        )?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn upsert_rollover(
        &self,
        household_id: i64,
        category_id: i64,
        year_month: YearMonth,
        rollover: Decimal,
    ) -> Result<()> {
        self.conn.execute(
            "INSERT INTO monthly_budgets(household_id, category_id, year_month, rollover, is_closed)
             VALUES (?1,?2,?3,?4,
                     (SELECT COALESCE(MAX(is_closed),0) FROM month_closings WHERE household_id=?1 AND year_month=?3))
             ON CONFLICT(household_id, category_id, year_month) DO UPDATE SET rollover=excluded.rollover",
            params![
                household_id,
                category_id,
                year_month.to_string(),
                rollover.to_string()
            ],
        )?;
        self.publish(
            StoreChange::new(Collection::MonthlyBudgets, household_id).for_month(year_month),
        );
        Ok(())
    }

    fn set_adjusted_goal(
        &self,
        household_id: i64,
        category_id: i64,
        year_month: YearMonth,
        goal: Option<Decimal>,
    ) -> Result<()> {
        self.conn.execute(
            "INSERT INTO monthly_budgets(household_id, category_id, year_month, adjusted_goal, is_closed)
             VALUES (?1,?2,?3,?4,
                     (SELECT COALESCE(MAX(is_closed),0) FROM month_closings WHERE household_id=?1 AND year_month=?3))
             ON CONFLICT(household_id, category_id, year_month) DO UPDATE SET adjusted_goal=excluded.adjusted_goal",
            params![
                household_id,
                category_id,
                year_month.to_string(),
                goal.map(|g| g.to_string())
            ],
        )?;
        self.publish(
            StoreChange::new(Collection::MonthlyBudgets, household_id).for_month(year_month),
        );
        Ok(())
    }

    fn delete_adjustment(
        &self,
        household_id: i64,
        category_id: i64,
        year_month: YearMonth,
    ) -> Result<()> {
        self.conn.execute(
            "DELETE FROM monthly_budgets WHERE household_id=?1 AND category_id=?2 AND year_month=?3",
            params![household_id, category_id, year_month.to_string()],
        )?;
        self.publish(
            StoreChange::new(Collection::MonthlyBudgets, household_id).for_month(year_month),
        );
        Ok(())
    }

    fn is_closed(&self, household_id: i64, year_month: YearMonth) -> Result<bool> {
        let v: Option<i64> = self
            .conn
            .query_row(
                "SELECT is_closed FROM month_closings WHERE household_id=?1 AND year_month=?2",
                params![household_id, year_month.to_string()],
                |r| r.get(0),
            )
            .optional()?;
        Ok(v.unwrap_or(0) != 0)
    }

    fn mark_closed(
        &self,
        household_id: i64,
        year_month: YearMonth,
        categories_updated: usize,
    ) -> Result<bool> {
        let ym = year_month.to_string();
        let tx = self.conn.unchecked_transaction()?;
        // The WHERE on the update arm makes this a compare-and-swap on is_closed.
        let flipped = tx.execute(
            "INSERT INTO month_closings(household_id, year_month, is_closed, categories_updated, closed_at)
             VALUES (?1,?2,1,?3,datetime('now'))
             ON CONFLICT(household_id, year_month) DO UPDATE
                SET is_closed=1, categories_updated=excluded.categories_updated, closed_at=excluded.closed_at
                WHERE month_closings.is_closed=0",
            params![household_id, ym, categories_updated as i64],
        )?;
        if flipped == 0 {
            return Ok(false);
        }
        tx.execute(
            "UPDATE monthly_budgets SET is_closed=1 WHERE household_id=?1 AND year_month=?2",
            params![household_id, ym],
        )?;
        tx.commit()?;
        self.publish(
            StoreChange::new(Collection::MonthlyBudgets, household_id).for_month(year_month),
        );
        Ok(true)
    }
}

impl PlannedPaymentStore for SqliteStore {
    fn list_planned(
        &self,
        household_id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PlannedPayment>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT id, household_id, description, amount, due_date, category_id FROM planned_payments
             WHERE household_id=?1 AND due_date>=?2 AND due_date<=?3 ORDER BY due_date, id",
        )?;
        let rows = stmt.query_map(params![household_id, from, to], planned_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

impl ChangeFeed for SqliteStore {
    fn subscribe(&self) -> Receiver<StoreChange> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.borrow_mut().push(tx);
        rx
    }
}
