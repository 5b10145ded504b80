// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Keyed collections the budget engine reads from and writes to.
//!
//! Every trait is scoped by household. The engine only ever sees these traits,
//! so any document store with per-key upserts can back it.

pub mod sqlite;

use std::sync::mpsc::Receiver;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::error::Result;
use crate::models::{
    AnnualBudget, Category, MonthlyBudgetAdjustment, PlannedPayment, Transaction, TxType,
};
use crate::period::YearMonth;

pub use sqlite::SqliteStore;

pub trait CategoryStore {
    fn list_categories(&self, household_id: i64) -> Result<Vec<Category>>;
}

pub trait TypeStore {
    fn list_types(&self, household_id: i64) -> Result<Vec<TxType>>;
}

pub trait TransactionStore {
    fn query_transactions(
        &self,
        household_id: i64,
        category_id: Option<i64>,
        year_month: Option<YearMonth>,
    ) -> Result<Vec<Transaction>>;
}

pub trait AnnualBudgetStore {
    fn get_annual(
        &self,
        household_id: i64,
        category_id: i64,
        year: i32,
    ) -> Result<Option<AnnualBudget>>;

    fn list_annual(&self, household_id: i64, year: i32) -> Result<Vec<AnnualBudget>>;
}

/// Monthly adjustment records, at most one per (household, category, month).
///
/// Writers touch only the field they own: `upsert_rollover` never changes a
/// manual goal and `set_adjusted_goal` never changes a rollover.
pub trait AdjustmentStore {
    fn get_adjustment(
        &self,
        household_id: i64,
        category_id: i64,
        year_month: YearMonth,
    ) -> Result<Option<MonthlyBudgetAdjustment>>;

    fn query_adjustments(
        &self,
        household_id: i64,
        year_month: YearMonth,
    ) -> Result<Vec<MonthlyBudgetAdjustment>>;

    /// Create-or-merge the record, overwriting only `rollover`.
    fn upsert_rollover(
        &self,
        household_id: i64,
        category_id: i64,
        year_month: YearMonth,
        rollover: Decimal,
    ) -> Result<()>;

    /// Create-or-merge the record, overwriting only `adjusted_goal`.
    fn set_adjusted_goal(
        &self,
        household_id: i64,
        category_id: i64,
        year_month: YearMonth,
        goal: Option<Decimal>,
    ) -> Result<()>;

    fn delete_adjustment(
        &self,
        household_id: i64,
        category_id: i64,
        year_month: YearMonth,
    ) -> Result<()>;

    fn is_closed(&self, household_id: i64, year_month: YearMonth) -> Result<bool>;

    /// Atomically flips the month to closed. Returns `false` when it was already closed.
    fn mark_closed(
        &self,
        household_id: i64,
        year_month: YearMonth,
        categories_updated: usize,
    ) -> Result<bool>;
}

pub trait PlannedPaymentStore {
    fn list_planned(
        &self,
        household_id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PlannedPayment>>;
}

/// Everything the performance calculator and month close need.
pub trait BudgetStore:
    CategoryStore + TypeStore + TransactionStore + AnnualBudgetStore + AdjustmentStore
{
}

impl<T> BudgetStore for T where
    T: CategoryStore + TypeStore + TransactionStore + AnnualBudgetStore + AdjustmentStore
{
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Households,
    Types,
    Categories,
    Transactions,
    AnnualBudgets,
    MonthlyBudgets,
    PlannedPayments,
}

/// Published after every successful write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreChange {
    pub collection: Collection,
    pub household_id: i64,
    pub year_month: Option<YearMonth>,
    pub year: Option<i32>,
}

impl StoreChange {
    pub fn new(collection: Collection, household_id: i64) -> Self {
        Self {
            collection,
            household_id,
            year_month: None,
            year: None,
        }
    }

    pub fn for_month(mut self, year_month: YearMonth) -> Self {
        self.year = Some(year_month.year());
        self.year_month = Some(year_month);
        self
    }

    pub fn for_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }
}

/// Subscribe-to-changes side of a store.
pub trait ChangeFeed {
    fn subscribe(&self) -> Receiver<StoreChange>;
}
