// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::period::YearMonth;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Household {
    pub id: i64,
    pub name: String,
}

/// Income/expense classification. Anything not flagged income is expense-like.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxType {
    pub id: i64,
    pub household_id: i64,
    pub name: String,
    pub is_income: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub household_id: i64,
    pub name: String,
    pub type_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub household_id: i64,
    pub category_id: Option<i64>,
    pub type_id: Option<i64>,
    pub amount: Decimal, // income positive, expense negative
    pub year_month: YearMonth,
    pub date: NaiveDate,
    pub description: String,
    pub installment_group: Option<i64>,
    pub installment_current: u32,
    pub installment_total: u32,
}

/// Transaction fields supplied by the caller; ids and installment numbering are assigned on insert.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub household_id: i64,
    pub category_id: Option<i64>,
    pub type_id: Option<i64>,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub description: String,
}

/// Replacement fields for a single ledger row. The date stays as booked.
#[derive(Debug, Clone)]
pub struct TransactionEdit {
    pub category_id: Option<i64>,
    pub type_id: Option<i64>,
    pub amount: Decimal,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnualBudget {
    pub household_id: i64,
    pub category_id: i64,
    pub year: i32,
    pub annual_estimate: Decimal,
}

/// Per (category, month) override and carried balance.
///
/// `adjusted_goal` is only written by user goal adjustments, `rollover` and
/// `is_closed` only by month close.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyBudgetAdjustment {
    pub household_id: i64,
    pub category_id: i64,
    pub year_month: YearMonth,
    pub adjusted_goal: Option<Decimal>,
    pub rollover: Decimal,
    pub is_closed: bool,
}

/// Derived goal-vs-actual view of one category for one month. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSnapshot {
    pub category_id: i64,
    pub category_name: String,
    pub type_id: i64,
    pub is_income: bool,
    pub monthly_base_goal: Decimal,
    pub adjusted_goal: Option<Decimal>,
    pub rollover: Decimal,
    pub total_available: Decimal,
    pub real_spent: Decimal,
    pub remaining: Decimal,
    pub is_over_budget: bool,
    pub has_adjustment: bool,
}

impl PerformanceSnapshot {
    /// Goal in effect for the month: the manual override when present, else the base goal.
    pub fn goal(&self) -> Decimal {
        self.adjusted_goal.unwrap_or(self.monthly_base_goal)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannedPayment {
    pub id: i64,
    pub household_id: i64,
    pub description: String,
    pub amount: Decimal,
    pub due_date: NaiveDate,
    pub category_id: Option<i64>,
}
