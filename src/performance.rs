// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Goal vs. actual spend per category for one month.

use std::collections::{BTreeMap, HashMap, HashSet};

use rust_decimal::Decimal;

use crate::error::{BudgetError, Result};
use crate::models::{
    AnnualBudget, Category, MonthlyBudgetAdjustment, PerformanceSnapshot, Transaction, TxType,
};
use crate::period::YearMonth;
use crate::store::BudgetStore;

pub type Performance = BTreeMap<i64, PerformanceSnapshot>;

const MONTHS_PER_YEAR: i64 = 12;

pub fn monthly_base_goal(annual_estimate: Decimal) -> Decimal {
    annual_estimate / Decimal::from(MONTHS_PER_YEAR)
}

/// Pure projection of the month's inputs into one snapshot per category.
///
/// Missing annual estimates count as zero, missing adjustment records as no
/// override and zero rollover. Only negative amounts count as spend in an
/// expense-like category; refunds booked as positive amounts are ignored.
/// Income categories report received (positive) amounts and are never over budget.
pub fn compute_performance(
    year_month: YearMonth,
    categories: &[Category],
    types: &[TxType],
    annual_estimates: &[AnnualBudget],
    adjustments: &[MonthlyBudgetAdjustment],
    transactions: &[Transaction],
) -> Performance {
    let income_types: HashSet<i64> = types
        .iter()
        .filter(|t| t.is_income)
        .map(|t| t.id)
        .collect();

    let estimates: HashMap<i64, Decimal> = annual_estimates
        .iter()
        .filter(|a| a.year == year_month.year())
        .map(|a| (a.category_id, a.annual_estimate))
        .collect();

    let adjustments: HashMap<i64, &MonthlyBudgetAdjustment> = adjustments
        .iter()
        .filter(|a| a.year_month == year_month)
        .map(|a| (a.category_id, a))
        .collect();

    let mut spent_out: HashMap<i64, Decimal> = HashMap::new();
    let mut received: HashMap<i64, Decimal> = HashMap::new();
    for t in transactions.iter().filter(|t| t.year_month == year_month) {
        let Some(cat) = t.category_id else { continue };
        if t.amount < Decimal::ZERO {
            *spent_out.entry(cat).or_default() += -t.amount;
        } else if t.amount > Decimal::ZERO {
            *received.entry(cat).or_default() += t.amount;
        }
    }

    let mut out = Performance::new();
    for category in categories {
        let is_income = income_types.contains(&category.type_id);
        let base = monthly_base_goal(estimates.get(&category.id).copied().unwrap_or_default());
        let adjustment = adjustments.get(&category.id);
        let adjusted_goal = adjustment.and_then(|a| a.adjusted_goal);
        let rollover = adjustment.map(|a| a.rollover).unwrap_or_default();
        let total_available = adjusted_goal.unwrap_or(base) + rollover;
        let real_spent = if is_income {
            received.get(&category.id).copied().unwrap_or_default()
        } else {
            spent_out.get(&category.id).copied().unwrap_or_default()
        };
        let remaining = total_available - real_spent;

        out.insert(
            category.id,
            PerformanceSnapshot {
                category_id: category.id,
                category_name: category.name.clone(),
                type_id: category.type_id,
                is_income,
                monthly_base_goal: base,
                adjusted_goal,
                rollover,
                total_available,
                real_spent,
                remaining,
                is_over_budget: !is_income && real_spent > total_available,
                has_adjustment: adjustment.is_some(),
            },
        );
    }
    out
}

fn unavailable(what: &str) -> impl FnOnce(BudgetError) -> BudgetError + '_ {
    move |e| match e {
        BudgetError::Validation(_) => e,
        other => BudgetError::IncompleteData(format!("{} unavailable: {}", what, other)),
    }
}

/// Reads every input for the month from the store and computes the snapshot.
pub fn load_performance<S: BudgetStore + ?Sized>(
    store: &S,
    household_id: i64,
    year_month: YearMonth,
) -> Result<Performance> {
    let categories = store
        .list_categories(household_id)
        .map_err(unavailable("category registry"))?;
    let types = store
        .list_types(household_id)
        .map_err(unavailable("type registry"))?;
    let annual = store
        .list_annual(household_id, year_month.year())
        .map_err(unavailable("annual budgets"))?;
    let adjustments = store
        .query_adjustments(household_id, year_month)
        .map_err(unavailable("monthly adjustments"))?;
    let transactions = store
        .query_transactions(household_id, None, Some(year_month))
        .map_err(unavailable("transaction ledger"))?;

    let known: HashSet<i64> = categories.iter().map(|c| c.id).collect();
    let orphaned = transactions
        .iter()
        .filter(|t| t.category_id.is_some_and(|c| !known.contains(&c)))
        .count();
    if orphaned > 0 {
        tracing::warn!(
            household_id,
            %year_month,
            orphaned,
            "transactions reference deleted categories and are left out"
        );
    }

    let perf = compute_performance(
        year_month,
        &categories,
        &types,
        &annual,
        &adjustments,
        &transactions,
    );
    tracing::debug!(household_id, %year_month, categories = perf.len(), "performance recomputed");
    Ok(perf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ym() -> YearMonth {
        YearMonth::parse("202501").unwrap()
    }

    fn tx(id: i64, cat: i64, amount: i64) -> Transaction {
        Transaction {
            id,
            household_id: 1,
            category_id: Some(cat),
            type_id: None,
            amount: Decimal::from(amount),
            year_month: ym(),
            date: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            description: String::new(),
            installment_group: None,
            installment_current: 1,
            installment_total: 1,
        }
    }

    fn groceries() -> (Vec<Category>, Vec<TxType>, Vec<AnnualBudget>) {
        let types = vec![TxType {
            id: 1,
            household_id: 1,
            name: "Expense".into(),
            is_income: false,
        }];
        let cats = vec![Category {
            id: 10,
            household_id: 1,
            name: "Groceries".into(),
            type_id: 1,
        }];
        let annual = vec![AnnualBudget {
            household_id: 1,
            category_id: 10,
            year: 2025,
            annual_estimate: Decimal::from(1200),
        }];
        (cats, types, annual)
    }

    #[test]
    fn refunds_do_not_reduce_spend() {
        let (cats, types, annual) = groceries();
        let txs = vec![tx(1, 10, -85), tx(2, 10, 20)];
        let perf = compute_performance(ym(), &cats, &types, &annual, &[], &txs);
        let g = &perf[&10];
        assert_eq!(g.real_spent, Decimal::from(85));
        assert_eq!(g.remaining, Decimal::from(15));
    }

    #[test]
    fn other_months_and_years_ignored() {
        let (cats, types, mut annual) = groceries();
        annual.push(AnnualBudget {
            household_id: 1,
            category_id: 10,
            year: 2024,
            annual_estimate: Decimal::from(2400),
        });
        let mut old = tx(1, 10, -50);
        old.year_month = YearMonth::parse("202412").unwrap();
        let perf = compute_performance(ym(), &cats, &types, &annual, &[], &[old]);
        assert_eq!(perf[&10].monthly_base_goal, Decimal::from(100));
        assert!(perf[&10].real_spent.is_zero());
    }

    #[test]
    fn empty_registry_yields_empty_map() {
        let perf = compute_performance(ym(), &[], &[], &[], &[], &[]);
        assert!(perf.is_empty());
    }
}
