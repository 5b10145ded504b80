// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::{BudgetError, Result};
use crate::performance::monthly_base_goal;
use crate::period::YearMonth;
use crate::store::{AdjustmentStore, AnnualBudgetStore, CategoryStore};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum GoalChange {
    /// Matches the base goal and no record exists.
    Unchanged,
    /// Override dropped, record kept for its rollover or closed flag.
    Cleared,
    /// Override dropped together with the now-empty record.
    Removed,
    Set(Decimal),
}

/// Goals closer than half a cent are the same goal.
pub fn goals_match(a: Decimal, b: Decimal) -> bool {
    (a - b).abs() < Decimal::new(5, 3)
}

/// Stores a manual monthly goal for a category, or drops the override when the
/// requested amount is the annual base goal. Never touches `rollover`.
pub fn save_goal_adjustment<S>(
    store: &S,
    household_id: i64,
    category_id: i64,
    year_month: YearMonth,
    amount: Decimal,
) -> Result<GoalChange>
where
    S: CategoryStore + AnnualBudgetStore + AdjustmentStore + ?Sized,
{
    if amount < Decimal::ZERO {
        return Err(BudgetError::validation(format!(
            "Monthly goal must be non-negative, got {}",
            amount
        )));
    }

    if !store
        .list_categories(household_id)?
        .iter()
        .any(|c| c.id == category_id)
    {
        return Err(BudgetError::validation(format!(
            "Category {} does not belong to household {}",
            category_id, household_id
        )));
    }

    let base = store
        .get_annual(household_id, category_id, year_month.year())?
        .map(|a| monthly_base_goal(a.annual_estimate))
        .unwrap_or_default();
    let existing = store.get_adjustment(household_id, category_id, year_month)?;

    let change = match existing {
        None if goals_match(amount, base) => GoalChange::Unchanged,
        Some(rec) if goals_match(amount, base) => {
            if rec.rollover.is_zero() && !rec.is_closed {
                store.delete_adjustment(household_id, category_id, year_month)?;
                GoalChange::Removed
            } else {
                store.set_adjusted_goal(household_id, category_id, year_month, None)?;
                GoalChange::Cleared
            }
        }
        _ => {
            store.set_adjusted_goal(household_id, category_id, year_month, Some(amount))?;
            GoalChange::Set(amount)
        }
    };

    tracing::info!(household_id, category_id, %year_month, ?change, "goal adjustment saved");
    Ok(change)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tolerance_is_half_a_cent() {
        let base = Decimal::from(1000) / Decimal::from(12);
        assert!(goals_match(Decimal::new(8333, 2), base));
        assert!(!goals_match(Decimal::new(8332, 2), base));
    }
}
