// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Month close: carries each expense category's remaining balance into the next month.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::{BudgetError, Result};
use crate::performance::{Performance, load_performance};
use crate::period::YearMonth;
use crate::store::{AdjustmentStore, BudgetStore};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CloseOutcome {
    pub closed: YearMonth,
    pub next: YearMonth,
    pub categories_updated: usize,
}

/// Rollover to write for each expense category: its full `remaining`, for every
/// category with a non-zero balance or an existing record this month.
pub fn rollover_plan(performance: &Performance) -> Vec<(i64, Decimal)> {
    performance
        .values()
        .filter(|p| !p.is_income)
        .filter(|p| !p.remaining.is_zero() || p.has_adjustment)
        .map(|p| (p.category_id, p.remaining))
        .collect()
}

/// Closes `year_month` and propagates rollovers into the following month.
///
/// Each rollover write overwrites the next month's value, so re-running after a
/// partial failure converges to the same state. The month is only marked closed
/// once every write has succeeded, and the mark itself is a compare-and-swap.
/// Months close in calendar order: once the following month is closed this one
/// is rejected.
pub fn close_month<S: BudgetStore + ?Sized>(
    store: &S,
    household_id: i64,
    year_month: YearMonth,
) -> Result<CloseOutcome> {
    if store.is_closed(household_id, year_month)? {
        return Err(BudgetError::AlreadyClosed {
            year_month: year_month.to_string(),
        });
    }

    let next = year_month.next()?;
    if store.is_closed(household_id, next)? {
        // Rewriting `next`'s rollover would leave the month after it stale.
        return Err(BudgetError::validation(format!(
            "Month {} is already closed; months must be closed in order",
            next
        )));
    }

    let performance = load_performance(store, household_id, year_month)?;
    let plan = rollover_plan(&performance);

    for (category_id, rollover) in &plan {
        store
            .upsert_rollover(household_id, *category_id, next, *rollover)
            .map_err(|e| {
                tracing::warn!(
                    household_id,
                    category_id,
                    %year_month,
                    error = %e,
                    "rollover write failed; month left open"
                );
                e
            })?;
    }

    if !store.mark_closed(household_id, year_month, plan.len())? {
        // Another closer won the race. Our writes carried identical values.
        return Err(BudgetError::AlreadyClosed {
            year_month: year_month.to_string(),
        });
    }

    tracing::info!(
        household_id,
        %year_month,
        %next,
        categories_updated = plan.len(),
        "month closed"
    );
    Ok(CloseOutcome {
        closed: year_month,
        next,
        categories_updated: plan.len(),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingClose {
    pub year_month: YearMonth,
    /// Whether any adjustment record already exists for the month.
    pub has_data: bool,
}

/// The month before `today` still waiting to be closed, if any.
pub fn closing_status<S: AdjustmentStore + ?Sized>(
    store: &S,
    household_id: i64,
    today: NaiveDate,
) -> Result<Option<PendingClose>> {
    let previous = YearMonth::from_date(today)?.prev()?;
    if store.is_closed(household_id, previous)? {
        return Ok(None);
    }
    let has_data = !store.query_adjustments(household_id, previous)?.is_empty();
    Ok(Some(PendingClose {
        year_month: previous,
        has_data,
    }))
}
