// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Cash view of one month: funds on hand plus booked and planned flows.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::Result;
use crate::models::{PlannedPayment, Transaction};
use crate::period::YearMonth;
use crate::store::{PlannedPaymentStore, TransactionStore};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyBalance {
    pub year_month: YearMonth,
    pub available_funds: Decimal,
    /// Net of every booked transaction in the month (expenses negative).
    pub total_effective: Decimal,
    /// Net of planned payments due in the month.
    pub total_planned: Decimal,
    pub balance: Decimal,
}

/// Amounts are signed, so the balance is funds plus both net flows.
pub fn monthly_balance(
    year_month: YearMonth,
    available_funds: Decimal,
    transactions: &[Transaction],
    planned: &[PlannedPayment],
) -> MonthlyBalance {
    let total_effective: Decimal = transactions
        .iter()
        .filter(|t| t.year_month == year_month)
        .map(|t| t.amount)
        .sum();
    let total_planned: Decimal = planned
        .iter()
        .filter(|p| p.due_date >= year_month.first_day() && p.due_date <= year_month.last_day())
        .map(|p| p.amount)
        .sum();
    MonthlyBalance {
        year_month,
        available_funds,
        total_effective,
        total_planned,
        balance: available_funds + total_effective + total_planned,
    }
}

pub fn load_monthly_balance<S>(
    store: &S,
    household_id: i64,
    year_month: YearMonth,
    available_funds: Decimal,
) -> Result<MonthlyBalance>
where
    S: TransactionStore + PlannedPaymentStore + ?Sized,
{
    let transactions = store.query_transactions(household_id, None, Some(year_month))?;
    let planned = store.list_planned(household_id, year_month.first_day(), year_month.last_day())?;
    let out = monthly_balance(year_month, available_funds, &transactions, &planned);
    tracing::debug!(household_id, %year_month, balance = %out.balance, "monthly balance");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn planned_outside_month_is_ignored() {
        let ym = YearMonth::parse("202503").unwrap();
        let planned = vec![
            PlannedPayment {
                id: 1,
                household_id: 1,
                description: "Rent".into(),
                amount: Decimal::from(-900),
                due_date: NaiveDate::from_ymd_opt(2025, 3, 31).unwrap(),
                category_id: None,
            },
            PlannedPayment {
                id: 2,
                household_id: 1,
                description: "Rent".into(),
                amount: Decimal::from(-900),
                due_date: NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(),
                category_id: None,
            },
        ];
        let b = monthly_balance(ym, Decimal::from(2000), &[], &planned);
        assert_eq!(b.total_planned, Decimal::from(-900));
        assert_eq!(b.balance, Decimal::from(1100));
    }
}
