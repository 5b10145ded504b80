// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{BudgetError, Result};
use crate::period::{YearMonth, add_months};

pub const MAX_INSTALLMENTS: u32 = 120;

#[derive(Debug, Clone, PartialEq)]
pub struct InstallmentRow {
    pub date: NaiveDate,
    pub year_month: YearMonth,
    pub amount: Decimal,
    pub current: u32,
    pub total: u32,
}

/// One ledger row per month starting at `first_date`. Cents that do not divide
/// evenly land on the first installment so the rows always sum to `total`.
pub fn split_installments(
    total: Decimal,
    first_date: NaiveDate,
    count: u32,
) -> Result<Vec<InstallmentRow>> {
    if count == 0 || count > MAX_INSTALLMENTS {
        return Err(BudgetError::validation(format!(
            "Installments must be between 1 and {}, got {}",
            MAX_INSTALLMENTS, count
        )));
    }
    let n = Decimal::from(count);
    let each = (total / n).round_dp_with_strategy(2, RoundingStrategy::ToZero);
    let first = total - each * (n - Decimal::ONE);

    (0..count)
        .map(|i| {
            let date = add_months(first_date, i)?;
            Ok(InstallmentRow {
                date,
                year_month: YearMonth::from_date(date)?,
                amount: if i == 0 { first } else { each },
                current: i + 1,
                total: count,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remainder_goes_to_first_installment() {
        let d = NaiveDate::from_ymd_opt(2025, 11, 15).unwrap();
        let rows = split_installments(Decimal::new(-10000, 2), d, 3).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].amount, Decimal::new(-3334, 2));
        assert_eq!(rows[1].amount, Decimal::new(-3333, 2));
        let sum: Decimal = rows.iter().map(|r| r.amount).sum();
        assert_eq!(sum, Decimal::new(-10000, 2));
        assert_eq!(rows[2].year_month.to_string(), "202601");
        assert_eq!(rows[2].current, 3);
    }

    #[test]
    fn zero_installments_rejected() {
        let d = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        assert!(split_installments(Decimal::ONE, d, 0).is_err());
    }
}
