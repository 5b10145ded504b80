// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Reminders for planned payments coming due.

use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::alerts::{Severity, fmt_amount};
use crate::error::Result;
use crate::models::PlannedPayment;
use crate::notify::{BILL_DUE_TAG, Notification};
use crate::store::PlannedPaymentStore;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DueAlert {
    pub payment_id: i64,
    pub description: String,
    pub amount: Decimal,
    pub due_date: NaiveDate,
    pub severity: Severity,
    pub message: String,
}

impl std::fmt::Display for DueAlert {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.severity, self.message)
    }
}

/// Payments due today (CRITICAL) or tomorrow (WARNING), in that order.
pub fn due_alerts(payments: &[PlannedPayment], today: NaiveDate, symbol: &str) -> Vec<DueAlert> {
    let tomorrow = today.checked_add_days(Days::new(1));
    let mut out: Vec<DueAlert> = payments
        .iter()
        .filter_map(|p| {
            let (severity, when) = if p.due_date == today {
                (Severity::Critical, "is due TODAY")
            } else if Some(p.due_date) == tomorrow {
                (Severity::Warning, "is due tomorrow")
            } else {
                return None;
            };
            Some(DueAlert {
                payment_id: p.id,
                description: p.description.clone(),
                amount: p.amount,
                due_date: p.due_date,
                severity,
                message: format!(
                    "{} ({}) {}.",
                    p.description,
                    fmt_amount(symbol, p.amount.abs()),
                    when
                ),
            })
        })
        .collect();
    out.sort_by(|a, b| {
        b.severity
            .cmp(&a.severity)
            .then_with(|| a.description.cmp(&b.description))
    });
    out
}

pub fn load_due_alerts<S: PlannedPaymentStore + ?Sized>(
    store: &S,
    household_id: i64,
    today: NaiveDate,
    symbol: &str,
) -> Result<Vec<DueAlert>> {
    let until = today.checked_add_days(Days::new(1)).unwrap_or(today);
    let payments = store.list_planned(household_id, today, until)?;
    Ok(due_alerts(&payments, today, symbol))
}

pub fn due_notification(alerts: &[DueAlert]) -> Option<Notification> {
    Notification::from_lines("Bills due", BILL_DUE_TAG, alerts)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payment(id: i64, desc: &str, due: NaiveDate) -> PlannedPayment {
        PlannedPayment {
            id,
            household_id: 1,
            description: desc.into(),
            amount: Decimal::new(12050, 2),
            due_date: due,
            category_id: None,
        }
    }

    #[test]
    fn today_and_tomorrow_only() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 31).unwrap();
        let list = vec![
            payment(1, "Water", NaiveDate::from_ymd_opt(2025, 4, 1).unwrap()),
            payment(2, "Power", today),
            payment(3, "Rent", NaiveDate::from_ymd_opt(2025, 4, 2).unwrap()),
        ];
        let alerts = due_alerts(&list, today, "$");
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].payment_id, 2);
        assert_eq!(alerts[0].message, "Power ($120.50) is due TODAY.");
        assert_eq!(alerts[1].severity, Severity::Warning);
    }
}
