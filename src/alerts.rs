// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::HashMap;
use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::PerformanceSnapshot;
use crate::notify::{BUDGET_ALERT_TAG, Notification};
use crate::performance::Performance;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Critical => "CRITICAL",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertLine {
    pub category_id: i64,
    pub category_name: String,
    pub severity: Severity,
    pub message: String,
}

impl fmt::Display for AlertLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.severity, self.message)
    }
}

#[derive(Debug, Clone)]
pub struct AlertOptions {
    /// WARNING when remaining / available drops below this.
    pub warning_ratio: Decimal,
    /// INFO when spent / available reaches this.
    pub info_ratio: Decimal,
    pub currency_symbol: String,
}

impl Default for AlertOptions {
    fn default() -> Self {
        Self {
            warning_ratio: Decimal::new(2, 1),
            info_ratio: Decimal::new(5, 1),
            currency_symbol: "$".into(),
        }
    }
}

pub fn fmt_amount(symbol: &str, d: Decimal) -> String {
    format!("{}{:.2}", symbol, d.round_dp(2))
}

fn percent(ratio: Decimal) -> Decimal {
    (ratio * Decimal::ONE_HUNDRED).round_dp(0)
}

/// Severity tier for one category, or `None` when it needs no alert.
pub fn classify(p: &PerformanceSnapshot, opts: &AlertOptions) -> Option<Severity> {
    if p.is_income || p.total_available <= Decimal::ZERO {
        return None;
    }
    if p.is_over_budget {
        Some(Severity::Critical)
    } else if p.remaining / p.total_available < opts.warning_ratio {
        Some(Severity::Warning)
    } else if p.real_spent / p.total_available >= opts.info_ratio {
        Some(Severity::Info)
    } else {
        None
    }
}

pub fn evaluate_alerts(
    snapshot: &Performance,
    category_names: &HashMap<i64, String>,
) -> Vec<AlertLine> {
    evaluate_alerts_with(snapshot, category_names, &AlertOptions::default())
}

/// Alert lines ordered CRITICAL, WARNING, INFO and by category name within a tier.
pub fn evaluate_alerts_with(
    snapshot: &Performance,
    category_names: &HashMap<i64, String>,
    opts: &AlertOptions,
) -> Vec<AlertLine> {
    let sym = opts.currency_symbol.as_str();
    let mut lines: Vec<AlertLine> = snapshot
        .values()
        .filter_map(|p| {
            let severity = classify(p, opts)?;
            let name = category_names
                .get(&p.category_id)
                .cloned()
                .unwrap_or_else(|| p.category_name.clone());
            let total = fmt_amount(sym, p.total_available);
            let message = match severity {
                Severity::Critical => format!(
                    "{}: {} limit exceeded by {}.",
                    name,
                    total,
                    fmt_amount(sym, -p.remaining)
                ),
                Severity::Warning => format!(
                    "{}: only {} left ({}% of {}).",
                    name,
                    fmt_amount(sym, p.remaining),
                    percent(p.remaining / p.total_available),
                    total
                ),
                Severity::Info => format!(
                    "{}: spent {}, {}% of the {} limit.",
                    name,
                    fmt_amount(sym, p.real_spent),
                    percent(p.real_spent / p.total_available),
                    total
                ),
            };
            Some(AlertLine {
                category_id: p.category_id,
                category_name: name,
                severity,
                message,
            })
        })
        .collect();

    lines.sort_by(|a, b| {
        b.severity
            .cmp(&a.severity)
            .then_with(|| a.category_name.cmp(&b.category_name))
            .then_with(|| a.category_id.cmp(&b.category_id))
    });
    lines
}

pub fn budget_notification(lines: &[AlertLine]) -> Option<Notification> {
    Notification::from_lines("Budget alert", BUDGET_ALERT_TAG, lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(id: i64, name: &str, total: i64, spent: i64) -> PerformanceSnapshot {
        let total = Decimal::from(total);
        let spent = Decimal::from(spent);
        PerformanceSnapshot {
            category_id: id,
            category_name: name.into(),
            type_id: 1,
            is_income: false,
            monthly_base_goal: total,
            adjusted_goal: None,
            rollover: Decimal::ZERO,
            total_available: total,
            real_spent: spent,
            remaining: total - spent,
            is_over_budget: spent > total,
            has_adjustment: false,
        }
    }

    fn perf(items: Vec<PerformanceSnapshot>) -> Performance {
        items.into_iter().map(|p| (p.category_id, p)).collect()
    }

    #[test]
    fn exact_spend_is_warning_not_critical() {
        let p = snap(1, "Fuel", 100, 100);
        assert!(!p.is_over_budget);
        assert_eq!(classify(&p, &AlertOptions::default()), Some(Severity::Warning));
    }

    #[test]
    fn tiers() {
        let opts = AlertOptions::default();
        assert_eq!(classify(&snap(1, "a", 100, 101), &opts), Some(Severity::Critical));
        assert_eq!(classify(&snap(1, "a", 100, 85), &opts), Some(Severity::Warning));
        assert_eq!(classify(&snap(1, "a", 100, 50), &opts), Some(Severity::Info));
        assert_eq!(classify(&snap(1, "a", 100, 49), &opts), None);
        assert_eq!(classify(&snap(1, "a", 0, 10), &opts), None);
    }

    #[test]
    fn ordered_by_severity_then_name() {
        let p = perf(vec![
            snap(1, "Zoo", 100, 60),
            snap(2, "Bakery", 100, 60),
            snap(3, "Rent", 100, 150),
            snap(4, "Gym", 100, 90),
        ]);
        let lines = evaluate_alerts(&p, &HashMap::new());
        let names: Vec<&str> = lines.iter().map(|l| l.category_name.as_str()).collect();
        assert_eq!(names, ["Rent", "Gym", "Bakery", "Zoo"]);
        assert_eq!(lines[0].message, "Rent: $100.00 limit exceeded by $50.00.");
    }

    #[test]
    fn income_never_alerts() {
        let mut p = snap(1, "Salary", 100, 500);
        p.is_income = true;
        p.is_over_budget = false;
        assert!(evaluate_alerts(&perf(vec![p]), &HashMap::new()).is_empty());
    }
}
