// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::HashMap;
use std::sync::mpsc::Receiver;

use crate::alerts::{AlertOptions, budget_notification, evaluate_alerts_with};
use crate::error::Result;
use crate::notify::NotificationDispatcher;
use crate::performance::{Performance, load_performance};
use crate::period::YearMonth;
use crate::store::{BudgetStore, ChangeFeed, Collection, StoreChange};

/// Recomputes a month's performance whenever a store write could affect it,
/// then hands any budget alerts to the dispatcher.
pub struct PerformanceWatcher<'a, S: ?Sized> {
    store: &'a S,
    changes: Receiver<StoreChange>,
    household_id: i64,
    year_month: YearMonth,
    options: AlertOptions,
    dispatcher: &'a dyn NotificationDispatcher,
}

impl<'a, S> PerformanceWatcher<'a, S>
where
    S: BudgetStore + ChangeFeed + ?Sized,
{
    pub fn new(
        store: &'a S,
        household_id: i64,
        year_month: YearMonth,
        options: AlertOptions,
        dispatcher: &'a dyn NotificationDispatcher,
    ) -> Self {
        Self {
            changes: store.subscribe(),
            store,
            household_id,
            year_month,
            options,
            dispatcher,
        }
    }

    pub fn year_month(&self) -> YearMonth {
        self.year_month
    }

    fn concerns(&self, change: &StoreChange) -> bool {
        if change.household_id != self.household_id {
            return false;
        }
        match change.collection {
            Collection::Categories | Collection::Types => true,
            Collection::Transactions | Collection::MonthlyBudgets => {
                change.year_month.is_none_or(|ym| ym == self.year_month)
            }
            Collection::AnnualBudgets => change.year.is_none_or(|y| y == self.year_month.year()),
            Collection::Households | Collection::PlannedPayments => false,
        }
    }

    /// Drains pending changes. Returns a fresh snapshot if any of them was relevant.
    pub fn poll(&self) -> Result<Option<Performance>> {
        let mut relevant = false;
        for change in self.changes.try_iter() {
            relevant |= self.concerns(&change);
        }
        if !relevant {
            return Ok(None);
        }
        self.refresh().map(Some)
    }

    /// Recomputes unconditionally and dispatches alerts.
    pub fn refresh(&self) -> Result<Performance> {
        let perf = load_performance(self.store, self.household_id, self.year_month)?;
        let names: HashMap<i64, String> = perf
            .values()
            .map(|p| (p.category_id, p.category_name.clone()))
            .collect();
        let lines = evaluate_alerts_with(&perf, &names, &self.options);
        if let Some(n) = budget_notification(&lines) {
            self.dispatcher.dispatch(&n);
        }
        Ok(perf)
    }
}
