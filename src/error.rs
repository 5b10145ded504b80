// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use thiserror::Error;

/// Failures surfaced by the budget engine.
#[derive(Debug, Error)]
pub enum BudgetError {
    /// Malformed input or missing household context. Never retried.
    #[error("Validation error: {0}")]
    Validation(String),
    /// The month's rollover was already propagated.
    #[error("Month {year_month} is already closed")]
    AlreadyClosed { year_month: String },
    /// A dependent store could not provide what the engine needs; callers may retry.
    #[error("Incomplete data: {0}")]
    IncompleteData(String),
    #[error("Store error: {0}")]
    Store(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, BudgetError>;

impl BudgetError {
    pub fn validation(msg: impl Into<String>) -> Self {
        BudgetError::Validation(msg.into())
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, BudgetError::IncompleteData(_) | BudgetError::Store(_))
    }
}
