// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod households;
pub mod types;
pub mod categories;
pub mod transactions;
pub mod annual;
pub mod budgets;
pub mod alerts;
pub mod planned;
pub mod exporter;
pub mod config;
pub mod doctor;
