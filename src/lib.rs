// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod alerts;
pub mod balance;
pub mod cli;
pub mod commands;
pub mod db;
pub mod error;
pub mod goals;
pub mod installments;
pub mod models;
pub mod notify;
pub mod performance;
pub mod period;
pub mod planned;
pub mod rollover;
pub mod store;
pub mod utils;
pub mod watch;
