// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use serde::Serialize;

pub const BUDGET_ALERT_TAG: &str = "budget-alert";
pub const BILL_DUE_TAG: &str = "bill-due-alert";

/// A message for the notification collaborator. Notifications sharing a `tag`
/// replace each other; `renotify` asks for the replacement to alert again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub tag: String,
    pub renotify: bool,
}

impl Notification {
    pub fn from_lines<I, L>(title: &str, tag: &str, lines: I) -> Option<Self>
    where
        I: IntoIterator<Item = L>,
        L: ToString,
    {
        let body = lines
            .into_iter()
            .map(|l| l.to_string())
            .collect::<Vec<_>>()
            .join("\n");
        if body.is_empty() {
            return None;
        }
        Some(Self {
            title: title.to_string(),
            body,
            tag: tag.to_string(),
            renotify: true,
        })
    }
}

pub trait NotificationDispatcher {
    fn dispatch(&self, notification: &Notification);
}

/// Emits notifications as structured log events.
pub struct TracingDispatcher;

impl NotificationDispatcher for TracingDispatcher {
    fn dispatch(&self, n: &Notification) {
        tracing::info!(tag = %n.tag, renotify = n.renotify, title = %n.title, body = %n.body, "notification");
    }
}

pub struct StdoutDispatcher;

impl NotificationDispatcher for StdoutDispatcher {
    fn dispatch(&self, n: &Notification) {
        TracingDispatcher.dispatch(n);
        println!("{}", n.title);
        println!("{}", n.body);
    }
}
