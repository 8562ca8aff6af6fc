//! Daily spend accounting.
//!
//! The daily cumulative bucket is the only mutable state shared between
//! concurrent requests. The check-and-commit is a single critical
//! section, so two concurrent approvals cannot jointly exceed a limit
//! neither alone would breach.

use crate::decision::request::ActionType;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Mutex;

/// Result of a commit attempt against a daily bucket.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LedgerCommit {
    /// Whether the amount was committed
    pub committed: bool,
    /// Bucket total before this attempt
    pub spent_before: f64,
}

/// Per-action-type daily spend buckets, keyed by UTC day.
pub struct DailySpendLedger {
    buckets: Mutex<HashMap<(ActionType, NaiveDate), f64>>,
}

impl DailySpendLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// Spend already committed today for an action type.
    pub fn spent_today(&self, action_type: ActionType) -> f64 {
        let today = crate::core::now().date_naive();
        let buckets = self.buckets.lock().unwrap();
        buckets.get(&(action_type, today)).copied().unwrap_or(0.0)
    }

    /// Atomically commit `amount` if the bucket stays within `limit`.
    pub fn try_commit(&self, action_type: ActionType, amount: f64, limit: f64) -> LedgerCommit {
        let today = crate::core::now().date_naive();
        let mut buckets = self.buckets.lock().unwrap();

        // Old-day buckets are dead weight once the UTC day rolls over
        buckets.retain(|(_, day), _| *day == today);

        let entry = buckets.entry((action_type, today)).or_insert(0.0);
        let spent_before = *entry;

        if spent_before + amount > limit {
            return LedgerCommit {
                committed: false,
                spent_before,
            };
        }

        *entry += amount;
        LedgerCommit {
            committed: true,
            spent_before,
        }
    }
}

impl Default for DailySpendLedger {
    fn default() -> Self {
        Self::new()
    }
}
