//! Decision metrics.
//!
//! In-process counters the engine updates as requests flow through it.

use crate::decision::tier::Tier;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time view of the counters.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub total_decisions: u64,
    pub autonomous_decisions: u64,
    pub council_decisions: u64,
    pub human_decisions: u64,
    pub self_modification_decisions: u64,
    pub approved_verdicts: u64,
    pub rejected_verdicts: u64,
}

/// Engine decision counters.
#[derive(Debug, Default)]
pub struct EngineMetrics {
    total: AtomicU64,
    autonomous: AtomicU64,
    council: AtomicU64,
    human: AtomicU64,
    self_modification: AtomicU64,
    approved: AtomicU64,
    rejected: AtomicU64,
}

impl EngineMetrics {
    /// Create zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a request routed to a tier.
    pub fn record_tier(&self, tier: Tier) {
        self.total.fetch_add(1, Ordering::Relaxed);
        match tier {
            Tier::Autonomous => self.autonomous.fetch_add(1, Ordering::Relaxed),
            Tier::Council => self.council.fetch_add(1, Ordering::Relaxed),
            Tier::Human => self.human.fetch_add(1, Ordering::Relaxed),
            Tier::SelfModification => self.self_modification.fetch_add(1, Ordering::Relaxed),
        };
    }

    /// Record a final verdict.
    pub fn record_verdict(&self, approved: bool) {
        if approved {
            self.approved.fetch_add(1, Ordering::Relaxed);
        } else {
            self.rejected.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Snapshot the counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            total_decisions: self.total.load(Ordering::Relaxed),
            autonomous_decisions: self.autonomous.load(Ordering::Relaxed),
            council_decisions: self.council.load(Ordering::Relaxed),
            human_decisions: self.human.load(Ordering::Relaxed),
            self_modification_decisions: self.self_modification.load(Ordering::Relaxed),
            approved_verdicts: self.approved.load(Ordering::Relaxed),
            rejected_verdicts: self.rejected.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_tiers() {
        let metrics = EngineMetrics::new();
        metrics.record_tier(Tier::Autonomous);
        metrics.record_tier(Tier::Council);
        metrics.record_tier(Tier::Council);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.total_decisions, 3);
        assert_eq!(snapshot.autonomous_decisions, 1);
        assert_eq!(snapshot.council_decisions, 2);
        assert_eq!(snapshot.human_decisions, 0);
    }

    #[test]
    fn test_record_verdicts() {
        let metrics = EngineMetrics::new();
        metrics.record_verdict(true);
        metrics.record_verdict(false);
        metrics.record_verdict(false);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.approved_verdicts, 1);
        assert_eq!(snapshot.rejected_verdicts, 2);
    }
}
