//! Query filters for audit entries.

use crate::audit::entry::AuditEntry;
use crate::core::Timestamp;
use crate::decision::tier::Tier;
use serde::{Deserialize, Serialize};

/// Filter for querying audit entries.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AuditFilter {
    /// Filter by request ID
    pub request_id: Option<String>,
    /// Filter by tier
    pub tier: Option<Tier>,
    /// Filter by final verdict
    pub approved: Option<bool>,
    /// Filter by date from
    pub date_from: Option<Timestamp>,
    /// Filter by date to
    pub date_to: Option<Timestamp>,
    /// Maximum results
    pub limit: Option<usize>,
}

impl AuditFilter {
    /// Create a new empty filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter by request ID.
    pub fn by_request(mut self, request_id: &str) -> Self {
        self.request_id = Some(request_id.to_string());
        self
    }

    /// Filter by tier.
    pub fn by_tier(mut self, tier: Tier) -> Self {
        self.tier = Some(tier);
        self
    }

    /// Filter approved verdicts only.
    pub fn approved_only(mut self) -> Self {
        self.approved = Some(true);
        self
    }

    /// Filter rejected verdicts only.
    pub fn rejected_only(mut self) -> Self {
        self.approved = Some(false);
        self
    }

    /// Filter by date range.
    pub fn by_date_range(mut self, from: Timestamp, to: Timestamp) -> Self {
        self.date_from = Some(from);
        self.date_to = Some(to);
        self
    }

    /// Set result limit.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Check if an entry matches this filter.
    pub fn matches(&self, entry: &AuditEntry) -> bool {
        if let Some(request_id) = &self.request_id {
            if &entry.request_id != request_id {
                return false;
            }
        }

        if let Some(tier) = self.tier {
            if entry.tier != tier {
                return false;
            }
        }

        if let Some(approved) = self.approved {
            if entry.approved != approved {
                return false;
            }
        }

        if let Some(from) = self.date_from {
            if entry.recorded_at < from {
                return false;
            }
        }

        if let Some(to) = self.date_to {
            if entry.recorded_at > to {
                return false;
            }
        }

        true
    }
}
