//! Audit entry structure.
//!
//! One entry per decided request: the tier, whichever deliberation or
//! approval record applied, the policy gate outcome, and the final
//! verdict. Entries are hash-chained for tamper evidence.

use crate::approval::waiter::ApprovalWaiter;
use crate::core::{now, Hash256, Result, Timestamp};
use crate::council::deliberation::ConsensusResult;
use crate::decision::tier::Tier;
use crate::policy::gate::PolicyCheck;
use serde::{Deserialize, Serialize};

/// Unique entry identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryId(pub String);

impl EntryId {
    /// Create a new entry ID.
    pub fn new(id: &str) -> Self {
        Self(id.to_string())
    }

    /// Generate a unique ID.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Get the ID string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Append-only record of one decision and its outcome.
///
/// Entries are never edited or deleted; the log is the sole source of
/// truth for post-hoc recomputation of any consensus or policy outcome.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Unique entry ID
    pub id: EntryId,
    /// Request the entry describes
    pub request_id: String,
    /// Tier the request was classified into
    pub tier: Tier,
    /// Council result, for council-tier decisions
    pub consensus: Option<ConsensusResult>,
    /// Terminal approval state, for human-gated decisions
    pub approval: Option<ApprovalWaiter>,
    /// Policy gate outcome, when the gate was consulted
    pub policy: Option<PolicyCheck>,
    /// Final verdict
    pub approved: bool,
    /// Human-readable verdict reason
    pub reason: String,
    /// When the entry was recorded
    pub recorded_at: Timestamp,
    /// Hash of the preceding entry
    pub parent_hash: Hash256,
    /// Content hash, covering the parent hash
    pub hash: Hash256,
}

impl AuditEntry {
    /// Create a new unchained entry.
    pub fn new(request_id: &str, tier: Tier, approved: bool, reason: &str) -> Self {
        Self {
            id: EntryId::generate(),
            request_id: request_id.to_string(),
            tier,
            consensus: None,
            approval: None,
            policy: None,
            approved,
            reason: reason.to_string(),
            recorded_at: now(),
            parent_hash: Hash256::zero(),
            hash: Hash256::zero(),
        }
    }

    /// Attach a council result.
    pub fn with_consensus(mut self, consensus: ConsensusResult) -> Self {
        self.consensus = Some(consensus);
        self
    }

    /// Attach a terminal approval state.
    pub fn with_approval(mut self, approval: ApprovalWaiter) -> Self {
        self.approval = Some(approval);
        self
    }

    /// Attach a policy gate outcome.
    pub fn with_policy(mut self, policy: PolicyCheck) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Chain the entry to its parent and compute its content hash.
    pub fn compute_hash(&mut self, parent_hash: Hash256) -> Result<Hash256> {
        self.parent_hash = parent_hash;
        let hash = self.content_hash()?;
        self.hash = hash.clone();
        Ok(hash)
    }

    /// Verify the stored hash against the entry's content.
    pub fn verify_hash(&self) -> Result<bool> {
        Ok(self.content_hash()? == self.hash)
    }

    fn content_hash(&self) -> Result<Hash256> {
        let body = serde_json::to_vec(&(
            &self.id,
            &self.request_id,
            &self.tier,
            &self.consensus,
            &self.approval,
            &self.policy,
            self.approved,
            &self.reason,
            &self.recorded_at,
        ))?;

        Ok(Hash256::digest(&[&body, self.parent_hash.as_bytes()]))
    }
}
