//! Append-only decision audit log.
//!
//! Every verdict is recorded here before it is released to the caller
//! (write-before-act). Entries are hash-chained; no update or delete
//! operation exists.

use crate::audit::entry::{AuditEntry, EntryId};
use crate::audit::filter::AuditFilter;
use crate::core::{Error, Result};
use tokio::sync::RwLock;
use tracing::debug;

/// Result of chain verification.
#[derive(Clone, Debug)]
pub struct ChainVerification {
    /// Whether the chain is valid
    pub valid: bool,
    /// Number of entries verified
    pub entries_verified: usize,
    /// Index of the first invalid entry (if any)
    pub first_invalid_index: Option<usize>,
}

/// Append-only, tamper-evident audit log.
pub struct AuditLog {
    entries: RwLock<Vec<AuditEntry>>,
}

impl AuditLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Append an entry, chaining it to the current head.
    ///
    /// The write completes before the verdict referencing the entry may
    /// be released; a failure here is fatal for the request.
    pub async fn record(&self, mut entry: AuditEntry) -> Result<EntryId> {
        let mut entries = self.entries.write().await;
        let parent_hash = entries
            .last()
            .map(|last| last.hash.clone())
            .unwrap_or_default();

        entry
            .compute_hash(parent_hash)
            .map_err(|err| Error::AuditWriteFailed(err.to_string()))?;

        debug!(entry = %entry.id, request = %entry.request_id, "audit entry appended");

        let id = entry.id.clone();
        entries.push(entry);
        Ok(id)
    }

    /// Read an entry by ID.
    pub async fn get(&self, id: &EntryId) -> Option<AuditEntry> {
        self.entries
            .read()
            .await
            .iter()
            .find(|entry| &entry.id == id)
            .cloned()
    }

    /// All entries for a request, in record order.
    pub async fn by_request(&self, request_id: &str) -> Vec<AuditEntry> {
        self.entries
            .read()
            .await
            .iter()
            .filter(|entry| entry.request_id == request_id)
            .cloned()
            .collect()
    }

    /// Query entries matching a filter.
    pub async fn query(&self, filter: &AuditFilter) -> Vec<AuditEntry> {
        let entries = self.entries.read().await;
        let matching = entries.iter().filter(|entry| filter.matches(entry));

        match filter.limit {
            Some(limit) => matching.take(limit).cloned().collect(),
            None => matching.cloned().collect(),
        }
    }

    /// Number of entries.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the log is empty.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Verify the entire hash chain.
    pub async fn verify_chain(&self) -> Result<ChainVerification> {
        let entries = self.entries.read().await;
        let mut expected_parent = crate::core::Hash256::zero();

        for (index, entry) in entries.iter().enumerate() {
            if entry.parent_hash != expected_parent || !entry.verify_hash()? {
                return Ok(ChainVerification {
                    valid: false,
                    entries_verified: index,
                    first_invalid_index: Some(index),
                });
            }
            expected_parent = entry.hash.clone();
        }

        Ok(ChainVerification {
            valid: true,
            entries_verified: entries.len(),
            first_invalid_index: None,
        })
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::tier::Tier;

    fn entry(request_id: &str, tier: Tier, approved: bool) -> AuditEntry {
        AuditEntry::new(request_id, tier, approved, "test")
    }

    #[tokio::test]
    async fn test_record_and_get() {
        let log = AuditLog::new();
        let id = log
            .record(entry("req-1", Tier::Autonomous, true))
            .await
            .unwrap();

        let stored = log.get(&id).await.unwrap();
        assert_eq!(stored.request_id, "req-1");
        assert!(stored.verify_hash().unwrap());
    }

    #[tokio::test]
    async fn test_entries_are_chained() {
        let log = AuditLog::new();
        log.record(entry("req-1", Tier::Autonomous, true)).await.unwrap();
        log.record(entry("req-2", Tier::Council, false)).await.unwrap();

        let verification = log.verify_chain().await.unwrap();
        assert!(verification.valid);
        assert_eq!(verification.entries_verified, 2);
    }

    #[tokio::test]
    async fn test_query_by_tier() {
        let log = AuditLog::new();
        log.record(entry("req-1", Tier::Autonomous, true)).await.unwrap();
        log.record(entry("req-2", Tier::Council, false)).await.unwrap();
        log.record(entry("req-3", Tier::Council, true)).await.unwrap();

        let council = log
            .query(&AuditFilter::new().by_tier(Tier::Council))
            .await;
        assert_eq!(council.len(), 2);

        let approved_council = log
            .query(&AuditFilter::new().by_tier(Tier::Council).approved_only())
            .await;
        assert_eq!(approved_council.len(), 1);
        assert_eq!(approved_council[0].request_id, "req-3");
    }

    #[tokio::test]
    async fn test_query_limit() {
        let log = AuditLog::new();
        for i in 0..5 {
            log.record(entry(&format!("req-{i}"), Tier::Autonomous, true))
                .await
                .unwrap();
        }

        let limited = log.query(&AuditFilter::new().with_limit(2)).await;
        assert_eq!(limited.len(), 2);
    }

    #[tokio::test]
    async fn test_by_request() {
        let log = AuditLog::new();
        log.record(entry("req-1", Tier::Autonomous, true)).await.unwrap();
        log.record(entry("req-2", Tier::Autonomous, true)).await.unwrap();

        let entries = log.by_request("req-1").await;
        assert_eq!(entries.len(), 1);
    }
}
