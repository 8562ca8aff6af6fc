//! Decision engine orchestration.
//!
//! Routes each request through its tier's approval path, the policy
//! gate, and the audit log. The audit write completes before the verdict
//! is released, so no caller can observe an approved verdict whose entry
//! is absent from the log.

use crate::approval::notify::{ApprovalPrompt, Notifier, TracingNotifier};
use crate::approval::waiter::ApprovalCoordinator;
use crate::audit::entry::{AuditEntry, EntryId};
use crate::audit::log::AuditLog;
use crate::config::EngineConfig;
use crate::core::Result;
use crate::council::deliberation::{ConsensusOutcome, ConsensusResult, CouncilEngine};
use crate::council::opinion::OpinionSource;
use crate::decision::request::DecisionRequest;
use crate::decision::tier::{Tier, TierClassifier};
use crate::monitoring::metrics::{EngineMetrics, MetricsSnapshot};
use crate::policy::gate::PolicyGate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// The engine's answer to a decision request.
///
/// The caller is solely responsible for performing the underlying effect
/// and must not act on a rejected verdict.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Verdict {
    /// Whether execution is authorized
    pub approved: bool,
    /// Tier the request passed through
    pub tier: Tier,
    /// Human-readable reason
    pub reason: String,
    /// Audit entry recording the decision
    pub audit_entry_id: EntryId,
}

/// Decision engine orchestrating all components.
pub struct DecisionEngine {
    /// Tier classifier
    classifier: TierClassifier,
    /// Council deliberation engine
    council: CouncilEngine,
    /// Human approval coordinator
    approvals: ApprovalCoordinator,
    /// Policy gate
    gate: PolicyGate,
    /// Audit log
    audit: AuditLog,
    /// Notification channel for human-gated requests
    notifier: Arc<dyn Notifier>,
    /// Decision counters
    metrics: EngineMetrics,
}

impl DecisionEngine {
    /// Create a new engine from configuration.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            classifier: TierClassifier::new(config.tiers),
            council: CouncilEngine::new(config.council),
            approvals: ApprovalCoordinator::new(config.approval),
            gate: PolicyGate::new(config.policy),
            audit: AuditLog::new(),
            notifier: Arc::new(TracingNotifier),
            metrics: EngineMetrics::new(),
        }
    }

    /// Add a council opinion source.
    pub fn with_source(mut self, source: Arc<dyn OpinionSource>) -> Self {
        self.council = self.council.with_source(source);
        self
    }

    /// Replace the approval notifier.
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Human responders submit approvals through this coordinator.
    pub fn approvals(&self) -> &ApprovalCoordinator {
        &self.approvals
    }

    /// Read-only audit access.
    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    /// Current decision counters.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Decide a request.
    ///
    /// Malformed requests fail fast, before any deliberation or audit
    /// entry. Every other path produces exactly one terminal verdict
    /// backed by exactly one audit entry.
    pub async fn decide(&self, request: DecisionRequest) -> Result<Verdict> {
        self.classifier.validate(&request)?;
        let tier = self.classifier.classify(&request);
        self.metrics.record_tier(tier);

        info!(request = %request.id, tier = %tier, action = %request.action_type, "decision request received");

        let mut consensus: Option<ConsensusResult> = None;
        let mut approval = None;

        let (mut approved, mut reason) = match tier {
            Tier::Autonomous => (true, "auto-approved (under threshold)".to_string()),
            Tier::Council => {
                let result = self.council.deliberate(&request).await;
                let verdict = (result.outcome.is_approved(), council_reason(&result));
                consensus = Some(result);
                verdict
            }
            Tier::Human | Tier::SelfModification => {
                let waiter = self.approvals.open(&request).await?;
                let prompt = ApprovalPrompt::for_request(&request, waiter.expires_at);
                if let Err(err) = self.notifier.notify(&prompt).await {
                    // The waiter is still resolvable by submit or timeout
                    warn!(request = %request.id, error = %err, "approval notification failed");
                }

                let terminal = self.approvals.wait(&request.id).await?;
                let verdict = (terminal.status.is_approved(), approval_reason(&terminal));
                approval = Some(terminal);
                verdict
            }
        };

        // Even an approved council or human decision can still be
        // blocked by the policy gate.
        let policy = if approved {
            let check = self.gate.authorize(&request);
            if let Some(violation) = &check.violation {
                approved = false;
                reason = format!("policy violation: {violation}");
            }
            Some(check)
        } else {
            None
        };

        self.metrics.record_verdict(approved);

        let mut entry = AuditEntry::new(&request.id, tier, approved, &reason);
        if let Some(consensus) = consensus {
            entry = entry.with_consensus(consensus);
        }
        if let Some(approval) = approval {
            entry = entry.with_approval(approval);
        }
        if let Some(policy) = policy {
            entry = entry.with_policy(policy);
        }

        // Write-before-act: an unaudited approval is unacceptable
        let audit_entry_id = self.audit.record(entry).await?;

        info!(request = %request.id, approved, %reason, "verdict recorded");

        Ok(Verdict {
            approved,
            tier,
            reason,
            audit_entry_id,
        })
    }

    /// Withdraw a human-gated request that is no longer relevant.
    pub async fn withdraw(&self, request_id: &str) -> Result<()> {
        self.approvals.withdraw(request_id).await
    }
}

fn council_reason(result: &ConsensusResult) -> String {
    match result.outcome {
        ConsensusOutcome::Approved => {
            format!("council approved (score {:.2})", result.weighted_score)
        }
        ConsensusOutcome::TieApproved => match &result.tie_break_source {
            Some(source) => format!("council tie approved by chairman {source}"),
            None => "council tie approved".to_string(),
        },
        ConsensusOutcome::TieRejected => match &result.tie_break_source {
            Some(source) => format!("council tie rejected by chairman {source}"),
            None => "council tie rejected (chairman unavailable)".to_string(),
        },
        ConsensusOutcome::Rejected => match &result.reason {
            Some(reason) => format!("council rejected: {reason}"),
            None => format!("council rejected (score {:.2})", result.weighted_score),
        },
    }
}

fn approval_reason(waiter: &crate::approval::waiter::ApprovalWaiter) -> String {
    use crate::approval::waiter::ApprovalStatus;

    let responder = waiter.responder_id.as_deref().unwrap_or("unknown");
    match waiter.status {
        ApprovalStatus::Approved => format!("approved by {responder}"),
        ApprovalStatus::Rejected => format!("rejected by {responder}"),
        ApprovalStatus::TimedOut => "approval timed out".to_string(),
        ApprovalStatus::Pending => "approval pending".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CouncilConfig, EngineConfig, PolicyConfig, TierConfig};
    use crate::core::{Error, Timestamp};
    use crate::council::opinion::{Opinion, SourceError, VoteChoice};
    use crate::decision::request::ActionType;
    use async_trait::async_trait;

    struct StaticSource {
        id: String,
        vote: VoteChoice,
        confidence: f64,
    }

    impl StaticSource {
        fn new(id: &str, vote: VoteChoice, confidence: f64) -> Arc<Self> {
            Arc::new(Self {
                id: id.to_string(),
                vote,
                confidence,
            })
        }
    }

    #[async_trait]
    impl OpinionSource for StaticSource {
        fn source_id(&self) -> &str {
            &self.id
        }

        async fn opine(
            &self,
            _request: &DecisionRequest,
            _deadline: Timestamp,
        ) -> std::result::Result<Opinion, SourceError> {
            Ok(Opinion::new(&self.id, self.vote, self.confidence))
        }
    }

    fn spend(amount: f64) -> DecisionRequest {
        DecisionRequest::new(ActionType::Spend, "pay vendor").with_amount(amount)
    }

    #[tokio::test]
    async fn test_autonomous_approval_is_audited() {
        let engine = DecisionEngine::new(EngineConfig::default());
        let verdict = engine.decide(spend(25.0)).await.unwrap();

        assert!(verdict.approved);
        assert_eq!(verdict.tier, Tier::Autonomous);

        // Write-before-act: the entry backing the verdict must exist
        let entry = engine.audit().get(&verdict.audit_entry_id).await.unwrap();
        assert!(entry.approved);
        assert!(entry.policy.is_some());
        assert!(entry.consensus.is_none());
    }

    #[tokio::test]
    async fn test_council_approval() {
        let engine = DecisionEngine::new(EngineConfig::default())
            .with_source(StaticSource::new("a", VoteChoice::Approve, 0.9))
            .with_source(StaticSource::new("b", VoteChoice::Approve, 0.9))
            .with_source(StaticSource::new("c", VoteChoice::Approve, 0.8));

        let verdict = engine.decide(spend(500.0)).await.unwrap();

        assert!(verdict.approved);
        assert_eq!(verdict.tier, Tier::Council);

        let entry = engine.audit().get(&verdict.audit_entry_id).await.unwrap();
        let consensus = entry.consensus.unwrap();
        assert_eq!(consensus.opinions.len(), 3);
        assert!(consensus.outcome.is_approved());
    }

    #[tokio::test]
    async fn test_council_quorum_failure_rejects() {
        // Two configured sources, one fails: default quorum is all
        struct FailingSource;

        #[async_trait]
        impl OpinionSource for FailingSource {
            fn source_id(&self) -> &str {
                "broken"
            }

            async fn opine(
                &self,
                _request: &DecisionRequest,
                _deadline: Timestamp,
            ) -> std::result::Result<Opinion, SourceError> {
                Err(SourceError::Unavailable("offline".to_string()))
            }
        }

        let engine = DecisionEngine::new(EngineConfig::default())
            .with_source(StaticSource::new("a", VoteChoice::Approve, 1.0))
            .with_source(Arc::new(FailingSource));

        let verdict = engine.decide(spend(500.0)).await.unwrap();

        assert!(!verdict.approved);
        assert!(verdict.reason.contains("insufficient opinions"));
    }

    #[tokio::test]
    async fn test_human_approval_flow() {
        let engine = Arc::new(DecisionEngine::new(EngineConfig::default()));
        let request = spend(2500.0);
        let request_id = request.id.clone();

        let deciding = {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move { engine.decide(request).await })
        };

        // Wait for the waiter to open, then respond
        loop {
            tokio::task::yield_now().await;
            if engine.approvals().get(&request_id).await.is_some() {
                break;
            }
        }
        engine
            .approvals()
            .submit(&request_id, "operator-1", true)
            .await
            .unwrap();

        let verdict = deciding.await.unwrap().unwrap();
        assert!(verdict.approved);
        assert_eq!(verdict.tier, Tier::Human);
        assert!(verdict.reason.contains("operator-1"));

        let entry = engine.audit().get(&verdict.audit_entry_id).await.unwrap();
        let approval = entry.approval.unwrap();
        assert_eq!(approval.responder_id.as_deref(), Some("operator-1"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_human_timeout_rejects_once() {
        let engine = DecisionEngine::new(EngineConfig::default());
        let verdict = engine.decide(spend(3000.0)).await.unwrap();

        assert!(!verdict.approved);
        assert_eq!(verdict.reason, "approval timed out");
        assert_eq!(engine.audit().len().await, 1);

        let entry = engine.audit().get(&verdict.audit_entry_id).await.unwrap();
        assert_eq!(
            entry.approval.unwrap().status,
            crate::approval::waiter::ApprovalStatus::TimedOut
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_response_does_not_add_entry() {
        let engine = DecisionEngine::new(EngineConfig::default());
        let request = spend(3000.0);
        let request_id = request.id.clone();

        let verdict = engine.decide(request).await.unwrap();
        assert!(!verdict.approved);
        assert_eq!(engine.audit().len().await, 1);

        // A response after the terminal state is ignored
        let outcome = engine
            .approvals()
            .submit(&request_id, "operator-1", true)
            .await
            .unwrap();
        assert!(matches!(
            outcome,
            crate::approval::waiter::SubmitOutcome::Duplicate(_)
        ));
        assert_eq!(engine.audit().len().await, 1);
    }

    #[tokio::test]
    async fn test_self_modification_routes_to_human() {
        let engine = Arc::new(DecisionEngine::new(EngineConfig::default()));
        let request = DecisionRequest::new(ActionType::SelfModification, "adjust strategy");
        let request_id = request.id.clone();

        let deciding = {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move { engine.decide(request).await })
        };

        loop {
            tokio::task::yield_now().await;
            if engine.approvals().get(&request_id).await.is_some() {
                break;
            }
        }
        engine
            .approvals()
            .submit(&request_id, "operator-1", false)
            .await
            .unwrap();

        let verdict = deciding.await.unwrap().unwrap();
        assert!(!verdict.approved);
        assert_eq!(verdict.tier, Tier::SelfModification);
    }

    #[tokio::test]
    async fn test_policy_gate_blocks_approved_council_verdict() {
        // Council approves 1500, but the per-transaction limit is 1000
        let engine = DecisionEngine::new(EngineConfig::default())
            .with_source(StaticSource::new("a", VoteChoice::Approve, 1.0))
            .with_source(StaticSource::new("b", VoteChoice::Approve, 1.0));

        let verdict = engine.decide(spend(1500.0)).await.unwrap();

        assert!(!verdict.approved);
        assert!(verdict.reason.contains("per_tx_limit"));

        let entry = engine.audit().get(&verdict.audit_entry_id).await.unwrap();
        assert!(entry.consensus.unwrap().outcome.is_approved());
        assert!(!entry.policy.unwrap().passed);
    }

    #[tokio::test]
    async fn test_malformed_request_fails_fast() {
        let engine = DecisionEngine::new(EngineConfig::default());
        let request = DecisionRequest::new(ActionType::Spend, "no amount");

        let result = engine.decide(request).await;

        assert!(matches!(result, Err(Error::MalformedRequest(_))));
        // No audit entry is created before validation passes
        assert!(engine.audit().is_empty().await);
    }

    #[tokio::test]
    async fn test_concurrent_requests_respect_daily_limit() {
        // Everything autonomous; two 600s against a 1000 daily limit
        let config = EngineConfig {
            tiers: TierConfig {
                auto_approve_usd: 10_000.0,
                ..TierConfig::default()
            },
            policy: PolicyConfig {
                max_single_tx_usd: 1000.0,
                max_daily_spend_usd: 1000.0,
                multisig_threshold_usd: 2000.0,
                approved_addresses: Vec::new(),
            },
            ..EngineConfig::default()
        };

        let engine = Arc::new(DecisionEngine::new(config));
        let first = {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move { engine.decide(spend(600.0)).await })
        };
        let second = {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move { engine.decide(spend(600.0)).await })
        };

        let first = first.await.unwrap().unwrap();
        let second = second.await.unwrap().unwrap();

        let approvals = [&first, &second].iter().filter(|v| v.approved).count();
        assert_eq!(approvals, 1);

        let rejected = if first.approved { &second } else { &first };
        assert!(rejected.reason.contains("daily_limit"));
    }

    #[tokio::test]
    async fn test_metrics_track_tiers_and_verdicts() {
        let engine = DecisionEngine::new(EngineConfig::default());
        engine.decide(spend(10.0)).await.unwrap();
        engine.decide(spend(20.0)).await.unwrap();

        let snapshot = engine.metrics();
        assert_eq!(snapshot.total_decisions, 2);
        assert_eq!(snapshot.autonomous_decisions, 2);
        assert_eq!(snapshot.approved_verdicts, 2);
    }

    #[tokio::test]
    async fn test_council_config_threshold_respected() {
        // A 2-2 split with the chairman approving resolves the tie
        let config = EngineConfig {
            council: CouncilConfig {
                chairman: "d".to_string(),
                ..CouncilConfig::default()
            },
            ..EngineConfig::default()
        };

        let engine = DecisionEngine::new(config)
            .with_source(StaticSource::new("a", VoteChoice::Approve, 1.0))
            .with_source(StaticSource::new("b", VoteChoice::Reject, 1.0))
            .with_source(StaticSource::new("c", VoteChoice::Reject, 1.0))
            .with_source(StaticSource::new("d", VoteChoice::Approve, 1.0));

        let verdict = engine.decide(spend(500.0)).await.unwrap();

        assert!(verdict.approved);
        assert!(verdict.reason.contains("chairman d"));
    }
}
