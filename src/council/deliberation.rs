//! Council deliberation engine.
//!
//! Fans out one concurrent opinion query per configured source, collects
//! whatever arrives before the deliberation deadline, and aggregates the
//! received opinions into a consensus result. Aggregation is a pure
//! function of the opinions and the configuration, so any audit reader
//! can recompute the outcome offline.

use crate::config::CouncilConfig;
use crate::core::now;
use crate::council::opinion::{Opinion, OpinionSource, VoteChoice};
use crate::decision::request::DecisionRequest;
use futures::stream::{FuturesUnordered, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Outcome of a council deliberation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConsensusOutcome {
    /// Weighted score cleared the consensus threshold
    Approved,
    /// Score below threshold without an exact vote tie, or quorum failure
    Rejected,
    /// Exact vote tie, resolved by the chairman's approval
    TieApproved,
    /// Exact vote tie, with the chairman rejecting, abstaining, or absent
    TieRejected,
}

impl ConsensusOutcome {
    /// Whether the outcome authorizes the action.
    pub fn is_approved(&self) -> bool {
        matches!(self, ConsensusOutcome::Approved | ConsensusOutcome::TieApproved)
    }
}

/// Result of one council deliberation.
///
/// Created once per deliberation and never mutated after finalization.
/// The outcome is recomputable from the retained opinions, the threshold,
/// and the tie-break rule alone.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConsensusResult {
    /// Request deliberated on
    pub request_id: String,
    /// Opinions actually received, in arrival order
    pub opinions: Vec<Opinion>,
    /// Normalized weighted score in [-1, 1]
    pub weighted_score: f64,
    /// Consensus fraction in force when the result was finalized
    pub threshold_used: f64,
    /// The outcome
    pub outcome: ConsensusOutcome,
    /// Source that broke the tie, if one did
    pub tie_break_source: Option<String>,
    /// Reason for a forced outcome (quorum failure, chairman unavailable)
    pub reason: Option<String>,
}

/// Aggregate received opinions into a consensus result.
///
/// Pure: no clock, no I/O. `configured_sources` is the number of sources
/// that were queried, which anchors the default quorum of "all sources
/// must respond".
pub fn aggregate(
    request_id: &str,
    opinions: Vec<Opinion>,
    configured_sources: usize,
    config: &CouncilConfig,
) -> ConsensusResult {
    let min_quorum = config.min_quorum.unwrap_or(configured_sources);
    if opinions.is_empty() || opinions.len() < min_quorum {
        return ConsensusResult {
            request_id: request_id.to_string(),
            opinions,
            weighted_score: 0.0,
            threshold_used: config.consensus_threshold,
            outcome: ConsensusOutcome::Rejected,
            tie_break_source: None,
            reason: Some("insufficient opinions".to_string()),
        };
    }

    let confidence_mass: f64 = opinions.iter().map(|o| o.confidence).sum();
    let weighted_sum: f64 = opinions.iter().map(|o| o.vote.value() * o.confidence).sum();
    let weighted_score = if confidence_mass > 0.0 {
        weighted_sum / confidence_mass
    } else {
        0.0
    };

    let approve_votes = opinions.iter().filter(|o| o.vote == VoteChoice::Approve).count();
    let reject_votes = opinions.iter().filter(|o| o.vote == VoteChoice::Reject).count();

    // threshold is a fraction in [0, 1]; rescale to the score range
    let required_score = 2.0 * config.consensus_threshold - 1.0;

    let (outcome, tie_break_source, reason) = if weighted_score >= required_score {
        (ConsensusOutcome::Approved, None, None)
    } else if approve_votes == reject_votes {
        match opinions.iter().find(|o| o.source_id == config.chairman) {
            Some(chairman) if chairman.vote == VoteChoice::Approve => (
                ConsensusOutcome::TieApproved,
                Some(config.chairman.clone()),
                None,
            ),
            Some(_) => (
                ConsensusOutcome::TieRejected,
                Some(config.chairman.clone()),
                None,
            ),
            // Chairman unavailable is fail-closed
            None => (
                ConsensusOutcome::TieRejected,
                None,
                Some("chairman unavailable".to_string()),
            ),
        }
    } else {
        (ConsensusOutcome::Rejected, None, None)
    };

    ConsensusResult {
        request_id: request_id.to_string(),
        opinions,
        weighted_score,
        threshold_used: config.consensus_threshold,
        outcome,
        tie_break_source,
        reason,
    }
}

/// Council deliberation engine.
pub struct CouncilEngine {
    /// Configured opinion sources
    sources: Vec<Arc<dyn OpinionSource>>,
    /// Configuration
    config: CouncilConfig,
}

impl CouncilEngine {
    /// Create an engine with no sources.
    pub fn new(config: CouncilConfig) -> Self {
        Self {
            sources: Vec::new(),
            config,
        }
    }

    /// Add an opinion source.
    pub fn with_source(mut self, source: Arc<dyn OpinionSource>) -> Self {
        self.sources.push(source);
        self
    }

    /// Number of configured sources.
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Conduct a deliberation on a request.
    ///
    /// Each source is queried concurrently under its own timeout; the
    /// whole collection phase is bounded by the deliberation deadline.
    /// A source failure or timeout yields no opinion for that source and
    /// is never retried here.
    pub async fn deliberate(&self, request: &DecisionRequest) -> ConsensusResult {
        let per_source = Duration::from_secs(self.config.source_timeout_secs);
        let deadline =
            tokio::time::Instant::now() + Duration::from_secs(self.config.deliberation_timeout_secs);

        info!(
            request = %request.id,
            sources = self.sources.len(),
            "council deliberation started"
        );

        let wall_deadline =
            now() + chrono::Duration::from_std(per_source).unwrap_or(chrono::Duration::zero());

        let mut queries: FuturesUnordered<_> = self
            .sources
            .iter()
            .map(|source| {
                let source = Arc::clone(source);
                let request = request.clone();

                async move {
                    let source_id = source.source_id().to_string();
                    match tokio::time::timeout(per_source, source.opine(&request, wall_deadline))
                        .await
                    {
                        Ok(Ok(opinion)) => Some(opinion),
                        Ok(Err(err)) => {
                            warn!(source = %source_id, error = %err, "opinion source failed");
                            None
                        }
                        Err(_) => {
                            warn!(source = %source_id, "opinion source timed out");
                            None
                        }
                    }
                }
            })
            .collect();

        let mut opinions = Vec::new();
        loop {
            match tokio::time::timeout_at(deadline, queries.next()).await {
                Ok(Some(Some(opinion))) => opinions.push(opinion),
                Ok(Some(None)) => {}
                Ok(None) => break,
                Err(_) => {
                    // Deadline elapsed: finalize with what arrived.
                    // Dropping the remaining queries cancels them.
                    warn!(request = %request.id, "deliberation deadline elapsed");
                    break;
                }
            }
        }
        drop(queries);

        let result = aggregate(&request.id, opinions, self.sources.len(), &self.config);

        info!(
            request = %request.id,
            outcome = ?result.outcome,
            score = result.weighted_score,
            opinions = result.opinions.len(),
            "council deliberation finished"
        );

        result
    }
}
