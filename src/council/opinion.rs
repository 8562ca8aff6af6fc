//! Council opinions and the opinion source contract.

use crate::core::{now, Timestamp};
use crate::decision::request::DecisionRequest;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A council member's vote.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteChoice {
    /// Approve the action
    Approve,
    /// Reject the action
    Reject,
    /// Decline to weigh in
    Abstain,
}

impl VoteChoice {
    /// Contribution to the weighted score.
    pub fn value(&self) -> f64 {
        match self {
            VoteChoice::Approve => 1.0,
            VoteChoice::Reject => -1.0,
            VoteChoice::Abstain => 0.0,
        }
    }
}

/// Failure modes of an opinion source.
///
/// These stay inside the council layer: a failed source is excluded from
/// aggregation, never surfaced as a request-level error.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("source timed out")]
    Timeout,

    #[error("source unavailable: {0}")]
    Unavailable(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// A single opinion from one source in one deliberation.
///
/// Immutable once recorded.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Opinion {
    /// Source that produced the opinion
    pub source_id: String,
    /// The vote
    pub vote: VoteChoice,
    /// Confidence in the vote (0.0 - 1.0)
    pub confidence: f64,
    /// Free-text rationale
    pub rationale: String,
    /// When the opinion arrived
    pub received_at: Timestamp,
}

/// Raw shape adapters coerce model output into.
#[derive(Deserialize)]
struct RawOpinion {
    vote: String,
    confidence: Option<f64>,
    #[serde(alias = "reasoning")]
    rationale: Option<String>,
}

impl Opinion {
    /// Create a new opinion. Confidence is clamped to [0, 1].
    pub fn new(source_id: &str, vote: VoteChoice, confidence: f64) -> Self {
        Self {
            source_id: source_id.to_string(),
            vote,
            confidence: confidence.clamp(0.0, 1.0),
            rationale: String::new(),
            received_at: now(),
        }
    }

    /// Attach a rationale.
    pub fn with_rationale(mut self, rationale: &str) -> Self {
        self.rationale = rationale.to_string();
        self
    }

    /// Coerce a raw model response into a strict opinion.
    ///
    /// Expects `{"vote": "approve|reject|abstain", "confidence": 0.0-1.0,
    /// "rationale": "..."}` (`"reasoning"` is accepted for the rationale
    /// key, and a missing confidence defaults to 0.5). Anything else is a
    /// source failure, not a malformed opinion.
    pub fn from_json(source_id: &str, raw: &str) -> std::result::Result<Self, SourceError> {
        let parsed: RawOpinion = serde_json::from_str(raw)
            .map_err(|e| SourceError::InvalidResponse(e.to_string()))?;

        let vote = match parsed.vote.to_lowercase().as_str() {
            "approve" => VoteChoice::Approve,
            "reject" => VoteChoice::Reject,
            "abstain" => VoteChoice::Abstain,
            other => {
                return Err(SourceError::InvalidResponse(format!(
                    "unrecognized vote {other:?}"
                )))
            }
        };

        Ok(Self::new(source_id, vote, parsed.confidence.unwrap_or(0.5))
            .with_rationale(parsed.rationale.as_deref().unwrap_or("")))
    }
}

/// Contract for an external opinion source.
///
/// Given a request and a deadline, a source returns an opinion or fails
/// within the deadline; it must not block past it. Retry policy belongs
/// to the source's adapter, never to the deliberation engine.
#[async_trait]
pub trait OpinionSource: Send + Sync {
    /// Stable identifier, used for chairman matching and audit.
    fn source_id(&self) -> &str;

    /// Produce an opinion on the request before the deadline.
    async fn opine(
        &self,
        request: &DecisionRequest,
        deadline: Timestamp,
    ) -> std::result::Result<Opinion, SourceError>;
}
