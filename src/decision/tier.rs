//! Tier classification.
//!
//! Maps a decision request to the authorization path it must pass.
//! Classification is deterministic and side-effect free so it can be
//! re-verified from an audit entry alone.

use crate::config::TierConfig;
use crate::core::{Error, Result};
use crate::decision::request::{ActionType, DecisionRequest};
use serde::{Deserialize, Serialize};

/// Authorization level assigned to a decision request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tier {
    /// Executes without review
    Autonomous,
    /// Requires council consensus
    Council,
    /// Requires human approval
    Human,
    /// Fixed highest-scrutiny tier, regardless of amount
    SelfModification,
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tier::Autonomous => write!(f, "autonomous"),
            Tier::Council => write!(f, "council"),
            Tier::Human => write!(f, "human"),
            Tier::SelfModification => write!(f, "self_modification"),
        }
    }
}

/// Maps decision requests to tiers using configured thresholds.
pub struct TierClassifier {
    config: TierConfig,
}

impl TierClassifier {
    /// Create a classifier from tier thresholds.
    pub fn new(config: TierConfig) -> Self {
        Self { config }
    }

    /// Reject requests that cannot be classified, before any
    /// deliberation or audit entry is created.
    pub fn validate(&self, request: &DecisionRequest) -> Result<()> {
        if let Some(amount) = request.amount {
            if !amount.is_finite() || amount < 0.0 {
                return Err(Error::MalformedRequest(format!(
                    "invalid amount {amount} for request {}",
                    request.id
                )));
            }
        } else if request.action_type == ActionType::Spend {
            return Err(Error::MalformedRequest(format!(
                "spend request {} has no amount",
                request.id
            )));
        }
        Ok(())
    }

    /// Assign a tier. Pure and total: same input always yields the same
    /// tier, and every well-formed request gets one.
    pub fn classify(&self, request: &DecisionRequest) -> Tier {
        if request.action_type == ActionType::SelfModification {
            return Tier::SelfModification;
        }

        match request.amount {
            Some(amount) => {
                if amount < self.config.auto_approve_usd {
                    Tier::Autonomous
                } else if amount > self.config.human_required_usd {
                    Tier::Human
                } else {
                    Tier::Council
                }
            }
            None => match request.action_type {
                ActionType::VentureChange => self.config.venture_change_default,
                ActionType::Generic => self.config.generic_default,
                // Amountless spends are rejected at submission; fail
                // closed here to stay total.
                ActionType::Spend => Tier::Human,
                ActionType::SelfModification => Tier::SelfModification,
            },
        }
    }
}
