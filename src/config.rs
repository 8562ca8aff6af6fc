//! Engine configuration.
//!
//! All thresholds, timeouts, and limits are externally supplied, loaded
//! once into an immutable value, and passed into each component at
//! construction. No ambient global state.

use crate::decision::tier::Tier;
use serde::{Deserialize, Serialize};

/// Tier classification thresholds.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TierConfig {
    /// Amounts below this are approved autonomously
    pub auto_approve_usd: f64,
    /// Amounts above this require human approval
    pub human_required_usd: f64,
    /// Tier for venture changes without a monetary amount
    pub venture_change_default: Tier,
    /// Tier for generic actions without a monetary amount
    pub generic_default: Tier,
}

impl Default for TierConfig {
    fn default() -> Self {
        Self {
            auto_approve_usd: 100.0,
            human_required_usd: 2000.0,
            venture_change_default: Tier::Council,
            generic_default: Tier::Autonomous,
        }
    }
}

/// Council deliberation configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CouncilConfig {
    /// Consensus fraction required for automatic approval
    pub consensus_threshold: f64,
    /// Minimum opinions required to finalize; None means all sources
    pub min_quorum: Option<usize>,
    /// Source whose vote breaks exact ties
    pub chairman: String,
    /// Per-source opinion timeout in seconds
    pub source_timeout_secs: u64,
    /// Deliberation-wide deadline in seconds
    pub deliberation_timeout_secs: u64,
}

impl Default for CouncilConfig {
    fn default() -> Self {
        Self {
            consensus_threshold: 0.66,
            min_quorum: None,
            chairman: "x-ai/grok-3".to_string(),
            source_timeout_secs: 120,
            deliberation_timeout_secs: 150,
        }
    }
}

/// Human approval configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApprovalConfig {
    /// Hours before an unanswered request auto-rejects
    pub timeout_hours: i64,
}

impl Default for ApprovalConfig {
    fn default() -> Self {
        Self { timeout_hours: 24 }
    }
}

/// Spending limits and whitelist for the policy gate.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Per-transaction spending limit
    pub max_single_tx_usd: f64,
    /// Rolling daily cumulative limit per action type
    pub max_daily_spend_usd: f64,
    /// Amounts above this require multi-signature
    pub multisig_threshold_usd: f64,
    /// Approved destination addresses; empty disables the check
    pub approved_addresses: Vec<String>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            max_single_tx_usd: 1000.0,
            max_daily_spend_usd: 5000.0,
            multisig_threshold_usd: 2000.0,
            approved_addresses: Vec::new(),
        }
    }
}

/// Root engine configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Tier thresholds
    #[serde(default)]
    pub tiers: TierConfig,
    /// Council parameters
    #[serde(default)]
    pub council: CouncilConfig,
    /// Human approval parameters
    #[serde(default)]
    pub approval: ApprovalConfig,
    /// Policy gate limits
    #[serde(default)]
    pub policy: PolicyConfig,
}

impl EngineConfig {
    /// Load a configuration from a JSON string.
    pub fn from_json(json: &str) -> crate::core::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_thresholds() {
        let config = EngineConfig::default();
        assert_eq!(config.tiers.auto_approve_usd, 100.0);
        assert_eq!(config.tiers.human_required_usd, 2000.0);
        assert_eq!(config.council.consensus_threshold, 0.66);
        assert_eq!(config.approval.timeout_hours, 24);
        assert_eq!(config.policy.max_single_tx_usd, 1000.0);
    }

    #[test]
    fn test_from_json_partial() {
        let config = EngineConfig::from_json(
            r#"{"tiers": {"auto_approve_usd": 50.0, "human_required_usd": 500.0,
                "venture_change_default": "Council", "generic_default": "Autonomous"}}"#,
        )
        .unwrap();
        assert_eq!(config.tiers.auto_approve_usd, 50.0);
        // Untouched sections keep their defaults
        assert_eq!(config.policy.max_daily_spend_usd, 5000.0);
    }

    #[test]
    fn test_from_json_invalid() {
        assert!(EngineConfig::from_json("not json").is_err());
    }
}
