//! Policy gate.
//!
//! Hard constraints checked after a tier's verdict is approved and before
//! execution is authorized. Even an approved council or human decision
//! can still be blocked here.

use crate::config::PolicyConfig;
use crate::decision::request::{ActionType, DecisionRequest};
use crate::policy::ledger::DailySpendLedger;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::warn;

/// The specific constraint violated by a failed check.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "constraint", rename_all = "snake_case")]
pub enum PolicyViolation {
    /// Destination missing from the transfer whitelist
    NotWhitelisted {
        destination: String,
    },
    /// Amount above the per-transaction limit
    PerTxLimitExceeded {
        amount: f64,
        limit: f64,
    },
    /// Amount would push the daily cumulative total over the limit
    DailyLimitExceeded {
        amount: f64,
        spent_today: f64,
        limit: f64,
    },
    /// Amount above the multi-signature threshold
    MultiSigRequired {
        amount: f64,
        threshold: f64,
    },
}

impl PolicyViolation {
    /// Configured constraint name, as reported in verdicts and audit.
    pub fn constraint_name(&self) -> &'static str {
        match self {
            PolicyViolation::NotWhitelisted { .. } => "whitelist_membership",
            PolicyViolation::PerTxLimitExceeded { .. } => "per_tx_limit",
            PolicyViolation::DailyLimitExceeded { .. } => "daily_limit",
            PolicyViolation::MultiSigRequired { .. } => "multi_sig_required",
        }
    }
}

impl std::fmt::Display for PolicyViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PolicyViolation::NotWhitelisted { destination } => {
                write!(f, "whitelist_membership: destination {destination:?} not approved")
            }
            PolicyViolation::PerTxLimitExceeded { amount, limit } => {
                write!(f, "per_tx_limit: {amount} exceeds {limit}")
            }
            PolicyViolation::DailyLimitExceeded {
                amount,
                spent_today,
                limit,
            } => write!(
                f,
                "daily_limit: {amount} on top of {spent_today} exceeds {limit}"
            ),
            PolicyViolation::MultiSigRequired { amount, threshold } => {
                write!(f, "multi_sig_required: {amount} above {threshold}")
            }
        }
    }
}

/// Limits in force when a check ran, retained for audit reproducibility.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvaluatedLimits {
    /// Per-transaction limit
    pub per_tx_limit: f64,
    /// Daily cumulative limit
    pub daily_limit: f64,
    /// Bucket total before this check
    pub daily_spent_before: f64,
    /// Multi-signature threshold
    pub multisig_threshold: f64,
}

/// Outcome of the policy gate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PolicyCheck {
    /// Whether every constraint passed
    pub passed: bool,
    /// The first violated constraint, on failure
    pub violation: Option<PolicyViolation>,
    /// Limits evaluated during the check
    pub limits: EvaluatedLimits,
}

impl PolicyCheck {
    fn pass(limits: EvaluatedLimits) -> Self {
        Self {
            passed: true,
            violation: None,
            limits,
        }
    }

    fn fail(violation: PolicyViolation, limits: EvaluatedLimits) -> Self {
        Self {
            passed: false,
            violation: Some(violation),
            limits,
        }
    }
}

/// Final hard-constraint check between tier approval and execution.
pub struct PolicyGate {
    config: PolicyConfig,
    /// Lowercased approved destinations
    whitelist: HashSet<String>,
    ledger: DailySpendLedger,
}

impl PolicyGate {
    /// Create a gate from policy limits.
    pub fn new(config: PolicyConfig) -> Self {
        let whitelist = config
            .approved_addresses
            .iter()
            .map(|addr| addr.to_lowercase())
            .collect();

        Self {
            config,
            whitelist,
            ledger: DailySpendLedger::new(),
        }
    }

    /// Evaluate all constraints for a tier-approved request, committing
    /// the spend to the daily bucket on success.
    ///
    /// Checks run in order and short-circuit on the first failure:
    /// whitelist, per-transaction limit, daily cumulative limit,
    /// multi-signature threshold.
    pub fn authorize(&self, request: &DecisionRequest) -> PolicyCheck {
        let spent_before = self.ledger.spent_today(request.action_type);
        let limits = EvaluatedLimits {
            per_tx_limit: self.config.max_single_tx_usd,
            daily_limit: self.config.max_daily_spend_usd,
            daily_spent_before: spent_before,
            multisig_threshold: self.config.multisig_threshold_usd,
        };

        // (1) whitelist membership for transfer-type actions; a missing
        // destination fails closed when a whitelist is configured
        if request.action_type == ActionType::Spend && !self.whitelist.is_empty() {
            let approved = request
                .destination
                .as_deref()
                .map(|dest| self.whitelist.contains(&dest.to_lowercase()))
                .unwrap_or(false);

            if !approved {
                let destination = request.destination.clone().unwrap_or_default();
                warn!(request = %request.id, destination = %destination, "destination not whitelisted");
                return PolicyCheck::fail(PolicyViolation::NotWhitelisted { destination }, limits);
            }
        }

        // Amountless actions carry no monetary constraints
        let Some(amount) = request.amount else {
            return PolicyCheck::pass(limits);
        };

        // (2) per-transaction limit
        if amount > self.config.max_single_tx_usd {
            warn!(request = %request.id, amount, "per-transaction limit exceeded");
            return PolicyCheck::fail(
                PolicyViolation::PerTxLimitExceeded {
                    amount,
                    limit: self.config.max_single_tx_usd,
                },
                limits,
            );
        }

        // (3) daily cumulative limit, precheck only; the commit below is
        // the atomic authority
        if spent_before + amount > self.config.max_daily_spend_usd {
            warn!(request = %request.id, amount, spent_before, "daily limit exceeded");
            return PolicyCheck::fail(
                PolicyViolation::DailyLimitExceeded {
                    amount,
                    spent_today: spent_before,
                    limit: self.config.max_daily_spend_usd,
                },
                limits,
            );
        }

        // (4) multi-signature threshold, before any commit so a blocked
        // action never counts as spend
        if amount > self.config.multisig_threshold_usd {
            warn!(request = %request.id, amount, "multi-signature required");
            return PolicyCheck::fail(
                PolicyViolation::MultiSigRequired {
                    amount,
                    threshold: self.config.multisig_threshold_usd,
                },
                limits,
            );
        }

        // Atomic re-check: a concurrent approval may have landed since
        // the precheck
        let commit = self
            .ledger
            .try_commit(request.action_type, amount, self.config.max_daily_spend_usd);

        let limits = EvaluatedLimits {
            daily_spent_before: commit.spent_before,
            ..limits
        };

        if !commit.committed {
            warn!(request = %request.id, amount, spent = commit.spent_before, "daily limit exceeded at commit");
            return PolicyCheck::fail(
                PolicyViolation::DailyLimitExceeded {
                    amount,
                    spent_today: commit.spent_before,
                    limit: self.config.max_daily_spend_usd,
                },
                limits,
            );
        }

        PolicyCheck::pass(limits)
    }
}
