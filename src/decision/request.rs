//! Decision requests.

use crate::core::{now, Timestamp};
use serde::{Deserialize, Serialize};

/// Category of action a request proposes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    /// Outbound transfer of funds
    Spend,
    /// Venture lifecycle change (create, scale, shut down)
    VentureChange,
    /// Change to the system's own behavior or configuration
    SelfModification,
    /// Anything else
    Generic,
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionType::Spend => write!(f, "spend"),
            ActionType::VentureChange => write!(f, "venture_change"),
            ActionType::SelfModification => write!(f, "self_modification"),
            ActionType::Generic => write!(f, "generic"),
        }
    }
}

/// A request for an authorization decision.
///
/// Immutable once created; every field is fixed at submission time so the
/// classification can be re-verified from an audit entry.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DecisionRequest {
    /// Unique request ID
    pub id: String,
    /// Action category
    pub action_type: ActionType,
    /// Monetary value, decisive for tiering
    pub amount: Option<f64>,
    /// Destination address for transfer-type actions
    pub destination: Option<String>,
    /// Opaque description passed to opinion sources and audit
    pub payload: String,
    /// Submission timestamp
    pub requested_at: Timestamp,
    /// Optional hard cutoff
    pub deadline: Option<Timestamp>,
}

impl DecisionRequest {
    /// Create a new request.
    pub fn new(action_type: ActionType, payload: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            action_type,
            amount: None,
            destination: None,
            payload: payload.to_string(),
            requested_at: now(),
            deadline: None,
        }
    }

    /// Set the monetary amount.
    pub fn with_amount(mut self, amount: f64) -> Self {
        self.amount = Some(amount);
        self
    }

    /// Set the destination address.
    pub fn with_destination(mut self, destination: &str) -> Self {
        self.destination = Some(destination.to_string());
        self
    }

    /// Set a hard deadline.
    pub fn with_deadline(mut self, deadline: Timestamp) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_creation() {
        let request = DecisionRequest::new(ActionType::Spend, "pay hosting invoice")
            .with_amount(42.0)
            .with_destination("0xabc");

        assert!(!request.id.is_empty());
        assert_eq!(request.action_type, ActionType::Spend);
        assert_eq!(request.amount, Some(42.0));
        assert_eq!(request.destination, Some("0xabc".to_string()));
        assert!(request.deadline.is_none());
    }

    #[test]
    fn test_unique_ids() {
        let a = DecisionRequest::new(ActionType::Generic, "a");
        let b = DecisionRequest::new(ActionType::Generic, "b");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_action_type_display() {
        assert_eq!(ActionType::Spend.to_string(), "spend");
        assert_eq!(ActionType::SelfModification.to_string(), "self_modification");
    }

    #[test]
    fn test_request_serialization() {
        let request = DecisionRequest::new(ActionType::VentureChange, "launch venture").with_amount(250.0);
        let json = serde_json::to_string(&request).unwrap();
        let parsed: DecisionRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.id, request.id);
        assert_eq!(parsed.amount, request.amount);
    }
}
