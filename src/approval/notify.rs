//! Notification contract for human-gated decisions.
//!
//! The engine hands a request summary to whichever channel is configured
//! and gets back a correlation handle; it does not know or care which
//! channel delivered the prompt.

use crate::core::{Result, Timestamp};
use crate::decision::request::DecisionRequest;
use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

/// Human-readable summary of a request awaiting approval.
#[derive(Clone, Debug, Serialize)]
pub struct ApprovalPrompt {
    /// Request awaiting approval
    pub request_id: String,
    /// What the request proposes
    pub action: String,
    /// Monetary value, if any
    pub amount: Option<f64>,
    /// When the request auto-rejects
    pub expires_at: Timestamp,
}

impl ApprovalPrompt {
    /// Build a prompt for a request.
    pub fn for_request(request: &DecisionRequest, expires_at: Timestamp) -> Self {
        Self {
            request_id: request.id.clone(),
            action: request.payload.clone(),
            amount: request.amount,
            expires_at,
        }
    }
}

/// Delivers approval prompts to a human responder.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver the prompt; returns a correlation handle.
    async fn notify(&self, prompt: &ApprovalPrompt) -> Result<String>;
}

/// Default notifier that logs the prompt.
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn notify(&self, prompt: &ApprovalPrompt) -> Result<String> {
        info!(
            request = %prompt.request_id,
            amount = ?prompt.amount,
            expires = %prompt.expires_at,
            "approval requested: {}",
            prompt.action
        );
        Ok(prompt.request_id.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::request::ActionType;

    #[tokio::test]
    async fn test_tracing_notifier_returns_handle() {
        let request = DecisionRequest::new(ActionType::Spend, "renew domain").with_amount(2100.0);
        let prompt = ApprovalPrompt::for_request(&request, crate::core::now());

        let handle = TracingNotifier.notify(&prompt).await.unwrap();
        assert_eq!(handle, request.id);
    }

    #[test]
    fn test_prompt_carries_request_fields() {
        let request = DecisionRequest::new(ActionType::VentureChange, "shut down venture");
        let expires = crate::core::now();
        let prompt = ApprovalPrompt::for_request(&request, expires);

        assert_eq!(prompt.request_id, request.id);
        assert_eq!(prompt.action, "shut down venture");
        assert!(prompt.amount.is_none());
        assert_eq!(prompt.expires_at, expires);
    }
}
