//! Human approval state machine.
//!
//! One waiter per human-gated request. A waiter transitions exactly once
//! out of Pending, to Approved, Rejected, or TimedOut; timeouts fail
//! closed and are treated like rejections downstream.

use crate::config::ApprovalConfig;
use crate::core::{now, Error, Result, Timestamp};
use crate::decision::request::DecisionRequest;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::{watch, Mutex};
use tracing::{info, warn};

/// Status of a human approval request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApprovalStatus {
    /// Awaiting a human response
    Pending,
    /// Approved by a responder
    Approved,
    /// Rejected by a responder
    Rejected,
    /// Expired with no response
    TimedOut,
}

impl ApprovalStatus {
    /// Whether the status is terminal.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ApprovalStatus::Pending)
    }

    /// Whether the status authorizes the action.
    pub fn is_approved(&self) -> bool {
        matches!(self, ApprovalStatus::Approved)
    }
}

impl std::fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApprovalStatus::Pending => write!(f, "pending"),
            ApprovalStatus::Approved => write!(f, "approved"),
            ApprovalStatus::Rejected => write!(f, "rejected"),
            ApprovalStatus::TimedOut => write!(f, "timed_out"),
        }
    }
}

/// Tracking record for one human-gated request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApprovalWaiter {
    /// Request awaiting approval
    pub request_id: String,
    /// Current status
    pub status: ApprovalStatus,
    /// When the waiter was opened
    pub created_at: Timestamp,
    /// When an unanswered request auto-rejects
    pub expires_at: Timestamp,
    /// Who resolved it ("system" on timeout)
    pub responder_id: Option<String>,
}

/// Result of submitting a human response.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The response resolved the request
    Accepted,
    /// A terminal state was already reached; the response was ignored
    Duplicate(ApprovalStatus),
}

struct WaiterSlot {
    waiter: ApprovalWaiter,
    tx: watch::Sender<ApprovalStatus>,
}

/// Coordinates human approval waits across requests.
///
/// `wait` suspends the caller until a terminal state or the deadline;
/// `submit` accepts exactly one response per request; `withdraw` cancels
/// a pending waiter without leaking the waiting task.
pub struct ApprovalCoordinator {
    slots: Mutex<HashMap<String, WaiterSlot>>,
    config: ApprovalConfig,
}

impl ApprovalCoordinator {
    /// Create a coordinator.
    pub fn new(config: ApprovalConfig) -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            config,
        }
    }

    /// Register a pending waiter for a request.
    ///
    /// The expiry is the configured timeout, capped by the request's own
    /// deadline when one is set.
    pub async fn open(&self, request: &DecisionRequest) -> Result<ApprovalWaiter> {
        let mut slots = self.slots.lock().await;
        if slots.contains_key(&request.id) {
            return Err(Error::DuplicateRequest(request.id.clone()));
        }

        let created_at = now();
        let mut expires_at = created_at + chrono::Duration::hours(self.config.timeout_hours);
        if let Some(deadline) = request.deadline {
            expires_at = expires_at.min(deadline);
        }

        let waiter = ApprovalWaiter {
            request_id: request.id.clone(),
            status: ApprovalStatus::Pending,
            created_at,
            expires_at,
            responder_id: None,
        };

        let (tx, _rx) = watch::channel(ApprovalStatus::Pending);
        slots.insert(
            request.id.clone(),
            WaiterSlot {
                waiter: waiter.clone(),
                tx,
            },
        );

        info!(request = %request.id, expires = %expires_at, "approval waiter opened");
        Ok(waiter)
    }

    /// Suspend until the request reaches a terminal state or its deadline
    /// passes, whichever is first. Expiry resolves to TimedOut exactly
    /// once.
    pub async fn wait(&self, request_id: &str) -> Result<ApprovalWaiter> {
        let (mut rx, expires_at) = {
            let slots = self.slots.lock().await;
            let slot = slots
                .get(request_id)
                .ok_or_else(|| Error::UnknownRequest(request_id.to_string()))?;
            if slot.waiter.status.is_terminal() {
                return Ok(slot.waiter.clone());
            }
            (slot.tx.subscribe(), slot.waiter.expires_at)
        };

        let remaining = (expires_at - now()).to_std().unwrap_or_default();
        let deadline = tokio::time::Instant::now() + remaining;

        loop {
            tokio::select! {
                changed = rx.changed() => match changed {
                    Ok(()) => {
                        if rx.borrow().is_terminal() {
                            break;
                        }
                    }
                    // Slot removed: the request was withdrawn
                    Err(_) => return Err(Error::RequestWithdrawn(request_id.to_string())),
                },
                _ = tokio::time::sleep_until(deadline) => {
                    self.resolve(request_id, ApprovalStatus::TimedOut, "system").await?;
                    break;
                }
            }
        }

        let slots = self.slots.lock().await;
        slots
            .get(request_id)
            .map(|slot| slot.waiter.clone())
            .ok_or_else(|| Error::RequestWithdrawn(request_id.to_string()))
    }

    /// Submit a human response. The first response wins; later ones are
    /// ignored and logged as duplicates, not errors.
    pub async fn submit(
        &self,
        request_id: &str,
        responder_id: &str,
        approve: bool,
    ) -> Result<SubmitOutcome> {
        let status = if approve {
            ApprovalStatus::Approved
        } else {
            ApprovalStatus::Rejected
        };

        let outcome = self.resolve(request_id, status, responder_id).await?;
        if outcome == SubmitOutcome::Accepted {
            info!(request = %request_id, responder = %responder_id, status = %status, "approval resolved");
        }
        Ok(outcome)
    }

    /// Cancel a pending waiter; its waiting task observes the withdrawal
    /// instead of hanging until the deadline.
    pub async fn withdraw(&self, request_id: &str) -> Result<()> {
        let mut slots = self.slots.lock().await;
        match slots.remove(request_id) {
            Some(_) => {
                info!(request = %request_id, "approval request withdrawn");
                Ok(())
            }
            None => Err(Error::UnknownRequest(request_id.to_string())),
        }
    }

    /// Current waiter snapshot.
    pub async fn get(&self, request_id: &str) -> Option<ApprovalWaiter> {
        self.slots
            .lock()
            .await
            .get(request_id)
            .map(|slot| slot.waiter.clone())
    }

    /// Number of waiters still pending.
    pub async fn pending_count(&self) -> usize {
        self.slots
            .lock()
            .await
            .values()
            .filter(|slot| slot.waiter.status == ApprovalStatus::Pending)
            .count()
    }

    async fn resolve(
        &self,
        request_id: &str,
        status: ApprovalStatus,
        responder_id: &str,
    ) -> Result<SubmitOutcome> {
        let mut slots = self.slots.lock().await;
        let slot = slots
            .get_mut(request_id)
            .ok_or_else(|| Error::UnknownRequest(request_id.to_string()))?;

        if slot.waiter.status.is_terminal() {
            warn!(
                request = %request_id,
                current = %slot.waiter.status,
                attempted = %status,
                "late approval response ignored"
            );
            return Ok(SubmitOutcome::Duplicate(slot.waiter.status));
        }

        slot.waiter.status = status;
        slot.waiter.responder_id = Some(responder_id.to_string());
        let _ = slot.tx.send(status);
        Ok(SubmitOutcome::Accepted)
    }
}
