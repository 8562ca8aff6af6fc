//! Approval Module
//!
//! Human sign-off for high-impact decisions:
//! - Per-request waiter state machine with fail-closed timeouts
//! - Suspending wait and single-writer submit operations
//! - Channel-agnostic notification contract

pub mod notify;
pub mod waiter;

pub use notify::{ApprovalPrompt, Notifier, TracingNotifier};
pub use waiter::{ApprovalCoordinator, ApprovalStatus, ApprovalWaiter, SubmitOutcome};
