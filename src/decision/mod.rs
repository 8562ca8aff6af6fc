//! Decision Module
//!
//! Request intake and orchestration:
//! - Decision requests and action types
//! - Tier classification from configured thresholds
//! - The engine routing each request through its authorization path

pub mod engine;
pub mod request;
pub mod tier;

pub use engine::{DecisionEngine, Verdict};
pub use request::{ActionType, DecisionRequest};
pub use tier::{Tier, TierClassifier};
