//! Council Module
//!
//! Multi-source deliberation for mid-impact decisions:
//! - Opinions with votes, confidence, and rationale
//! - The opinion source contract consumed by the engine
//! - Concurrent deliberation with weighted consensus and chairman
//!   tie-break

pub mod deliberation;
pub mod opinion;

pub use deliberation::{aggregate, ConsensusOutcome, ConsensusResult, CouncilEngine};
pub use opinion::{Opinion, OpinionSource, SourceError, VoteChoice};
