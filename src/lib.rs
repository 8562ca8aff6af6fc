//! # Qualia Engine
//!
//! A tiered decision authorization engine gating every consequential
//! action behind the appropriate level of scrutiny:
//! - **Tier Classifier**: routes each request to autonomous execution,
//!   council consensus, or human approval from configured thresholds
//! - **Council**: concurrent multi-source deliberation with weighted
//!   consensus and a chairman tie-break
//! - **Approval**: human sign-off with fail-closed timeouts
//! - **Policy Gate**: spending limits and whitelist enforcement before
//!   any execution is authorized
//! - **Audit**: append-only, hash-chained record of every decision,
//!   written before the verdict is released
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use qualia_engine::config::EngineConfig;
//! use qualia_engine::decision::{ActionType, DecisionEngine, DecisionRequest};
//!
//! #[tokio::main]
//! async fn main() {
//!     let engine = DecisionEngine::new(EngineConfig::default());
//!
//!     let request = DecisionRequest::new(ActionType::Spend, "renew api subscription")
//!         .with_amount(25.0)
//!         .with_destination("0xa11ce");
//!
//!     let verdict = engine.decide(request).await.unwrap();
//!     println!("approved: {} ({})", verdict.approved, verdict.reason);
//! }
//! ```

pub mod approval;
pub mod audit;
pub mod config;
pub mod core;
pub mod council;
pub mod decision;
pub mod monitoring;
pub mod policy;

pub use crate::core::error::{Error, Result};
