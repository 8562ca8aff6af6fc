//! Audit Module
//!
//! Append-only, tamper-evident decision record:
//! - Hash-chained entries, written before any verdict is released
//! - Queries by request, tier, and time range

pub mod entry;
pub mod filter;
pub mod log;

pub use entry::{AuditEntry, EntryId};
pub use filter::AuditFilter;
pub use log::{AuditLog, ChainVerification};
