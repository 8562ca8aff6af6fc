//! Policy Module
//!
//! Hard constraints between tier approval and execution:
//! - Whitelist, per-transaction, daily, and multi-signature checks
//! - Atomic daily spend accounting

pub mod gate;
pub mod ledger;

pub use gate::{EvaluatedLimits, PolicyCheck, PolicyGate, PolicyViolation};
pub use ledger::DailySpendLedger;
