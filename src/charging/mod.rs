//! Fee charging
//!
//! This module contains:
//! - Recent transaction-id history for duplicate detection
//! - Node due-diligence screening
//! - The ledger seam fees are charged through
//! - The three charging policies and the agent choosing between them

pub mod agent;
pub mod diligence;
pub mod history;
pub mod ledger;
pub mod policy;

pub use agent::{HandleContext, PolicyOutcome, TxnChargingPolicyAgent};
pub use diligence::{AwareNodeDiligenceScreen, NodeDiligenceScreen};
pub use history::{DuplicateClassification, DuplicateHistory, HistoryRecord, TxnIdRecentHistory};
pub use ledger::{Charge, ChargeExecutor, InMemoryLedger, LedgerError};
pub use policy::{ChargingPolicy, FeeChargingPolicy};
