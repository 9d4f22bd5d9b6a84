//! Fee engine: resource-based transaction fees for a permissioned ledger
//!
//! This crate provides the fee-pricing and charging core of a ledger node:
//! - Resource model of providers, resources and usage matrices
//! - Exact calibration of a multi-resource fee schedule from canonical prices
//! - Overflow-checked fee calculation with exchange rate and congestion pricing
//! - Per-operation usage assessment
//! - Duplicate, due-diligence and full charging policies
//!
//! # Example
//!
//! ```rust
//! use fee_engine::calc::{ExchangeRate, FixedMultiplier, RateStore};
//! use fee_engine::fees::{FeesConfig, UsageBasedFeeCalculator};
//! use fee_engine::schedule::{FeeComponents, FeeData, FeeSchedule, ScheduleStore};
//! use fee_engine::txn::{Operation, SubType, TxnAccessor};
//! use std::sync::Arc;
//!
//! // Publish a schedule charging a flat constant price per provider
//! let mut components = FeeComponents::default();
//! components.constant = 1_200_000;
//! let mut schedule = FeeSchedule::new();
//! schedule.insert(Operation::CryptoTransfer, SubType::Default, FeeData::uniform(components));
//!
//! let calculator = UsageBasedFeeCalculator::from_config(
//!     &FeesConfig::default(),
//!     Arc::new(ScheduleStore::new(schedule)),
//!     Arc::new(RateStore::new(ExchangeRate::new(1, 12).unwrap())),
//!     Arc::new(FixedMultiplier::default()),
//! );
//!
//! let txn: TxnAccessor = serde_json::from_str(r#"{
//!     "txn_id": { "payer": "0.0.1001", "valid_start": "2024-01-01T00:00:00Z" },
//!     "node_account": "0.0.3",
//!     "function": "CryptoTransfer",
//!     "offered_fee": 100000000,
//!     "payer_key": { "ed25519": "00112233" }
//! }"#).unwrap();
//!
//! let fees = calculator.estimate_fee(&txn).unwrap();
//! assert_eq!(fees.total().unwrap(), 300);
//! ```

pub mod calc;
pub mod charging;
pub mod cli;
pub mod fees;
pub mod resource;
pub mod schedule;
pub mod txn;
pub mod usage;

// Re-export commonly used types
pub use calc::{ExchangeRate, FeeCalcError, FeeObject, OverflowCheckingCalc, MAX_FEE};
pub use charging::{
    ChargeExecutor, DuplicateClassification, HandleContext, InMemoryLedger, PolicyOutcome,
    TxnChargingPolicyAgent, TxnIdRecentHistory,
};
pub use fees::{FeeError, FeesConfig, UsageBasedFeeCalculator};
pub use resource::{ResourceProvider, UsableResource, UsageAccumulator};
pub use schedule::{
    CalibrationData, CalibrationError, FeeData, FeeSchedule, FeeScheduleCalibrator, ScheduleStore,
};
pub use txn::{AccountId, Operation, ResponseCode, SubType, TxnAccessor};
pub use usage::{AccessorBasedUsages, UsageAssessor, UsageError};
