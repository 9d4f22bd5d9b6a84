//! Usage estimation
//!
//! Turns a transaction into a provider × resource usage matrix:
//! - Signature usage from the signature map and payer key
//! - The base estimate every transaction pays
//! - Operation-specific assessors and their registry

pub mod assessors;
pub mod estimate;
pub mod sig_usage;

pub use assessors::{
    AccessorBasedUsages, CryptoTransferUsage, SubmitMessageUsage, UsageAssessor, UsageError,
    DEFAULT_TOKEN_TRANSFER_USAGE_MULTIPLIER,
};
pub use estimate::{BaseTransactionMeta, TxnUsageEstimate};
pub use sig_usage::SigUsage;
