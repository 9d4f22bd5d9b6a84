//! Per-operation usage assessors
//!
//! Each assessor builds a private estimate from the base transaction usage
//! plus its operation's specifics, and writes the caller's accumulator only
//! once the whole estimate succeeded.

use crate::resource::UsageAccumulator;
use crate::txn::{OpMeta, Operation, TxnAccessor};
use crate::usage::estimate::{
    BaseTransactionMeta, TxnUsageEstimate, BASIC_ACCOUNT_AMT_SIZE, BASIC_ENTITY_ID_SIZE,
    LONG_SIZE, NFT_TRANSFER_SIZE, RECEIPT_STORAGE_TIME_SEC, TX_HASH_SIZE,
};
use crate::usage::sig_usage::SigUsage;
use std::collections::BTreeMap;
use thiserror::Error;

/// Default weight of each token and token transfer in a crypto transfer
pub const DEFAULT_TOKEN_TRANSFER_USAGE_MULTIPLIER: u64 = 380;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UsageError {
    #[error("No usage assessor for {0}")]
    Unsupported(Operation),
    #[error("{0} transaction is missing its operation details")]
    MissingOpMeta(Operation),
}

/// Estimates the resources an operation consumes
pub trait UsageAssessor: Send + Sync {
    fn assess(
        &self,
        sig_usage: &SigUsage,
        accessor: &TxnAccessor,
        into: &mut UsageAccumulator,
    ) -> Result<(), UsageError>;
}

fn base_estimate(sig_usage: &SigUsage, accessor: &TxnAccessor) -> TxnUsageEstimate {
    TxnUsageEstimate::new(&BaseTransactionMeta::from_accessor(accessor), *sig_usage)
}

// =============================================================================
// Consensus submit message
// =============================================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct SubmitMessageUsage;

impl UsageAssessor for SubmitMessageUsage {
    fn assess(
        &self,
        sig_usage: &SigUsage,
        accessor: &TxnAccessor,
        into: &mut UsageAccumulator,
    ) -> Result<(), UsageError> {
        let num_msg_bytes = match accessor.op_meta {
            OpMeta::SubmitMessage { num_msg_bytes } => num_msg_bytes,
            _ => return Err(UsageError::MissingOpMeta(accessor.function)),
        };

        let mut estimate = base_estimate(sig_usage, accessor);
        // Topic id plus the message itself
        estimate.add_bpt(BASIC_ENTITY_ID_SIZE.saturating_add(num_msg_bytes));
        // Running hash and sequence number in the receipt
        estimate.add_network_rbs((LONG_SIZE + TX_HASH_SIZE) * RECEIPT_STORAGE_TIME_SEC);
        estimate.project_into(into);
        Ok(())
    }
}

// =============================================================================
// Crypto transfer
// =============================================================================

#[derive(Debug, Clone, Copy)]
pub struct CryptoTransferUsage {
    token_multiplier: u64,
}

impl CryptoTransferUsage {
    /// Assessor weighting token transfers by `token_multiplier`
    pub fn new(token_multiplier: u64) -> Self {
        Self { token_multiplier }
    }
}

impl Default for CryptoTransferUsage {
    fn default() -> Self {
        Self::new(DEFAULT_TOKEN_TRANSFER_USAGE_MULTIPLIER)
    }
}

impl UsageAssessor for CryptoTransferUsage {
    fn assess(
        &self,
        sig_usage: &SigUsage,
        accessor: &TxnAccessor,
        into: &mut UsageAccumulator,
    ) -> Result<(), UsageError> {
        let (tokens_involved, token_transfers, nft_transfers) = match accessor.op_meta {
            OpMeta::CryptoTransfer {
                tokens_involved,
                token_transfers,
                nft_transfers,
            } => (tokens_involved, token_transfers, nft_transfers),
            // A plain hbar transfer carries no token details
            OpMeta::None => (0, 0, 0),
            _ => return Err(UsageError::MissingOpMeta(accessor.function)),
        };

        let weighted_tokens = self.token_multiplier.saturating_mul(u64::from(tokens_involved));
        let weighted_transfers = self.token_multiplier.saturating_mul(u64::from(token_transfers));
        let hbar_transfers = u64::from(accessor.num_explicit_transfers);

        let token_bytes = weighted_tokens
            .saturating_mul(BASIC_ENTITY_ID_SIZE)
            .saturating_add(weighted_transfers.saturating_mul(BASIC_ACCOUNT_AMT_SIZE))
            .saturating_add(u64::from(nft_transfers).saturating_mul(NFT_TRANSFER_SIZE));

        let mut estimate = base_estimate(sig_usage, accessor);
        estimate.add_bpt(
            token_bytes.saturating_add(hbar_transfers.saturating_mul(BASIC_ACCOUNT_AMT_SIZE)),
        );
        estimate.add_rbs(token_bytes.saturating_mul(RECEIPT_STORAGE_TIME_SEC));
        estimate.project_into(into);
        Ok(())
    }
}

// =============================================================================
// Registry
// =============================================================================

/// Usage assessors keyed by operation
#[derive(Default)]
pub struct AccessorBasedUsages {
    assessors: BTreeMap<Operation, Box<dyn UsageAssessor>>,
}

impl AccessorBasedUsages {
    /// Registry with no assessors
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in assessor
    pub fn with_defaults(token_transfer_usage_multiplier: u64) -> Self {
        let mut usages = Self::new();
        usages.register(Operation::ConsensusSubmitMessage, SubmitMessageUsage);
        usages.register(
            Operation::CryptoTransfer,
            CryptoTransferUsage::new(token_transfer_usage_multiplier),
        );
        usages
    }

    /// Assess `function` with `assessor`, replacing any previous one
    pub fn register(&mut self, function: Operation, assessor: impl UsageAssessor + 'static) {
        self.assessors.insert(function, Box::new(assessor));
    }

    /// Whether `function` has an assessor
    pub fn supports(&self, function: Operation) -> bool {
        self.assessors.contains_key(&function)
    }

    /// Assess `accessor` into `accumulator` with its operation's assessor
    pub fn assess(
        &self,
        sig_usage: &SigUsage,
        accessor: &TxnAccessor,
        into: &mut UsageAccumulator,
    ) -> Result<(), UsageError> {
        let assessor = self
            .assessors
            .get(&accessor.function)
            .ok_or(UsageError::Unsupported(accessor.function))?;
        assessor.assess(sig_usage, accessor, into)
    }
}
