//! Per-transaction response codes
//!
//! These are the outcomes visible to the submitter. None of them is fatal to
//! the node.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Final or intermediate status of a handled transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponseCode {
    Ok,
    DuplicateTransaction,
    InsufficientTxFee,
    InsufficientPayerBalance,
    PayerAccountNotFound,
    InvalidNodeAccount,
    InvalidTransactionStart,
    TransactionExpired,
    NotSupported,
    FailFee,
}

impl ResponseCode {
    /// Whether the transaction may proceed
    pub fn is_ok(&self) -> bool {
        matches!(self, ResponseCode::Ok)
    }
}

impl fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResponseCode::Ok => "OK",
            ResponseCode::DuplicateTransaction => "DUPLICATE_TRANSACTION",
            ResponseCode::InsufficientTxFee => "INSUFFICIENT_TX_FEE",
            ResponseCode::InsufficientPayerBalance => "INSUFFICIENT_PAYER_BALANCE",
            ResponseCode::PayerAccountNotFound => "PAYER_ACCOUNT_NOT_FOUND",
            ResponseCode::InvalidNodeAccount => "INVALID_NODE_ACCOUNT",
            ResponseCode::InvalidTransactionStart => "INVALID_TRANSACTION_START",
            ResponseCode::TransactionExpired => "TRANSACTION_EXPIRED",
            ResponseCode::NotSupported => "NOT_SUPPORTED",
            ResponseCode::FailFee => "FAIL_FEE",
        };
        f.write_str(name)
    }
}
