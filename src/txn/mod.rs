//! Transaction model
//!
//! The subset of a transaction the fee subsystem reads, the operations it
//! prices, and the response codes it produces.

pub mod accessor;
pub mod functionality;
pub mod response;

pub use accessor::{
    AccountId, Key, OpMeta, SigPair, TransactionId, TxnAccessor, DEFAULT_VALID_DURATION_SECS,
};
pub use functionality::{Operation, SubType};
pub use response::ResponseCode;
