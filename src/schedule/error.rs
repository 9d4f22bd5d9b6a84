//! Calibration and schedule publication errors
//!
//! All of these are configuration errors: they surface when a schedule is
//! built or loaded, never while a transaction is being handled.

use crate::resource::{ResourceProvider, UsableResource};
use crate::txn::{Operation, SubType};
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CalibrationError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("No relative weight for provider {0}")]
    MissingProviderWeight(ResourceProvider),
    #[error("Relative weight of provider {0} must be positive, got {1}")]
    NonPositiveWeight(ResourceProvider, String),
    #[error("No capacity for resource {0}")]
    MissingCapacity(UsableResource),
    #[error("Capacity of resource {0} must be positive, got {1}")]
    NonPositiveCapacity(UsableResource, String),
    #[error("No constant weight for {0}")]
    MissingConstantWeight(Operation),
    #[error("Constant weight of {0} must be strictly between 0 and 1, got {1}")]
    InvalidConstantWeight(Operation, String),
    #[error("No canonical price for {0} ({1})")]
    MissingCanonicalPrice(Operation, SubType),
    #[error("Canonical price of {0} ({1}) must be positive, got {2}")]
    NonPositiveCanonicalPrice(Operation, SubType, String),
    #[error("No canonical usage for {0} ({1})")]
    MissingCanonicalUsage(Operation, SubType),
    #[error("Canonical usage of {0} ({1}) has zero generic price")]
    ZeroGenericPrice(Operation, SubType),
    #[error("Price of {2} for {3} in {0} ({1}) is not representable as a 64-bit integer")]
    UnrepresentablePrice(Operation, SubType, UsableResource, ResourceProvider),
}
