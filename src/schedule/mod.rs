//! Fee schedule
//!
//! This module contains:
//! - Exact decimal parsing and rounding
//! - Calibration inputs and their validation
//! - The calibrator that turns canonical prices into resource prices
//! - The published schedule and its atomically swapped snapshot

pub mod assets;
pub mod calibrator;
pub mod decimal;
pub mod entry;
pub mod error;
pub mod store;

pub use assets::{CalibrationData, CalibrationSource};
pub use calibrator::{FeeScheduleCalibrator, GenericPrices, SCHEDULE_MULTIPLIER};
pub use decimal::{Decimal, DecimalError};
pub use entry::{
    FeeComponents, FeeData, FeeSchedule, DEFAULT_MAX_FEE, DEFAULT_MIN_FEE, FEE_DIVISOR_FACTOR,
    USD_TO_TINYCENTS,
};
pub use error::CalibrationError;
pub use store::ScheduleStore;
