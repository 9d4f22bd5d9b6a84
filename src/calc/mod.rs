//! Fee calculation
//!
//! Overflow-checked conversion of usage and prices into tinybar fees, the
//! exchange rate it converts at, and the congestion multiplier it scales by.

pub mod congestion;
pub mod overflow;
pub mod rate;

pub use congestion::{
    CongestionError, CongestionMultipliers, FeeMultiplierSource, FixedMultiplier,
    ThrottleMultiplierSource,
};
pub use overflow::{non_degenerate_div, FeeCalcError, FeeObject, OverflowCheckingCalc, MAX_FEE};
pub use rate::{ExchangeRate, ExchangeRateSource, RateStore};
