//! Transaction fee computation
//!
//! Configuration, priced usage, and the usage-based calculator that the
//! charging agent and fee estimates both go through.

pub mod calculator;
pub mod config;
pub mod priced;

pub use calculator::{FeeError, UsageBasedFeeCalculator};
pub use config::{ConfigError, FeesConfig};
pub use priced::PricedUsageCalculator;
