//! Fee subsystem configuration

use crate::calc::CongestionMultipliers;
use crate::schedule::{DEFAULT_MAX_FEE, DEFAULT_MIN_FEE};
use crate::txn::AccountId;
use crate::usage::DEFAULT_TOKEN_TRANSFER_USAGE_MULTIPLIER;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::io::BufReader;
use std::path::Path;
use thiserror::Error;

/// Default congestion pricing table
pub const DEFAULT_CONGESTION_MULTIPLIERS: &str = "90,10x,95,25x,99,100x";

/// Account credited with network and service fees
pub const DEFAULT_FUNDING_ACCOUNT: AccountId = AccountId::num(98);

/// Seconds a transaction id is remembered for duplicate detection
pub const DEFAULT_DUPLICATE_WINDOW_SECS: i64 = 180;

/// Payers never charged fees: the treasury and the system admin
pub const DEFAULT_EXEMPT_PAYERS: [AccountId; 2] = [AccountId::num(2), AccountId::num(50)];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Duplicate window of {0} seconds is out of range")]
    InvalidDuplicateWindow(i64),
}

/// Fee subsystem configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeesConfig {
    pub token_transfer_usage_multiplier: u64,
    pub percent_congestion_multipliers: CongestionMultipliers,
    pub funding_account: AccountId,
    pub duplicate_window_secs: i64,
    pub default_min_fee: u64,
    pub default_max_fee: u64,
    /// Payers charged nothing, whatever they offered or hold
    pub exempt_payers: BTreeSet<AccountId>,
}

impl Default for FeesConfig {
    fn default() -> Self {
        Self {
            token_transfer_usage_multiplier: DEFAULT_TOKEN_TRANSFER_USAGE_MULTIPLIER,
            percent_congestion_multipliers: DEFAULT_CONGESTION_MULTIPLIERS
                .parse()
                .unwrap_or_default(),
            funding_account: DEFAULT_FUNDING_ACCOUNT,
            duplicate_window_secs: DEFAULT_DUPLICATE_WINDOW_SECS,
            default_min_fee: DEFAULT_MIN_FEE,
            default_max_fee: DEFAULT_MAX_FEE,
            exempt_payers: DEFAULT_EXEMPT_PAYERS.into_iter().collect(),
        }
    }
}

impl FeesConfig {
    /// Load from a JSON file; absent fields keep their defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let file = fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config: Self = serde_json::from_reader(reader)?;
        config.validate()?;
        log::debug!("Loaded fee configuration from {}", path.display());
        Ok(config)
    }

    /// Check the values serde cannot
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.duplicate_window_secs < 0
            || Duration::try_seconds(self.duplicate_window_secs).is_none()
        {
            return Err(ConfigError::InvalidDuplicateWindow(
                self.duplicate_window_secs,
            ));
        }
        Ok(())
    }
}
