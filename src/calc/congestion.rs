//! Congestion pricing
//!
//! Fees are multiplied while the network is busy. The multiplier table is
//! configured as a property string of `threshold,multiplier` pairs, for
//! example `"90,10x,95,25x,99,100x"`: at 90% utilization or above fees are
//! multiplied by 10, at 95% by 25, at 99% by 100.

use crate::calc::overflow::FeeCalcError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};
use thiserror::Error;

/// Multiplier applied when no threshold is reached
pub const NO_CONGESTION_MULTIPLIER: u64 = 1;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CongestionError {
    #[error("Congestion multipliers must come in threshold,multiplier pairs: {0:?}")]
    UnpairedEntry(String),
    #[error("Invalid utilization threshold {0:?}")]
    InvalidThreshold(String),
    #[error("Invalid multiplier {0:?}")]
    InvalidMultiplier(String),
    #[error("Thresholds must be strictly increasing: {0:?}")]
    NotIncreasing(String),
}

/// Ordered utilization thresholds and their multipliers
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CongestionMultipliers {
    thresholds: Vec<(u32, u64)>,
}

impl CongestionMultipliers {
    /// Multiplier for the given utilization percentage
    pub fn multiplier_for(&self, utilization_percent: u32) -> u64 {
        self.thresholds
            .iter()
            .rev()
            .find(|(threshold, _)| utilization_percent >= *threshold)
            .map(|(_, multiplier)| *multiplier)
            .unwrap_or(NO_CONGESTION_MULTIPLIER)
    }

    /// Configured `(threshold, multiplier)` pairs
    pub fn thresholds(&self) -> &[(u32, u64)] {
        &self.thresholds
    }
}

impl FromStr for CongestionMultipliers {
    type Err = CongestionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect();
        if parts.len() % 2 != 0 {
            return Err(CongestionError::UnpairedEntry(s.to_string()));
        }

        let mut thresholds: Vec<(u32, u64)> = Vec::with_capacity(parts.len() / 2);
        for pair in parts.chunks(2) {
            let threshold: u32 = pair[0]
                .parse()
                .ok()
                .filter(|t| *t <= 100)
                .ok_or_else(|| CongestionError::InvalidThreshold(pair[0].to_string()))?;
            let multiplier: u64 = pair[1]
                .strip_suffix(&['x', 'X'][..])
                .unwrap_or(pair[1])
                .parse()
                .ok()
                .filter(|m| *m >= 1)
                .ok_or_else(|| CongestionError::InvalidMultiplier(pair[1].to_string()))?;

            if let Some((last, _)) = thresholds.last() {
                if threshold <= *last {
                    return Err(CongestionError::NotIncreasing(s.to_string()));
                }
            }
            thresholds.push((threshold, multiplier));
        }
        Ok(Self { thresholds })
    }
}

impl TryFrom<String> for CongestionMultipliers {
    type Error = CongestionError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<CongestionMultipliers> for String {
    fn from(multipliers: CongestionMultipliers) -> Self {
        multipliers.to_string()
    }
}

impl fmt::Display for CongestionMultipliers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .thresholds
            .iter()
            .map(|(threshold, multiplier)| format!("{},{}x", threshold, multiplier))
            .collect();
        f.write_str(&rendered.join(","))
    }
}

// =============================================================================
// Multiplier sources
// =============================================================================

/// Where the current congestion multiplier comes from
pub trait FeeMultiplierSource: Send + Sync {
    /// Multiplier for the next fee computation, always at least 1
    fn current_multiplier(&self) -> u64;
}

/// Constant multiplier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedMultiplier(u64);

impl FixedMultiplier {
    /// A multiplier below 1 would discount fees and is rejected
    pub fn new(multiplier: u64) -> Result<Self, FeeCalcError> {
        if multiplier < NO_CONGESTION_MULTIPLIER {
            return Err(FeeCalcError::InvalidMultiplier(multiplier));
        }
        Ok(Self(multiplier))
    }
}

impl Default for FixedMultiplier {
    fn default() -> Self {
        Self(NO_CONGESTION_MULTIPLIER)
    }
}

impl FeeMultiplierSource for FixedMultiplier {
    fn current_multiplier(&self) -> u64 {
        self.0
    }
}

/// Multiplier driven by the throttle's reported utilization
#[derive(Debug, Default)]
pub struct ThrottleMultiplierSource {
    multipliers: CongestionMultipliers,
    utilization_percent: AtomicU32,
}

impl ThrottleMultiplierSource {
    /// Source at 0% utilization
    pub fn new(multipliers: CongestionMultipliers) -> Self {
        Self {
            multipliers,
            utilization_percent: AtomicU32::new(0),
        }
    }

    /// Record the throttle utilization, capped at 100%
    pub fn update_utilization(&self, percent: u32) {
        let percent = percent.min(100);
        let previous = self.utilization_percent.swap(percent, Ordering::SeqCst);
        let before = self.multipliers.multiplier_for(previous);
        let after = self.multipliers.multiplier_for(percent);
        if before != after {
            log::info!(
                "Congestion multiplier changed from {}x to {}x at {}% utilization",
                before,
                after,
                percent
            );
        }
    }

    /// Last recorded utilization
    pub fn utilization_percent(&self) -> u32 {
        self.utilization_percent.load(Ordering::SeqCst)
    }
}

impl FeeMultiplierSource for ThrottleMultiplierSource {
    fn current_multiplier(&self) -> u64 {
        self.multipliers.multiplier_for(self.utilization_percent())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFAULT_TABLE: &str = "90,10x,95,25x,99,100x";

    #[test]
    fn test_parse_and_lookup() {
        let multipliers: CongestionMultipliers = DEFAULT_TABLE.parse().unwrap();
        assert_eq!(multipliers.thresholds(), &[(90, 10), (95, 25), (99, 100)]);

        assert_eq!(multipliers.multiplier_for(0), 1);
        assert_eq!(multipliers.multiplier_for(89), 1);
        assert_eq!(multipliers.multiplier_for(90), 10);
        assert_eq!(multipliers.multiplier_for(97), 25);
        assert_eq!(multipliers.multiplier_for(100), 100);
        assert_eq!(multipliers.to_string(), DEFAULT_TABLE);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            "90,10x,95".parse::<CongestionMultipliers>(),
            Err(CongestionError::UnpairedEntry(_))
        ));
        assert!(matches!(
            "101,10x".parse::<CongestionMultipliers>(),
            Err(CongestionError::InvalidThreshold(_))
        ));
        assert!(matches!(
            "90,0x".parse::<CongestionMultipliers>(),
            Err(CongestionError::InvalidMultiplier(_))
        ));
        assert!(matches!(
            "95,10x,90,25x".parse::<CongestionMultipliers>(),
            Err(CongestionError::NotIncreasing(_))
        ));
        assert_eq!("".parse::<CongestionMultipliers>().unwrap().multiplier_for(100), 1);
    }

    #[test]
    fn test_throttle_source_follows_utilization() {
        let source = ThrottleMultiplierSource::new(DEFAULT_TABLE.parse().unwrap());
        assert_eq!(source.current_multiplier(), 1);

        source.update_utilization(96);
        assert_eq!(source.current_multiplier(), 25);

        source.update_utilization(250);
        assert_eq!(source.utilization_percent(), 100);
        assert_eq!(source.current_multiplier(), 100);
    }

    #[test]
    fn test_fixed_multiplier_rejects_zero() {
        assert_eq!(
            FixedMultiplier::new(0),
            Err(FeeCalcError::InvalidMultiplier(0))
        );
        assert_eq!(FixedMultiplier::new(7).unwrap().current_multiplier(), 7);
        assert_eq!(FixedMultiplier::default().current_multiplier(), 1);
    }
}
