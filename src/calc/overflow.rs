//! Overflow-checked fee arithmetic
//!
//! Turns a usage matrix and a schedule entry into node, network and service
//! fees in tinybars. Every multiplication and addition is checked against
//! `MAX_FEE`; nothing saturates or wraps.

use crate::calc::rate::ExchangeRate;
use crate::resource::{ResourceProvider, UsableResource, UsageAccumulator};
use crate::schedule::{FeeComponents, FeeData, FEE_DIVISOR_FACTOR};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// Constants
// =============================================================================

/// Largest representable fee, in any unit
pub const MAX_FEE: u64 = i64::MAX as u64;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeeCalcError {
    #[error("Fee computation overflowed")]
    Overflow,
    #[error("Congestion multiplier must be at least 1, got {0}")]
    InvalidMultiplier(u64),
    #[error("Invalid exchange rate {hbar_equiv} hbar = {cent_equiv} cents")]
    InvalidRate { hbar_equiv: u32, cent_equiv: u32 },
}

// =============================================================================
// Fee Object
// =============================================================================

/// Fees owed by one transaction, in tinybars
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeObject {
    pub node_fee: u64,
    pub network_fee: u64,
    pub service_fee: u64,
}

impl FeeObject {
    /// Fees in tinybars per provider
    pub fn new(node_fee: u64, network_fee: u64, service_fee: u64) -> Self {
        Self {
            node_fee,
            network_fee,
            service_fee,
        }
    }

    /// Fee owed to `provider`
    pub fn fee(&self, provider: ResourceProvider) -> u64 {
        match provider {
            ResourceProvider::Node => self.node_fee,
            ResourceProvider::Network => self.network_fee,
            ResourceProvider::Service => self.service_fee,
        }
    }

    /// Node plus network fee
    pub fn node_and_network(&self) -> Result<u64, FeeCalcError> {
        checked_add(self.node_fee, self.network_fee)
    }

    /// Sum of all three fees
    pub fn total(&self) -> Result<u64, FeeCalcError> {
        checked_add(self.node_and_network()?, self.service_fee)
    }
}

impl fmt::Display for FeeObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "node {} + network {} + service {} tinybars",
            self.node_fee, self.network_fee, self.service_fee
        )
    }
}

// =============================================================================
// Calculator
// =============================================================================

/// Stateless overflow-checked fee calculator
#[derive(Debug, Clone, Copy, Default)]
pub struct OverflowCheckingCalc;

impl OverflowCheckingCalc {
    /// Stateless calculator
    pub fn new() -> Self {
        Self
    }

    /// Fees for `usage` at `prices`, scaled by `multiplier` and converted at
    /// `rate`
    pub fn fees(
        &self,
        usage: &UsageAccumulator,
        prices: &FeeData,
        rate: &ExchangeRate,
        multiplier: u64,
    ) -> Result<FeeObject, FeeCalcError> {
        if multiplier == 0 {
            return Err(FeeCalcError::InvalidMultiplier(multiplier));
        }

        let mut fees = [0u64; 3];
        for provider in ResourceProvider::ALL {
            fees[provider.index()] =
                self.provider_fee(usage, provider, prices.components(provider), rate, multiplier)?;
        }
        Ok(FeeObject::new(fees[0], fees[1], fees[2]))
    }

    fn provider_fee(
        &self,
        usage: &UsageAccumulator,
        provider: ResourceProvider,
        components: &FeeComponents,
        rate: &ExchangeRate,
        multiplier: u64,
    ) -> Result<u64, FeeCalcError> {
        let nominal = nominal_fee(usage, provider, components)?;
        let clamped = clamp(nominal, components.min, components.max);
        let tinycents = non_degenerate_div(clamped, FEE_DIVISOR_FACTOR);
        let scaled = checked_mul(tinycents, multiplier)?;
        rate.tinycents_to_tinybars(scaled)
    }
}

/// `Σ price × usage` for one provider, in schedule units
pub fn nominal_fee(
    usage: &UsageAccumulator,
    provider: ResourceProvider,
    components: &FeeComponents,
) -> Result<u64, FeeCalcError> {
    let mut sum = 0u64;
    for resource in UsableResource::ALL {
        let units = usage.get(provider, resource);
        if units == 0 {
            continue;
        }
        sum = checked_add(sum, checked_mul(components.price(resource), units)?)?;
    }
    Ok(sum)
}

/// `x / divisor`, except that a positive `x` never rounds down to zero
pub fn non_degenerate_div(x: u64, divisor: u64) -> u64 {
    if x == 0 {
        0
    } else {
        (x / divisor).max(1)
    }
}

/// Bound `nominal` below by `min`, then above by `max`
///
/// When a schedule sets `max < min`, a nominal fee below `min` is raised to
/// `min` and one above `max` is lowered to `max`.
fn clamp(nominal: u64, min: u64, max: u64) -> u64 {
    if nominal < min {
        min
    } else if nominal > max {
        max
    } else {
        nominal
    }
}

fn checked_mul(a: u64, b: u64) -> Result<u64, FeeCalcError> {
    a.checked_mul(b)
        .filter(|product| *product <= MAX_FEE)
        .ok_or(FeeCalcError::Overflow)
}

fn checked_add(a: u64, b: u64) -> Result<u64, FeeCalcError> {
    a.checked_add(b)
        .filter(|sum| *sum <= MAX_FEE)
        .ok_or(FeeCalcError::Overflow)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::DEFAULT_MAX_FEE;
    use ResourceProvider::*;
    use UsableResource::*;

    fn unit_rate() -> ExchangeRate {
        ExchangeRate::new(1, 1).unwrap()
    }

    fn flat_prices(constant: u64, bpt: u64) -> FeeData {
        let mut components = FeeComponents::default();
        components.constant = constant;
        components.bpt = bpt;
        FeeData::uniform(components)
    }

    fn basic_usage() -> UsageAccumulator {
        let mut usage = UsageAccumulator::new();
        for provider in ResourceProvider::ALL {
            usage.set(provider, Constant, 1);
            usage.set(provider, Bpt, 100);
        }
        usage
    }

    #[test]
    fn test_basic_fees() {
        let calc = OverflowCheckingCalc::new();
        let fees = calc
            .fees(&basic_usage(), &flat_prices(50_000, 1_000), &unit_rate(), 1)
            .unwrap();
        // (50_000 + 100 * 1_000) / 1000 = 150 tinycents each
        assert_eq!(fees, FeeObject::new(150, 150, 150));
        assert_eq!(fees.total().unwrap(), 450);
        assert_eq!(fees.node_and_network().unwrap(), 300);
    }

    #[test]
    fn test_exchange_rate_and_multiplier() {
        let calc = OverflowCheckingCalc::new();
        let rate = ExchangeRate::new(1, 12).unwrap();
        let fees = calc
            .fees(&basic_usage(), &flat_prices(1_200_000, 0), &rate, 10)
            .unwrap();
        // 1_200 tinycents × 10 / 12
        assert_eq!(fees.node_fee, 1_000);
    }

    #[test]
    fn test_non_degenerate_division() {
        assert_eq!(non_degenerate_div(0, 1000), 0);
        assert_eq!(non_degenerate_div(1, 1000), 1);
        assert_eq!(non_degenerate_div(999, 1000), 1);
        assert_eq!(non_degenerate_div(2_999, 1000), 2);

        let calc = OverflowCheckingCalc::new();
        let mut usage = UsageAccumulator::new();
        usage.set(Service, Constant, 1);
        let fees = calc
            .fees(&usage, &flat_prices(1, 0), &unit_rate(), 1)
            .unwrap();
        assert_eq!(fees, FeeObject::new(0, 0, 1));
    }

    #[test]
    fn test_min_max_clamp() {
        let calc = OverflowCheckingCalc::new();
        let mut prices = flat_prices(1_000, 0);
        prices.nodedata.min = 7_000;
        prices.servicedata.max = 500;

        let fees = calc.fees(&basic_usage(), &prices, &unit_rate(), 1).unwrap();
        assert_eq!(fees.node_fee, 7);
        assert_eq!(fees.network_fee, 1);
        // Clamped to 500, then never below one tinycent
        assert_eq!(fees.service_fee, 1);
        assert_eq!(prices.networkdata.max, DEFAULT_MAX_FEE);
    }

    #[test]
    fn test_clamp_with_max_below_min() {
        assert_eq!(clamp(1_000, 7_000, 3_000), 7_000);
        assert_eq!(clamp(5_000, 7_000, 3_000), 3_000);
        assert_eq!(clamp(10_000, 7_000, 3_000), 3_000);
        assert_eq!(clamp(5_000, 1_000, 9_000), 5_000);
    }

    #[test]
    fn test_overflow_reported() {
        let calc = OverflowCheckingCalc::new();
        let mut usage = UsageAccumulator::new();
        usage.set(Node, Bpt, u64::MAX);
        let mut prices = flat_prices(0, 2);
        prices.nodedata.max = u64::MAX;

        assert_eq!(
            calc.fees(&usage, &prices, &unit_rate(), 1),
            Err(FeeCalcError::Overflow)
        );

        // Sum of in-range products overflowing
        let mut usage = UsageAccumulator::new();
        usage.set(Network, Constant, 1);
        usage.set(Network, Bpt, 1);
        let mut prices = flat_prices(MAX_FEE, 1);
        prices.networkdata.max = u64::MAX;
        assert_eq!(
            calc.fees(&usage, &prices, &unit_rate(), 1),
            Err(FeeCalcError::Overflow)
        );
    }

    #[test]
    fn test_multiplier_overflow_and_zero() {
        let calc = OverflowCheckingCalc::new();
        let usage = basic_usage();
        let prices = flat_prices(DEFAULT_MAX_FEE, 0);
        assert_eq!(
            calc.fees(&usage, &prices, &unit_rate(), u64::MAX),
            Err(FeeCalcError::Overflow)
        );
        assert_eq!(
            calc.fees(&usage, &prices, &unit_rate(), 0),
            Err(FeeCalcError::InvalidMultiplier(0))
        );
    }

    #[test]
    fn test_total_overflow() {
        let fees = FeeObject::new(MAX_FEE, 1, 0);
        assert_eq!(fees.total(), Err(FeeCalcError::Overflow));
        assert_eq!(fees.fee(Node), MAX_FEE);
    }
}
