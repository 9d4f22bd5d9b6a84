//! Fee schedule calibration
//!
//! Derives integer resource prices for every priced (operation, subtype)
//! from the calibration inputs:
//!
//! 1. `generic[p][r] = weight[p] / capacity[r]` for each measured resource
//! 2. `generic[p][CONSTANT] = S[p] * constW / (1 - constW)`, where `S[p]` sums
//!    the measured generic prices of provider `p`
//! 3. `genericTotal = Σ generic[p][r] * canonicalUsage[p][r]`
//! 4. `normalizingFactor = 1000 * canonicalPrice / genericTotal * 10^10`
//! 5. `price[p][r] = round_half_up(normalizingFactor * generic[p][r])`
//!
//! Every step is exact; the only rounding is the final one.

use crate::resource::{
    ResourceProvider, UsableResource, UsageAccumulator, NUM_PROVIDERS, NUM_RESOURCES,
};
use crate::schedule::assets::CalibrationSource;
use crate::schedule::decimal::{round_half_up, to_exact_i64};
use crate::schedule::entry::{
    rational_power_of_ten, FeeComponents, FeeData, FeeSchedule, DEFAULT_MAX_FEE, DEFAULT_MIN_FEE,
};
use crate::schedule::error::CalibrationError;
use crate::txn::{Operation, SubType};
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Zero};

// =============================================================================
// Constants
// =============================================================================

/// Schedule prices are published in 1/SCHEDULE_MULTIPLIER tinycents
pub const SCHEDULE_MULTIPLIER: u64 = 1_000;

/// log10 of tinycents per US dollar
const USD_TO_TINYCENTS_EXPONENT: usize = 10;

/// Unrounded price of each (provider, resource)
pub type GenericPrices = [[BigRational; NUM_RESOURCES]; NUM_PROVIDERS];

fn zero_prices() -> GenericPrices {
    std::array::from_fn(|_| std::array::from_fn(|_| BigRational::zero()))
}

// =============================================================================
// Calibrator
// =============================================================================

/// Builds fee schedule entries from a calibration source
pub struct FeeScheduleCalibrator<'a, S: CalibrationSource> {
    source: &'a S,
    min_fee: u64,
    max_fee: u64,
}

impl<'a, S: CalibrationSource> FeeScheduleCalibrator<'a, S> {
    /// Calibrator with the default min/max bounds
    pub fn new(source: &'a S) -> Self {
        Self {
            source,
            min_fee: DEFAULT_MIN_FEE,
            max_fee: DEFAULT_MAX_FEE,
        }
    }

    /// Bounds written into every published component
    pub fn with_bounds(mut self, min_fee: u64, max_fee: u64) -> Self {
        self.min_fee = min_fee;
        self.max_fee = max_fee;
        self
    }

    /// Generic (unnormalized) prices of an operation
    pub fn generic_prices_for(&self, function: Operation) -> Result<GenericPrices, CalibrationError> {
        let const_weight = self.source.constant_weight(function)?.into_inner();
        let const_ratio = &const_weight / (BigRational::one() - &const_weight);

        let mut generic = zero_prices();
        for provider in ResourceProvider::ALL {
            let weight = self.source.provider_weight(provider)?.into_inner();
            let row = &mut generic[provider.index()];

            let mut measured_sum = BigRational::zero();
            for resource in UsableResource::measured() {
                let capacity = self.source.capacity(resource)?.into_inner();
                let price = &weight / capacity;
                measured_sum += &price;
                row[resource.index()] = price;
            }
            row[UsableResource::Constant.index()] = measured_sum * &const_ratio;
        }
        Ok(generic)
    }

    /// Calibrated prices of one (operation, subtype)
    pub fn canonical_prices_for(
        &self,
        function: Operation,
        subtype: SubType,
    ) -> Result<FeeData, CalibrationError> {
        let generic = self.generic_prices_for(function)?;
        let usage = self.source.canonical_usage(function, subtype)?;
        let canonical_price = self.source.canonical_price(function, subtype)?.into_inner();

        let generic_total = generic_total(&generic, &usage);
        if generic_total.is_zero() {
            return Err(CalibrationError::ZeroGenericPrice(function, subtype));
        }

        let normalizing_factor = BigRational::from_integer(BigInt::from(SCHEDULE_MULTIPLIER))
            * canonical_price
            / generic_total
            * rational_power_of_ten(USD_TO_TINYCENTS_EXPONENT);

        let mut prices = FeeData::default();
        for provider in ResourceProvider::ALL {
            let mut components =
                FeeComponents::default().with_bounds(self.min_fee, self.max_fee);
            for resource in UsableResource::ALL {
                let exact = &normalizing_factor * &generic[provider.index()][resource.index()];
                let price = to_exact_i64(&round_half_up(&exact))
                    .and_then(|p| u64::try_from(p).ok())
                    .ok_or(CalibrationError::UnrepresentablePrice(
                        function, subtype, resource, provider,
                    ))?;
                components.set_price(resource, price);
            }
            *prices.components_mut(provider) = components;
        }
        Ok(prices)
    }

    /// Calibrate every (operation, subtype) that has a canonical price
    pub fn build_schedule(&self) -> Result<FeeSchedule, CalibrationError> {
        let mut schedule = FeeSchedule::new();
        for (function, subtype) in self.source.priced_pairs() {
            let prices = self.canonical_prices_for(function, subtype)?;
            log::debug!(
                "Calibrated {} ({}): node constant {}, network constant {}, service constant {}",
                function,
                subtype,
                prices.nodedata.constant,
                prices.networkdata.constant,
                prices.servicedata.constant
            );
            schedule.insert(function, subtype, prices);
        }
        log::info!("Calibrated {} fee schedule entries", schedule.len());
        Ok(schedule)
    }
}

fn generic_total(generic: &GenericPrices, usage: &UsageAccumulator) -> BigRational {
    let mut total = BigRational::zero();
    for (provider, resource, units) in usage.non_zero() {
        total += &generic[provider.index()][resource.index()]
            * BigRational::from_integer(BigInt::from(units));
    }
    total
}
