//! Usage-based fee calculator
//!
//! Reads the published schedule, the active exchange rate and the current
//! congestion multiplier once per computation, then prices the
//! transaction's assessed usage.

use crate::calc::{ExchangeRateSource, FeeCalcError, FeeMultiplierSource, FeeObject};
use crate::fees::config::FeesConfig;
use crate::fees::priced::PricedUsageCalculator;
use crate::resource::UsageAccumulator;
use crate::schedule::ScheduleStore;
use crate::txn::{Operation, ResponseCode, SubType, TxnAccessor};
use crate::usage::{AccessorBasedUsages, UsageError};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeeError {
    #[error("Usage error: {0}")]
    Usage(#[from] UsageError),
    #[error("Calculation error: {0}")]
    Calc(#[from] FeeCalcError),
    #[error("No prices published for {0} ({1})")]
    MissingPrices(Operation, SubType),
}

impl FeeError {
    /// Status reported for a transaction whose fee could not be computed
    pub fn response_code(&self) -> ResponseCode {
        match self {
            FeeError::Usage(UsageError::Unsupported(_)) => ResponseCode::NotSupported,
            _ => ResponseCode::FailFee,
        }
    }
}

/// Fee calculator shared by the handle and estimate paths
pub struct UsageBasedFeeCalculator {
    schedule: Arc<ScheduleStore>,
    rates: Arc<dyn ExchangeRateSource>,
    multipliers: Arc<dyn FeeMultiplierSource>,
    priced: PricedUsageCalculator,
}

impl UsageBasedFeeCalculator {
    /// Calculator over the given sources and assessors
    pub fn new(
        schedule: Arc<ScheduleStore>,
        rates: Arc<dyn ExchangeRateSource>,
        multipliers: Arc<dyn FeeMultiplierSource>,
        usages: AccessorBasedUsages,
    ) -> Self {
        Self {
            schedule,
            rates,
            multipliers,
            priced: PricedUsageCalculator::new(usages),
        }
    }

    /// Calculator with the built-in assessors configured from `config`
    pub fn from_config(
        config: &FeesConfig,
        schedule: Arc<ScheduleStore>,
        rates: Arc<dyn ExchangeRateSource>,
        multipliers: Arc<dyn FeeMultiplierSource>,
    ) -> Self {
        Self::new(
            schedule,
            rates,
            multipliers,
            AccessorBasedUsages::with_defaults(config.token_transfer_usage_multiplier),
        )
    }

    /// Whether `function` has a usage assessor
    pub fn supports(&self, function: Operation) -> bool {
        self.priced.supports(function)
    }

    /// Fee of a transaction being handled, assessed into `accumulator`
    pub fn compute_fee(
        &self,
        accessor: &TxnAccessor,
        accumulator: &mut UsageAccumulator,
    ) -> Result<FeeObject, FeeError> {
        let schedule = self.schedule.current();
        let prices = schedule
            .get(accessor.function, accessor.subtype)
            .ok_or(FeeError::MissingPrices(accessor.function, accessor.subtype))?;
        let rate = self.rates.active_rate();
        let multiplier = self.multipliers.current_multiplier();

        let fees = self
            .priced
            .in_handle_fees(accessor, prices, &rate, multiplier, accumulator)?;
        log::debug!(
            "Fee for {} ({}): {} at multiplier {}",
            accessor.txn_id,
            accessor.function,
            fees,
            multiplier
        );
        Ok(fees)
    }

    /// Fee a transaction would be charged, without touching handle state
    pub fn estimate_fee(&self, accessor: &TxnAccessor) -> Result<FeeObject, FeeError> {
        let schedule = self.schedule.current();
        let prices = schedule
            .get(accessor.function, accessor.subtype)
            .ok_or(FeeError::MissingPrices(accessor.function, accessor.subtype))?;
        let rate = self.rates.active_rate();
        let multiplier = self.multipliers.current_multiplier();

        self.priced
            .extra_handle_fees(accessor, prices, &rate, multiplier)
    }
}
