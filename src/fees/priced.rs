//! Priced usage
//!
//! Assesses a transaction's usage and prices it with the overflow-checked
//! calculator, either into a caller-owned accumulator (handle path) or a
//! fresh one (estimate path).

use crate::calc::{ExchangeRate, FeeObject, OverflowCheckingCalc};
use crate::fees::calculator::FeeError;
use crate::resource::UsageAccumulator;
use crate::schedule::FeeData;
use crate::txn::{Operation, TxnAccessor};
use crate::usage::{AccessorBasedUsages, SigUsage};

pub struct PricedUsageCalculator {
    usages: AccessorBasedUsages,
    calc: OverflowCheckingCalc,
}

impl PricedUsageCalculator {
    /// Prices usage assessed by `usages`
    pub fn new(usages: AccessorBasedUsages) -> Self {
        Self {
            usages,
            calc: OverflowCheckingCalc::new(),
        }
    }

    /// Whether `function` has a usage assessor
    pub fn supports(&self, function: Operation) -> bool {
        self.usages.supports(function)
    }

    /// Fees on the handle path, reusing `accumulator`
    ///
    /// On success `accumulator` holds the assessed usage; on failure it is
    /// left as the assessor found it or fully overwritten, never half-written.
    pub fn in_handle_fees(
        &self,
        accessor: &TxnAccessor,
        prices: &FeeData,
        rate: &ExchangeRate,
        multiplier: u64,
        accumulator: &mut UsageAccumulator,
    ) -> Result<FeeObject, FeeError> {
        let sig_usage = SigUsage::from_accessor(accessor);
        self.usages.assess(&sig_usage, accessor, accumulator)?;
        Ok(self.calc.fees(accumulator, prices, rate, multiplier)?)
    }

    /// Fees off the handle path, with an accumulator of their own
    pub fn extra_handle_fees(
        &self,
        accessor: &TxnAccessor,
        prices: &FeeData,
        rate: &ExchangeRate,
        multiplier: u64,
    ) -> Result<FeeObject, FeeError> {
        let mut accumulator = UsageAccumulator::new();
        self.in_handle_fees(accessor, prices, rate, multiplier, &mut accumulator)
    }
}
