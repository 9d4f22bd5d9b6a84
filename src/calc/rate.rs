//! Exchange rate between tinycents and tinybars

use crate::calc::overflow::{FeeCalcError, MAX_FEE};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// `hbar_equiv` hbars are worth `cent_equiv` cents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawExchangeRate")]
pub struct ExchangeRate {
    hbar_equiv: u32,
    cent_equiv: u32,
}

#[derive(Deserialize)]
struct RawExchangeRate {
    hbar_equiv: u32,
    cent_equiv: u32,
}

impl TryFrom<RawExchangeRate> for ExchangeRate {
    type Error = FeeCalcError;

    fn try_from(raw: RawExchangeRate) -> Result<Self, Self::Error> {
        Self::new(raw.hbar_equiv, raw.cent_equiv)
    }
}

impl ExchangeRate {
    /// Both sides of the rate must be positive
    pub fn new(hbar_equiv: u32, cent_equiv: u32) -> Result<Self, FeeCalcError> {
        if hbar_equiv == 0 || cent_equiv == 0 {
            return Err(FeeCalcError::InvalidRate {
                hbar_equiv,
                cent_equiv,
            });
        }
        Ok(Self {
            hbar_equiv,
            cent_equiv,
        })
    }

    /// Hbar side of the rate
    pub fn hbar_equiv(&self) -> u32 {
        self.hbar_equiv
    }

    /// Cent side of the rate
    pub fn cent_equiv(&self) -> u32 {
        self.cent_equiv
    }

    /// Convert tinycents to tinybars, truncating
    ///
    /// The product is formed in 128 bits; a quotient above `MAX_FEE` is an
    /// overflow.
    pub fn tinycents_to_tinybars(&self, tinycents: u64) -> Result<u64, FeeCalcError> {
        let tinybars =
            u128::from(tinycents) * u128::from(self.hbar_equiv) / u128::from(self.cent_equiv);
        if tinybars > u128::from(MAX_FEE) {
            return Err(FeeCalcError::Overflow);
        }
        Ok(tinybars as u64)
    }
}

/// Where the active exchange rate comes from
pub trait ExchangeRateSource: Send + Sync {
    fn active_rate(&self) -> ExchangeRate;
}

/// Exchange rate updated out of band and read per computation
#[derive(Debug)]
pub struct RateStore {
    rate: RwLock<ExchangeRate>,
}

impl RateStore {
    /// Store starting at `rate`
    pub fn new(rate: ExchangeRate) -> Self {
        Self {
            rate: RwLock::new(rate),
        }
    }

    /// Replace the active rate
    pub fn update(&self, rate: ExchangeRate) {
        log::info!(
            "Exchange rate updated to {} hbar = {} cents",
            rate.hbar_equiv,
            rate.cent_equiv
        );
        *self.rate.write() = rate;
    }
}

impl ExchangeRateSource for RateStore {
    fn active_rate(&self) -> ExchangeRate {
        *self.rate.read()
    }
}
