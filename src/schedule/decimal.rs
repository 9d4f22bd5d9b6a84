//! Exact decimal arithmetic for calibration
//!
//! Calibration inputs are decimal strings parsed into arbitrary-precision
//! rationals, so no intermediate step of the calibration ever rounds.
//! Rounding happens once, when a price is published.

use num_bigint::{BigInt, Sign};
use num_rational::BigRational;
use num_traits::{pow, One, Signed, ToPrimitive};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

/// Largest decimal exponent accepted in calibration inputs
pub const MAX_EXPONENT: i32 = 64;

/// Decimal parsing errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecimalError {
    #[error("Invalid decimal literal: {0:?}")]
    InvalidLiteral(String),
    #[error("Exponent out of range in {0:?}")]
    ExponentOutOfRange(String),
}

/// Parse a decimal literal such as `"0.001"`, `"-2"` or `"1.5e-4"` exactly
pub fn parse_decimal(text: &str) -> Result<BigRational, DecimalError> {
    let invalid = || DecimalError::InvalidLiteral(text.to_string());
    let trimmed = text.trim();

    let (mantissa, exponent) = match trimmed.find(&['e', 'E'][..]) {
        Some(at) => {
            let exponent: i32 = trimmed[at + 1..].parse().map_err(|_| invalid())?;
            if exponent.abs() > MAX_EXPONENT {
                return Err(DecimalError::ExponentOutOfRange(text.to_string()));
            }
            (&trimmed[..at], exponent)
        }
        None => (trimmed, 0),
    };

    let (negative, unsigned) = match mantissa.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, mantissa.strip_prefix('+').unwrap_or(mantissa)),
    };
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((i, f)) => (i, f),
        None => (unsigned, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(invalid());
    }
    if !int_part.bytes().chain(frac_part.bytes()).all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let digits = format!("{}{}", int_part, frac_part);
    let mut numer = BigInt::parse_bytes(digits.as_bytes(), 10).ok_or_else(invalid)?;
    if negative {
        numer = -numer;
    }

    let scale = frac_part.len() as i32 - exponent;
    Ok(if scale >= 0 {
        BigRational::new(numer, power_of_ten(scale as usize))
    } else {
        BigRational::from_integer(numer * power_of_ten((-scale) as usize))
    })
}

/// `10^exponent`
pub fn power_of_ten(exponent: usize) -> BigInt {
    pow(BigInt::from(10u32), exponent)
}

/// Round to the nearest integer, ties away from zero
pub fn round_half_up(value: &BigRational) -> BigInt {
    let numer = value.numer().abs();
    let denom = value.denom().abs();
    let two = BigInt::from(2u32);
    let rounded = (&numer * &two + &denom) / (&denom * &two);
    if value.is_negative() {
        -rounded
    } else {
        rounded
    }
}

/// Render with at most `scale` fractional digits, rounding half up
pub fn format_decimal(value: &BigRational, scale: usize) -> String {
    let scaled = round_half_up(&(value * BigRational::from_integer(power_of_ten(scale))));
    let negative = scaled.sign() == Sign::Minus;
    let digits = scaled.abs().to_string();

    let mut text = if scale == 0 {
        digits
    } else if digits.len() > scale {
        let (int_part, frac_part) = digits.split_at(digits.len() - scale);
        format!("{}.{}", int_part, frac_part)
    } else {
        format!("0.{}{}", "0".repeat(scale - digits.len()), digits)
    };
    if text.contains('.') {
        let trimmed = text.trim_end_matches('0').trim_end_matches('.').len();
        text.truncate(trimmed);
    }
    if negative && text != "0" {
        text.insert(0, '-');
    }
    text
}

/// Convert an integral value to `i64`, if it fits
pub fn to_exact_i64(value: &BigInt) -> Option<i64> {
    value.to_i64()
}

// =============================================================================
// Decimal
// =============================================================================

/// Exact decimal value read from calibration data
///
/// Deserializes from a decimal string or an integer. Floating point JSON
/// numbers are rejected because they may already have lost precision.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Decimal(BigRational);

impl Decimal {
    /// Parse a decimal literal such as `"0.0001"` or `"1e-4"`
    pub fn parse(text: &str) -> Result<Self, DecimalError> {
        parse_decimal(text).map(Self)
    }

    /// Exact value
    pub fn value(&self) -> &BigRational {
        &self.0
    }

    /// Exact value, consuming the decimal
    pub fn into_inner(self) -> BigRational {
        self.0
    }

    /// Strictly above zero
    pub fn is_positive(&self) -> bool {
        self.0.is_positive()
    }

    /// Strictly between zero and one
    pub fn is_proper_fraction(&self) -> bool {
        self.0.is_positive() && self.0 < BigRational::one()
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_decimal(&self.0, 34))
    }
}

impl fmt::Debug for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Decimal({})", self)
    }
}

impl From<u64> for Decimal {
    fn from(value: u64) -> Self {
        Self(BigRational::from_integer(BigInt::from(value)))
    }
}

impl Serialize for Decimal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Decimal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct DecimalVisitor;

        impl serde::de::Visitor<'_> for DecimalVisitor {
            type Value = Decimal;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a decimal string or an integer")
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<Decimal, E> {
                Decimal::parse(v).map_err(E::custom)
            }

            fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<Decimal, E> {
                Ok(Decimal::from(v))
            }

            fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<Decimal, E> {
                Ok(Decimal(BigRational::from_integer(BigInt::from(v))))
            }

            fn visit_f64<E: serde::de::Error>(self, v: f64) -> Result<Decimal, E> {
                Err(E::custom(format!(
                    "inexact decimal {}; quote it as a string",
                    v
                )))
            }
        }

        deserializer.deserialize_any(DecimalVisitor)
    }
}
