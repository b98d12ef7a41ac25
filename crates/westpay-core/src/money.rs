//! Money amounts.
//!
//! Amounts are integer paise in memory and decimal rupees in the store.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::{Add, Neg, Sub};
use std::str::FromStr;

use crate::error::WestpayError;

/// An amount of Indian rupees, held as integer paise.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    /// Zero rupees.
    pub const ZERO: Self = Self(0);

    /// Create an amount from paise.
    #[must_use]
    pub const fn from_paise(paise: i64) -> Self {
        Self(paise)
    }

    /// Create an amount from whole rupees, saturating at the `i64` paise range.
    #[must_use]
    pub const fn from_rupees(rupees: i64) -> Self {
        Self(rupees.saturating_mul(100))
    }

    /// Create an amount from whole rupees, or `None` if it does not fit in paise.
    #[must_use]
    pub const fn checked_from_rupees(rupees: i64) -> Option<Self> {
        match rupees.checked_mul(100) {
            Some(paise) => Some(Self(paise)),
            None => None,
        }
    }

    /// Create an amount from a decimal rupee value, rounding to the nearest paisa.
    ///
    /// Non-finite input yields zero.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_decimal(rupees: f64) -> Self {
        if !rupees.is_finite() {
            return Self::ZERO;
        }
        Self((rupees * 100.0).round() as i64)
    }

    /// Like [`Money::from_decimal`], but `None` for non-finite or out-of-range input.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn checked_from_decimal(rupees: f64) -> Option<Self> {
        let paise = (rupees * 100.0).round();
        // i64::MAX as f64 is 2^63, one past the largest i64.
        (paise.is_finite() && paise >= i64::MIN as f64 && paise < i64::MAX as f64)
            .then(|| Self(paise as i64))
    }

    /// Amount in paise.
    #[must_use]
    pub const fn paise(self) -> i64 {
        self.0
    }

    /// Amount as decimal rupees.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn to_decimal(self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Whether the amount is strictly greater than zero.
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Checked addition.
    #[must_use]
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Checked subtraction.
    #[must_use]
    pub const fn checked_sub(self, other: Self) -> Option<Self> {
        match self.0.checked_sub(other.0) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Apply a rate expressed in basis points (725 = 7.25 %), rounding half away from zero.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn percent_bps(self, bps: i64) -> Self {
        let scaled = self.0 as i128 * bps as i128;
        let half = if scaled >= 0 { 5_000 } else { -5_000 };
        Self(((scaled + half) / 10_000) as i64)
    }

    /// Require a strictly positive amount.
    ///
    /// # Errors
    ///
    /// Returns [`WestpayError::InvalidAmount`] for zero or negative amounts.
    pub fn ensure_positive(self) -> Result<Self, WestpayError> {
        if self.is_positive() {
            Ok(self)
        } else {
            Err(WestpayError::InvalidAmount(format!(
                "amount must be positive, got {self}"
            )))
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl FromStr for Money {
    type Err = WestpayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<f64>()
            .ok()
            .and_then(Self::checked_from_decimal)
            .ok_or_else(|| WestpayError::InvalidAmount(format!("not an amount: {s:?}")))
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl Neg for Money {
    type Output = Self;

    fn neg(self) -> Self {
        Self(-self.0)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0 % 100 == 0 {
            serializer.serialize_i64(self.0 / 100)
        } else {
            serializer.serialize_f64(self.to_decimal())
        }
    }
}

/// Wire forms accepted for an amount; older records hold numeric strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawAmount {
    Int(i64),
    Float(f64),
    Text(String),
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match RawAmount::deserialize(deserializer)? {
            RawAmount::Int(rupees) => Self::checked_from_rupees(rupees)
                .ok_or_else(|| serde::de::Error::custom(format!("amount out of range: {rupees}"))),
            RawAmount::Float(rupees) => Self::checked_from_decimal(rupees)
                .ok_or_else(|| serde::de::Error::custom(format!("amount out of range: {rupees}"))),
            RawAmount::Text(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}
