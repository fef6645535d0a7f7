//! Exact monetary values
//!
//! Amounts are stored as whole minor units (cents) so that splitting and
//! accumulation are exact. Decimal is only used at the edges: parsing
//! user/API input and formatting for display and the wire.

use std::fmt;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value as JsonValue;

use crate::domain::result::{Error, Result};

/// A non-negative monetary amount in minor units of the ledger currency.
///
/// The server and the client exchange amounts in the same (single)
/// currency, so no currency code is carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// Create from whole minor units (e.g. cents)
    pub fn from_minor_units(minor_units: i64) -> Result<Self> {
        if minor_units < 0 {
            return Err(Error::validation(format!(
                "monetary amount cannot be negative: {}",
                minor_units
            )));
        }
        Ok(Self(minor_units))
    }

    /// Create from a decimal amount of whole currency units
    ///
    /// Rejects negative values and values with more than two fractional
    /// digits (sub-minor-unit precision never round-trips exactly).
    pub fn from_decimal(amount: Decimal) -> Result<Self> {
        if amount.is_sign_negative() {
            return Err(Error::validation(format!(
                "monetary amount cannot be negative: {}",
                amount
            )));
        }
        let minor = amount * Decimal::new(100, 0);
        if !minor.fract().is_zero() {
            return Err(Error::validation(format!(
                "monetary amount has sub-cent precision: {}",
                amount
            )));
        }
        let minor = minor.trunc().to_i64().ok_or_else(|| {
            Error::validation(format!("monetary amount out of range: {}", amount))
        })?;
        Self::from_minor_units(minor)
    }

    pub fn minor_units(&self) -> i64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Decimal view in whole currency units (scale 2)
    pub fn to_decimal(&self) -> Decimal {
        Decimal::new(self.0, 2)
    }

    /// Checked addition; `None` on overflow
    pub fn checked_add(&self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    /// Sum a sequence of amounts, failing on overflow
    pub fn sum<I: IntoIterator<Item = Money>>(amounts: I) -> Result<Money> {
        amounts.into_iter().try_fold(Money::ZERO, |acc, m| {
            acc.checked_add(m)
                .ok_or_else(|| Error::validation("monetary amount out of range"))
        })
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_decimal())
    }
}

// Wire format: a decimal in whole currency units with at most two
// fractional digits. Serialized as a quoted decimal (rust_decimal's
// default); peers that send bare JSON numbers are accepted on read.
impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        Serialize::serialize(&self.to_decimal(), serializer)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        // API peers send amounts as numbers, but some serializers quote
        // decimals; accept both.
        let value = JsonValue::deserialize(deserializer)?;
        let decimal = match value {
            JsonValue::Number(n) => n
                .to_string()
                .parse::<Decimal>()
                .map_err(|e| D::Error::custom(format!("invalid decimal: {}", e)))?,
            JsonValue::String(s) => s
                .parse::<Decimal>()
                .map_err(|e| D::Error::custom(format!("invalid decimal: {}", e)))?,
            _ => return Err(D::Error::custom("expected number or string for amount")),
        };
        Money::from_decimal(decimal).map_err(D::Error::custom)
    }
}
