//! Currency amounts stored as integer minor units (two fractional digits).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Amount that could not be parsed as a non-negative currency value.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid amount '{0}': expected a non-negative number with at most two decimals")]
pub struct InvalidAmount(pub String);

/// Non-negative currency amount in minor units (1.00 == 100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// Build from minor units. Negative inputs are rejected.
    pub fn from_minor(minor: i64) -> Result<Self, InvalidAmount> {
        if minor < 0 {
            return Err(InvalidAmount(minor.to_string()));
        }
        Ok(Self(minor))
    }

    /// Build from whole currency units.
    pub fn from_major(major: i64) -> Result<Self, InvalidAmount> {
        major
            .checked_mul(100)
            .ok_or_else(|| InvalidAmount(major.to_string()))
            .and_then(Self::from_minor)
    }

    pub fn minor(self) -> i64 {
        self.0
    }
}

impl FromStr for Money {
    type Err = InvalidAmount;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidAmount(s.to_string());
        let trimmed = s.trim();

        let (whole, fraction) = match trimmed.split_once('.') {
            Some((w, f)) => (w, f),
            None => (trimmed, ""),
        };

        if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        if fraction.len() > 2 || !fraction.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        if trimmed.ends_with('.') {
            return Err(invalid());
        }

        let whole: i64 = whole.parse().map_err(|_| invalid())?;
        let cents: i64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i64>().map_err(|_| invalid())? * 10,
            _ => fraction.parse().map_err(|_| invalid())?,
        };

        whole
            .checked_mul(100)
            .and_then(|w| w.checked_add(cents))
            .map(Money)
            .ok_or_else(invalid)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Integer(i64),
            Float(f64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Integer(major) => Money::from_major(major).map_err(serde::de::Error::custom),
            Raw::Float(value) => {
                if !value.is_finite() || value < 0.0 {
                    return Err(serde::de::Error::custom(InvalidAmount(value.to_string())));
                }
                let minor = (value * 100.0).round();
                if minor > i64::MAX as f64 {
                    return Err(serde::de::Error::custom(InvalidAmount(value.to_string())));
                }
                Ok(Money(minor as i64))
            }
            Raw::Text(text) => text.parse().map_err(serde::de::Error::custom),
        }
    }
}
