//! Value objects for the order domain.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::OrderError;

/// Share of the subtotal charged as a transaction fee (25%).
pub fn transaction_fee_rate() -> Decimal {
    Decimal::new(25, 2)
}

/// Monetary amount backed by an exact decimal.
///
/// Fee arithmetic is done in decimal so that
/// `net_total == subtotal + subtotal * rate` holds exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Creates a money amount from a decimal value.
    pub fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Creates a money amount from an integer number of cents.
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, 2))
    }

    /// Returns zero money.
    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    /// Returns the underlying decimal amount.
    pub fn amount(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Multiplies by a decimal rate, or `None` if the result does not fit.
    pub fn checked_scale(&self, rate: Decimal) -> Option<Money> {
        self.0.checked_mul(rate).map(Money)
    }

    /// Adds two amounts, or `None` if the result does not fit.
    pub fn checked_add(&self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

impl FromStr for Money {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s.trim()).map(Money)
    }
}

/// Fee and net total computed from a subtotal at issuance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pricing {
    pub transaction_fee: Money,
    pub net_total: Money,
}

impl Pricing {
    /// Applies the fixed fee rate to a subtotal.
    ///
    /// Fails with [`OrderError::InvalidNumber`] when the net total would not
    /// be representable.
    pub fn for_subtotal(subtotal: Money) -> Result<Self, OrderError> {
        let transaction_fee = subtotal.checked_scale(transaction_fee_rate());
        let net_total = transaction_fee.and_then(|fee| subtotal.checked_add(fee));
        match (transaction_fee, net_total) {
            (Some(transaction_fee), Some(net_total)) => Ok(Self {
                transaction_fee,
                net_total,
            }),
            _ => Err(OrderError::InvalidNumber {
                field: "subtotal",
                value: subtotal.to_string(),
            }),
        }
    }
}

/// How malformed numeric command input is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputPolicy {
    /// Malformed or negative numbers reject the command.
    #[default]
    Strict,

    /// Malformed or negative numbers silently become zero.
    Lenient,
}

impl InputPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputPolicy::Strict => "strict",
            InputPolicy::Lenient => "lenient",
        }
    }

    /// Parses a non-negative item count.
    pub fn parse_total_items(&self, raw: &str) -> Result<u32, OrderError> {
        match raw.trim().parse::<i64>() {
            Ok(n) if n >= 0 => u32::try_from(n).map_err(|_| OrderError::InvalidNumber {
                field: "total_items",
                value: raw.to_string(),
            }),
            Ok(_) => self.default_or(
                0,
                OrderError::NegativeAmount {
                    field: "total_items",
                },
            ),
            Err(_) => self.default_or(
                0,
                OrderError::InvalidNumber {
                    field: "total_items",
                    value: raw.to_string(),
                },
            ),
        }
    }

    /// Parses a non-negative decimal subtotal small enough to be priced.
    pub fn parse_subtotal(&self, raw: &str) -> Result<Money, OrderError> {
        match raw.parse::<Money>() {
            Ok(money) if money.is_negative() => {
                self.default_or(Money::zero(), OrderError::NegativeAmount { field: "subtotal" })
            }
            Ok(money) if Pricing::for_subtotal(money).is_ok() => Ok(money),
            _ => self.default_or(
                Money::zero(),
                OrderError::InvalidNumber {
                    field: "subtotal",
                    value: raw.to_string(),
                },
            ),
        }
    }

    fn default_or<T>(&self, fallback: T, err: OrderError) -> Result<T, OrderError> {
        match self {
            InputPolicy::Strict => Err(err),
            InputPolicy::Lenient => {
                tracing::warn!(error = %err, "numeric input defaulted to zero");
                Ok(fallback)
            }
        }
    }
}

impl FromStr for InputPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(InputPolicy::Strict),
            "lenient" => Ok(InputPolicy::Lenient),
            other => Err(format!("unknown input policy: {other}")),
        }
    }
}
