//! Type-safe price representation in minor currency units.
//!
//! Store webhooks report prices as decimal strings in the major unit
//! (`"19.99"`), while the catalog and the widget carry integer cents so cart
//! totals never accumulate rounding error.

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, Mul};
use core::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// A price in the smallest currency unit (e.g., cents for USD).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Price(i64);

impl Price {
    /// Zero price.
    pub const ZERO: Self = Self(0);

    /// Create a price from minor units.
    #[must_use]
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Minor units.
    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Amount in the major unit (e.g., dollars, not cents).
    #[must_use]
    pub fn amount(self) -> Decimal {
        Decimal::new(self.0, 2)
    }

    /// Parse a major-unit decimal string as sent by store webhooks.
    ///
    /// Returns `None` for malformed input or amounts that overflow `i64` cents.
    #[must_use]
    pub fn parse_major(value: &str) -> Option<Self> {
        let amount = Decimal::from_str(value.trim()).ok()?;
        amount
            .checked_mul(Decimal::ONE_HUNDRED)?
            .round()
            .to_i64()
            .map(Self)
    }

    /// Format for display in the given ISO 4217 currency, converting with `rate`.
    ///
    /// Known currencies use their symbol (`$12.50`); everything else is
    /// prefixed with the code (`SEK 12.50`). A rate that overflows the
    /// conversion is treated as `1`.
    #[must_use]
    pub fn display(self, currency: &Currency) -> String {
        let amount = self.amount();
        let converted = amount
            .checked_mul(currency.rate_decimal())
            .unwrap_or(amount)
            .round_dp(2);
        match currency_symbol(&currency.active) {
            Some(symbol) => format!("{symbol}{converted:.2}"),
            None => format!("{} {converted:.2}", currency.active),
        }
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.amount())
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl Mul<u32> for Price {
    type Output = Self;

    fn mul(self, rhs: u32) -> Self::Output {
        Self(self.0.saturating_mul(i64::from(rhs)))
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

/// The host store's active currency, as reported by the host page.
///
/// `rate` is kept as the string the host exposes (`"1.0"`); Shopify reports
/// the presentment conversion rate this way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    /// ISO 4217 currency code.
    pub active: String,
    /// Conversion rate from the shop currency.
    pub rate: String,
}

impl Currency {
    /// Conversion rate as a decimal, treating malformed rates as `1`.
    #[must_use]
    pub fn rate_decimal(&self) -> Decimal {
        Decimal::from_str(self.rate.trim()).unwrap_or(Decimal::ONE)
    }
}

impl Default for Currency {
    fn default() -> Self {
        Self {
            active: "USD".to_owned(),
            rate: "1.0".to_owned(),
        }
    }
}

fn currency_symbol(code: &str) -> Option<&'static str> {
    match code {
        "USD" | "CAD" | "AUD" | "NZD" => Some("$"),
        "EUR" => Some("€"),
        "GBP" => Some("£"),
        "JPY" => Some("¥"),
        _ => None,
    }
}
