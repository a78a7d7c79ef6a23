//! Ruble prices using decimal arithmetic.
//!
//! The catalog stores prices as `numeric` rubles. Display follows the
//! Russian locale: thousands grouped with a no-break space, a decimal comma
//! only when kopecks are present, and the ruble sign as suffix.

use core::fmt;
use core::iter::Sum;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

const GROUP_SEPARATOR: char = '\u{a0}';
const RUBLE_SIGN: &str = "₽";

/// A price in rubles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Zero rubles.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a price from a decimal amount of rubles.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create a price from whole rubles.
    #[must_use]
    pub fn from_rubles(rubles: i64) -> Self {
        Self(Decimal::from(rubles))
    }

    /// The decimal amount in rubles.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Price of `quantity` units.
    #[must_use]
    pub fn times(&self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }

    /// Discount relative to a former price, as a whole percentage.
    ///
    /// Returns `None` unless `old` is strictly greater than `self`.
    /// Halves round away from zero.
    #[must_use]
    pub fn discount_percent(&self, old: Self) -> Option<u32> {
        if old.0 <= self.0 || old.0.is_zero() {
            return None;
        }
        let percent = ((old.0 - self.0) / old.0) * Decimal::ONE_HUNDRED;
        percent
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_u32()
    }

    /// Format for display, e.g. `12 990 ₽` or `1 234,50 ₽`.
    #[must_use]
    pub fn display(&self) -> String {
        let rounded = self
            .0
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        let negative = rounded.is_sign_negative() && !rounded.is_zero();
        let abs = rounded.abs();

        let whole = abs.trunc().normalize();
        let fraction = abs - whole;

        let digits = whole.to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(GROUP_SEPARATOR);
            }
            grouped.push(ch);
        }

        let mut out = String::new();
        if negative {
            out.push('-');
        }
        out.push_str(&grouped);
        if !fraction.is_zero() {
            let kopecks = (fraction * Decimal::ONE_HUNDRED).to_u32().unwrap_or(0);
            out.push_str(&format!(",{kopecks:02}"));
        }
        out.push(' ');
        out.push_str(RUBLE_SIGN);
        out
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        Self(iter.map(|p| p.0).sum())
    }
}
