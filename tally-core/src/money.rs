use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fraction digits used by [`Money`]'s `Display` impl. Three-decimal
/// currencies can pass their own width to [`Money::format_with`].
pub const DEFAULT_FRACTION_DIGITS: u32 = 2;

/// A monetary amount in minor units (e.g. kopecks or cents).
///
/// Storing an integer sidesteps floating-point drift in balance sums. The
/// value is signed: ledger entries only ever carry positive amounts, but net
/// balances and intermediate arithmetic go negative.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub fn from_minor(minor: i64) -> Self {
        Money(minor)
    }

    pub fn minor(self) -> i64 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub fn abs(self) -> Self {
        Money(self.0.abs())
    }

    /// Even share of an N-way split. The remainder is dropped, not
    /// distributed; a 100-unit total split three ways records 33 per head
    /// and the odd unit is never booked anywhere. Callers validate
    /// `parts > 0` before splitting.
    pub fn split(self, parts: i64) -> Self {
        Money(self.0 / parts)
    }

    /// Parse a decimal-looking token into minor units.
    ///
    /// Characters are consumed left to right: at most one fractional
    /// separator (`.` or `,`) is skipped, every other character must be an
    /// ASCII digit and is appended as the next least-significant decimal
    /// digit. The separator's position does not scale the result:
    /// `"50.25"` is 5025 minor units, while `"1.5"` is 15 because one
    /// fractional digit stays one digit.
    pub fn parse(text: &str) -> Result<Self, MoneyError> {
        let mut minor: i64 = 0;
        let mut seen_separator = false;
        let mut seen_digit = false;
        for ch in text.trim().chars() {
            match ch {
                '.' | ',' if !seen_separator => seen_separator = true,
                '.' | ',' => return Err(MoneyError::DuplicateSeparator),
                '0'..='9' => {
                    seen_digit = true;
                    let digit = i64::from(ch as u8 - b'0');
                    minor = minor
                        .checked_mul(10)
                        .and_then(|value| value.checked_add(digit))
                        .ok_or(MoneyError::Overflow)?;
                }
                other => return Err(MoneyError::InvalidCharacter(other)),
            }
        }
        if !seen_digit {
            return Err(MoneyError::Empty);
        }
        Ok(Money(minor))
    }

    /// Render as `"whole.fraction"` with the fraction zero-padded to
    /// `fraction_digits` digits.
    pub fn format_with(self, fraction_digits: u32) -> String {
        let unit = 10_i64.pow(fraction_digits);
        let sign = if self.0 < 0 { "-" } else { "" };
        let magnitude = self.0.unsigned_abs();
        let whole = magnitude / unit as u64;
        let fraction = magnitude % unit as u64;
        format!(
            "{sign}{whole}.{fraction:0width$}",
            width = fraction_digits as usize
        )
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_with(DEFAULT_FRACTION_DIGITS))
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Money {
        Money(-self.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        self.0 -= rhs.0;
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        Money(iter.map(|money| money.0).sum())
    }
}

/// Error produced when an amount token cannot be parsed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("amount is empty")]
    Empty,
    #[error("unexpected character `{0}` in amount")]
    InvalidCharacter(char),
    #[error("more than one fractional separator in amount")]
    DuplicateSeparator,
    #[error("amount does not fit the supported range")]
    Overflow,
}
