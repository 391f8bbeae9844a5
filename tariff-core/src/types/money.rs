//! Money is always represented in integer cents. Duty computation rounds
//! only once, at the end, using banker's rounding (round-half-to-even),
//! per spec.md §4.9 Step 5.

use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

/// An amount of U.S. dollars, stored as integer cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    pub fn cents(self) -> i64 {
        self.0
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// `value * rate`, rounded half-to-even to the nearest cent.
    pub fn apply_rate(self, rate: f64) -> Money {
        let exact = self.0 as f64 * rate;
        Money(round_half_to_even(exact))
    }

    pub fn checked_sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

/// Round-half-to-even ("banker's rounding") to the nearest integer.
pub fn round_half_to_even(x: f64) -> i64 {
    let floor = x.floor();
    let diff = x - floor;
    let floor_i = floor as i64;
    if diff < 0.5 {
        floor_i
    } else if diff > 0.5 {
        floor_i + 1
    } else if floor_i % 2 == 0 {
        floor_i
    } else {
        floor_i + 1
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

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::ZERO, |a, b| a + b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn applies_rate_with_rounding() {
        let v = Money::from_cents(10_000_00);
        assert_eq!(v.apply_rate(0.25).cents(), 2_500_00);
    }

    #[test]
    fn banker_rounding_ties_to_even() {
        assert_eq!(round_half_to_even(2.5), 2);
        assert_eq!(round_half_to_even(3.5), 4);
        assert_eq!(round_half_to_even(-2.5), -2);
    }
}
