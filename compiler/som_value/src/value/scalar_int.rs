//! Machine-width integer of the numeric tower.
//!
//! `ScalarInt` wraps `i64` and deliberately does NOT implement `Add`, `Sub`,
//! `Mul`, `Div`, `Rem`, `Neg` or `Shl`. Every arithmetic method is checked and
//! returns `None` when the exact result does not fit, which is the signal the
//! tower uses to redo the operation on `BigInt`. Wraparound cannot be
//! written by accident.
//!
//! `BitAnd` and `BitXor` are implemented because they cannot overflow.

use std::fmt;
use std::ops::{BitAnd, BitXor};

use num_bigint::BigInt;

/// A 64-bit signed integer with checked-only arithmetic.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct ScalarInt(i64);

impl ScalarInt {
    pub const ZERO: Self = Self(0);
    pub const ONE: Self = Self(1);
    pub const MIN: Self = Self(i64::MIN);
    pub const MAX: Self = Self(i64::MAX);

    #[inline]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Extract the raw `i64` value.
    #[inline]
    pub const fn raw(self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Widen to arbitrary precision.
    #[inline]
    pub fn to_big(self) -> BigInt {
        BigInt::from(self.0)
    }

    /// Convert to `f64` (nearest representable double).
    #[inline]
    #[allow(
        clippy::cast_precision_loss,
        reason = "integer-to-double promotion is lossy by definition"
    )]
    pub fn to_f64(self) -> f64 {
        self.0 as f64
    }

    /// Checked addition. `None` when the sum leaves the `i64` range.
    #[inline]
    pub const fn checked_add(self, rhs: Self) -> Option<Self> {
        match self.0.checked_add(rhs.0) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Checked subtraction. `None` when the difference leaves the `i64` range.
    #[inline]
    pub const fn checked_sub(self, rhs: Self) -> Option<Self> {
        match self.0.checked_sub(rhs.0) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Checked multiplication. `None` when the product leaves the `i64` range.
    #[inline]
    pub const fn checked_mul(self, rhs: Self) -> Option<Self> {
        match self.0.checked_mul(rhs.0) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Truncating division. `None` on a zero divisor or on `i64::MIN / -1`.
    ///
    /// Callers must test `is_zero` first: the two `None` cases mean
    /// different things (error vs. promotion).
    #[inline]
    pub const fn checked_div(self, rhs: Self) -> Option<Self> {
        match self.0.checked_div(rhs.0) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Truncated remainder, sign follows the dividend. `None` only on a zero
    /// divisor; `i64::MIN rem: -1` is `0`.
    #[inline]
    pub const fn checked_rem(self, rhs: Self) -> Option<Self> {
        if rhs.0 == 0 {
            return None;
        }
        if rhs.0 == -1 {
            return Some(Self::ZERO);
        }
        Some(Self(self.0 % rhs.0))
    }

    /// Floored modulo, sign follows the divisor. `None` only on a zero divisor.
    ///
    /// - `7 % 3` = `1`
    /// - `-7 % 3` = `2`
    /// - `7 % -3` = `-2`
    #[inline]
    pub const fn checked_mod_floor(self, rhs: Self) -> Option<Self> {
        let Some(Self(rem)) = self.checked_rem(rhs) else {
            return None;
        };
        if rem != 0 && (rem < 0) != (rhs.0 < 0) {
            // |rem| < |rhs| and opposite signs, so this cannot overflow
            Some(Self(rem + rhs.0))
        } else {
            Some(Self(rem))
        }
    }

    /// Left shift that fails instead of dropping bits.
    ///
    /// `None` when `amount >= 64` or when any significant bit (including
    /// the sign) would be shifted out.
    #[inline]
    pub fn checked_shl(self, amount: u32) -> Option<Self> {
        if amount >= 64 {
            return if self.0 == 0 { Some(Self::ZERO) } else { None };
        }
        let shifted = self.0 << amount;
        if shifted >> amount == self.0 {
            Some(Self(shifted))
        } else {
            None
        }
    }
}

impl BitAnd for ScalarInt {
    type Output = Self;

    #[inline]
    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl BitXor for ScalarInt {
    type Output = Self;

    #[inline]
    fn bitxor(self, rhs: Self) -> Self {
        Self(self.0 ^ rhs.0)
    }
}

impl From<i64> for ScalarInt {
    #[inline]
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<ScalarInt> for i64 {
    #[inline]
    fn from(value: ScalarInt) -> Self {
        value.0
    }
}

impl fmt::Debug for ScalarInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ScalarInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
