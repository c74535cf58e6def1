//! Prime-field arithmetic for a runtime characteristic.
//!
//! Residues are stored as `u64` in `[0, p)`. Products are formed in `u128`,
//! so any prime below 2⁶³ is supported without overflow.
//!
//! # Example
//!
//! ```
//! use coeffrec::field::{inv_mod, mul_mod, ModP};
//!
//! const P: u64 = 2_147_483_647;
//! assert_eq!(mul_mod(inv_mod(3, P).unwrap_or(0), 3, P), 1);
//!
//! let a = ModP::new(-1, P);
//! assert_eq!(a.value(), P - 1);
//! ```

use core::fmt;

use crate::error::ArithmeticError;

/// `(a + b) mod p` for residues already reduced mod `p`.
#[inline]
pub const fn add_mod(a: u64, b: u64, p: u64) -> u64 {
    let s = a as u128 + b as u128;
    (s % p as u128) as u64
}

/// `(a - b) mod p` for residues already reduced mod `p`.
#[inline]
pub const fn sub_mod(a: u64, b: u64, p: u64) -> u64 {
    if a >= b {
        a - b
    } else {
        p - (b - a)
    }
}

/// `(a · b) mod p`.
#[inline]
pub const fn mul_mod(a: u64, b: u64, p: u64) -> u64 {
    ((a as u128 * b as u128) % p as u128) as u64
}

/// `-a mod p`.
#[inline]
pub const fn neg_mod(a: u64, p: u64) -> u64 {
    if a == 0 {
        0
    } else {
        p - a
    }
}

/// `base^exp mod p` by square-and-multiply.
pub const fn pow_mod(base: u64, mut exp: u64, p: u64) -> u64 {
    let mut result = 1 % p;
    let mut b = base % p;
    while exp > 0 {
        if exp & 1 == 1 {
            result = mul_mod(result, b, p);
        }
        b = mul_mod(b, b, p);
        exp >>= 1;
    }
    result
}

/// Multiplicative inverse of `a` modulo `m` via the extended Euclidean
/// algorithm.
///
/// Works for any modulus (not only primes); returns `None` when `a` is not
/// invertible.
pub const fn inv_mod(a: u64, m: u64) -> Option<u64> {
    let (mut old_r, mut r) = ((a % m) as i128, m as i128);
    let (mut old_s, mut s) = (1i128, 0i128);
    while r != 0 {
        let q = old_r / r;
        let tmp_r = old_r - q * r;
        old_r = r;
        r = tmp_r;
        let tmp_s = old_s - q * s;
        old_s = s;
        s = tmp_s;
    }
    if old_r != 1 {
        return None;
    }
    Some(old_s.rem_euclid(m as i128) as u64)
}

/// Reduce a signed integer into `[0, p)`.
#[inline]
pub const fn reduce_i64(v: i64, p: u64) -> u64 {
    (v as i128).rem_euclid(p as i128) as u64
}

/// An element of the prime field Z/pZ.
///
/// The characteristic travels with every element. Combining elements of
/// different characteristic through [`crate::field::Scalar`] is reported as
/// [`ArithmeticError::PrimeMismatch`]; the raw operator impls below assume
/// a common prime.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ModP {
    value: u64,
    prime: u64,
}

impl ModP {
    /// Element congruent to `value` modulo `prime`.
    #[inline]
    pub const fn new(value: i64, prime: u64) -> Self {
        Self {
            value: reduce_i64(value, prime),
            prime,
        }
    }

    /// Element from an unsigned residue (reduced if needed).
    #[inline]
    pub const fn from_u64(value: u64, prime: u64) -> Self {
        Self {
            value: value % prime,
            prime,
        }
    }

    /// Canonical residue in `[0, p)`.
    #[inline]
    pub const fn value(&self) -> u64 {
        self.value
    }

    /// Field characteristic.
    #[inline]
    pub const fn prime(&self) -> u64 {
        self.prime
    }

    /// True for the additive identity.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.value == 0
    }

    /// Multiplicative inverse.
    ///
    /// # Errors
    ///
    /// [`ArithmeticError::DivisionByZero`] for the zero element.
    pub fn inv(&self) -> Result<Self, ArithmeticError> {
        match inv_mod(self.value, self.prime) {
            Some(v) => Ok(Self::from_u64(v, self.prime)),
            None => Err(ArithmeticError::DivisionByZero),
        }
    }

    /// Integer power; negative exponents invert first.
    ///
    /// # Errors
    ///
    /// [`ArithmeticError::DivisionByZero`] for a negative power of zero.
    pub fn powi(&self, exp: i64) -> Result<Self, ArithmeticError> {
        let base = if exp < 0 { self.inv()? } else { *self };
        Ok(Self::from_u64(
            pow_mod(base.value, exp.unsigned_abs(), self.prime),
            self.prime,
        ))
    }

    /// Symmetric representative in `(-p/2, p/2]`, handy for printing.
    pub fn symmetric(&self) -> i64 {
        if self.value > self.prime / 2 {
            -((self.prime - self.value) as i64)
        } else {
            self.value as i64
        }
    }
}

impl core::ops::Add for ModP {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        debug_assert_eq!(self.prime, rhs.prime);
        Self::from_u64(add_mod(self.value, rhs.value, self.prime), self.prime)
    }
}

impl core::ops::Sub for ModP {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        debug_assert_eq!(self.prime, rhs.prime);
        Self::from_u64(sub_mod(self.value, rhs.value, self.prime), self.prime)
    }
}

impl core::ops::Mul for ModP {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        debug_assert_eq!(self.prime, rhs.prime);
        Self::from_u64(mul_mod(self.value, rhs.value, self.prime), self.prime)
    }
}

impl core::ops::Neg for ModP {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self::from_u64(neg_mod(self.value, self.prime), self.prime)
    }
}

impl fmt::Display for ModP {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} % {}", self.value, self.prime)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const P: u64 = 2_147_483_647;

    #[test]
    fn inverse_table_mod_5() {
        // Same table as the GF(5) inverse: 1↔1, 2↔3, 4↔4
        assert_eq!(inv_mod(1, 5), Some(1));
        assert_eq!(inv_mod(2, 5), Some(3));
        assert_eq!(inv_mod(3, 5), Some(2));
        assert_eq!(inv_mod(4, 5), Some(4));
        assert_eq!(inv_mod(0, 5), None);
    }

    #[test]
    fn inverse_mod_prime_power() {
        let m = 7u64.pow(4);
        let a = 1234u64;
        let inv = inv_mod(a, m).unwrap();
        assert_eq!(mul_mod(a, inv, m), 1);
        assert_eq!(inv_mod(49, m), None);
    }

    #[test]
    fn fermat_little_theorem() {
        for a in [2u64, 3, 12345, P - 1] {
            assert_eq!(pow_mod(a, P - 1, P), 1);
        }
    }

    #[test]
    fn signed_reduction() {
        assert_eq!(reduce_i64(-1, 7), 6);
        assert_eq!(reduce_i64(-14, 7), 0);
        assert_eq!(ModP::new(-3, 7).symmetric(), -3);
        assert_eq!(ModP::new(3, 7).symmetric(), 3);
    }

    #[test]
    fn field_operations() {
        let a = ModP::new(10, P);
        let b = ModP::new(-4, P);
        assert_eq!((a + b).value(), 6);
        assert_eq!((a - b).value(), 14);
        assert_eq!((a * b).symmetric(), -40);
        assert_eq!((a * a.inv().unwrap()).value(), 1);
        assert_eq!(a.powi(-2).unwrap() * a * a, ModP::new(1, P));
        assert!(ModP::new(0, P).inv().is_err());
    }
}
