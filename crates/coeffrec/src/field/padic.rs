//! Fixed-precision p-adic numbers.
//!
//! A non-zero value is `p^valuation · unit` where the unit is known modulo
//! `p^digits`. Multiplication and division keep the smaller digit count;
//! addition loses one digit for every power of `p` that cancels. A sum that
//! cancels completely is a zero known only up to `O(p^valuation)` and
//! carries `digits == 0`, the "lost all digits" state.
//!
//! The modulus `p^digits` must fit in a `u64` so that unit products fit in a
//! `u128`; [`crate::Settings::validate`] enforces this.
//!
//! # Example
//!
//! ```
//! use coeffrec::field::PAdic;
//!
//! let p = 65_521;
//! let x = PAdic::from_i64(3 * p as i64 * p as i64, p, 4);
//! assert_eq!(x.valuation(), 2);
//! assert_eq!(x.digits(), 4);
//!
//! // Complete cancellation exhausts the digits.
//! let z = x.sub(&x);
//! assert_eq!(z.digits(), 0);
//! ```

use core::fmt;

use super::modp::{inv_mod, mul_mod};
use crate::error::ArithmeticError;

/// A p-adic number with finite relative precision.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct PAdic {
    prime: u64,
    /// Number of known base-p digits of the unit.
    digits: u32,
    valuation: i32,
    /// Unit part modulo `p^digits`; zero exactly when `digits == 0`.
    unit: u64,
}

/// `p^k`, saturating to `u64::MAX` (callers keep `p^digits` in range).
#[inline]
fn pow_u64(p: u64, k: u32) -> u64 {
    p.checked_pow(k).unwrap_or(u64::MAX)
}

/// Strip factors of `p` from a non-zero `v`, returning `(v / p^n, n)`.
fn split_valuation(mut v: u128, p: u64) -> (u128, i32) {
    let mut n = 0;
    let p = p as u128;
    while v != 0 && v % p == 0 {
        v /= p;
        n += 1;
    }
    (v, n)
}

impl PAdic {
    /// Zero known to absolute precision `O(p^valuation)`.
    #[inline]
    pub const fn zero_with_precision(prime: u64, valuation: i32) -> Self {
        Self {
            prime,
            digits: 0,
            valuation,
            unit: 0,
        }
    }

    /// `p^n` with the full digit budget.
    pub fn p_power(prime: u64, digits: u32, n: i32) -> Self {
        Self {
            prime,
            digits,
            valuation: n,
            unit: 1,
        }
    }

    /// Embed an integer with `digits` digits of precision.
    ///
    /// Zero embeds as `O(p^digits)`.
    pub fn from_i64(value: i64, prime: u64, digits: u32) -> Self {
        if value == 0 {
            return Self::zero_with_precision(prime, digits as i32);
        }
        let modulus = pow_u64(prime, digits);
        let (unit, n) = split_valuation(value.unsigned_abs() as u128, prime);
        let mut unit = (unit % modulus as u128) as u64;
        if value < 0 {
            unit = modulus - unit;
        }
        Self {
            prime,
            digits,
            valuation: n,
            unit,
        }
    }

    /// Embed a non-negative integer, e.g. a random residue mod `p^digits`.
    pub fn from_u64(value: u64, prime: u64, digits: u32) -> Self {
        if value == 0 {
            return Self::zero_with_precision(prime, digits as i32);
        }
        let modulus = pow_u64(prime, digits);
        let (unit, n) = split_valuation(value as u128, prime);
        Self {
            prime,
            digits,
            valuation: n,
            unit: (unit % modulus as u128) as u64,
        }
    }

    /// Characteristic of the residue field.
    #[inline]
    pub const fn prime(&self) -> u64 {
        self.prime
    }

    /// Remaining relative precision in base-p digits.
    #[inline]
    pub const fn digits(&self) -> u32 {
        self.digits
    }

    /// Order of vanishing; for a zero this is its absolute precision.
    #[inline]
    pub const fn valuation(&self) -> i32 {
        self.valuation
    }

    /// Unit part modulo `p^digits`.
    #[inline]
    pub const fn unit(&self) -> u64 {
        self.unit
    }

    /// True when no digits are known.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.digits == 0
    }

    fn check_prime(&self, rhs: &Self) -> Result<(), ArithmeticError> {
        if self.prime == rhs.prime {
            Ok(())
        } else {
            Err(ArithmeticError::PrimeMismatch {
                left: self.prime,
                right: rhs.prime,
            })
        }
    }

    /// Sum with precision tracking.
    ///
    /// Mixed primes are a logic error upstream; callers going through
    /// [`crate::field::Scalar`] get a typed error instead.
    pub fn add(&self, rhs: &Self) -> Self {
        debug_assert_eq!(self.prime, rhs.prime);
        let p = self.prime;
        // Absolute precision of each operand.
        let abs_a = self.valuation + self.digits as i32;
        let abs_b = rhs.valuation + rhs.digits as i32;
        let abs = abs_a.min(abs_b);
        let n = self.valuation.min(rhs.valuation);
        if abs <= n {
            return Self::zero_with_precision(p, abs);
        }
        let width = (abs - n) as u32;
        let modulus = pow_u64(p, width);
        let shifted = |x: &Self| -> u64 {
            let shift = (x.valuation - n) as u32;
            if shift >= width || x.digits == 0 {
                0
            } else {
                mul_mod(x.unit % modulus, pow_u64(p, shift), modulus)
            }
        };
        let s = (shifted(self) as u128 + shifted(rhs) as u128) % modulus as u128;
        if s == 0 {
            return Self::zero_with_precision(p, abs);
        }
        let (unit, v) = split_valuation(s, p);
        Self {
            prime: p,
            digits: width - v as u32,
            valuation: n + v,
            unit: unit as u64,
        }
    }

    /// Additive inverse.
    pub fn neg(&self) -> Self {
        if self.digits == 0 {
            return *self;
        }
        let modulus = pow_u64(self.prime, self.digits);
        Self {
            unit: (modulus - self.unit) % modulus,
            ..*self
        }
    }

    /// Difference with precision tracking.
    pub fn sub(&self, rhs: &Self) -> Self {
        self.add(&rhs.neg())
    }

    /// Product.
    ///
    /// # Errors
    ///
    /// [`ArithmeticError::PrimeMismatch`] for operands over different primes.
    pub fn mul(&self, rhs: &Self) -> Result<Self, ArithmeticError> {
        self.check_prime(rhs)?;
        let valuation = self.valuation + rhs.valuation;
        if self.digits == 0 || rhs.digits == 0 {
            // O(p^a) · p^b u = O(p^(a+b))
            return Ok(Self::zero_with_precision(self.prime, valuation));
        }
        let digits = self.digits.min(rhs.digits);
        let modulus = pow_u64(self.prime, digits);
        Ok(Self {
            prime: self.prime,
            digits,
            valuation,
            unit: mul_mod(self.unit % modulus, rhs.unit % modulus, modulus),
        })
    }

    /// Multiplicative inverse.
    ///
    /// # Errors
    ///
    /// [`ArithmeticError::DigitsExhausted`] when no digits are known.
    pub fn inv(&self) -> Result<Self, ArithmeticError> {
        if self.digits == 0 {
            return Err(ArithmeticError::DigitsExhausted);
        }
        let modulus = pow_u64(self.prime, self.digits);
        let unit = inv_mod(self.unit, modulus).ok_or(ArithmeticError::DivisionByZero)?;
        Ok(Self {
            prime: self.prime,
            digits: self.digits,
            valuation: -self.valuation,
            unit,
        })
    }

    /// Quotient.
    ///
    /// # Errors
    ///
    /// Prime mismatch, or a divisor without digits.
    pub fn div(&self, rhs: &Self) -> Result<Self, ArithmeticError> {
        self.check_prime(rhs)?;
        self.mul(&rhs.inv()?)
    }
}

impl fmt::Display for PAdic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.digits == 0 {
            write!(f, "O({}^{})", self.prime, self.valuation)
        } else {
            write!(
                f,
                "{}·{}^{} + O({}^{})",
                self.unit,
                self.prime,
                self.valuation,
                self.prime,
                self.valuation + self.digits as i32
            )
        }
    }
}
