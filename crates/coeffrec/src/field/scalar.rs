//! Tagged arithmetic backends.
//!
//! Black boxes and phase-space points exchange values as [`Scalar`], a
//! closed set of backends with one checked capability set. Strategy
//! selection (see [`crate::scaling`]) matches on the tag, never on runtime
//! type inspection.
//!
//! | Backend | Tag | Magnitude | Valuation |
//! |---------|-----|-----------|-----------|
//! | `f64` | [`FieldKind::Floating`] | `|x|` | n/a |
//! | [`PAdic`] | [`FieldKind::PAdic`] | `p^-n` | `n` |
//! | [`ModP`] | [`FieldKind::Finite`] | n/a | n/a |

use core::fmt;

use serde::{Deserialize, Serialize};

use super::{ModP, PAdic};
use crate::error::ArithmeticError;

/// Arithmetic backend selection.
///
/// Serialized with an internal `kind` tag, e.g. in TOML:
///
/// ```toml
/// [field]
/// kind = "padic"
/// prime = 65521
/// digits = 4
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum FieldKind {
    /// Double-precision floating point.
    Floating,
    /// p-adic numbers with `digits` digits of relative precision.
    #[serde(rename = "padic")]
    PAdic {
        /// Residue characteristic.
        prime: u64,
        /// Digits carried by freshly created values.
        digits: u32,
    },
    /// The prime field Z/pZ.
    Finite {
        /// Field characteristic.
        prime: u64,
    },
}

impl FieldKind {
    /// The Mersenne prime 2³¹ - 1 used for exact slicing by default.
    pub const MERSENNE_31: u64 = 2_147_483_647;

    /// Default finite field.
    pub const fn finite() -> Self {
        Self::Finite {
            prime: Self::MERSENNE_31,
        }
    }

    /// Default p-adic field: p = 65521 with four digits (p⁴ < 2⁶⁴).
    pub const fn padic() -> Self {
        Self::PAdic {
            prime: 65_521,
            digits: 4,
        }
    }

    /// Short backend name for messages.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Floating => "floating",
            Self::PAdic { .. } => "padic",
            Self::Finite { .. } => "finite",
        }
    }

    /// Characteristic of the exact backends.
    pub const fn prime(&self) -> Option<u64> {
        match self {
            Self::Floating => None,
            Self::PAdic { prime, .. } | Self::Finite { prime } => Some(*prime),
        }
    }
}

impl Default for FieldKind {
    fn default() -> Self {
        Self::Floating
    }
}

/// A value in one of the supported arithmetic backends.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Scalar {
    /// Floating-point value.
    Floating(f64),
    /// p-adic value.
    PAdic(PAdic),
    /// Prime-field value.
    Finite(ModP),
}

impl Scalar {
    /// Embed an integer into the backend described by `field`.
    pub fn from_i64(field: &FieldKind, value: i64) -> Self {
        match *field {
            FieldKind::Floating => Self::Floating(value as f64),
            FieldKind::PAdic { prime, digits } => Self::PAdic(PAdic::from_i64(value, prime, digits)),
            FieldKind::Finite { prime } => Self::Finite(ModP::new(value, prime)),
        }
    }

    /// Zero of the backend.
    #[inline]
    pub fn zero(field: &FieldKind) -> Self {
        Self::from_i64(field, 0)
    }

    /// One of the backend.
    #[inline]
    pub fn one(field: &FieldKind) -> Self {
        Self::from_i64(field, 1)
    }

    /// Backend name, matching [`FieldKind::name`].
    pub const fn backend(&self) -> &'static str {
        match self {
            Self::Floating(_) => "floating",
            Self::PAdic(_) => "padic",
            Self::Finite(_) => "finite",
        }
    }

    fn mixed(&self, rhs: &Self) -> ArithmeticError {
        match (self, rhs) {
            (Self::PAdic(a), Self::PAdic(b)) => ArithmeticError::PrimeMismatch {
                left: a.prime(),
                right: b.prime(),
            },
            (Self::Finite(a), Self::Finite(b)) => ArithmeticError::PrimeMismatch {
                left: a.prime(),
                right: b.prime(),
            },
            _ => ArithmeticError::MixedBackends {
                left: self.backend(),
                right: rhs.backend(),
            },
        }
    }

    /// Checked sum.
    ///
    /// # Errors
    ///
    /// Mixed backends or mismatched primes.
    pub fn add(&self, rhs: &Self) -> Result<Self, ArithmeticError> {
        match (self, rhs) {
            (Self::Floating(a), Self::Floating(b)) => Ok(Self::Floating(a + b)),
            (Self::PAdic(a), Self::PAdic(b)) if a.prime() == b.prime() => Ok(Self::PAdic(a.add(b))),
            (Self::Finite(a), Self::Finite(b)) if a.prime() == b.prime() => Ok(Self::Finite(*a + *b)),
            _ => Err(self.mixed(rhs)),
        }
    }

    /// Checked difference.
    ///
    /// # Errors
    ///
    /// Mixed backends or mismatched primes.
    pub fn sub(&self, rhs: &Self) -> Result<Self, ArithmeticError> {
        self.add(&rhs.neg())
    }

    /// Additive inverse.
    pub fn neg(&self) -> Self {
        match self {
            Self::Floating(a) => Self::Floating(-a),
            Self::PAdic(a) => Self::PAdic(a.neg()),
            Self::Finite(a) => Self::Finite(-*a),
        }
    }

    /// Checked product.
    ///
    /// # Errors
    ///
    /// Mixed backends or mismatched primes.
    pub fn mul(&self, rhs: &Self) -> Result<Self, ArithmeticError> {
        match (self, rhs) {
            (Self::Floating(a), Self::Floating(b)) => Ok(Self::Floating(a * b)),
            (Self::PAdic(a), Self::PAdic(b)) => Ok(Self::PAdic(a.mul(b)?)),
            (Self::Finite(a), Self::Finite(b)) if a.prime() == b.prime() => Ok(Self::Finite(*a * *b)),
            _ => Err(self.mixed(rhs)),
        }
    }

    /// Checked multiplicative inverse.
    ///
    /// # Errors
    ///
    /// Division by zero, or a p-adic value without digits.
    pub fn inv(&self) -> Result<Self, ArithmeticError> {
        match self {
            Self::Floating(a) if *a == 0.0 => Err(ArithmeticError::DivisionByZero),
            Self::Floating(a) => Ok(Self::Floating(1.0 / a)),
            Self::PAdic(a) => Ok(Self::PAdic(a.inv()?)),
            Self::Finite(a) => Ok(Self::Finite(a.inv()?)),
        }
    }

    /// Checked quotient.
    ///
    /// # Errors
    ///
    /// Mixed backends, mismatched primes, or a zero divisor.
    pub fn div(&self, rhs: &Self) -> Result<Self, ArithmeticError> {
        self.mul(&rhs.inv()?)
    }

    /// Integer power; negative exponents invert first.
    ///
    /// # Errors
    ///
    /// Negative power of zero.
    pub fn powi(&self, exp: i32) -> Result<Self, ArithmeticError> {
        let base = if exp < 0 { self.inv()? } else { *self };
        let mut acc = match base {
            Self::Floating(_) => Self::Floating(1.0),
            Self::PAdic(a) => Self::PAdic(PAdic::p_power(a.prime(), a.digits().max(1), 0)),
            Self::Finite(a) => Self::Finite(ModP::new(1, a.prime())),
        };
        for _ in 0..exp.unsigned_abs() {
            acc = acc.mul(&base)?;
        }
        Ok(acc)
    }

    /// True for an (approximate, for p-adics) zero.
    pub fn is_zero(&self) -> bool {
        match self {
            Self::Floating(a) => *a == 0.0,
            Self::PAdic(a) => a.is_zero(),
            Self::Finite(a) => a.is_zero(),
        }
    }

    /// Absolute value of a floating-point value.
    pub fn magnitude(&self) -> Option<f64> {
        match self {
            Self::Floating(a) => Some(a.abs()),
            _ => None,
        }
    }

    /// p-adic valuation.
    pub fn valuation(&self) -> Option<i32> {
        match self {
            Self::PAdic(a) => Some(a.valuation()),
            _ => None,
        }
    }

    /// Remaining p-adic digits.
    pub fn digits(&self) -> Option<u32> {
        match self {
            Self::PAdic(a) => Some(a.digits()),
            _ => None,
        }
    }

    /// Prime-field residue.
    pub fn residue(&self) -> Option<u64> {
        match self {
            Self::Finite(a) => Some(a.value()),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Floating(a) => write!(f, "{a:e}"),
            Self::PAdic(a) => write!(f, "{a}"),
            Self::Finite(a) => write!(f, "{a}"),
        }
    }
}
