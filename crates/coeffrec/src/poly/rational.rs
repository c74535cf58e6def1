use core::fmt;

use super::Poly;
use crate::field::{inv_mod, mul_mod};

/// Reduced quotient of univariate polynomials with a monic denominator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rational {
    num: Poly,
    den: Poly,
}

impl Rational {
    /// `num / den` in lowest terms; `None` if `den` is zero.
    pub fn new(num: Poly, den: Poly) -> Option<Self> {
        let lead_inv = inv_mod(den.leading(), den.prime())?;
        let g = num.gcd(&den);
        let (num, den) = if g.is_zero() || g.is_one() {
            (num, den)
        } else {
            (num.exact_div(&g)?, den.exact_div(&g)?)
        };
        Some(Self {
            num: num.scale(lead_inv),
            den: den.scale(lead_inv),
        })
    }

    /// A polynomial as a rational function.
    pub fn from_poly(num: Poly) -> Self {
        let den = Poly::one(num.prime());
        Self { num, den }
    }

    /// Numerator.
    #[inline]
    pub fn numerator(&self) -> &Poly {
        &self.num
    }

    /// Monic denominator.
    #[inline]
    pub fn denominator(&self) -> &Poly {
        &self.den
    }

    /// Split into `(numerator, denominator)`.
    pub fn into_parts(self) -> (Poly, Poly) {
        (self.num, self.den)
    }

    /// Product in lowest terms.
    pub fn mul(&self, rhs: &Self) -> Self {
        let num = &self.num * &rhs.num;
        let den = &self.den * &rhs.den;
        // Both denominators are monic, so the product is non-zero.
        Self::new(num.clone(), den).unwrap_or_else(|| Self::from_poly(num))
    }

    /// Quotient in lowest terms; `None` when `rhs` is zero.
    pub fn div(&self, rhs: &Self) -> Option<Self> {
        Self::new(&self.num * &rhs.den, &self.den * &rhs.num)
    }

    /// Value at `t = x`; `None` at a pole.
    pub fn eval(&self, x: u64) -> Option<u64> {
        let p = self.num.prime();
        let d = inv_mod(self.den.eval(x), p)?;
        Some(mul_mod(self.num.eval(x), d, p))
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.den.is_one() {
            write!(f, "{}", self.num)
        } else {
            write!(f, "({})/({})", self.num, self.den)
        }
    }
}
