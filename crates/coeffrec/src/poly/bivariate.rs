//! Sparse polynomials in two slice parameters `t1`, `t2`.

use std::collections::BTreeMap;

use core::fmt;

use super::Poly;
use crate::field::{add_mod, inv_mod, mul_mod, neg_mod, pow_mod, ModP};

/// Polynomial in `t1, t2` over Z/pZ, keyed by exponent pair `(i, j)` of
/// `t1^i t2^j`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BiPoly {
    prime: u64,
    terms: BTreeMap<(usize, usize), u64>,
}

impl BiPoly {
    /// The zero polynomial.
    pub fn zero(prime: u64) -> Self {
        Self {
            prime,
            terms: BTreeMap::new(),
        }
    }

    /// Embed a polynomial in `t1`.
    pub fn from_t1(poly: &Poly) -> Self {
        let terms = poly
            .coeffs()
            .iter()
            .enumerate()
            .filter(|&(_, &c)| c != 0)
            .map(|(i, &c)| ((i, 0), c))
            .collect();
        Self {
            prime: poly.prime(),
            terms,
        }
    }

    /// `Σ_j coeffs[j](t1) · t2^j`.
    pub fn from_t2_coefficients(prime: u64, coeffs: &[Poly]) -> Self {
        let mut out = Self::zero(prime);
        for (j, c) in coeffs.iter().enumerate() {
            for (i, &v) in c.coeffs().iter().enumerate() {
                out.add_term(i, j, v);
            }
        }
        out
    }

    fn add_term(&mut self, i: usize, j: usize, c: u64) {
        let p = self.prime;
        let entry = self.terms.entry((i, j)).or_insert(0);
        *entry = add_mod(*entry, c, p);
        if *entry == 0 {
            self.terms.remove(&(i, j));
        }
    }

    /// Field characteristic.
    #[inline]
    pub fn prime(&self) -> u64 {
        self.prime
    }

    /// Non-zero terms `((i, j), c)`.
    pub fn terms(&self) -> impl Iterator<Item = ((usize, usize), u64)> + '_ {
        self.terms.iter().map(|(&k, &v)| (k, v))
    }

    /// True for zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.terms.is_empty()
    }

    /// Highest `i + j`; `None` for zero.
    pub fn total_degree(&self) -> Option<usize> {
        self.terms.keys().map(|(i, j)| i + j).max()
    }

    /// Value at `(t1, t2)`.
    pub fn eval(&self, t1: u64, t2: u64) -> u64 {
        let p = self.prime;
        self.terms.iter().fold(0, |acc, (&(i, j), &c)| {
            let m = mul_mod(pow_mod(t1, i as u64, p), pow_mod(t2, j as u64, p), p);
            add_mod(acc, mul_mod(c, m, p), p)
        })
    }

    /// `self · (t2 - x) + rhs`, the Horner step of a Newton form in `t2`.
    pub(crate) fn newton_step(&self, x: u64, rhs: &Poly) -> Self {
        let p = self.prime;
        let neg_x = neg_mod(x % p, p);
        let mut out = Self::zero(p);
        for (&(i, j), &c) in &self.terms {
            out.add_term(i, j + 1, c);
            out.add_term(i, j, mul_mod(c, neg_x, p));
        }
        for (i, &c) in rhs.coeffs().iter().enumerate() {
            out.add_term(i, 0, c);
        }
        out
    }

    /// Product.
    pub fn mul(&self, rhs: &Self) -> Self {
        let p = self.prime;
        let mut out = Self::zero(p);
        for (&(i, j), &a) in &self.terms {
            for (&(k, l), &b) in &rhs.terms {
                out.add_term(i + k, j + l, mul_mod(a, b, p));
            }
        }
        out
    }
}

impl fmt::Display for BiPoly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return write!(f, "0");
        }
        let p = self.prime;
        for (n, (&(i, j), &c)) in self.terms.iter().rev().enumerate() {
            let signed = ModP::from_u64(c, p).symmetric();
            match (n, signed < 0) {
                (0, true) => write!(f, "-")?,
                (0, false) => {}
                (_, true) => write!(f, " - ")?,
                (_, false) => write!(f, " + ")?,
            }
            let mag = signed.unsigned_abs();
            let mut parts = Vec::new();
            if mag != 1 || (i == 0 && j == 0) {
                parts.push(mag.to_string());
            }
            for (var, e) in [("t1", i), ("t2", j)] {
                match e {
                    0 => {}
                    1 => parts.push(var.to_string()),
                    _ => parts.push(format!("{var}^{e}")),
                }
            }
            write!(f, "{}", parts.join("*"))?;
        }
        Ok(())
    }
}

/// Unreduced quotient of bivariate polynomials.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BiRational {
    /// Numerator.
    pub num: BiPoly,
    /// Denominator (non-zero).
    pub den: BiPoly,
}

impl BiRational {
    /// Value at `(t1, t2)`; `None` at a pole.
    pub fn eval(&self, t1: u64, t2: u64) -> Option<u64> {
        let p = self.num.prime();
        let d = inv_mod(self.den.eval(t1, t2), p)?;
        Some(mul_mod(self.num.eval(t1, t2), d, p))
    }
}

impl fmt::Display for BiRational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})/({})", self.num, self.den)
    }
}
