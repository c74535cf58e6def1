//! Dense univariate polynomials over Z/pZ.
//!
//! Coefficients are stored little-endian (`coeffs[i]` multiplies `t^i`) as
//! canonical residues with no trailing zeros, so structural equality is
//! polynomial equality.
//!
//! # Example
//!
//! ```
//! use coeffrec::poly::Poly;
//!
//! let p = 101;
//! let t_minus_1 = Poly::from_i64s(p, &[-1, 1]);
//! let t_plus_1 = Poly::from_i64s(p, &[1, 1]);
//! let product = &t_minus_1 * &t_plus_1;
//! assert_eq!(product, Poly::from_i64s(p, &[-1, 0, 1]));
//! assert_eq!(product.to_string(), "t^2 - 1");
//! ```

use core::cmp::Ordering;
use core::fmt;

use rand::Rng;

use crate::field::{add_mod, inv_mod, mul_mod, neg_mod, reduce_i64, sub_mod, ModP};

/// A polynomial in one variable over the prime field of characteristic `prime`.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Poly {
    prime: u64,
    coeffs: Vec<u64>,
}

impl Poly {
    /// Polynomial from residues (reduced and trimmed).
    pub fn new(prime: u64, coeffs: Vec<u64>) -> Self {
        let mut coeffs: Vec<u64> = coeffs.into_iter().map(|c| c % prime).collect();
        while coeffs.last() == Some(&0) {
            coeffs.pop();
        }
        Self { prime, coeffs }
    }

    /// Polynomial from signed integer coefficients, lowest degree first.
    pub fn from_i64s(prime: u64, coeffs: &[i64]) -> Self {
        Self::new(prime, coeffs.iter().map(|&c| reduce_i64(c, prime)).collect())
    }

    /// The zero polynomial.
    #[inline]
    pub fn zero(prime: u64) -> Self {
        Self {
            prime,
            coeffs: Vec::new(),
        }
    }

    /// The constant `c`.
    #[inline]
    pub fn constant(prime: u64, c: u64) -> Self {
        Self::new(prime, vec![c])
    }

    /// The constant one.
    #[inline]
    pub fn one(prime: u64) -> Self {
        Self::constant(prime, 1)
    }

    /// `c · t^degree`.
    pub fn monomial(prime: u64, c: u64, degree: usize) -> Self {
        let mut coeffs = vec![0; degree + 1];
        coeffs[degree] = c;
        Self::new(prime, coeffs)
    }

    /// The variable `t`.
    #[inline]
    pub fn t(prime: u64) -> Self {
        Self::monomial(prime, 1, 1)
    }

    /// Uniformly random polynomial of degree below `bound`.
    pub fn random<R: Rng + ?Sized>(prime: u64, bound: usize, rng: &mut R) -> Self {
        Self::new(prime, (0..bound).map(|_| rng.gen_range(0..prime)).collect())
    }

    /// Field characteristic.
    #[inline]
    pub fn prime(&self) -> u64 {
        self.prime
    }

    /// Coefficients, lowest degree first.
    #[inline]
    pub fn coeffs(&self) -> &[u64] {
        &self.coeffs
    }

    /// Coefficient of `t^i`.
    #[inline]
    pub fn coeff(&self, i: usize) -> u64 {
        self.coeffs.get(i).copied().unwrap_or(0)
    }

    /// Degree; `None` for the zero polynomial.
    #[inline]
    pub fn degree(&self) -> Option<usize> {
        self.coeffs.len().checked_sub(1)
    }

    /// True for the zero polynomial.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.coeffs.is_empty()
    }

    /// True for zero or a non-zero constant.
    #[inline]
    pub fn is_constant(&self) -> bool {
        self.coeffs.len() <= 1
    }

    /// True for the constant one.
    #[inline]
    pub fn is_one(&self) -> bool {
        self.coeffs == [1]
    }

    /// Leading coefficient (zero for the zero polynomial).
    #[inline]
    pub fn leading(&self) -> u64 {
        self.coeffs.last().copied().unwrap_or(0)
    }

    /// Horner evaluation at `t = x`.
    pub fn eval(&self, x: u64) -> u64 {
        let p = self.prime;
        self.coeffs
            .iter()
            .rev()
            .fold(0, |acc, &c| add_mod(mul_mod(acc, x, p), c, p))
    }

    /// Multiply every coefficient by `c`.
    pub fn scale(&self, c: u64) -> Self {
        let p = self.prime;
        Self::new(p, self.coeffs.iter().map(|&a| mul_mod(a, c, p)).collect())
    }

    /// Divide by the leading coefficient; `None` for zero.
    pub fn monic(&self) -> Option<Self> {
        let inv = inv_mod(self.leading(), self.prime)?;
        Some(self.scale(inv))
    }

    /// Formal derivative.
    pub fn derivative(&self) -> Self {
        let p = self.prime;
        Self::new(
            p,
            self.coeffs
                .iter()
                .enumerate()
                .skip(1)
                .map(|(i, &c)| mul_mod(c, i as u64 % p, p))
                .collect(),
        )
    }

    /// Division with remainder; `None` when dividing by zero.
    pub fn div_rem(&self, divisor: &Self) -> Option<(Self, Self)> {
        debug_assert_eq!(self.prime, divisor.prime);
        let p = self.prime;
        let d_deg = divisor.degree()?;
        let inv_lead = inv_mod(divisor.leading(), p)?;
        let mut rem = self.coeffs.clone();
        if rem.len() <= d_deg {
            return Some((Self::zero(p), self.clone()));
        }
        let mut quot = vec![0u64; rem.len() - d_deg];
        for shift in (0..quot.len()).rev() {
            let lead = rem[shift + d_deg];
            if lead == 0 {
                continue;
            }
            let factor = mul_mod(lead, inv_lead, p);
            quot[shift] = factor;
            for (i, &dc) in divisor.coeffs.iter().enumerate() {
                rem[shift + i] = sub_mod(rem[shift + i], mul_mod(factor, dc, p), p);
            }
        }
        Some((Self::new(p, quot), Self::new(p, rem)))
    }

    /// Remainder modulo `m` (self when `m` is zero).
    pub fn rem(&self, m: &Self) -> Self {
        match self.div_rem(m) {
            Some((_, r)) => r,
            None => self.clone(),
        }
    }

    /// Exact quotient when `divisor` divides `self`.
    pub fn exact_div(&self, divisor: &Self) -> Option<Self> {
        let (q, r) = self.div_rem(divisor)?;
        r.is_zero().then_some(q)
    }

    /// Monic greatest common divisor (zero only if both inputs are zero).
    pub fn gcd(&self, other: &Self) -> Self {
        let mut a = self.clone();
        let mut b = other.clone();
        while !b.is_zero() {
            let r = a.rem(&b);
            a = b;
            b = r;
        }
        a.monic().unwrap_or(a)
    }

    /// `self^exp mod m` by square-and-multiply.
    pub fn pow_mod(&self, mut exp: u64, m: &Self) -> Self {
        let mut result = Self::one(self.prime).rem(m);
        let mut base = self.rem(m);
        while exp > 0 {
            if exp & 1 == 1 {
                result = (&result * &base).rem(m);
            }
            base = (&base * &base).rem(m);
            exp >>= 1;
        }
        result
    }

    /// `self^exp`.
    pub fn pow(&self, exp: u32) -> Self {
        (0..exp).fold(Self::one(self.prime), |acc, _| &acc * self)
    }

    /// Polynomial whose p-th power is `self`, for `self` with zero
    /// derivative (only exponents divisible by p occur).
    pub fn pth_root(&self) -> Self {
        let p = self.prime;
        let step = p as usize;
        Self::new(p, self.coeffs.iter().step_by(step).copied().collect())
    }

    /// Canonical order: degree first, then coefficients from the top.
    pub fn canonical_cmp(&self, other: &Self) -> Ordering {
        self.coeffs
            .len()
            .cmp(&other.coeffs.len())
            .then_with(|| self.coeffs.iter().rev().cmp(other.coeffs.iter().rev()))
    }

    /// Display helper with a custom variable name.
    pub fn display_in<'a>(&'a self, var: &'a str) -> impl fmt::Display + 'a {
        PolyDisplay { poly: self, var }
    }
}

impl PartialOrd for Poly {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Poly {
    fn cmp(&self, other: &Self) -> Ordering {
        self.prime
            .cmp(&other.prime)
            .then_with(|| self.canonical_cmp(other))
    }
}

impl core::ops::Add for &Poly {
    type Output = Poly;

    fn add(self, rhs: &Poly) -> Poly {
        debug_assert_eq!(self.prime, rhs.prime);
        let p = self.prime;
        let n = self.coeffs.len().max(rhs.coeffs.len());
        Poly::new(p, (0..n).map(|i| add_mod(self.coeff(i), rhs.coeff(i), p)).collect())
    }
}

impl core::ops::Sub for &Poly {
    type Output = Poly;

    fn sub(self, rhs: &Poly) -> Poly {
        debug_assert_eq!(self.prime, rhs.prime);
        let p = self.prime;
        let n = self.coeffs.len().max(rhs.coeffs.len());
        Poly::new(p, (0..n).map(|i| sub_mod(self.coeff(i), rhs.coeff(i), p)).collect())
    }
}

impl core::ops::Mul for &Poly {
    type Output = Poly;

    fn mul(self, rhs: &Poly) -> Poly {
        debug_assert_eq!(self.prime, rhs.prime);
        let p = self.prime;
        if self.is_zero() || rhs.is_zero() {
            return Poly::zero(p);
        }
        let mut out = vec![0u64; self.coeffs.len() + rhs.coeffs.len() - 1];
        for (i, &a) in self.coeffs.iter().enumerate() {
            if a == 0 {
                continue;
            }
            for (j, &b) in rhs.coeffs.iter().enumerate() {
                out[i + j] = add_mod(out[i + j], mul_mod(a, b, p), p);
            }
        }
        Poly::new(p, out)
    }
}

impl core::ops::Neg for &Poly {
    type Output = Poly;

    fn neg(self) -> Poly {
        let p = self.prime;
        Poly::new(p, self.coeffs.iter().map(|&c| neg_mod(c, p)).collect())
    }
}

struct PolyDisplay<'a> {
    poly: &'a Poly,
    var: &'a str,
}

impl fmt::Display for PolyDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = self.poly.prime;
        if self.poly.is_zero() {
            return write!(f, "0");
        }
        let mut first = true;
        for (i, &c) in self.poly.coeffs.iter().enumerate().rev() {
            if c == 0 {
                continue;
            }
            let signed = ModP::from_u64(c, p).symmetric();
            let (negative, magnitude) = (signed < 0, signed.unsigned_abs());
            if first {
                if negative {
                    write!(f, "-")?;
                }
            } else if negative {
                write!(f, " - ")?;
            } else {
                write!(f, " + ")?;
            }
            first = false;
            match (i, magnitude) {
                (0, m) => write!(f, "{m}")?,
                (1, 1) => write!(f, "{}", self.var)?,
                (1, m) => write!(f, "{m}*{}", self.var)?,
                (_, 1) => write!(f, "{}^{i}", self.var)?,
                (_, m) => write!(f, "{m}*{}^{i}", self.var)?,
            }
        }
        Ok(())
    }
}

impl fmt::Display for Poly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_in("t"))
    }
}
