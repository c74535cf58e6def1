//! Factorization over prime fields of odd characteristic.
//!
//! Three classical stages:
//!
//! 1. square-free decomposition (with p-th roots for inseparable parts),
//! 2. distinct-degree factorization,
//! 3. Cantor–Zassenhaus equal-degree splitting.
//!
//! Equal-degree splitting is randomized; its generator is seeded, and the
//! output is sorted canonically so the result does not depend on the seed.

use rand::rngs::StdRng;
use rand::SeedableRng;

use super::Poly;
use crate::error::FactorError;

/// Random splitting attempts per factor before giving up.
const SPLIT_ATTEMPTS: usize = 256;

/// `f = unit · Π factorᵢ^multiplicityᵢ` with monic irreducible factors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Factorization {
    /// Leading coefficient of the factored polynomial.
    pub unit: u64,
    /// Distinct monic irreducible factors with multiplicities, sorted
    /// canonically.
    pub factors: Vec<(Poly, u32)>,
}

impl Factorization {
    /// Multiplicity of `factor`, if it occurs.
    pub fn multiplicity_of(&self, factor: &Poly) -> Option<u32> {
        self.factors
            .iter()
            .find_map(|(f, m)| (f == factor).then_some(*m))
    }

    /// Total degree `Σ deg(fᵢ)·mᵢ`.
    pub fn degree(&self) -> usize {
        self.factors
            .iter()
            .map(|(f, m)| f.degree().unwrap_or(0) * *m as usize)
            .sum()
    }

    /// Multiply the factorization back out.
    pub fn expand(&self, prime: u64) -> Poly {
        self.factors
            .iter()
            .fold(Poly::constant(prime, self.unit), |acc, (f, m)| &acc * &f.pow(*m))
    }
}

/// Factor `f` into monic irreducibles.
///
/// # Errors
///
/// [`FactorError::ZeroPolynomial`] for zero, [`FactorError::UnsupportedCharacteristic`]
/// for p = 2, [`FactorError::Stalled`] if random splitting keeps failing.
pub fn factor(f: &Poly, seed: u64) -> Result<Factorization, FactorError> {
    let p = f.prime();
    if p < 3 || p % 2 == 0 {
        return Err(FactorError::UnsupportedCharacteristic(p));
    }
    let unit = f.leading();
    let monic = f.monic().ok_or(FactorError::ZeroPolynomial)?;
    let mut rng = StdRng::seed_from_u64(seed);
    let mut factors = Vec::new();
    for (square_free, multiplicity) in square_free_decomposition(&monic) {
        for (part, degree) in distinct_degree(&square_free) {
            for irreducible in equal_degree(&part, degree, &mut rng)? {
                factors.push((irreducible, multiplicity));
            }
        }
    }
    factors.sort();
    log::trace!("factored degree-{} polynomial into {} factors", f.degree().unwrap_or(0), factors.len());
    Ok(Factorization { unit, factors })
}

/// Monic square-free parts `(g, m)` with `f = Π g^m` and the `g` pairwise
/// coprime.
pub fn square_free_decomposition(f: &Poly) -> Vec<(Poly, u32)> {
    let p = f.prime();
    let mut out = Vec::new();
    let mut current = match f.monic() {
        Some(m) => m,
        None => return out,
    };
    let mut scale = 1u32;
    while !current.is_constant() {
        let mut c = current.gcd(&current.derivative());
        let mut w = current.exact_div(&c).unwrap_or_else(|| Poly::one(p));
        let mut i = 1u32;
        while !w.is_one() {
            let y = w.gcd(&c);
            if let Some(part) = w.exact_div(&y) {
                if !part.is_constant() {
                    out.push((part, i * scale));
                }
            }
            c = c.exact_div(&y).unwrap_or(c);
            w = y;
            i += 1;
        }
        if c.is_constant() {
            break;
        }
        // What is left is a p-th power.
        current = c.pth_root();
        scale = scale.saturating_mul(p.min(u32::MAX as u64) as u32);
    }
    out
}

/// Split a monic square-free `f` into products of irreducibles of equal
/// degree: `(product, degree)`.
pub fn distinct_degree(f: &Poly) -> Vec<(Poly, usize)> {
    let p = f.prime();
    let t = Poly::t(p);
    let mut out = Vec::new();
    let mut rest = f.clone();
    let mut h = t.rem(&rest);
    let mut d = 1;
    while rest.degree().unwrap_or(0) >= 2 * d {
        h = h.pow_mod(p, &rest);
        let g = rest.gcd(&(&h - &t));
        if !g.is_one() {
            rest = rest.exact_div(&g).unwrap_or(rest);
            h = h.rem(&rest);
            out.push((g, d));
        }
        d += 1;
    }
    if !rest.is_constant() {
        let degree = rest.degree().unwrap_or(0);
        out.push((rest, degree));
    }
    out
}

/// Split a monic product of distinct irreducibles of degree `d`.
///
/// # Errors
///
/// [`FactorError::Stalled`] when no random element splits the input.
pub fn equal_degree<R: rand::Rng + ?Sized>(
    f: &Poly,
    d: usize,
    rng: &mut R,
) -> Result<Vec<Poly>, FactorError> {
    let n = f.degree().unwrap_or(0);
    if n == 0 {
        return Ok(Vec::new());
    }
    if n == d {
        return Ok(vec![f.clone()]);
    }
    let p = f.prime();
    let half = (p - 1) / 2;
    for _ in 0..SPLIT_ATTEMPTS {
        let a = Poly::random(p, n, rng);
        if a.is_constant() {
            continue;
        }
        let mut g = a.gcd(f);
        if g.is_one() {
            // a^((p^d - 1)/2) = (a · a^p ⋯ a^(p^(d-1)))^((p - 1)/2)
            let mut frob = a.rem(f);
            let mut norm = frob.clone();
            for _ in 1..d {
                frob = frob.pow_mod(p, f);
                norm = (&norm * &frob).rem(f);
            }
            let b = norm.pow_mod(half, f);
            g = (&b - &Poly::one(p)).gcd(f);
        }
        let split = g.degree().unwrap_or(0);
        if split > 0 && split < n {
            if let Some(cofactor) = f.exact_div(&g) {
                let mut out = equal_degree(&g, d, rng)?;
                out.extend(equal_degree(&cofactor, d, rng)?);
                return Ok(out);
            }
        }
    }
    Err(FactorError::Stalled { degree: n })
}
