//! Reconstructed monomial ratios.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{EvalError, KinematicsError};
use crate::field::Scalar;
use crate::kinematics::{BlackBox, Invariant, PhaseSpacePoint};
use crate::scaling::{ScalingOutcome, ScalingResult};

/// Product of invariants raised to positive powers, in insertion order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Monomial {
    powers: Vec<(Invariant, u32)>,
}

impl Monomial {
    /// The empty product.
    pub fn new() -> Self {
        Self::default()
    }

    /// Monomial from `(invariant, exponent)` pairs. Repeated invariants
    /// accumulate; zero exponents are skipped.
    pub fn from_powers(powers: impl IntoIterator<Item = (Invariant, u32)>) -> Self {
        let mut m = Self::new();
        for (inv, e) in powers {
            m.push(inv, e);
        }
        m
    }

    /// Multiply by `invariant^exponent`.
    pub fn push(&mut self, invariant: Invariant, exponent: u32) {
        if exponent == 0 {
            return;
        }
        match self.powers.iter_mut().find(|(inv, _)| *inv == invariant) {
            Some((_, e)) => *e += exponent,
            None => self.powers.push((invariant, exponent)),
        }
    }

    /// Exponent of `invariant`; zero when absent.
    pub fn exponent(&self, invariant: &Invariant) -> u32 {
        self.powers
            .iter()
            .find_map(|(inv, e)| (inv == invariant).then_some(*e))
            .unwrap_or(0)
    }

    /// `(invariant, exponent)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&Invariant, u32)> {
        self.powers.iter().map(|(inv, e)| (inv, *e))
    }

    /// True for the empty product.
    pub fn is_one(&self) -> bool {
        self.powers.is_empty()
    }

    /// Sum of exponents.
    pub fn degree(&self) -> u32 {
        self.powers.iter().map(|(_, e)| e).sum()
    }

    /// Value at `point`.
    ///
    /// # Errors
    ///
    /// Unknown invariants or backend arithmetic failures.
    pub fn evaluate<P: PhaseSpacePoint>(&self, point: &P) -> Result<Scalar, KinematicsError> {
        let mut acc = Scalar::one(point.field());
        for (inv, e) in &self.powers {
            let exponent = i32::try_from(*e).unwrap_or(i32::MAX);
            acc = acc.mul(&point.evaluate(inv)?.powi(exponent)?)?;
        }
        Ok(acc)
    }
}

fn superscript(n: u32) -> String {
    const DIGITS: [char; 10] = ['⁰', '¹', '²', '³', '⁴', '⁵', '⁶', '⁷', '⁸', '⁹'];
    n.to_string()
        .bytes()
        .map(|b| DIGITS[usize::from(b - b'0')])
        .collect()
}

impl fmt::Display for Monomial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.powers.is_empty() {
            return write!(f, "1");
        }
        for (i, (inv, e)) in self.powers.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{inv}")?;
            if *e > 1 {
                write!(f, "{}", superscript(*e))?;
            }
        }
        Ok(())
    }
}

/// `coefficient · numerator / denominator` for a function of
/// `multiplicity` particles.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconstructedTerm {
    /// Zeros.
    pub numerator: Monomial,
    /// Poles.
    pub denominator: Monomial,
    /// Overall coefficient: 1, or 0 for a vanishing function.
    pub coefficient: i64,
    /// Number of external particles.
    pub multiplicity: usize,
}

impl ReconstructedTerm {
    /// Term with unit coefficient.
    pub fn new(numerator: Monomial, denominator: Monomial, multiplicity: usize) -> Self {
        Self {
            numerator,
            denominator,
            coefficient: 1,
            multiplicity,
        }
    }

    /// Term implied by scaling exponents: positive exponents go to the
    /// numerator, negative ones to the denominator, zero and failed
    /// entries are dropped.
    pub fn from_scalings(result: &ScalingResult, multiplicity: usize) -> Self {
        let mut numerator = Monomial::new();
        let mut denominator = Monomial::new();
        for (inv, outcome) in &result.entries {
            match *outcome {
                ScalingOutcome::Exponent(n) if n > 0 => numerator.push(inv.clone(), n.unsigned_abs()),
                ScalingOutcome::Exponent(n) if n < 0 => denominator.push(inv.clone(), n.unsigned_abs()),
                _ => {}
            }
        }
        Self::new(numerator, denominator, multiplicity)
    }
}

impl fmt::Display for ReconstructedTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.coefficient != 1 {
            write!(f, "{}·", self.coefficient)?;
        }
        if self.numerator.is_one() {
            write!(f, "1")?;
        } else {
            write!(f, "({})", self.numerator)?;
        }
        if !self.denominator.is_one() {
            write!(f, "/({})", self.denominator)?;
        }
        Ok(())
    }
}

impl<P: PhaseSpacePoint> BlackBox<P> for ReconstructedTerm {
    fn evaluate(&self, point: &P) -> Result<Scalar, EvalError> {
        let c = Scalar::from_i64(point.field(), self.coefficient);
        let num = self.numerator.evaluate(point)?;
        let den = self.denominator.evaluate(point)?;
        Ok(c.mul(&num)?.div(&den)?)
    }

    fn multiplicity(&self) -> usize {
        self.multiplicity
    }

    fn is_zero(&self) -> bool {
        self.coefficient == 0
    }
}

/// Highest pole order of every invariant across `terms`.
pub fn poles_and_orders<'a>(terms: impl IntoIterator<Item = &'a ReconstructedTerm>) -> BTreeMap<Invariant, u32> {
    let mut orders = BTreeMap::new();
    for term in terms {
        for (inv, e) in term.denominator.iter() {
            let order = orders.entry(inv.clone()).or_insert(0);
            *order = e.max(*order);
        }
    }
    orders
}
