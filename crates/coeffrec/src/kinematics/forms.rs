//! Reference phase-space model built from integer polynomial forms.
//!
//! Every invariant is a polynomial with integer coefficients in a fixed set
//! of coordinates `x0, x1, …`. Points draw the coordinates at random from
//! the configured backend. Deforming an invariant to a target value solves
//! for a *pivot* coordinate in which the form is linear with a constant
//! coefficient, so a slice through a [`FormPoint`] is an affine line in
//! coordinate space.
//!
//! ```
//! use std::sync::Arc;
//! use coeffrec::field::FieldKind;
//! use coeffrec::kinematics::forms::{Form, FormModel};
//! use coeffrec::kinematics::{Invariant, PhaseSpacePoint, PointGenerator};
//!
//! let x = Form::var;
//! let model = Arc::new(
//!     FormModel::new(4, 3)
//!         .with_invariant("a", x(0) + x(1))
//!         .with_invariant("c", x(1) * x(2)),
//! );
//! let field = FieldKind::Finite { prime: 101 };
//! let point = model.generate(4, 7, &field).unwrap();
//! let target = coeffrec::field::Scalar::from_i64(&field, 5);
//! let moved = point.deform(&[Invariant::new("a")], &[target]).unwrap();
//! assert_eq!(moved.evaluate(&Invariant::new("a")).unwrap().residue(), Some(5));
//! ```

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{Invariant, PhaseSpacePoint, PointGenerator};
use crate::error::{ArithmeticError, KinematicsError};
use crate::field::{FieldKind, ModP, PAdic, Scalar};

/// Integer polynomial in the model coordinates.
///
/// Monomials are exponent vectors with trailing zeros trimmed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Form {
    terms: BTreeMap<Vec<u32>, i64>,
}

fn trimmed(mut exps: Vec<u32>) -> Vec<u32> {
    while exps.last() == Some(&0) {
        exps.pop();
    }
    exps
}

impl Form {
    /// The coordinate `x_i`.
    pub fn var(i: usize) -> Self {
        let mut exps = vec![0; i + 1];
        exps[i] = 1;
        Self::from_terms([(exps, 1)])
    }

    /// The constant `c`.
    pub fn constant(c: i64) -> Self {
        Self::from_terms([(Vec::new(), c)])
    }

    fn from_terms(terms: impl IntoIterator<Item = (Vec<u32>, i64)>) -> Self {
        let mut out = Self::default();
        for (exps, c) in terms {
            out.add_term(trimmed(exps), c);
        }
        out
    }

    fn add_term(&mut self, exps: Vec<u32>, c: i64) {
        let entry = self.terms.entry(exps.clone()).or_insert(0);
        *entry += c;
        if *entry == 0 {
            self.terms.remove(&exps);
        }
    }

    /// `c · self`.
    pub fn scale(&self, c: i64) -> Self {
        Self::from_terms(self.terms.iter().map(|(e, v)| (e.clone(), v * c)))
    }

    /// `self^n`.
    pub fn pow(&self, n: u32) -> Self {
        (0..n).fold(Self::constant(1), |acc, _| acc * self.clone())
    }

    /// True when `x_i` occurs.
    pub fn involves(&self, i: usize) -> bool {
        self.terms.keys().any(|e| e.get(i).copied().unwrap_or(0) > 0)
    }

    /// `(c, rest)` with `self = c·x_i + rest` and `rest` free of `x_i`.
    pub fn linear_in(&self, i: usize) -> Option<(i64, Self)> {
        let mut coefficient = None;
        let mut rest = Self::default();
        for (e, &c) in &self.terms {
            match e.get(i).copied().unwrap_or(0) {
                0 => rest.add_term(e.clone(), c),
                1 if e.iter().enumerate().all(|(j, &k)| j == i || k == 0) => coefficient = Some(c),
                _ => return None,
            }
        }
        coefficient.map(|c| (c, rest))
    }

    /// Value at `coords`.
    ///
    /// # Errors
    ///
    /// Backend mismatches among the coordinates.
    pub fn evaluate(&self, field: &FieldKind, coords: &[Scalar]) -> Result<Scalar, ArithmeticError> {
        let mut acc = Scalar::zero(field);
        for (e, &c) in &self.terms {
            let mut term = Scalar::from_i64(field, c);
            for (i, &k) in e.iter().enumerate() {
                if k == 0 {
                    continue;
                }
                let x = coords.get(i).copied().unwrap_or_else(|| Scalar::zero(field));
                term = term.mul(&x.powi(k as i32)?)?;
            }
            acc = acc.add(&term)?;
        }
        Ok(acc)
    }
}

impl core::ops::Add for Form {
    type Output = Form;

    fn add(mut self, rhs: Form) -> Form {
        for (e, c) in rhs.terms {
            self.add_term(e, c);
        }
        self
    }
}

impl core::ops::Sub for Form {
    type Output = Form;

    fn sub(self, rhs: Form) -> Form {
        self + rhs.scale(-1)
    }
}

impl core::ops::Mul for Form {
    type Output = Form;

    fn mul(self, rhs: Form) -> Form {
        let mut out = Form::default();
        for (a, &x) in &self.terms {
            for (b, &y) in &rhs.terms {
                let len = a.len().max(b.len());
                let exps = (0..len)
                    .map(|i| a.get(i).copied().unwrap_or(0) + b.get(i).copied().unwrap_or(0))
                    .collect();
                out.add_term(exps, x * y);
            }
        }
        out
    }
}

/// A set of named invariants over `coordinates` random coordinates.
#[derive(Clone, Debug)]
pub struct FormModel {
    multiplicity: usize,
    coordinates: usize,
    invariants: BTreeMap<Invariant, Form>,
}

impl FormModel {
    /// Empty model for `multiplicity` particles.
    pub fn new(multiplicity: usize, coordinates: usize) -> Self {
        Self {
            multiplicity,
            coordinates,
            invariants: BTreeMap::new(),
        }
    }

    /// Register an invariant.
    #[must_use]
    pub fn with_invariant(mut self, name: impl Into<Invariant>, form: Form) -> Self {
        self.invariants.insert(name.into(), form);
        self
    }

    /// The form behind `invariant`.
    pub fn form(&self, invariant: &Invariant) -> Option<&Form> {
        self.invariants.get(invariant)
    }

    fn random_coordinate(&self, field: &FieldKind, rng: &mut StdRng) -> Scalar {
        match *field {
            FieldKind::Floating => Scalar::Floating(rng.gen_range(0.5..1.5)),
            FieldKind::Finite { prime } => Scalar::Finite(ModP::from_u64(rng.gen_range(1..prime), prime)),
            FieldKind::PAdic { prime, digits } => {
                let modulus = prime.checked_pow(digits).unwrap_or(u64::MAX);
                // Units only, so generic points carry full precision.
                let mut v = rng.gen_range(1..modulus);
                if v % prime == 0 {
                    v += 1;
                }
                Scalar::PAdic(PAdic::from_u64(v, prime, digits))
            }
        }
    }
}

impl PointGenerator for Arc<FormModel> {
    type Point = FormPoint;

    fn generate(&self, multiplicity: usize, seed: u64, field: &FieldKind) -> Result<FormPoint, KinematicsError> {
        if multiplicity != self.multiplicity {
            return Err(KinematicsError::MultiplicityMismatch {
                expected: self.multiplicity,
                requested: multiplicity,
            });
        }
        let mut rng = StdRng::seed_from_u64(seed);
        let coords = (0..self.coordinates)
            .map(|_| self.random_coordinate(field, &mut rng))
            .collect();
        Ok(FormPoint {
            model: Arc::clone(self),
            field: *field,
            coords,
        })
    }
}

/// A point of a [`FormModel`].
#[derive(Clone, Debug)]
pub struct FormPoint {
    model: Arc<FormModel>,
    field: FieldKind,
    coords: Vec<Scalar>,
}

impl FormPoint {
    /// Coordinate values.
    pub fn coordinates(&self) -> &[Scalar] {
        &self.coords
    }

    fn form(&self, invariant: &Invariant) -> Result<&Form, KinematicsError> {
        self.model
            .form(invariant)
            .ok_or_else(|| KinematicsError::UnknownInvariant(invariant.clone()))
    }
}

impl PhaseSpacePoint for FormPoint {
    fn field(&self) -> &FieldKind {
        &self.field
    }

    fn evaluate(&self, invariant: &Invariant) -> Result<Scalar, KinematicsError> {
        Ok(self.form(invariant)?.evaluate(&self.field, &self.coords)?)
    }

    fn deform(&self, directions: &[Invariant], values: &[Scalar]) -> Result<Self, KinematicsError> {
        if directions.len() != values.len() {
            return Err(KinematicsError::DirectionCount {
                directions: directions.len(),
                values: values.len(),
            });
        }
        let mut coords = self.coords.clone();
        let mut fixed: Vec<&Form> = Vec::with_capacity(directions.len());
        let mut pivots: Vec<usize> = Vec::with_capacity(directions.len());
        for (direction, target) in directions.iter().zip(values) {
            let form = self.form(direction)?;
            let (pivot, c, rest) = (0..coords.len())
                .filter(|i| !pivots.contains(i) && fixed.iter().all(|f| !f.involves(*i)))
                .find_map(|i| form.linear_in(i).map(|(c, rest)| (i, c, rest)))
                .ok_or_else(|| KinematicsError::NoPivot(direction.clone()))?;
            let rest = rest.evaluate(&self.field, &coords)?;
            let c = Scalar::from_i64(&self.field, c);
            coords[pivot] = target.sub(&rest)?.div(&c)?;
            fixed.push(form);
            pivots.push(pivot);
        }
        Ok(Self {
            model: Arc::clone(&self.model),
            field: self.field,
            coords,
        })
    }

    fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.field.hash(&mut hasher);
        for x in &self.coords {
            match x {
                Scalar::Floating(v) => v.to_bits().hash(&mut hasher),
                Scalar::PAdic(v) => v.hash(&mut hasher),
                Scalar::Finite(v) => v.value().hash(&mut hasher),
            }
        }
        hasher.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> Arc<FormModel> {
        let x = Form::var;
        Arc::new(
            FormModel::new(4, 4)
                .with_invariant("a", x(0) + x(1))
                .with_invariant("b", x(0) + x(1).scale(2) + x(2))
                .with_invariant("q", x(0) * x(0) + x(3)),
        )
    }

    #[test]
    fn linear_pivot_detection() {
        let x = Form::var;
        let f = x(0).scale(3) + x(1) * x(2);
        let (c, rest) = f.linear_in(0).unwrap();
        assert_eq!(c, 3);
        assert_eq!(rest, x(1) * x(2));
        assert!(f.linear_in(1).is_none());
        assert!((x(0) * x(0)).linear_in(0).is_none());
    }

    #[test]
    fn deformation_hits_the_target_without_moving_the_base() {
        let field = FieldKind::Finite { prime: 10_007 };
        let base = model().generate(4, 1, &field).unwrap();
        let a = Invariant::new("a");
        let target = Scalar::from_i64(&field, 42);
        let moved = base.deform(&[a.clone()], &[target]).unwrap();
        assert_eq!(moved.evaluate(&a).unwrap().residue(), Some(42));
        assert_ne!(base.evaluate(&a).unwrap().residue(), Some(42));
        assert_ne!(base.fingerprint(), moved.fingerprint());
    }

    #[test]
    fn two_directions_use_distinct_pivots() {
        let field = FieldKind::Finite { prime: 10_007 };
        let base = model().generate(4, 2, &field).unwrap();
        let (a, q) = (Invariant::new("a"), Invariant::new("q"));
        let values = [Scalar::from_i64(&field, 3), Scalar::from_i64(&field, 5)];
        let moved = base.deform(&[a.clone(), q.clone()], &values).unwrap();
        assert_eq!(moved.evaluate(&a).unwrap().residue(), Some(3));
        assert_eq!(moved.evaluate(&q).unwrap().residue(), Some(5));
    }

    #[test]
    fn floating_and_padic_points() {
        let m = model();
        let a = Invariant::new("a");
        let fp = m.generate(4, 3, &FieldKind::Floating).unwrap();
        let small = fp.deform(&[a.clone()], &[Scalar::Floating(1e-4)]).unwrap();
        let v = small.evaluate(&a).unwrap().magnitude().unwrap();
        assert!((v - 1e-4).abs() < 1e-12);

        let field = FieldKind::padic();
        let pp = m.generate(4, 3, &field).unwrap();
        let step = Scalar::PAdic(PAdic::p_power(65_521, 4, 1));
        let near = pp.deform(&[a.clone()], &[step]).unwrap();
        assert_eq!(near.evaluate(&a).unwrap().valuation(), Some(1));
    }

    #[test]
    fn failures_are_typed() {
        let field = FieldKind::Finite { prime: 101 };
        let m = model();
        assert!(matches!(
            m.generate(5, 0, &field),
            Err(KinematicsError::MultiplicityMismatch { expected: 4, requested: 5 })
        ));
        let p = m.generate(4, 0, &field).unwrap();
        assert!(matches!(
            p.evaluate(&Invariant::new("zz")),
            Err(KinematicsError::UnknownInvariant(_))
        ));
        assert!(matches!(
            p.deform(&[Invariant::new("a")], &[]),
            Err(KinematicsError::DirectionCount { directions: 1, values: 0 })
        ));
    }
}
