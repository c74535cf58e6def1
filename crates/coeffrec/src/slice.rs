//! One- and two-parameter slices through a phase-space point.
//!
//! A [`Slice`] pins a base point and one or two invariant directions.
//! Substituting parameter values `t` (or `t1, t2`) deforms a copy of the
//! base point so that each direction evaluates to its parameter; the base
//! point itself is never modified, so repeated substitutions are
//! independent and reproducible.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::error::{EvalError, KinematicsError, ReconstructionError, StructuralError};
use crate::field::{FieldKind, ModP, Scalar};
use crate::kinematics::{Invariant, PhaseSpacePoint};

/// A line (or plane) through `base` along named invariant directions.
#[derive(Clone, Debug)]
pub struct Slice<P> {
    base: P,
    directions: Vec<Invariant>,
}

impl<P: PhaseSpacePoint> Slice<P> {
    /// Slice through `base` along one or two `directions`.
    ///
    /// # Errors
    ///
    /// [`StructuralError::SliceDirections`] for zero or more than two
    /// directions; a [`KinematicsError`] when the point cannot be moved
    /// along them.
    pub fn new(base: P, directions: Vec<Invariant>) -> Result<Self, ReconstructionError> {
        if !(1..=2).contains(&directions.len()) {
            return Err(StructuralError::SliceDirections(directions.len()).into());
        }
        // Probe the deformation once so that a missing pivot is reported
        // here rather than as a stream of failed samples.
        let current = directions
            .iter()
            .map(|d| base.evaluate(d))
            .collect::<Result<Vec<_>, _>>()?;
        base.deform(&directions, &current)?;
        Ok(Self { base, directions })
    }

    /// Number of free parameters (1 or 2).
    #[inline]
    pub fn parameters(&self) -> usize {
        self.directions.len()
    }

    /// Directions perturbed by the parameters.
    #[inline]
    pub fn directions(&self) -> &[Invariant] {
        &self.directions
    }

    /// The base point.
    #[inline]
    pub fn base(&self) -> &P {
        &self.base
    }

    /// Backend of the base point.
    #[inline]
    pub fn field(&self) -> &FieldKind {
        self.base.field()
    }

    /// Characteristic of a finite-field slice.
    ///
    /// # Errors
    ///
    /// [`StructuralError::NotFiniteField`] for other backends.
    pub fn prime(&self) -> Result<u64, StructuralError> {
        match *self.field() {
            FieldKind::Finite { prime } => Ok(prime),
            other => Err(StructuralError::NotFiniteField(other.name())),
        }
    }

    /// A fresh point with the parameters set to `values`.
    ///
    /// # Errors
    ///
    /// Wrong number of values, or a failed deformation.
    pub fn substitute(&self, values: &[Scalar]) -> Result<P, KinematicsError> {
        self.base.deform(&self.directions, values)
    }

    /// Evaluate `f` at the finite-field parameter values `ts` and return
    /// the residue.
    pub(crate) fn residue_at<F>(&self, prime: u64, ts: &[u64], f: F) -> Result<u64, EvalError>
    where
        F: FnOnce(&P) -> Result<Scalar, EvalError>,
    {
        let values: Vec<Scalar> = ts
            .iter()
            .map(|&t| Scalar::Finite(ModP::from_u64(t, prime)))
            .collect();
        let point = self.substitute(&values)?;
        let value = f(&point)?;
        value
            .residue()
            .ok_or_else(|| EvalError::new(format!("expected a finite-field value, got {value}")))
    }

    /// Identity for caching: changes whenever the base point or the
    /// directions change.
    pub fn id(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.base.fingerprint().hash(&mut hasher);
        self.directions.hash(&mut hasher);
        hasher.finish()
    }
}

/// Build a [`Slice`]; see [`Slice::new`].
///
/// # Errors
///
/// As [`Slice::new`].
pub fn slice<P: PhaseSpacePoint>(base: P, directions: &[Invariant]) -> Result<Slice<P>, ReconstructionError> {
    Slice::new(base, directions.to_vec())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::kinematics::forms::{Form, FormModel};
    use crate::kinematics::PointGenerator;

    const FIELD: FieldKind = FieldKind::Finite { prime: 10_007 };

    fn model() -> Arc<FormModel> {
        let x = Form::var;
        Arc::new(
            FormModel::new(4, 3)
                .with_invariant("a", x(0) + x(1))
                .with_invariant("sq", x(0) * x(0) * x(1) * x(1) * x(2) * x(2)),
        )
    }

    #[test]
    fn direction_count_is_checked() {
        let p = model().generate(4, 1, &FIELD).unwrap();
        assert!(matches!(
            Slice::new(p.clone(), vec![]),
            Err(ReconstructionError::Structural(StructuralError::SliceDirections(0)))
        ));
        let three = vec!["a".into(), "a".into(), "a".into()];
        assert!(matches!(
            Slice::new(p, three),
            Err(ReconstructionError::Structural(StructuralError::SliceDirections(3)))
        ));
    }

    #[test]
    fn directions_without_pivot_are_rejected() {
        let p = model().generate(4, 1, &FIELD).unwrap();
        assert!(matches!(
            slice(p, &["sq".into()]),
            Err(ReconstructionError::Kinematics(KinematicsError::NoPivot(_)))
        ));
    }

    #[test]
    fn substitution_leaves_base_untouched() {
        let p = model().generate(4, 1, &FIELD).unwrap();
        let s = slice(p, &["a".into()]).unwrap();
        let before = s.base().fingerprint();
        let id = s.id();
        let a = Invariant::new("a");
        let at = |t| s.residue_at(10_007, &[t], |pt| Ok(pt.evaluate(&a)?)).unwrap();
        assert_eq!(at(5), 5);
        assert_eq!(at(9), 9);
        assert_eq!(s.base().fingerprint(), before);
        assert_eq!(s.id(), id);
        assert_eq!(s.prime(), Ok(10_007));
        assert_eq!(s.parameters(), 1);
    }

    #[test]
    fn floating_slices_have_no_prime() {
        let p = model().generate(4, 1, &FieldKind::Floating).unwrap();
        let s = slice(p, &["a".into()]).unwrap();
        assert_eq!(s.prime(), Err(StructuralError::NotFiniteField("floating")));
    }
}
