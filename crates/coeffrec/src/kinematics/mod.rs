//! Phase-space collaborators.
//!
//! The engine never constructs kinematics itself. It asks a
//! [`PointGenerator`] for a configuration, deforms it along named
//! [`Invariant`] directions, and hands the result to a [`BlackBox`].
//! [`forms`] ships a small reference model whose invariants are integer
//! polynomial forms in random coordinates.

use core::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{EvalError, KinematicsError};
use crate::field::{FieldKind, Scalar};

pub mod forms;

/// Name of a symbolic invariant, compared by string identity.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Invariant(Arc<str>);

impl Invariant {
    /// Invariant with the given name.
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    /// The name.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Invariant {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for Invariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Invariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invariant({:?})", &*self.0)
    }
}

/// A sampled kinematic configuration.
pub trait PhaseSpacePoint: Clone + Send + Sync {
    /// Backend of every value this point produces.
    fn field(&self) -> &FieldKind;

    /// Value of `invariant` at this point.
    ///
    /// # Errors
    ///
    /// Unknown invariants, or arithmetic failures in the backend.
    fn evaluate(&self, invariant: &Invariant) -> Result<Scalar, KinematicsError>;

    /// A new point on which `directions[i]` evaluates to `values[i]`.
    /// `self` is left untouched.
    ///
    /// # Errors
    ///
    /// Mismatched lengths, or directions the point cannot be moved along.
    fn deform(&self, directions: &[Invariant], values: &[Scalar]) -> Result<Self, KinematicsError>;

    /// Stable identity of the configuration, used for cache keys.
    fn fingerprint(&self) -> u64;
}

/// Source of random phase-space points.
pub trait PointGenerator: Sync {
    /// Point type produced.
    type Point: PhaseSpacePoint;

    /// A configuration of `multiplicity` particles over `field`,
    /// reproducible from `seed`.
    ///
    /// # Errors
    ///
    /// Unsupported multiplicity or backend.
    fn generate(&self, multiplicity: usize, seed: u64, field: &FieldKind) -> Result<Self::Point, KinematicsError>;
}

/// The unknown function under study.
pub trait BlackBox<P>: Sync {
    /// Value at `point`.
    ///
    /// # Errors
    ///
    /// Any failure to evaluate; scaling treats these as transient.
    fn evaluate(&self, point: &P) -> Result<Scalar, EvalError>;

    /// Number of external particles the function is defined for.
    fn multiplicity(&self) -> usize;

    /// True when the function is known to vanish identically.
    fn is_zero(&self) -> bool {
        false
    }
}

impl<P, B: BlackBox<P> + ?Sized> BlackBox<P> for &B {
    fn evaluate(&self, point: &P) -> Result<Scalar, EvalError> {
        (**self).evaluate(point)
    }

    fn multiplicity(&self) -> usize {
        (**self).multiplicity()
    }

    fn is_zero(&self) -> bool {
        (**self).is_zero()
    }
}

/// A closure as a [`BlackBox`].
///
/// ```
/// use coeffrec::error::EvalError;
/// use coeffrec::field::Scalar;
/// use coeffrec::kinematics::{BlackBox, FnBlackBox};
///
/// let bb = FnBlackBox::new(5, |_: &()| Ok::<_, EvalError>(Scalar::Floating(1.0)));
/// assert_eq!(BlackBox::<()>::multiplicity(&bb), 5);
/// assert!(!BlackBox::<()>::is_zero(&bb));
/// ```
#[derive(Clone)]
pub struct FnBlackBox<F> {
    f: F,
    multiplicity: usize,
    zero: bool,
}

impl<F> FnBlackBox<F> {
    /// Wrap `f` for functions of `multiplicity` particles.
    pub fn new(multiplicity: usize, f: F) -> Self {
        Self {
            f,
            multiplicity,
            zero: false,
        }
    }

    /// Mark the function as identically zero.
    #[must_use]
    pub fn identically_zero(mut self) -> Self {
        self.zero = true;
        self
    }
}

impl<P, F> BlackBox<P> for FnBlackBox<F>
where
    F: Fn(&P) -> Result<Scalar, EvalError> + Sync,
{
    fn evaluate(&self, point: &P) -> Result<Scalar, EvalError> {
        (self.f)(point)
    }

    fn multiplicity(&self) -> usize {
        self.multiplicity
    }

    fn is_zero(&self) -> bool {
        self.zero
    }
}

impl<F> fmt::Debug for FnBlackBox<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnBlackBox")
            .field("multiplicity", &self.multiplicity)
            .field("zero", &self.zero)
            .finish_non_exhaustive()
    }
}
