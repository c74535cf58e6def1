//! Error taxonomy.
//!
//! | Kind | Type | Recovery |
//! |------|------|----------|
//! | TransientNumericFailure | [`ScalingError`] (transient variants) | retried by [`crate::scaling::RetryPolicy`] |
//! | DegeneratePolicyViolation | [`crate::report::Notice`] | never an error; reported as a notice |
//! | MatchAssertionFailure | [`MatchError`] | fatal to the current study |
//! | StructuralInputError | [`StructuralError`] | propagated immediately |
//!
//! [`ReconstructionError`] is the umbrella returned by catalog building and
//! codimension-one studies.

use thiserror::Error;

use crate::kinematics::Invariant;

/// Failure of a single arithmetic operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArithmeticError {
    /// Operands come from different backends.
    #[error("cannot combine {left} and {right} values")]
    MixedBackends {
        /// Backend of the left operand.
        left: &'static str,
        /// Backend of the right operand.
        right: &'static str,
    },
    /// Operands live over different primes.
    #[error("characteristic mismatch: {left} vs {right}")]
    PrimeMismatch {
        /// Prime of the left operand.
        left: u64,
        /// Prime of the right operand.
        right: u64,
    },
    /// Inversion of zero.
    #[error("division by zero")]
    DivisionByZero,
    /// Inversion of a p-adic value whose digits all cancelled.
    #[error("lost all p-adic digits")]
    DigitsExhausted,
}

/// Failure of the phase-space collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KinematicsError {
    /// The invariant is not known to the phase-space model.
    #[error("unknown invariant `{0}`")]
    UnknownInvariant(Invariant),
    /// No coordinate can be solved for to deform along this invariant.
    #[error("invariant `{0}` has no free linear pivot coordinate")]
    NoPivot(Invariant),
    /// Generated multiplicity does not match the model.
    #[error("model has multiplicity {expected}, requested {requested}")]
    MultiplicityMismatch {
        /// Multiplicity the model was built for.
        expected: usize,
        /// Multiplicity that was requested.
        requested: usize,
    },
    /// Direction and value lists differ in length.
    #[error("{directions} deformation directions but {values} values")]
    DirectionCount {
        /// Number of directions.
        directions: usize,
        /// Number of values.
        values: usize,
    },
    /// A deformation value belongs to a different backend than the point.
    #[error(transparent)]
    Arithmetic(#[from] ArithmeticError),
}

impl KinematicsError {
    /// Whether the failure comes from the model or the request rather than
    /// from the sampled point.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::UnknownInvariant(_) | Self::NoPivot(_) | Self::MultiplicityMismatch { .. }
        )
    }
}

/// A black-box evaluation failed.
///
/// Failures of the phase-space collaborator keep their type, so callers can
/// tell an unknown invariant from a numerical accident.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    /// The black box itself gave up.
    #[error("black-box evaluation failed: {0}")]
    Failed(String),
    /// Evaluating an invariant on the point failed.
    #[error("black-box evaluation failed: {0}")]
    Kinematics(#[from] KinematicsError),
    /// Arithmetic on evaluated invariants failed.
    #[error("black-box evaluation failed: {0}")]
    Arithmetic(#[from] ArithmeticError),
}

impl EvalError {
    /// Error with a free-form reason.
    pub fn new(reason: impl Into<String>) -> Self {
        Self::Failed(reason.into())
    }
}

/// Failure of a scaling computation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScalingError {
    /// The black box raised during sampling.
    #[error(transparent)]
    Evaluation(#[from] EvalError),
    /// Point generation or deformation failed.
    #[error(transparent)]
    Kinematics(#[from] KinematicsError),
    /// Arithmetic on sampled values failed.
    #[error(transparent)]
    Arithmetic(#[from] ArithmeticError),
    /// The log-linear fit did not produce an integer slope.
    #[error("malformed log-linear fit: {reason}")]
    MalformedFit {
        /// What went wrong with the fit.
        reason: String,
    },
    /// The p-adic evaluation kept no valid digit.
    #[error("lost all p-adic digits scaling `{0}`")]
    DigitsExhausted(Invariant),
    /// The configured backend has no scaling strategy.
    #[error("no scaling strategy for the {0} backend")]
    UnsupportedField(&'static str),
    /// Every allowed attempt failed.
    #[error("scaling failed after {attempts} attempts: {last}")]
    RetriesExhausted {
        /// Attempts made.
        attempts: u32,
        /// Failure of the final attempt.
        last: Box<ScalingError>,
    },
}

impl ScalingError {
    /// Whether a fresh seed may cure this failure.
    ///
    /// Structural kinematics failures never are. Digit exhaustion is
    /// transient only when explicitly allowed: p-adic evaluation does not
    /// improve with a different parameter choice.
    pub fn is_transient(&self, retry_on_digit_loss: bool) -> bool {
        match self {
            Self::Kinematics(k) | Self::Evaluation(EvalError::Kinematics(k)) => !k.is_structural(),
            Self::Evaluation(_) | Self::Arithmetic(_) | Self::MalformedFit { .. } => true,
            Self::DigitsExhausted(_) => retry_on_digit_loss,
            Self::UnsupportedField(_) | Self::RetriesExhausted { .. } => false,
        }
    }
}

/// Failure of the exact interpolation collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InterpolationError {
    /// The interpolant did not stabilise within the sample budget.
    #[error("no convergence after {points} sample points")]
    NoConvergence {
        /// Points consumed.
        points: usize,
    },
    /// Too many consecutive sample points could not be evaluated.
    #[error("{failures} consecutive failed samples, last: {last}")]
    TooManyFailures {
        /// Consecutive failures.
        failures: usize,
        /// Last evaluation error.
        last: EvalError,
    },
    /// Sampled values are not prime-field residues.
    #[error("interpolation needs a finite field, got {0} values")]
    NotFiniteField(&'static str),
}

/// Failure of polynomial factorization.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FactorError {
    /// The zero polynomial has no factorization.
    #[error("cannot factor the zero polynomial")]
    ZeroPolynomial,
    /// Equal-degree splitting needs an odd characteristic.
    #[error("factorization over characteristic {0} is not supported")]
    UnsupportedCharacteristic(u64),
    /// Random splitting failed to make progress.
    #[error("equal-degree splitting stalled on a degree-{degree} polynomial")]
    Stalled {
        /// Degree of the polynomial that would not split.
        degree: usize,
    },
}

/// A strict factor-matching assertion failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    /// Some but not all factors of a candidate divide the polynomial.
    #[error("candidate `{invariant}` is missing factors: {}", .missing.join(", "))]
    MissingFactors {
        /// Candidate whose factors are incomplete.
        invariant: Invariant,
        /// Factors that do not appear.
        missing: Vec<String>,
    },
    /// A candidate's factors appear with different multiplicities.
    #[error("candidate `{invariant}` factors appear with multiplicities {multiplicities:?}")]
    InconsistentMultiplicity {
        /// Candidate with inconsistent powers.
        invariant: Invariant,
        /// Observed multiplicities, in catalog order.
        multiplicities: Vec<u32>,
    },
    /// The catalog does not explain the whole polynomial.
    #[error("matched degree {matched_degree} of {degree}; unmatched factors: {}", .unmatched.join(", "))]
    IncompleteMatch {
        /// Degree explained by the catalog.
        matched_degree: usize,
        /// Degree of the polynomial.
        degree: usize,
        /// Leftover factors, rendered with multiplicity.
        unmatched: Vec<String>,
    },
    /// The polynomial could not be factored.
    #[error(transparent)]
    Factor(#[from] FactorError),
}

/// Malformed input to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructuralError {
    /// Slices carry one or two parameters.
    #[error("a slice needs one or two directions, got {0}")]
    SliceDirections(usize),
    /// Exact work needs a prime-field slice.
    #[error("exact reconstruction needs a finite-field slice, got {0}")]
    NotFiniteField(&'static str),
    /// The operation is only defined on one-parameter slices.
    #[error("{0} requires a one-parameter slice")]
    Univariate(&'static str),
    /// The operation is only defined on two-parameter slices.
    #[error("{0} requires a two-parameter slice")]
    Bivariate(&'static str),
}

/// Failure of a catalog build or codimension-one study.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReconstructionError {
    /// Malformed input.
    #[error(transparent)]
    Structural(#[from] StructuralError),
    /// Interpolation failed.
    #[error(transparent)]
    Interpolation(#[from] InterpolationError),
    /// Factorization failed.
    #[error(transparent)]
    Factor(#[from] FactorError),
    /// Strict matching failed.
    #[error(transparent)]
    Match(#[from] MatchError),
    /// The phase-space collaborator failed.
    #[error(transparent)]
    Kinematics(#[from] KinematicsError),
}

/// Failure to load or validate [`crate::Settings`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The settings file could not be read.
    #[error("cannot read settings: {0}")]
    Io(#[from] std::io::Error),
    /// The TOML is malformed or has unknown keys.
    #[error("invalid settings TOML: {0}")]
    Toml(#[from] toml::de::Error),
    /// A value is out of range.
    #[error("invalid setting `{key}`: {reason}")]
    Invalid {
        /// Offending key.
        key: &'static str,
        /// Why it was rejected.
        reason: String,
    },
    /// The dedicated worker pool could not be created.
    #[error("cannot build worker pool: {0}")]
    ThreadPool(String),
}
