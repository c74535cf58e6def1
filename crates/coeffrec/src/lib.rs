//! Rational-function reconstruction for amplitude coefficients.
//!
//! `coeffrec` recovers closed-form ratios of invariants that describe an
//! unknown coefficient function, given only a numerical black box that
//! can be evaluated at phase-space points over a floating, p-adic or
//! finite-field backend.
//!
//! # Pipeline
//!
//! ```text
//! ScalingAnalyzer      inv -> 0: signed exponent per invariant
//! Slice                line (or plane) through a point along invariant directions
//! interpolate          Newton / Thiele reconstruction on the slice, exact mod p
//! build_catalog        candidate invariant -> irreducible factors on the slice
//! match_factors        polynomial factors -> candidate multiplicities
//! CodimensionOneStudy  all of the above -> ReconstructedTerm
//! ```
//!
//! # Errors
//!
//! | Kind | Where | Effect |
//! |------|-------|--------|
//! | transient numeric failure | scaling | retried with fresh seeds |
//! | degenerate factor, aliasing | catalog, matching | [`report::Notice`] |
//! | match assertion failure | study | [`error::MatchError`] |
//! | structural input error | everywhere | [`error::StructuralError`] |
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use coeffrec::prelude::*;
//! use coeffrec::kinematics::forms::{Form, FormModel, FormPoint};
//!
//! let x = Form::var;
//! let model = Arc::new(
//!     FormModel::new(4, 3)
//!         .with_invariant("a", x(0) + x(1))
//!         .with_invariant("b", x(0) + x(2)),
//! );
//! let field = FieldKind::Finite { prime: 10_007 };
//! let point = model.generate(4, 1, &field).unwrap();
//! let line = slice(point, &[Invariant::new("a")]).unwrap();
//!
//! let bb = FnBlackBox::new(4, |p: &FormPoint| -> Result<Scalar, EvalError> {
//!     let ab = p.evaluate(&Invariant::new("a"))?.mul(&p.evaluate(&Invariant::new("b"))?)?;
//!     Ok(ab.inv()?)
//! });
//! let candidates = [Invariant::new("a"), Invariant::new("b")];
//! let term = run_codimension_one_study(&bb, &line, &candidates, true, &Settings::with_field(field)).unwrap();
//! assert_eq!(term.to_string(), "1/(a b)");
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

// Settings and error taxonomy
pub mod config;
pub mod error;
pub mod report;

// Arithmetic backends and polynomials
pub mod field;
pub mod poly;

// Exact interpolation
pub mod interpolate;

// Phase-space collaborators
pub mod kinematics;

// Reconstruction engine
pub mod catalog;
pub mod matcher;
pub mod scaling;
pub mod slice;
pub mod study;
pub mod term;

pub use catalog::{build_catalog, CatalogCache, FactorCatalog};
pub use config::{InterpolationSettings, Settings};
pub use error::ReconstructionError;
pub use matcher::{match_factors, MatchMode, MatchResult};
pub use report::{Diagnostics, Notice, NoticeKind, Severity};
pub use scaling::{scaling, single_scalings, RetryPolicy, Scaling, ScalingAnalyzer, ScalingOutcome, ScalingResult};
pub use slice::{slice, Slice};
pub use study::{
    bivariate_newton_on_slice, bivariate_on_slice_given_lcd, newton_on_slice, run_codimension_one_study,
    thiele_on_slice, thiele_on_slice_given_lcd, CodimensionOneStudy, Interpolation, StudyReport,
};
pub use term::{poles_and_orders, Monomial, ReconstructedTerm};

/// Everything needed to drive a reconstruction.
pub mod prelude {
    pub use crate::catalog::{build_catalog, CatalogCache, FactorCatalog};
    pub use crate::config::Settings;
    pub use crate::error::{EvalError, ReconstructionError};
    pub use crate::field::{FieldKind, Scalar};
    pub use crate::kinematics::{BlackBox, FnBlackBox, Invariant, PhaseSpacePoint, PointGenerator};
    pub use crate::matcher::{match_factors, MatchMode};
    pub use crate::scaling::ScalingAnalyzer;
    pub use crate::slice::{slice, Slice};
    pub use crate::study::{run_codimension_one_study, CodimensionOneStudy, Interpolation};
    pub use crate::term::ReconstructedTerm;
}
