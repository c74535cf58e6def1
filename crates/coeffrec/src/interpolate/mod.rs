//! Exact interpolation over Z/pZ.
//!
//! All interpolators sample a function `t ↦ f(t)` at seeded random distinct
//! points of the field. Points at which the function cannot be evaluated
//! (poles, degenerate kinematics) are skipped; [`MAX_CONSECUTIVE_FAILURES`]
//! failed samples in a row abort the interpolation.
//!
//! | Function | Result | Termination |
//! |----------|--------|-------------|
//! | [`newton`] | [`Poly`](crate::poly::Poly) | `checks` consecutive zero divided differences |
//! | [`thiele`] | [`Rational`](crate::poly::Rational) | `checks` consecutive correct predictions |
//! | [`bivariate_newton`] | [`BiPoly`](crate::poly::BiPoly) | `checks` consecutive zero vector differences |

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{EvalError, InterpolationError};

mod newton;
pub use newton::newton;

mod thiele;
pub use thiele::thiele;

mod bivariate;
pub use bivariate::bivariate_newton;

/// Consecutive failed samples tolerated before giving up.
pub const MAX_CONSECUTIVE_FAILURES: usize = 32;

/// Seeded stream of distinct non-zero field elements.
pub(crate) struct SamplePoints {
    prime: u64,
    rng: StdRng,
    used: HashSet<u64>,
}

impl SamplePoints {
    pub(crate) fn new(prime: u64, seed: u64) -> Self {
        Self {
            prime,
            rng: StdRng::seed_from_u64(seed),
            used: HashSet::new(),
        }
    }

    /// Next unused point; `None` once the field is exhausted.
    pub(crate) fn next_point(&mut self) -> Option<u64> {
        if self.used.len() as u64 >= self.prime - 1 {
            return None;
        }
        loop {
            let x = self.rng.gen_range(1..self.prime);
            if self.used.insert(x) {
                return Some(x);
            }
        }
    }
}

/// Consecutive-failure bookkeeping shared by the interpolators.
#[derive(Default)]
pub(crate) struct FailureBudget {
    consecutive: usize,
}

impl FailureBudget {
    /// Record a failed sample.
    pub(crate) fn fail(&mut self, x: u64, e: EvalError) -> Result<(), InterpolationError> {
        self.consecutive += 1;
        log::trace!("skipping sample point {x}: {e}");
        if self.consecutive >= MAX_CONSECUTIVE_FAILURES {
            return Err(InterpolationError::TooManyFailures {
                failures: self.consecutive,
                last: e,
            });
        }
        Ok(())
    }

    /// Record a successful sample.
    pub(crate) fn succeed(&mut self) {
        self.consecutive = 0;
    }
}
