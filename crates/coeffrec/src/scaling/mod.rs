//! Single-invariant scaling analysis.
//!
//! The exponent `n` with which a black box behaves like `inv^n` as the
//! invariant is driven to zero is read off in one of two ways, chosen by
//! the configured backend:
//!
//! | Backend | Strategy |
//! |---------|----------|
//! | floating | deform to `10^-k` for `k = start, …, start + number - 1`, fit `log |f|` against `log |inv|` |
//! | p-adic | deform to `p` once, read the valuation of `f` |
//! | finite | unsupported ([`ScalingError::UnsupportedField`]) |
//!
//! Each attempt generates its own phase-space point from the attempt seed;
//! failed attempts are retried by [`RetryPolicy`].
//!
//! ```
//! use std::sync::Arc;
//! use coeffrec::prelude::*;
//! use coeffrec::kinematics::forms::{Form, FormModel, FormPoint};
//!
//! let x = Form::var;
//! let model = Arc::new(FormModel::new(4, 3).with_invariant("a", x(0) + x(1)));
//! let a = Invariant::new("a");
//! let bb = FnBlackBox::new(4, |p: &FormPoint| -> Result<Scalar, EvalError> {
//!     Ok(p.evaluate(&Invariant::new("a"))?.powi(-2)?)
//! });
//!
//! let analyzer = ScalingAnalyzer::new(model, Settings::default());
//! assert_eq!(analyzer.scaling(&bb, &a, 1).unwrap().exponent, -2);
//! ```

use rayon::prelude::*;
use serde::Serialize;

use crate::config::Settings;
use crate::error::{ConfigError, EvalError, ScalingError};
use crate::field::{FieldKind, PAdic, Scalar};
use crate::kinematics::{BlackBox, Invariant, PhaseSpacePoint, PointGenerator};
use crate::report::Diagnostics;

mod fit;
pub use fit::log_linear_fit;

mod retry;
pub use retry::{Attempted, RetryPolicy};

/// Exponent of one invariant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Scaling {
    /// Signed exponent: positive for zeros, negative for poles.
    pub exponent: i32,
    /// Attempts used (zero for identically vanishing black boxes).
    pub attempts: u32,
    /// Black-box evaluations performed by the successful attempt.
    pub samples: usize,
    /// Retries that led up to the successful attempt.
    pub diagnostics: Diagnostics,
}

/// Per-invariant outcome of a batch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScalingOutcome {
    /// The exponent was determined.
    Exponent(i32),
    /// Every attempt failed.
    Failed {
        /// Final error, rendered.
        reason: String,
    },
}

/// Exponents of a list of invariants, in input order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ScalingResult {
    /// One entry per requested invariant.
    pub entries: Vec<(Invariant, ScalingOutcome)>,
    /// Retry notices of every invariant, in input order.
    pub diagnostics: Diagnostics,
}

impl ScalingResult {
    /// Outcome for `invariant`.
    pub fn get(&self, invariant: &Invariant) -> Option<&ScalingOutcome> {
        self.entries
            .iter()
            .find_map(|(inv, outcome)| (inv == invariant).then_some(outcome))
    }

    /// Exponent for `invariant`, if it was determined.
    pub fn exponent(&self, invariant: &Invariant) -> Option<i32> {
        match self.get(invariant)? {
            ScalingOutcome::Exponent(n) => Some(*n),
            ScalingOutcome::Failed { .. } => None,
        }
    }

    /// Invariants whose scaling failed.
    pub fn failures(&self) -> impl Iterator<Item = (&Invariant, &str)> {
        self.entries.iter().filter_map(|(inv, outcome)| match outcome {
            ScalingOutcome::Failed { reason } => Some((inv, reason.as_str())),
            ScalingOutcome::Exponent(_) => None,
        })
    }
}

/// Scaling analysis against a point generator.
#[derive(Clone, Debug)]
pub struct ScalingAnalyzer<G> {
    generator: G,
    settings: Settings,
}

impl<G: PointGenerator> ScalingAnalyzer<G> {
    /// Analyzer drawing points from `generator`.
    pub fn new(generator: G, settings: Settings) -> Self {
        Self { generator, settings }
    }

    /// The settings in use.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Exponent of `bb` as `invariant → 0`.
    ///
    /// # Errors
    ///
    /// Non-transient failures immediately, otherwise
    /// [`ScalingError::RetriesExhausted`] after the configured attempts.
    pub fn scaling<B>(&self, bb: &B, invariant: &Invariant, seed: u64) -> Result<Scaling, ScalingError>
    where
        B: BlackBox<G::Point> + ?Sized,
    {
        if bb.is_zero() {
            return Ok(Scaling {
                exponent: 0,
                attempts: 0,
                samples: 0,
                diagnostics: Diagnostics::new(),
            });
        }
        let policy = RetryPolicy::from_settings(&self.settings);
        let Attempted {
            value: (exponent, samples),
            attempts,
            retries,
        } = policy.run(seed, |s| self.attempt(bb, invariant, s))?;
        log::debug!("scaling of {invariant}: {exponent} ({attempts} attempts, {samples} samples)");
        Ok(Scaling {
            exponent,
            attempts,
            samples,
            diagnostics: retries,
        })
    }

    /// Exponents of `bb` for every invariant, computed independently.
    ///
    /// Failures are recorded per invariant rather than aborting the batch.
    /// Invariant `i` is analysed with seed `seed + i`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::ThreadPool`] if a dedicated pool was requested and
    /// cannot be built.
    pub fn scalings<B>(&self, bb: &B, invariants: &[Invariant], seed: u64) -> Result<ScalingResult, ConfigError>
    where
        B: BlackBox<G::Point> + ?Sized,
    {
        let one = |(i, invariant): (usize, &Invariant)| {
            match self.scaling(bb, invariant, seed.wrapping_add(i as u64)) {
                Ok(s) => ((invariant.clone(), ScalingOutcome::Exponent(s.exponent)), s.diagnostics),
                Err(e) => {
                    log::warn!("scaling of {invariant} failed: {e}");
                    let outcome = ScalingOutcome::Failed { reason: e.to_string() };
                    ((invariant.clone(), outcome), Diagnostics::new())
                }
            }
        };
        type Row = ((Invariant, ScalingOutcome), Diagnostics);
        let rows: Vec<Row> = if self.settings.parallel {
            let run = || -> Vec<Row> { invariants.par_iter().enumerate().map(one).collect() };
            match self.settings.thread_pool()? {
                Some(pool) => pool.install(run),
                None => run(),
            }
        } else {
            invariants.iter().enumerate().map(one).collect()
        };
        let mut result = ScalingResult::default();
        for (entry, diagnostics) in rows {
            result.entries.push(entry);
            result.diagnostics.extend(diagnostics);
        }
        Ok(result)
    }

    /// One attempt: `(exponent, samples)`.
    fn attempt<B>(&self, bb: &B, invariant: &Invariant, seed: u64) -> Result<(i32, usize), ScalingError>
    where
        B: BlackBox<G::Point> + ?Sized,
    {
        let field = self.settings.field;
        match field {
            FieldKind::Floating => self.floating(bb, invariant, seed),
            FieldKind::PAdic { prime, digits } => self.padic(bb, invariant, seed, prime, digits),
            FieldKind::Finite { .. } => Err(ScalingError::UnsupportedField(field.name())),
        }
    }

    fn floating<B>(&self, bb: &B, invariant: &Invariant, seed: u64) -> Result<(i32, usize), ScalingError>
    where
        B: BlackBox<G::Point> + ?Sized,
    {
        let point = self
            .generator
            .generate(bb.multiplicity(), seed, &FieldKind::Floating)?;
        let start = self.settings.scalings_iterations_start;
        let number = self.settings.scalings_iterations_number;
        let mut xs = Vec::with_capacity(number as usize);
        let mut ys = Vec::with_capacity(number as usize);
        for k in start..start + number {
            let scale = 10f64.powi(-(k as i32));
            let moved = point.deform(core::slice::from_ref(invariant), &[Scalar::Floating(scale)])?;
            xs.push(magnitude(moved.evaluate(invariant)?)?);
            ys.push(magnitude(bb.evaluate(&moved)?)?);
        }
        log::trace!("{invariant}: |inv| = {xs:?}, |f| = {ys:?}");
        Ok((log_linear_fit(&xs, &ys, self.settings.fit_tolerance)?, ys.len()))
    }

    fn padic<B>(
        &self,
        bb: &B,
        invariant: &Invariant,
        seed: u64,
        prime: u64,
        digits: u32,
    ) -> Result<(i32, usize), ScalingError>
    where
        B: BlackBox<G::Point> + ?Sized,
    {
        let point = self
            .generator
            .generate(bb.multiplicity(), seed, &self.settings.field)?;
        let step = Scalar::PAdic(PAdic::p_power(prime, digits, 1));
        let moved = point.deform(core::slice::from_ref(invariant), &[step])?;
        match bb.evaluate(&moved)? {
            Scalar::PAdic(v) if v.is_zero() => Err(ScalingError::DigitsExhausted(invariant.clone())),
            Scalar::PAdic(v) => {
                log::trace!("{invariant}: f = {v}");
                Ok((v.valuation(), 1))
            }
            other => Err(EvalError::new(format!("expected a p-adic value, got {other}")).into()),
        }
    }
}

fn magnitude(value: Scalar) -> Result<f64, ScalingError> {
    value.magnitude().ok_or_else(|| ScalingError::MalformedFit {
        reason: format!("expected a floating value, got a {} one", value.backend()),
    })
}

/// Exponent of `bb` as `invariant → 0`; see [`ScalingAnalyzer::scaling`].
///
/// # Errors
///
/// As [`ScalingAnalyzer::scaling`].
pub fn scaling<G, B>(
    generator: &G,
    bb: &B,
    invariant: &Invariant,
    seed: u64,
    settings: &Settings,
) -> Result<Scaling, ScalingError>
where
    G: PointGenerator + Clone,
    B: BlackBox<G::Point> + ?Sized,
{
    ScalingAnalyzer::new(generator.clone(), settings.clone()).scaling(bb, invariant, seed)
}

/// Batch exponents; see [`ScalingAnalyzer::scalings`].
///
/// # Errors
///
/// As [`ScalingAnalyzer::scalings`].
pub fn single_scalings<G, B>(
    generator: &G,
    bb: &B,
    invariants: &[Invariant],
    seed: u64,
    settings: &Settings,
) -> Result<ScalingResult, ConfigError>
where
    G: PointGenerator + Clone,
    B: BlackBox<G::Point> + ?Sized,
{
    ScalingAnalyzer::new(generator.clone(), settings.clone()).scalings(bb, invariants, seed)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::kinematics::forms::{Form, FormModel, FormPoint};
    use crate::kinematics::FnBlackBox;

    fn model() -> Arc<FormModel> {
        let x = Form::var;
        Arc::new(
            FormModel::new(4, 3)
                .with_invariant("a", x(0) + x(1))
                .with_invariant("b", x(1) + x(2)),
        )
    }

    fn a_times_b_squared(p: &FormPoint) -> Result<Scalar, EvalError> {
        let a = p.evaluate(&Invariant::new("a"))?;
        let b = p.evaluate(&Invariant::new("b"))?;
        Ok(a.mul(&b.powi(2)?)?)
    }

    #[test]
    fn finite_fields_have_no_strategy() {
        let analyzer = ScalingAnalyzer::new(model(), Settings::with_field(FieldKind::finite()));
        let bb = FnBlackBox::new(4, a_times_b_squared);
        assert_eq!(
            analyzer.scaling(&bb, &Invariant::new("a"), 0),
            Err(ScalingError::UnsupportedField("finite"))
        );
    }

    #[test]
    fn batch_preserves_order_and_records_failures() {
        let bb = FnBlackBox::new(4, a_times_b_squared);
        let invariants: Vec<Invariant> = ["b", "missing", "a"].into_iter().map(Invariant::new).collect();
        for parallel in [true, false] {
            let settings = Settings {
                parallel,
                ..Settings::default()
            };
            let result = single_scalings(&model(), &bb, &invariants, 3, &settings).unwrap();
            let names: Vec<_> = result.entries.iter().map(|(i, _)| i.as_str()).collect();
            assert_eq!(names, ["b", "missing", "a"]);
            assert_eq!(result.exponent(&Invariant::new("a")), Some(1));
            assert_eq!(result.exponent(&Invariant::new("b")), Some(2));
            assert_eq!(result.failures().count(), 1);
        }
    }

    #[test]
    fn padic_batch_matches_floating() {
        let bb = FnBlackBox::new(4, a_times_b_squared);
        let invariants = [Invariant::new("a"), Invariant::new("b")];
        let settings = Settings::with_field(FieldKind::padic());
        let result = single_scalings(&model(), &bb, &invariants, 11, &settings).unwrap();
        assert_eq!(result.exponent(&invariants[0]), Some(1));
        assert_eq!(result.exponent(&invariants[1]), Some(2));
    }
}
