//! Scaling exponents recovered end to end.
//!
//! Every scenario uses the reference form model, so `a → 0` is reached by
//! moving a single pivot coordinate.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use coeffrec::error::{EvalError, KinematicsError, ScalingError};
use coeffrec::kinematics::forms::{Form, FormModel, FormPoint};
use coeffrec::prelude::*;
use coeffrec::NoticeKind;

fn model() -> Arc<FormModel> {
    let x = Form::var;
    Arc::new(
        FormModel::new(5, 4)
            .with_invariant("a", x(0) + x(1))
            .with_invariant("b", x(2) * x(3) + x(1)),
    )
}

fn power_of_a(n: i32) -> impl Fn(&FormPoint) -> Result<Scalar, EvalError> + Sync {
    move |p| {
        let a = p.evaluate(&Invariant::new("a"))?;
        let b = p.evaluate(&Invariant::new("b"))?;
        Ok(a.powi(n)?.mul(&b)?)
    }
}

#[test]
fn floating_strategy_recovers_integer_powers() {
    let analyzer = ScalingAnalyzer::new(model(), Settings::default());
    let a = Invariant::new("a");
    for n in -5..=5 {
        let bb = FnBlackBox::new(5, power_of_a(n));
        let s = analyzer.scaling(&bb, &a, 42).unwrap();
        assert_eq!(s.exponent, n, "a^{n}");
        assert_eq!(s.attempts, 1);
        assert_eq!(s.samples, 3);
    }
}

#[test]
fn padic_strategy_recovers_integer_powers() {
    let analyzer = ScalingAnalyzer::new(model(), Settings::with_field(FieldKind::padic()));
    let a = Invariant::new("a");
    for n in -5..=5 {
        let bb = FnBlackBox::new(5, power_of_a(n));
        let s = analyzer.scaling(&bb, &a, 7).unwrap();
        assert_eq!(s.exponent, n, "a^{n}");
        assert_eq!(s.samples, 1);
    }
}

#[test]
fn identically_zero_functions_are_never_sampled() {
    let calls = AtomicUsize::new(0);
    let bb = FnBlackBox::new(5, |_: &FormPoint| -> Result<Scalar, EvalError> {
        calls.fetch_add(1, Ordering::SeqCst);
        Err(EvalError::new("must not be called"))
    })
    .identically_zero();
    let invariants = [Invariant::new("a"), Invariant::new("b"), Invariant::new("nonexistent")];
    for field in [FieldKind::Floating, FieldKind::padic()] {
        let analyzer = ScalingAnalyzer::new(model(), Settings::with_field(field));
        let result = analyzer.scalings(&bb, &invariants, 0).unwrap();
        for inv in &invariants {
            assert_eq!(result.exponent(inv), Some(0));
            let s = analyzer.scaling(&bb, inv, 0).unwrap();
            assert_eq!((s.attempts, s.samples), (0, 0));
        }
    }
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn one_transient_failure_costs_one_retry() {
    let calls = AtomicUsize::new(0);
    let inner = power_of_a(-2);
    let bb = FnBlackBox::new(5, |p: &FormPoint| {
        if calls.fetch_add(1, Ordering::SeqCst) == 0 {
            return Err(EvalError::new("first evaluation fails"));
        }
        inner(p)
    });
    let analyzer = ScalingAnalyzer::new(model(), Settings::default());
    let s = analyzer.scaling(&bb, &Invariant::new("a"), 1).unwrap();
    assert_eq!(s.exponent, -2);
    assert_eq!(s.attempts, 2);
    assert_eq!(s.diagnostics.of_kind(NoticeKind::Retried).count(), 1);

    calls.store(0, Ordering::SeqCst);
    let batch = analyzer.scalings(&bb, &[Invariant::new("a")], 1).unwrap();
    assert_eq!(batch.exponent(&Invariant::new("a")), Some(-2));
    assert_eq!(batch.diagnostics.of_kind(NoticeKind::Retried).count(), 1);
}

#[test]
fn persistent_failures_exhaust_the_budget() {
    let bb = FnBlackBox::new(5, |_: &FormPoint| -> Result<Scalar, EvalError> { Err(EvalError::new("always")) });
    let settings = Settings {
        retry_attempts: 3,
        ..Settings::default()
    };
    let analyzer = ScalingAnalyzer::new(model(), settings);
    let err = analyzer.scaling(&bb, &Invariant::new("a"), 1).unwrap_err();
    assert!(matches!(err, ScalingError::RetriesExhausted { attempts: 3, .. }), "{err}");

    let result = analyzer.scalings(&bb, &[Invariant::new("a")], 1).unwrap();
    assert_eq!(result.failures().count(), 1);
}

#[test]
fn scalings_feed_a_reconstructed_term() {
    let bb = FnBlackBox::new(5, |p: &FormPoint| -> Result<Scalar, EvalError> {
        let a = p.evaluate(&Invariant::new("a"))?;
        let b = p.evaluate(&Invariant::new("b"))?;
        Ok(b.powi(2)?.div(&a.powi(3)?)?)
    });
    let invariants = [Invariant::new("a"), Invariant::new("b")];
    let analyzer = ScalingAnalyzer::new(model(), Settings::with_field(FieldKind::padic()));
    let result = analyzer.scalings(&bb, &invariants, 5).unwrap();
    let term = ReconstructedTerm::from_scalings(&result, 5);
    assert_eq!(term.to_string(), "(b²)/(a³)");
}

#[test]
fn unknown_invariants_inside_the_black_box_are_not_retried() {
    let calls = AtomicUsize::new(0);
    let bb = FnBlackBox::new(5, |p: &FormPoint| -> Result<Scalar, EvalError> {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(p.evaluate(&Invariant::new("zz"))?)
    });
    let settings = Settings {
        retry_attempts: 4,
        ..Settings::default()
    };
    let analyzer = ScalingAnalyzer::new(model(), settings);
    let err = analyzer.scaling(&bb, &Invariant::new("a"), 1).unwrap_err();
    assert!(
        matches!(
            err,
            ScalingError::Evaluation(EvalError::Kinematics(KinematicsError::UnknownInvariant(_)))
        ),
        "{err}"
    );
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}
