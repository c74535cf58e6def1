//! Codimension-one studies: restrict the black box to a slice, reconstruct
//! it exactly, and explain its numerator and denominator by catalog
//! invariants.
//!
//! The `*_on_slice` functions expose the interpolation step on its own.

use std::sync::Arc;

use crate::catalog::{build_catalog, CatalogCache, FactorCatalog};
use crate::config::Settings;
use crate::error::{EvalError, InterpolationError, ReconstructionError, StructuralError};
use crate::field::Scalar;
use crate::interpolate::{bivariate_newton, newton, thiele};
use crate::kinematics::{BlackBox, Invariant, PhaseSpacePoint};
use crate::matcher::{match_factors, MatchMode, MatchResult};
use crate::poly::{BiPoly, BiRational, Poly, Rational};
use crate::report::Diagnostics;
use crate::slice::Slice;
use crate::term::{Monomial, ReconstructedTerm};

fn univariate_prime<P: PhaseSpacePoint>(slice: &Slice<P>, what: &'static str) -> Result<u64, ReconstructionError> {
    if slice.parameters() != 1 {
        return Err(StructuralError::Univariate(what).into());
    }
    Ok(slice.prime()?)
}

fn bivariate_prime<P: PhaseSpacePoint>(slice: &Slice<P>, what: &'static str) -> Result<u64, ReconstructionError> {
    if slice.parameters() != 2 {
        return Err(StructuralError::Bivariate(what).into());
    }
    Ok(slice.prime()?)
}

fn ratio<P, B, K>(bb: &B, known: &K, point: &P) -> Result<Scalar, EvalError>
where
    B: BlackBox<P> + ?Sized,
    K: BlackBox<P> + ?Sized,
{
    let f = bb.evaluate(point)?;
    let k = known.evaluate(point)?;
    Ok(f.div(&k)?)
}

/// Newton interpolation of `bb` along a one-parameter slice.
///
/// # Errors
///
/// Structural errors for unsuitable slices; interpolation failures.
pub fn newton_on_slice<P, B>(bb: &B, slice: &Slice<P>, settings: &Settings) -> Result<Poly, ReconstructionError>
where
    P: PhaseSpacePoint,
    B: BlackBox<P> + ?Sized,
{
    let prime = univariate_prime(slice, "newton_on_slice")?;
    Ok(newton(
        |t| slice.residue_at(prime, &[t], |pt| bb.evaluate(pt)),
        prime,
        &settings.interpolation,
    )?)
}

/// Thiele interpolation of `bb` along a one-parameter slice.
///
/// # Errors
///
/// Structural errors for unsuitable slices; interpolation failures.
pub fn thiele_on_slice<P, B>(bb: &B, slice: &Slice<P>, settings: &Settings) -> Result<Rational, ReconstructionError>
where
    P: PhaseSpacePoint,
    B: BlackBox<P> + ?Sized,
{
    let prime = univariate_prime(slice, "thiele_on_slice")?;
    Ok(thiele(
        |t| slice.residue_at(prime, &[t], |pt| bb.evaluate(pt)),
        prime,
        &settings.interpolation,
    )?)
}

/// Reconstruct `bb` along a one-parameter slice given a factor `known`
/// that clears its denominator.
///
/// `bb / known` is interpolated as a polynomial and multiplied by the
/// Thiele reconstruction of `known`.
///
/// # Errors
///
/// Structural errors for unsuitable slices; interpolation failures, in
/// particular [`crate::error::InterpolationError::NoConvergence`] when
/// `known` does not clear the denominator.
pub fn thiele_on_slice_given_lcd<P, B, K>(
    bb: &B,
    known: &K,
    slice: &Slice<P>,
    settings: &Settings,
) -> Result<Rational, ReconstructionError>
where
    P: PhaseSpacePoint,
    B: BlackBox<P> + ?Sized,
    K: BlackBox<P> + ?Sized,
{
    let prime = univariate_prime(slice, "thiele_on_slice_given_lcd")?;
    let reduced = newton(
        |t| slice.residue_at(prime, &[t], |pt| ratio(bb, known, pt)),
        prime,
        &settings.interpolation,
    )?;
    let cleared = thiele(
        |t| slice.residue_at(prime, &[t], |pt| known.evaluate(pt)),
        prime,
        &settings.interpolation,
    )?;
    Ok(Rational::from_poly(reduced).mul(&cleared))
}

fn newton_on_plane<P, F>(
    slice: &Slice<P>,
    prime: u64,
    settings: &Settings,
    part: F,
) -> Result<BiPoly, InterpolationError>
where
    P: PhaseSpacePoint,
    F: Fn(&P) -> Result<Scalar, EvalError>,
{
    bivariate_newton(
        |t1, t2| slice.residue_at(prime, &[t1, t2], &part),
        prime,
        &settings.interpolation,
    )
}

/// Bivariate Newton interpolation of `bb` along a two-parameter slice.
///
/// # Errors
///
/// Structural errors for unsuitable slices; interpolation failures.
pub fn bivariate_newton_on_slice<P, B>(bb: &B, slice: &Slice<P>, settings: &Settings) -> Result<BiPoly, ReconstructionError>
where
    P: PhaseSpacePoint,
    B: BlackBox<P> + ?Sized,
{
    let prime = bivariate_prime(slice, "bivariate_newton_on_slice")?;
    Ok(bivariate_newton(
        |t1, t2| slice.residue_at(prime, &[t1, t2], |pt| bb.evaluate(pt)),
        prime,
        &settings.interpolation,
    )?)
}

/// Reconstruct `bb` along a two-parameter slice given a term `known` that
/// clears its denominator.
///
/// The result is `N(bb / known) · N(known numerator) / N(known denominator)`
/// with every `N` a bivariate Newton interpolation. It is not reduced.
///
/// # Errors
///
/// Structural errors for unsuitable slices; interpolation failures.
pub fn bivariate_on_slice_given_lcd<P, B>(
    bb: &B,
    known: &ReconstructedTerm,
    slice: &Slice<P>,
    settings: &Settings,
) -> Result<BiRational, ReconstructionError>
where
    P: PhaseSpacePoint,
    B: BlackBox<P> + ?Sized,
{
    let prime = bivariate_prime(slice, "bivariate_on_slice_given_lcd")?;
    let reduced = newton_on_plane(slice, prime, settings, |pt| ratio(bb, known, pt))?;
    let num = newton_on_plane(slice, prime, settings, |pt| {
        let value = known.numerator.evaluate(pt)?;
        Ok(Scalar::from_i64(pt.field(), known.coefficient).mul(&value)?)
    })?;
    let den = newton_on_plane(slice, prime, settings, |pt| Ok(known.denominator.evaluate(pt)?))?;
    Ok(BiRational {
        num: reduced.mul(&num),
        den,
    })
}

/// How a study reconstructs the black box on the slice.
pub enum Interpolation<'a, P> {
    /// Thiele continued fractions.
    Thiele,
    /// Newton interpolation after dividing out a known denominator-clearing
    /// factor; see [`thiele_on_slice_given_lcd`].
    KnownFactor(&'a dyn BlackBox<P>),
}

impl<P> Clone for Interpolation<'_, P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P> Copy for Interpolation<'_, P> {}

impl<P> std::fmt::Debug for Interpolation<'_, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Thiele => write!(f, "Thiele"),
            Self::KnownFactor(k) => write!(f, "KnownFactor(multiplicity {})", k.multiplicity()),
        }
    }
}

/// Everything a study produced.
#[derive(Clone, Debug)]
pub struct StudyReport {
    /// Reconstructed monomial ratio.
    pub term: ReconstructedTerm,
    /// The black box on the slice.
    pub function: Rational,
    /// Catalog used for matching.
    pub catalog: Arc<FactorCatalog>,
    /// Numerator match; `unmatched` holds polynomial content with no
    /// catalog explanation.
    pub numerator: MatchResult,
    /// Denominator match; always complete.
    pub denominator: MatchResult,
    /// Catalog and matching notices.
    pub diagnostics: Diagnostics,
}

/// Orchestrates slice interpolation, catalog building and matching.
#[derive(Debug)]
pub struct CodimensionOneStudy<'a> {
    settings: &'a Settings,
    cache: Option<&'a mut CatalogCache>,
}

impl<'a> CodimensionOneStudy<'a> {
    /// Study without catalog caching.
    pub fn new(settings: &'a Settings) -> Self {
        Self { settings, cache: None }
    }

    /// Reuse catalogs from `cache`.
    #[must_use]
    pub fn with_cache(mut self, cache: &'a mut CatalogCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Reconstruct `bb` on `slice`, explaining its denominator by
    /// `candidates`.
    ///
    /// The numerator is matched leniently and the denominator strictly.
    /// `assert_factors` controls whether partial or inconsistent candidate
    /// hits abort the study.
    ///
    /// # Errors
    ///
    /// [`StructuralError`] for slices that are not one-parameter
    /// finite-field slices; interpolation, factorization or catalog
    /// failures; [`crate::error::MatchError`] when the denominator is not
    /// fully explained or a strict candidate check fails.
    pub fn run<P, B>(
        &mut self,
        bb: &B,
        slice: &Slice<P>,
        candidates: &[Invariant],
        assert_factors: bool,
        interpolation: Interpolation<'_, P>,
    ) -> Result<StudyReport, ReconstructionError>
    where
        P: PhaseSpacePoint,
        B: BlackBox<P> + ?Sized,
    {
        univariate_prime(slice, "codimension-one study")?;
        let function = match interpolation {
            Interpolation::Thiele => thiele_on_slice(bb, slice, self.settings)?,
            Interpolation::KnownFactor(known) => thiele_on_slice_given_lcd(bb, known, slice, self.settings)?,
        };
        log::debug!("function on slice: {function}");

        let catalog = match self.cache.as_deref_mut() {
            Some(cache) => cache.get_or_build(candidates, slice, self.settings)?,
            None => Arc::new(build_catalog(candidates, slice, self.settings)?),
        };
        let mut diagnostics = catalog.diagnostics().clone();
        let seed = self.settings.factor_seed;
        let numerator = match_factors(
            function.numerator(),
            &catalog,
            MatchMode::numerator(assert_factors),
            seed,
            &mut diagnostics,
        )?;
        let denominator = match_factors(
            function.denominator(),
            &catalog,
            MatchMode::denominator(assert_factors),
            seed,
            &mut diagnostics,
        )?;

        let mut term = ReconstructedTerm::new(
            Monomial::from_powers(numerator.matched.iter().cloned()),
            Monomial::from_powers(denominator.matched.iter().cloned()),
            bb.multiplicity(),
        );
        if function.numerator().is_zero() {
            term.coefficient = 0;
        }
        log::debug!("codimension-one study on {:?}: {term}", slice.directions());
        Ok(StudyReport {
            term,
            function,
            catalog,
            numerator,
            denominator,
            diagnostics,
        })
    }
}

/// Thiele-based study without caching; see [`CodimensionOneStudy::run`].
///
/// # Errors
///
/// As [`CodimensionOneStudy::run`].
pub fn run_codimension_one_study<P, B>(
    bb: &B,
    slice: &Slice<P>,
    candidates: &[Invariant],
    assert_factors: bool,
    settings: &Settings,
) -> Result<ReconstructedTerm, ReconstructionError>
where
    P: PhaseSpacePoint,
    B: BlackBox<P> + ?Sized,
{
    CodimensionOneStudy::new(settings)
        .run(bb, slice, candidates, assert_factors, Interpolation::Thiele)
        .map(|report| report.term)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MatchError;
    use crate::field::FieldKind;
    use crate::kinematics::forms::{Form, FormModel, FormPoint};
    use crate::kinematics::{FnBlackBox, PointGenerator};

    const PRIME: u64 = 10_007;

    fn line() -> Slice<FormPoint> {
        let x = Form::var;
        let model = Arc::new(
            FormModel::new(4, 3)
                .with_invariant("a", x(0) + x(1))
                .with_invariant("b", x(0) + x(2))
                .with_invariant("c", x(1) * x(2)),
        );
        let point = model.generate(4, 11, &FieldKind::Finite { prime: PRIME }).unwrap();
        Slice::new(point, vec!["a".into()]).unwrap()
    }

    fn settings() -> Settings {
        Settings::with_field(FieldKind::Finite { prime: PRIME })
    }

    fn a_over_b() -> impl Fn(&FormPoint) -> Result<Scalar, EvalError> {
        |p| {
            let a = p.evaluate(&"a".into())?;
            let b = p.evaluate(&"b".into())?;
            Ok(a.mul(&a)?.div(&b)?)
        }
    }

    #[test]
    fn study_splits_numerator_and_denominator() {
        let bb = FnBlackBox::new(4, a_over_b());
        let s = line();
        let report = CodimensionOneStudy::new(&settings())
            .run(&bb, &s, &["a".into(), "b".into(), "c".into()], true, Interpolation::Thiele)
            .unwrap();
        assert_eq!(report.term.to_string(), "(a²)/(b)");
        assert_eq!(report.function.denominator().degree(), Some(1));
        assert!(report.numerator.unmatched.is_empty());
        assert_eq!(report.catalog.discarded_constants(), &[Invariant::new("c")]);
    }

    #[test]
    fn known_factor_gives_the_same_function() {
        let bb = FnBlackBox::new(4, a_over_b());
        let known = ReconstructedTerm::new(Monomial::new(), Monomial::from_powers([("b".into(), 1)]), 4);
        let s = line();
        let plain = thiele_on_slice(&bb, &s, &settings()).unwrap();
        let lcd = thiele_on_slice_given_lcd(&bb, &known, &s, &settings()).unwrap();
        assert_eq!(plain, lcd);
        let report = CodimensionOneStudy::new(&settings())
            .run(&bb, &s, &["b".into(), "a".into()], true, Interpolation::KnownFactor(&known))
            .unwrap();
        assert_eq!(report.term.to_string(), "(a²)/(b)");
    }

    #[test]
    fn zero_black_box_has_zero_coefficient() {
        let bb = FnBlackBox::new(4, |p: &FormPoint| Ok::<_, EvalError>(Scalar::zero(p.field())));
        let term = run_codimension_one_study(&bb, &line(), &["a".into()], true, &settings()).unwrap();
        assert_eq!(term.coefficient, 0);
        assert!(term.numerator.is_one() && term.denominator.is_one());
    }

    #[test]
    fn missing_candidates_fail_the_denominator() {
        let bb = FnBlackBox::new(4, a_over_b());
        let err = run_codimension_one_study(&bb, &line(), &["a".into()], true, &settings()).unwrap_err();
        assert!(matches!(
            err,
            ReconstructionError::Match(MatchError::IncompleteMatch { degree: 1, matched_degree: 0, .. })
        ));
    }

    #[test]
    fn newton_on_slice_recovers_polynomials() {
        let bb = FnBlackBox::new(4, |p: &FormPoint| -> Result<Scalar, EvalError> {
            let a = p.evaluate(&"a".into())?;
            Ok(a.mul(&a)?)
        });
        let poly = newton_on_slice(&bb, &line(), &settings()).unwrap();
        assert_eq!(poly, Poly::monomial(PRIME, 1, 2));
    }

    #[test]
    fn slice_dimension_is_checked() {
        let bb = FnBlackBox::new(4, a_over_b());
        assert!(matches!(
            bivariate_newton_on_slice(&bb, &line(), &settings()),
            Err(ReconstructionError::Structural(StructuralError::Bivariate(_)))
        ));
    }

    #[test]
    fn bivariate_lcd_matches_the_black_box() {
        let x = Form::var;
        let model = Arc::new(
            FormModel::new(4, 3)
                .with_invariant("a", x(0) + x(1))
                .with_invariant("b", x(2))
                .with_invariant("d", x(0) + x(1) + x(2)),
        );
        let point = model.generate(4, 2, &FieldKind::Finite { prime: PRIME }).unwrap();
        let plane = Slice::new(point, vec!["a".into(), "b".into()]).unwrap();
        let bb = FnBlackBox::new(4, |p: &FormPoint| -> Result<Scalar, EvalError> {
            let a = p.evaluate(&"a".into())?;
            let d = p.evaluate(&"d".into())?;
            Ok(d.div(&a)?)
        });
        let known = ReconstructedTerm::new(Monomial::new(), Monomial::from_powers([("a".into(), 1)]), 4);
        let r = bivariate_on_slice_given_lcd(&bb, &known, &plane, &settings()).unwrap();
        // d = t1 + t2 on this plane
        for (t1, t2) in [(3, 5), (17, 4), (100, 9_000)] {
            let expected = crate::field::mul_mod(
                (t1 + t2) % PRIME,
                crate::field::inv_mod(t1, PRIME).unwrap(),
                PRIME,
            );
            assert_eq!(r.eval(t1, t2), Some(expected));
        }
    }
}
