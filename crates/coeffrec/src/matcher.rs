//! Matching a reconstructed polynomial against a [`FactorCatalog`].

use crate::catalog::FactorCatalog;
use crate::error::MatchError;
use crate::kinematics::Invariant;
use crate::poly::{factor, Poly};
use crate::report::{Diagnostics, Notice, NoticeKind};

/// Strictness of a match.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MatchMode {
    /// The catalog must explain the whole polynomial.
    pub assert_full_match: bool,
    /// A candidate hit must be complete and consistent, or the match
    /// fails. When unset, violations become warnings.
    pub assert_factors: bool,
}

impl MatchMode {
    /// Mode used for denominators.
    pub const fn denominator(assert_factors: bool) -> Self {
        Self {
            assert_full_match: true,
            assert_factors,
        }
    }

    /// Mode used for numerators: leftover content is allowed.
    pub const fn numerator(assert_factors: bool) -> Self {
        Self {
            assert_full_match: false,
            assert_factors,
        }
    }
}

/// Candidates found in a polynomial.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MatchResult {
    /// Matched candidates with their multiplicity, in catalog order.
    pub matched: Vec<(Invariant, u32)>,
    /// Factors the catalog does not explain, with remaining multiplicity.
    pub unmatched: Vec<(Poly, u32)>,
    /// Degree accounted for by `matched`.
    pub matched_degree: usize,
    /// Degree of the polynomial.
    pub degree: usize,
}

impl MatchResult {
    /// Multiplicity of `invariant`, if matched.
    pub fn multiplicity(&self, invariant: &Invariant) -> Option<u32> {
        self.matched
            .iter()
            .find_map(|(inv, m)| (inv == invariant).then_some(*m))
    }

    /// True when nothing is left over.
    pub fn is_full(&self) -> bool {
        self.matched_degree == self.degree
    }
}

fn render(factor: &Poly, multiplicity: u32) -> String {
    if multiplicity == 1 {
        factor.to_string()
    } else {
        format!("({factor})^{multiplicity}")
    }
}

/// Match the factors of `poly` against `catalog`.
///
/// The polynomial is made monic and factored with `seed`. A candidate is
/// hit when any of its factors occurs; it is recorded with the smallest
/// multiplicity among its present factors, and that much is removed from
/// the pool of unexplained factors. Lenient-mode violations are pushed to
/// `diagnostics`.
///
/// # Errors
///
/// [`MatchError::MissingFactors`] or [`MatchError::InconsistentMultiplicity`]
/// under `assert_factors`, [`MatchError::IncompleteMatch`] under
/// `assert_full_match`, and factorization failures.
pub fn match_factors(
    poly: &Poly,
    catalog: &FactorCatalog,
    mode: MatchMode,
    seed: u64,
    diagnostics: &mut Diagnostics,
) -> Result<MatchResult, MatchError> {
    let Some(monic) = poly.monic().filter(|p| !p.is_constant()) else {
        return Ok(MatchResult::default());
    };
    let factorization = factor(&monic, seed)?;
    let mut pool = factorization.factors.clone();
    let mut result = MatchResult {
        degree: factorization.degree(),
        ..MatchResult::default()
    };

    for (invariant, factors) in catalog.entries() {
        let present: Vec<(&Poly, Option<u32>)> = factors
            .iter()
            .map(|f| (f, factorization.multiplicity_of(f)))
            .collect();
        let multiplicities: Vec<u32> = present.iter().filter_map(|(_, m)| *m).collect();
        let Some(&lowest) = multiplicities.iter().min() else {
            continue;
        };

        let missing: Vec<String> = present
            .iter()
            .filter(|(_, m)| m.is_none())
            .map(|(f, _)| f.to_string())
            .collect();
        if !missing.is_empty() {
            if mode.assert_factors {
                return Err(MatchError::MissingFactors {
                    invariant: invariant.clone(),
                    missing,
                });
            }
            diagnostics.push(
                Notice::warn(
                    NoticeKind::LenientMismatch,
                    format!("only some factors of {invariant} are present"),
                )
                .with_details(missing.into_iter().map(|f| format!("missing {f}")).collect()),
            );
        }
        if multiplicities.iter().any(|&m| m != lowest) {
            if mode.assert_factors {
                return Err(MatchError::InconsistentMultiplicity {
                    invariant: invariant.clone(),
                    multiplicities,
                });
            }
            diagnostics.push(Notice::warn(
                NoticeKind::LenientMismatch,
                format!("factors of {invariant} appear with multiplicities {multiplicities:?}; using {lowest}"),
            ));
        }

        for (f, m) in &present {
            if m.is_none() {
                continue;
            }
            result.matched_degree += f.degree().unwrap_or(0) * lowest as usize;
            if let Some(slot) = pool.iter_mut().find(|(g, _)| g == *f) {
                slot.1 -= lowest;
            }
        }
        pool.retain(|(_, m)| *m > 0);
        result.matched.push((invariant.clone(), lowest));
    }

    result.unmatched = pool;
    if mode.assert_full_match && !result.is_full() {
        return Err(MatchError::IncompleteMatch {
            matched_degree: result.matched_degree,
            degree: result.degree,
            unmatched: result.unmatched.iter().map(|(f, m)| render(f, *m)).collect(),
        });
    }
    Ok(result)
}
