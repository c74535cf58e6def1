//! Factor catalogs: which irreducible factors each candidate invariant
//! contributes along a slice.
//!
//! Building a catalog evaluates every candidate along the slice parameter
//! (by exact Newton interpolation), factors the result, and resolves
//! factors shared between candidates:
//!
//! * constant candidates are discarded;
//! * factors of multiplicity other than one are dropped, and a candidate
//!   left without factors leaves the catalog;
//! * a candidate with at least one factor nobody else has keeps exactly
//!   those unique factors;
//! * candidates whose factors are all shared are visited shortest factor
//!   list first (earliest in the input on ties); one that overlaps no kept
//!   candidate is kept as a representative, any other becomes an alias of
//!   the first representative it overlaps.
//!
//! No factor appears in two catalog entries. Every recoverable event is
//! recorded in [`FactorCatalog::diagnostics`].

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use rayon::prelude::*;

use crate::config::Settings;
use crate::error::{ReconstructionError, StructuralError};
use crate::interpolate::newton;
use crate::kinematics::{Invariant, PhaseSpacePoint};
use crate::poly::{factor, Factorization, Poly};
use crate::report::{Diagnostics, Notice, NoticeKind};
use crate::slice::Slice;

/// Candidate invariant → irreducible factors along one slice.
#[derive(Clone, Debug, Default)]
pub struct FactorCatalog {
    entries: Vec<(Invariant, Vec<Poly>)>,
    aliases: BTreeMap<Invariant, Invariant>,
    discarded_constants: Vec<Invariant>,
    dropped: Vec<Invariant>,
    diagnostics: Diagnostics,
}

impl FactorCatalog {
    /// Catalog with the given entries and nothing discarded.
    ///
    /// Entries with empty factor lists are skipped.
    pub fn from_entries(entries: impl IntoIterator<Item = (Invariant, Vec<Poly>)>) -> Self {
        Self {
            entries: entries.into_iter().filter(|(_, fs)| !fs.is_empty()).collect(),
            ..Self::default()
        }
    }

    /// Entries in candidate order.
    pub fn entries(&self) -> &[(Invariant, Vec<Poly>)] {
        &self.entries
    }

    /// Factors of `invariant`.
    pub fn get(&self, invariant: &Invariant) -> Option<&[Poly]> {
        self.entries
            .iter()
            .find_map(|(inv, fs)| (inv == invariant).then_some(fs.as_slice()))
    }

    /// Catalog keys in candidate order.
    pub fn keys(&self) -> impl Iterator<Item = &Invariant> {
        self.entries.iter().map(|(inv, _)| inv)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no candidate survived.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Alias → representative for candidates merged by shared factors.
    pub fn aliases(&self) -> &BTreeMap<Invariant, Invariant> {
        &self.aliases
    }

    /// Candidates that are constant along the slice.
    pub fn discarded_constants(&self) -> &[Invariant] {
        &self.discarded_constants
    }

    /// Candidates whose every factor was degenerate.
    pub fn dropped(&self) -> &[Invariant] {
        &self.dropped
    }

    /// Notices raised while building.
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }
}

/// Greedy first-fit of candidates whose factors are all shared.
///
/// Candidates are visited by (factor-list length, input index). A candidate
/// none of whose factors is claimed by a representative becomes a representative;
/// otherwise it is an alias of the first representative it overlaps.
/// Returns the representatives in visiting order, each with its aliases.
fn first_fit(lists: &[(Invariant, Vec<Poly>)], shared_only: &[usize]) -> Vec<(usize, Vec<usize>)> {
    let mut order = shared_only.to_vec();
    order.sort_by_key(|&i| (lists[i].1.len(), i));
    let mut groups: Vec<(usize, Vec<usize>)> = Vec::new();
    for i in order {
        let fs = &lists[i].1;
        let overlapping = groups
            .iter_mut()
            .find(|(rep, _)| lists[*rep].1.iter().any(|f| fs.contains(f)));
        match overlapping {
            Some((_, aliases)) => aliases.push(i),
            None => groups.push((i, Vec::new())),
        }
    }
    groups
}

/// A candidate evaluated along the slice.
enum Evaluated {
    Constant,
    Factored(Factorization),
}

fn evaluate_candidate<P: PhaseSpacePoint>(
    candidate: &Invariant,
    slice: &Slice<P>,
    prime: u64,
    settings: &Settings,
) -> Result<Evaluated, ReconstructionError> {
    let poly = newton(
        |t| slice.residue_at(prime, &[t], |point| Ok(point.evaluate(candidate)?)),
        prime,
        &settings.interpolation,
    )?;
    if poly.is_constant() {
        return Ok(Evaluated::Constant);
    }
    log::trace!("{candidate} on slice: {poly}");
    Ok(Evaluated::Factored(factor(&poly, settings.factor_seed)?))
}

/// Build the factor catalog of `candidates` along `slice`.
///
/// # Errors
///
/// [`StructuralError`] for two-parameter or non-finite-field slices;
/// interpolation or factorization failures of any candidate.
pub fn build_catalog<P: PhaseSpacePoint>(
    candidates: &[Invariant],
    slice: &Slice<P>,
    settings: &Settings,
) -> Result<FactorCatalog, ReconstructionError> {
    if slice.parameters() != 1 {
        return Err(StructuralError::Univariate("factor catalog").into());
    }
    let prime = slice.prime()?;
    let mut unique_candidates: Vec<&Invariant> = Vec::with_capacity(candidates.len());
    for c in candidates {
        if !unique_candidates.contains(&c) {
            unique_candidates.push(c);
        }
    }
    let evaluated: Vec<Result<Evaluated, ReconstructionError>> = if settings.parallel {
        unique_candidates
            .par_iter()
            .map(|c| evaluate_candidate(c, slice, prime, settings))
            .collect()
    } else {
        unique_candidates
            .iter()
            .map(|c| evaluate_candidate(c, slice, prime, settings))
            .collect()
    };

    let mut catalog = FactorCatalog::default();
    let mut lists: Vec<(Invariant, Vec<Poly>)> = Vec::new();
    for (candidate, outcome) in unique_candidates.into_iter().zip(evaluated) {
        let factorization = match outcome? {
            Evaluated::Constant => {
                catalog.diagnostics.push(Notice::info(
                    NoticeKind::ConstantCandidate,
                    format!("{candidate} is constant on the slice and is discarded"),
                ));
                catalog.discarded_constants.push(candidate.clone());
                continue;
            }
            Evaluated::Factored(f) => f,
        };
        let (simple, degenerate): (Vec<_>, Vec<_>) =
            factorization.factors.into_iter().partition(|(_, m)| *m == 1);
        if !degenerate.is_empty() {
            catalog.diagnostics.push(
                Notice::warn(
                    NoticeKind::DegenerateFactor,
                    format!("{candidate} has factors with multiplicity other than 1 on a generic slice; dropping them"),
                )
                .with_details(degenerate.iter().map(|(f, m)| format!("({f})^{m}")).collect()),
            );
        }
        if simple.is_empty() {
            catalog.dropped.push(candidate.clone());
            continue;
        }
        lists.push((candidate.clone(), simple.into_iter().map(|(f, _)| f).collect()));
    }

    let mut counts: HashMap<&Poly, usize> = HashMap::new();
    for f in lists.iter().flat_map(|(_, fs)| fs) {
        *counts.entry(f).or_insert(0) += 1;
    }
    let mut kept: Vec<(usize, Vec<Poly>)> = Vec::new();
    let mut shared_only: Vec<usize> = Vec::new();
    for (i, (_, fs)) in lists.iter().enumerate() {
        let unique: Vec<Poly> = fs.iter().filter(|f| counts[f] == 1).cloned().collect();
        if unique.is_empty() {
            shared_only.push(i);
        } else {
            kept.push((i, unique));
        }
    }

    if !shared_only.is_empty() {
        let names: Vec<String> = shared_only.iter().map(|&i| lists[i].0.to_string()).collect();
        catalog.diagnostics.push(Notice::warn(
            NoticeKind::Aliased,
            format!(
                "candidates with only non-unique factors: {}; keeping one representative per family, families need not be disjoint",
                names.join(", ")
            ),
        ));
        for (rep, members) in first_fit(&lists, &shared_only) {
            let aliases: Vec<&Invariant> = members.iter().map(|&i| &lists[i].0).collect();
            if !aliases.is_empty() {
                catalog.diagnostics.push(
                    Notice::warn(
                        NoticeKind::Aliased,
                        format!("equivalence class for {}", lists[rep].0),
                    )
                    .with_details(aliases.iter().map(|a| format!("↪ {a}")).collect()),
                );
                for alias in aliases {
                    catalog.aliases.insert(alias.clone(), lists[rep].0.clone());
                }
            }
            kept.push((rep, lists[rep].1.clone()));
        }
    }

    kept.sort_by_key(|(i, _)| *i);
    catalog.entries = kept
        .into_iter()
        .map(|(i, fs)| (lists[i].0.clone(), fs))
        .collect();
    log::debug!(
        "factor catalog: {} of {} candidates kept, {} aliased",
        catalog.len(),
        candidates.len(),
        catalog.aliases.len()
    );
    Ok(catalog)
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct CatalogKey {
    candidates: Vec<Invariant>,
    slice: u64,
    prime: u64,
}

/// Caller-owned cache of catalogs keyed by (candidates, slice identity,
/// prime).
///
/// A different candidate list or a slice through a different base point
/// is a different key, so stale catalogs are never returned; stale entries
/// are released with [`CatalogCache::invalidate_slice`] or
/// [`CatalogCache::clear`].
#[derive(Debug, Default)]
pub struct CatalogCache {
    entries: HashMap<CatalogKey, Arc<FactorCatalog>>,
}

impl CatalogCache {
    /// Empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached catalog, building it on a miss.
    ///
    /// # Errors
    ///
    /// As [`build_catalog`]; failed builds are not cached.
    pub fn get_or_build<P: PhaseSpacePoint>(
        &mut self,
        candidates: &[Invariant],
        slice: &Slice<P>,
        settings: &Settings,
    ) -> Result<Arc<FactorCatalog>, ReconstructionError> {
        let key = CatalogKey {
            candidates: candidates.to_vec(),
            slice: slice.id(),
            prime: slice.prime()?,
        };
        if let Some(hit) = self.entries.get(&key) {
            log::trace!("factor catalog cache hit for slice {:#x}", key.slice);
            return Ok(Arc::clone(hit));
        }
        let catalog = Arc::new(build_catalog(candidates, slice, settings)?);
        self.entries.insert(key, Arc::clone(&catalog));
        Ok(catalog)
    }

    /// Drop every catalog built on the slice with identity `slice_id`.
    pub fn invalidate_slice(&mut self, slice_id: u64) {
        self.entries.retain(|k, _| k.slice != slice_id);
    }

    /// Drop everything.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of cached catalogs.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldKind;
    use crate::kinematics::forms::{Form, FormModel, FormPoint};
    use crate::kinematics::PointGenerator;

    const PRIME: u64 = 10_007;

    fn slice_along_a(model: FormModel) -> Slice<FormPoint> {
        let point = Arc::new(model)
            .generate(4, 5, &FieldKind::Finite { prime: PRIME })
            .unwrap();
        Slice::new(point, vec!["a".into()]).unwrap()
    }

    fn settings() -> Settings {
        Settings::with_field(FieldKind::Finite { prime: PRIME })
    }

    #[test]
    fn unique_factors_are_kept_and_shared_ones_stripped() {
        let x = Form::var;
        // on the slice: a = t, b = t + k, m = (t)(t + k)
        let s = slice_along_a(
            FormModel::new(4, 3)
                .with_invariant("a", x(0) + x(1))
                .with_invariant("m", (x(0) + x(1)) * (x(0) + x(2)))
                .with_invariant("b", x(0) + x(2) + x(1) * x(1)),
        );
        let candidates: Vec<Invariant> = ["m", "a"].into_iter().map(Invariant::new).collect();
        let catalog = build_catalog(&candidates, &s, &settings()).unwrap();
        // m has the unique factor from x0 + x2, a only the shared factor t.
        assert_eq!(catalog.keys().map(Invariant::as_str).collect::<Vec<_>>(), ["m", "a"]);
        assert_eq!(catalog.get(&"m".into()).unwrap().len(), 1);
        assert_eq!(catalog.get(&"a".into()).unwrap(), &[Poly::t(PRIME)]);
        assert!(catalog.aliases().is_empty());
    }

    #[test]
    fn disjoint_shared_candidates_are_all_kept() {
        let x = Form::var;
        let s = slice_along_a(
            FormModel::new(4, 3)
                .with_invariant("a", x(0) + x(1))
                .with_invariant("a2", (x(0) + x(1)) * (x(0) + x(2)))
                .with_invariant("c2", x(0) + x(2)),
        );
        // a2 shares both of its factors, once with a and once with c2.
        let candidates: Vec<Invariant> = ["a2", "a", "c2"].into_iter().map(Invariant::new).collect();
        let catalog = build_catalog(&candidates, &s, &settings()).unwrap();
        assert_eq!(catalog.keys().map(Invariant::as_str).collect::<Vec<_>>(), ["a", "c2"]);
        assert_eq!(catalog.aliases().len(), 1);
        assert_eq!(catalog.aliases().get(&Invariant::new("a2")), Some(&"a".into()));
        assert_eq!(catalog.diagnostics().of_kind(NoticeKind::Aliased).count(), 2);
    }

    #[test]
    fn first_fit_visits_shortest_lists_first() {
        let t = Poly::t(PRIME);
        let u = &t + &Poly::constant(PRIME, 1);
        let v = &t + &Poly::constant(PRIME, 2);
        let lists: Vec<(Invariant, Vec<Poly>)> = vec![
            ("tu".into(), vec![t.clone(), u.clone()]),
            ("uv".into(), vec![u.clone(), v.clone()]),
            ("t".into(), vec![t.clone()]),
            ("v".into(), vec![v]),
            ("t_again".into(), vec![t]),
        ];
        // t and v claim their factors; tu overlaps t, uv overlaps v.
        let groups = first_fit(&lists, &[0, 1, 2, 3, 4]);
        assert_eq!(groups, vec![(2, vec![4, 0]), (3, vec![1])]);
    }

    #[test]
    fn degenerate_factors_are_dropped_with_a_warning() {
        let x = Form::var;
        let s = slice_along_a(
            FormModel::new(4, 4)
                .with_invariant("a", x(0) + x(1))
                .with_invariant("sq", (x(0) + x(1)) * (x(0) + x(1)))
                .with_invariant("mix", (x(0) + x(2)) * (x(0) + x(2)) * (x(0) + x(3))),
        );
        let candidates: Vec<Invariant> = ["sq", "mix"].into_iter().map(Invariant::new).collect();
        let catalog = build_catalog(&candidates, &s, &settings()).unwrap();
        assert_eq!(catalog.dropped(), &[Invariant::new("sq")]);
        assert_eq!(catalog.keys().map(Invariant::as_str).collect::<Vec<_>>(), ["mix"]);
        let mix = catalog.get(&"mix".into()).unwrap();
        assert_eq!(mix.len(), 1);
        assert_eq!(mix[0].degree(), Some(1));
        assert_eq!(catalog.diagnostics().of_kind(NoticeKind::DegenerateFactor).count(), 2);
    }

    #[test]
    fn bivariate_and_non_finite_slices_are_rejected() {
        let x = Form::var;
        let model = Arc::new(
            FormModel::new(4, 3)
                .with_invariant("a", x(0) + x(1))
                .with_invariant("c", x(2)),
        );
        let field = FieldKind::Finite { prime: PRIME };
        let point = model.generate(4, 1, &field).unwrap();
        let plane = Slice::new(point, vec!["a".into(), "c".into()]).unwrap();
        assert!(matches!(
            build_catalog(&["a".into()], &plane, &settings()),
            Err(ReconstructionError::Structural(StructuralError::Univariate(_)))
        ));
        let point = model.generate(4, 1, &FieldKind::Floating).unwrap();
        let line = Slice::new(point, vec!["a".into()]).unwrap();
        assert!(matches!(
            build_catalog(&["a".into()], &line, &settings()),
            Err(ReconstructionError::Structural(StructuralError::NotFiniteField("floating")))
        ));
    }

    #[test]
    fn empty_candidate_list() {
        let x = Form::var;
        let s = slice_along_a(FormModel::new(4, 2).with_invariant("a", x(0) + x(1)));
        let catalog = build_catalog(&[], &s, &settings()).unwrap();
        assert!(catalog.is_empty());
        assert!(catalog.diagnostics().is_empty());
    }

    #[test]
    fn cache_reuses_and_invalidates() {
        let x = Form::var;
        let s = slice_along_a(
            FormModel::new(4, 3)
                .with_invariant("a", x(0) + x(1))
                .with_invariant("b", x(0) + x(2)),
        );
        let candidates: Vec<Invariant> = vec!["a".into(), "b".into()];
        let mut cache = CatalogCache::new();
        let first = cache.get_or_build(&candidates, &s, &settings()).unwrap();
        let second = cache.get_or_build(&candidates, &s, &settings()).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        cache.get_or_build(&candidates[..1], &s, &settings()).unwrap();
        assert_eq!(cache.len(), 2);
        cache.invalidate_slice(s.id());
        assert!(cache.is_empty());
    }
}
