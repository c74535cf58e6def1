use super::{newton, FailureBudget, SamplePoints};
use crate::config::InterpolationSettings;
use crate::error::{EvalError, InterpolationError};
use crate::field::{inv_mod, sub_mod};
use crate::poly::{BiPoly, Poly};

/// Reconstruct the bivariate polynomial behind `f(t1, t2)`.
///
/// Newton interpolation in `t2` whose values are themselves univariate
/// Newton interpolants in `t1`; divided differences act on whole
/// coefficient vectors. A line `t2 = x` on which the inner interpolation
/// fails counts as one failed sample.
///
/// # Errors
///
/// [`InterpolationError::NoConvergence`] when either sample budget runs
/// out, [`InterpolationError::TooManyFailures`] when evaluation keeps
/// failing.
pub fn bivariate_newton<F>(
    mut f: F,
    prime: u64,
    settings: &InterpolationSettings,
) -> Result<BiPoly, InterpolationError>
where
    F: FnMut(u64, u64) -> Result<u64, EvalError>,
{
    let inner = InterpolationSettings {
        seed: settings.seed.wrapping_add(1),
        ..settings.clone()
    };
    let mut points = SamplePoints::new(prime, settings.seed);
    let mut budget = FailureBudget::default();
    let mut nodes: Vec<u64> = Vec::new();
    let mut coeffs: Vec<Poly> = Vec::new();
    let mut zeros = 0;
    let mut sampled = 0;
    while sampled < settings.max_points {
        let Some(x) = points.next_point() else { break };
        sampled += 1;
        let line = match newton(|t1| f(t1, x), prime, &inner) {
            Ok(line) => line,
            Err(InterpolationError::TooManyFailures { last, .. }) => {
                budget.fail(x, last)?;
                continue;
            }
            Err(e) => return Err(e),
        };
        budget.succeed();
        let mut v = line;
        for (&xj, aj) in nodes.iter().zip(&coeffs) {
            let inv = inv_mod(sub_mod(x, xj, prime), prime).unwrap_or(0);
            v = (&v - aj).scale(inv);
        }
        let vanished = v.is_zero();
        nodes.push(x);
        coeffs.push(v);
        if vanished {
            zeros += 1;
            if zeros >= settings.checks {
                let result = nodes
                    .iter()
                    .zip(&coeffs)
                    .rev()
                    .fold(BiPoly::zero(prime), |acc, (&xj, aj)| acc.newton_step(xj, aj));
                log::debug!(
                    "bivariate newton converged after {sampled} lines: total degree {:?}",
                    result.total_degree()
                );
                return Ok(result);
            }
        } else {
            zeros = 0;
        }
    }
    Err(InterpolationError::NoConvergence { points: sampled })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{add_mod, mul_mod};

    const P: u64 = 10_007;

    #[test]
    fn recovers_mixed_terms() {
        // 3 + t1 t2 + 2 t2^2
        let f = |t1: u64, t2: u64| {
            Ok::<_, EvalError>(add_mod(
                add_mod(3, mul_mod(t1, t2, P), P),
                mul_mod(2, mul_mod(t2, t2, P), P),
                P,
            ))
        };
        let b = bivariate_newton(f, P, &InterpolationSettings::default()).unwrap();
        let terms: Vec<_> = b.terms().collect();
        assert_eq!(terms, vec![((0, 0), 3), ((0, 2), 2), ((1, 1), 1)]);
    }

    #[test]
    fn polynomial_in_t1_only() {
        let b = bivariate_newton(
            |t1, _| Ok(mul_mod(t1, t1, P)),
            P,
            &InterpolationSettings::default(),
        )
        .unwrap();
        assert_eq!(b.terms().collect::<Vec<_>>(), vec![((2, 0), 1)]);
    }
}
