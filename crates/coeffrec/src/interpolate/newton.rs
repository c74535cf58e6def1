use super::{FailureBudget, SamplePoints};
use crate::config::InterpolationSettings;
use crate::error::{EvalError, InterpolationError};
use crate::field::{inv_mod, mul_mod, sub_mod};
use crate::poly::Poly;

/// Newton form `Σ aₖ Π_{j<k} (t - xⱼ)` grown one node at a time.
pub(crate) struct NewtonForm {
    prime: u64,
    nodes: Vec<u64>,
    coeffs: Vec<u64>,
}

impl NewtonForm {
    pub(crate) fn new(prime: u64) -> Self {
        Self {
            prime,
            nodes: Vec::new(),
            coeffs: Vec::new(),
        }
    }

    /// Add the node `(x, y)` and return its divided difference.
    pub(crate) fn push(&mut self, x: u64, y: u64) -> u64 {
        let p = self.prime;
        let mut v = y;
        for (&xj, &aj) in self.nodes.iter().zip(&self.coeffs) {
            // Nodes are distinct, so the inverse exists.
            let inv = inv_mod(sub_mod(x, xj, p), p).unwrap_or(0);
            v = mul_mod(sub_mod(v, aj, p), inv, p);
        }
        self.nodes.push(x);
        self.coeffs.push(v);
        v
    }

    /// Expand into monomial form.
    pub(crate) fn to_poly(&self) -> Poly {
        let p = self.prime;
        let mut acc = Poly::zero(p);
        for (&xj, &aj) in self.nodes.iter().zip(&self.coeffs).rev() {
            let shifted = Poly::new(p, vec![p - xj % p, 1]);
            acc = &(&acc * &shifted) + &Poly::constant(p, aj);
        }
        acc
    }
}

/// Reconstruct the polynomial behind `f` over Z/`prime`Z.
///
/// ```
/// use coeffrec::config::InterpolationSettings;
/// use coeffrec::interpolate::newton;
/// use coeffrec::poly::Poly;
///
/// let p = 10_007;
/// let poly = newton(|t| Ok((3 * t * t + 5) % p), p, &InterpolationSettings::default()).unwrap();
/// assert_eq!(poly, Poly::from_i64s(p, &[5, 0, 3]));
/// ```
///
/// # Errors
///
/// [`InterpolationError::NoConvergence`] when the sample budget runs out,
/// [`InterpolationError::TooManyFailures`] when evaluation keeps failing.
pub fn newton<F>(mut f: F, prime: u64, settings: &InterpolationSettings) -> Result<Poly, InterpolationError>
where
    F: FnMut(u64) -> Result<u64, EvalError>,
{
    let mut points = SamplePoints::new(prime, settings.seed);
    let mut budget = FailureBudget::default();
    let mut form = NewtonForm::new(prime);
    let mut zeros = 0;
    let mut sampled = 0;
    while sampled < settings.max_points {
        let Some(x) = points.next_point() else { break };
        sampled += 1;
        let y = match f(x) {
            Ok(y) => y % prime,
            Err(e) => {
                budget.fail(x, e)?;
                continue;
            }
        };
        budget.succeed();
        if form.push(x, y) == 0 {
            zeros += 1;
            if zeros >= settings.checks {
                let poly = form.to_poly();
                log::debug!(
                    "newton converged after {sampled} points: degree {:?}",
                    poly.degree()
                );
                return Ok(poly);
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

    const P: u64 = 10_007;

    fn settings() -> InterpolationSettings {
        InterpolationSettings::default()
    }

    #[test]
    fn recovers_a_cubic() {
        let target = Poly::from_i64s(P, &[7, -2, 0, 9]);
        let poly = newton(|t| Ok(target.eval(t)), P, &settings()).unwrap();
        assert_eq!(poly, target);
    }

    #[test]
    fn zero_function() {
        let poly = newton(|_| Ok(0), P, &settings()).unwrap();
        assert!(poly.is_zero());
    }

    #[test]
    fn failed_samples_are_skipped() {
        let target = Poly::from_i64s(P, &[1, 1]);
        let mut calls = 0;
        let poly = newton(
            |t| {
                calls += 1;
                if calls % 3 == 0 {
                    Err(EvalError::new("pole"))
                } else {
                    Ok(target.eval(t))
                }
            },
            P,
            &settings(),
        )
        .unwrap();
        assert_eq!(poly, target);
    }

    #[test]
    fn budget_is_enforced() {
        let s = InterpolationSettings {
            max_points: 5,
            ..settings()
        };
        // Degree 10 cannot be pinned down by five points.
        let target = Poly::monomial(P, 1, 10);
        assert_eq!(
            newton(|t| Ok(target.eval(t)), P, &s),
            Err(InterpolationError::NoConvergence { points: 5 })
        );
    }

    #[test]
    fn persistent_failures_abort() {
        let err = newton(|_| Err(EvalError::new("always")), P, &settings()).unwrap_err();
        assert!(matches!(err, InterpolationError::TooManyFailures { .. }));
    }
}
