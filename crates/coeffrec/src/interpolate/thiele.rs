use super::{FailureBudget, SamplePoints};
use crate::config::InterpolationSettings;
use crate::error::{EvalError, InterpolationError};
use crate::field::{add_mod, inv_mod, mul_mod, sub_mod};
use crate::poly::{Poly, Rational};

/// Thiele continued fraction
/// `a₀ + (t - x₀) / (a₁ + (t - x₁) / (a₂ + …))`.
struct ContinuedFraction {
    prime: u64,
    nodes: Vec<u64>,
    coeffs: Vec<u64>,
}

impl ContinuedFraction {
    fn new(prime: u64) -> Self {
        Self {
            prime,
            nodes: Vec::new(),
            coeffs: Vec::new(),
        }
    }

    /// Value at `x`; `None` if a partial denominator vanishes.
    fn predict(&self, x: u64) -> Option<u64> {
        let p = self.prime;
        let (&last, rest) = self.coeffs.split_last()?;
        let mut v = last;
        for (&xj, &aj) in self.nodes.iter().zip(rest).rev() {
            let inv = inv_mod(v, p)?;
            v = add_mod(aj, mul_mod(sub_mod(x, xj, p), inv, p), p);
        }
        Some(v)
    }

    /// Extend by the inverse difference at `(x, y)`; false when it is
    /// undefined and the point has to be skipped.
    fn try_push(&mut self, x: u64, y: u64) -> bool {
        let p = self.prime;
        let mut v = y;
        for (&xj, &aj) in self.nodes.iter().zip(&self.coeffs) {
            let Some(inv) = inv_mod(sub_mod(v, aj, p), p) else {
                return false;
            };
            v = mul_mod(sub_mod(x, xj, p), inv, p);
        }
        self.nodes.push(x);
        self.coeffs.push(v);
        true
    }

    /// Fold bottom-up into `num / den`.
    fn to_rational(&self) -> Option<Rational> {
        let p = self.prime;
        let (&last, rest) = self.coeffs.split_last()?;
        let mut num = Poly::constant(p, last);
        let mut den = Poly::one(p);
        for (&xj, &aj) in self.nodes.iter().zip(rest).rev() {
            let shifted = Poly::new(p, vec![p - xj % p, 1]);
            let next = &num.scale(aj) + &(&shifted * &den);
            den = num;
            num = next;
        }
        Rational::new(num, den)
    }
}

/// Reconstruct the rational function behind `f` over Z/`prime`Z.
///
/// Samples that the current continued fraction already predicts count
/// towards termination; `checks` consecutive correct predictions end the
/// interpolation.
///
/// # Errors
///
/// [`InterpolationError::NoConvergence`] when the sample budget runs out,
/// [`InterpolationError::TooManyFailures`] when evaluation keeps failing.
pub fn thiele<F>(mut f: F, prime: u64, settings: &InterpolationSettings) -> Result<Rational, InterpolationError>
where
    F: FnMut(u64) -> Result<u64, EvalError>,
{
    let mut points = SamplePoints::new(prime, settings.seed);
    let mut budget = FailureBudget::default();
    let mut cf = ContinuedFraction::new(prime);
    let mut confirmed = 0;
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
        if cf.predict(x) == Some(y) {
            confirmed += 1;
            if confirmed >= settings.checks {
                let r = cf
                    .to_rational()
                    .ok_or(InterpolationError::NoConvergence { points: sampled })?;
                log::debug!("thiele converged after {sampled} points: {r}");
                return Ok(r);
            }
            continue;
        }
        confirmed = 0;
        if !cf.try_push(x, y) {
            log::trace!("skipping sample point {x}: vanishing inverse difference");
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

    fn poly(c: &[i64]) -> Poly {
        Poly::from_i64s(P, c)
    }

    #[test]
    fn recovers_simple_poles() {
        // 1 / (t (t + 3))
        let target = Rational::new(poly(&[1]), &poly(&[0, 1]) * &poly(&[3, 1])).unwrap();
        let r = thiele(
            |t| target.eval(t).ok_or_else(|| EvalError::new("pole")),
            P,
            &settings(),
        )
        .unwrap();
        assert_eq!(r, target);
    }

    #[test]
    fn recovers_numerator_and_denominator() {
        let target = Rational::new(&poly(&[2, 1]) * &poly(&[-5, 1]), poly(&[7, 0, 1])).unwrap();
        let r = thiele(
            |t| target.eval(t).ok_or_else(|| EvalError::new("pole")),
            P,
            &settings(),
        )
        .unwrap();
        assert_eq!(r.numerator(), target.numerator());
        assert_eq!(r.denominator(), target.denominator());
    }

    #[test]
    fn polynomials_and_constants() {
        let r = thiele(|t| Ok((t * t) % P), P, &settings()).unwrap();
        assert_eq!(r, Rational::from_poly(poly(&[0, 0, 1])));
        let r = thiele(|_| Ok(0), P, &settings()).unwrap();
        assert!(r.numerator().is_zero());
        assert!(r.denominator().is_one());
    }
}
