use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::Settings;
use crate::error::ScalingError;
use crate::report::{Diagnostics, Notice, NoticeKind};

/// Bounded retry of scaling attempts with fresh seeds.
///
/// The first attempt runs with the caller's seed; every retry draws a new
/// seed from a generator keyed by that seed, so a retried computation is
/// still reproducible. Only transient failures
/// ([`ScalingError::is_transient`]) are retried.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts, first one included.
    pub max_attempts: u32,
    /// Whether p-adic digit exhaustion is retried.
    pub retry_on_digit_loss: bool,
}

/// A value together with the number of attempts it took.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attempted<T> {
    /// The successful result.
    pub value: T,
    /// Attempts made, successful one included.
    pub attempts: u32,
    /// One [`NoticeKind::Retried`] warning per failed attempt.
    pub retries: Diagnostics,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            retry_on_digit_loss: false,
        }
    }
}

impl RetryPolicy {
    /// Policy described by `settings`.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            max_attempts: settings.retry_attempts,
            retry_on_digit_loss: settings.retry_on_digit_loss,
        }
    }

    /// Run `attempt` until it succeeds, fails permanently, or the attempt
    /// budget is spent.
    ///
    /// # Errors
    ///
    /// Non-transient failures as they occur;
    /// [`ScalingError::RetriesExhausted`] once every attempt failed.
    pub fn run<T, F>(&self, seed: u64, mut attempt: F) -> Result<Attempted<T>, ScalingError>
    where
        F: FnMut(u64) -> Result<T, ScalingError>,
    {
        let mut seeds = StdRng::seed_from_u64(seed);
        let mut current = seed;
        let mut attempts = 0;
        let mut retries = Diagnostics::new();
        loop {
            attempts += 1;
            match attempt(current) {
                Ok(value) => {
                    return Ok(Attempted {
                        value,
                        attempts,
                        retries,
                    })
                }
                Err(e) if !e.is_transient(self.retry_on_digit_loss) => return Err(e),
                Err(e) if attempts >= self.max_attempts => {
                    return Err(ScalingError::RetriesExhausted {
                        attempts,
                        last: Box::new(e),
                    })
                }
                Err(e) => {
                    current = seeds.gen();
                    retries.push(Notice::warn(
                        NoticeKind::Retried,
                        format!("scaling attempt {attempts} failed ({e}); retrying with seed {current}"),
                    ));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EvalError;
    use crate::kinematics::Invariant;

    #[test]
    fn first_success_takes_one_attempt() {
        let out = RetryPolicy::default().run(5, |s| Ok::<_, ScalingError>(s)).unwrap();
        assert_eq!(
            out,
            Attempted {
                value: 5,
                attempts: 1,
                retries: Diagnostics::new(),
            }
        );
    }

    #[test]
    fn transient_failure_is_retried_with_a_fresh_seed() {
        let mut seen = Vec::new();
        let out = RetryPolicy::default()
            .run(5, |s| {
                seen.push(s);
                if seen.len() == 1 {
                    Err(ScalingError::Evaluation(EvalError::new("flaky")))
                } else {
                    Ok(3)
                }
            })
            .unwrap();
        assert_eq!(out.attempts, 2);
        assert_eq!(out.value, 3);
        assert_eq!(seen.len(), 2);
        assert_ne!(seen[0], seen[1]);
        let retried: Vec<_> = out.retries.of_kind(NoticeKind::Retried).collect();
        assert_eq!(retried.len(), 1);
        assert!(retried[0].is_warning());
        assert!(retried[0].message.contains(&seen[1].to_string()), "{}", retried[0].message);
    }

    #[test]
    fn exhaustion_surfaces_the_last_failure() {
        let err = RetryPolicy::default()
            .run(0, |_| -> Result<(), _> { Err(ScalingError::MalformedFit { reason: "x".into() }) })
            .unwrap_err();
        match err {
            ScalingError::RetriesExhausted { attempts, last } => {
                assert_eq!(attempts, 2);
                assert!(matches!(*last, ScalingError::MalformedFit { .. }));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn digit_loss_is_retried_only_on_request() {
        let mut calls = 0;
        let exhausted = || ScalingError::DigitsExhausted(Invariant::new("a"));
        let err = RetryPolicy::default()
            .run(0, |_| -> Result<(), _> {
                calls += 1;
                Err(exhausted())
            })
            .unwrap_err();
        assert_eq!(err, exhausted());
        assert_eq!(calls, 1);

        let policy = RetryPolicy {
            max_attempts: 3,
            retry_on_digit_loss: true,
        };
        let err = policy.run(0, |_| -> Result<(), _> { Err(exhausted()) }).unwrap_err();
        assert!(matches!(err, ScalingError::RetriesExhausted { attempts: 3, .. }));
    }
}
