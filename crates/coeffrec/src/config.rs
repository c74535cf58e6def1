//! Engine configuration.
//!
//! [`Settings`] is threaded explicitly into every public operation; there
//! is no process-wide state, so reconstructions with different settings can
//! run side by side. Settings deserialize from TOML with every key optional:
//!
//! ```toml
//! scalings_iterations_start = 3
//! scalings_iterations_number = 3
//! retry_attempts = 2
//! parallel = true
//!
//! [field]
//! kind = "padic"
//! prime = 65521
//! digits = 4
//!
//! [interpolation]
//! seed = 1
//! checks = 3
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::field::{mul_mod, pow_mod, FieldKind};

/// Parameters of the exact interpolators.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InterpolationSettings {
    /// Seed of the sample-point generator.
    pub seed: u64,
    /// Consecutive confirming samples required before termination.
    pub checks: usize,
    /// Sample budget per interpolation.
    pub max_points: usize,
}

impl Default for InterpolationSettings {
    fn default() -> Self {
        Self {
            seed: 1,
            checks: 3,
            max_points: 512,
        }
    }
}

/// Engine-wide configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Arithmetic backend for scaling studies.
    pub field: FieldKind,
    /// First exponent `k` of the floating scales `10^-k`.
    pub scalings_iterations_start: u32,
    /// Number of floating scales sampled.
    pub scalings_iterations_number: u32,
    /// Largest accepted distance of a fitted slope from an integer.
    pub fit_tolerance: f64,
    /// Attempts per scaling, first one included.
    pub retry_attempts: u32,
    /// Treat p-adic digit exhaustion as transient.
    pub retry_on_digit_loss: bool,
    /// Run batch scalings on the rayon pool.
    pub parallel: bool,
    /// Size of a dedicated worker pool; the global pool when unset.
    pub threads: Option<usize>,
    /// Interpolation parameters.
    pub interpolation: InterpolationSettings,
    /// Seed for randomized factorization.
    pub factor_seed: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            field: FieldKind::Floating,
            scalings_iterations_start: 3,
            scalings_iterations_number: 3,
            fit_tolerance: 0.2,
            retry_attempts: 2,
            retry_on_digit_loss: false,
            parallel: true,
            threads: None,
            interpolation: InterpolationSettings::default(),
            factor_seed: 0,
        }
    }
}

impl Settings {
    /// Default settings over `field`.
    pub fn with_field(field: FieldKind) -> Self {
        Self {
            field,
            ..Self::default()
        }
    }

    /// Parse and validate TOML.
    ///
    /// # Errors
    ///
    /// Malformed TOML, unknown keys, or values rejected by [`Self::validate`].
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let settings: Self = toml::from_str(s)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Read, parse and validate a TOML file.
    ///
    /// # Errors
    ///
    /// I/O failures plus everything [`Self::from_toml_str`] rejects.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] naming the first offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |key, reason: String| Err(ConfigError::Invalid { key, reason });
        if let Some(prime) = self.field.prime() {
            if prime < 3 || !is_prime(prime) {
                return invalid("field.prime", format!("{prime} is not an odd prime"));
            }
        }
        if let FieldKind::PAdic { prime, digits } = self.field {
            if digits == 0 {
                return invalid("field.digits", "at least one digit is required".into());
            }
            if prime.checked_pow(digits).is_none() {
                return invalid("field.digits", format!("{prime}^{digits} does not fit in 64 bits"));
            }
        }
        if self.scalings_iterations_number < 2 {
            return invalid(
                "scalings_iterations_number",
                "a slope needs at least two scales".into(),
            );
        }
        if self.scalings_iterations_start + self.scalings_iterations_number > 300 {
            return invalid("scalings_iterations_start", "scales underflow f64".into());
        }
        if !(self.fit_tolerance > 0.0 && self.fit_tolerance <= 0.5) {
            return invalid("fit_tolerance", format!("{} is outside (0, 0.5]", self.fit_tolerance));
        }
        if self.retry_attempts == 0 {
            return invalid("retry_attempts", "at least one attempt is required".into());
        }
        if self.threads == Some(0) {
            return invalid("threads", "a worker pool needs at least one thread".into());
        }
        if self.interpolation.checks == 0 {
            return invalid("interpolation.checks", "at least one check is required".into());
        }
        if self.interpolation.max_points <= self.interpolation.checks {
            return invalid(
                "interpolation.max_points",
                format!("must exceed checks ({})", self.interpolation.checks),
            );
        }
        Ok(())
    }

    /// Dedicated worker pool when `threads` is set.
    ///
    /// # Errors
    ///
    /// [`ConfigError::ThreadPool`] if rayon cannot spawn the workers.
    pub fn thread_pool(&self) -> Result<Option<rayon::ThreadPool>, ConfigError> {
        self.threads
            .map(|n| {
                rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .build()
                    .map_err(|e| ConfigError::ThreadPool(e.to_string()))
            })
            .transpose()
    }
}

/// Deterministic Miller–Rabin for 64-bit inputs.
fn is_prime(n: u64) -> bool {
    const BASES: [u64; 12] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37];
    if n < 2 {
        return false;
    }
    for b in BASES {
        if n % b == 0 {
            return n == b;
        }
    }
    let mut d = n - 1;
    let mut s = 0;
    while d % 2 == 0 {
        d /= 2;
        s += 1;
    }
    'witness: for a in BASES {
        let mut x = pow_mod(a, d, n);
        if x == 1 || x == n - 1 {
            continue;
        }
        for _ in 1..s {
            x = mul_mod(x, x, n);
            if x == n - 1 {
                continue 'witness;
            }
        }
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let s = Settings::default();
        assert!(s.validate().is_ok());
        assert_eq!(s.retry_attempts, 2);
        assert_eq!(s.scalings_iterations_start, 3);
        assert!(Settings::with_field(FieldKind::finite()).validate().is_ok());
        assert!(Settings::with_field(FieldKind::padic()).validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let s = Settings::from_toml_str(
            "retry_attempts = 4\n[field]\nkind = \"padic\"\nprime = 101\ndigits = 6\n",
        )
        .unwrap();
        assert_eq!(s.retry_attempts, 4);
        assert_eq!(s.field, FieldKind::PAdic { prime: 101, digits: 6 });
        assert_eq!(s.interpolation, InterpolationSettings::default());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(matches!(
            Settings::from_toml_str("retry = 3\n"),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn ranges_are_checked() {
        let bad = |s: Settings| match s.validate() {
            Err(ConfigError::Invalid { key, .. }) => key,
            other => panic!("expected rejection, got {other:?}"),
        };
        assert_eq!(bad(Settings::with_field(FieldKind::Finite { prime: 2 })), "field.prime");
        assert_eq!(bad(Settings::with_field(FieldKind::Finite { prime: 91 })), "field.prime");
        assert_eq!(
            bad(Settings::with_field(FieldKind::PAdic { prime: 65_521, digits: 5 })),
            "field.digits"
        );
        assert_eq!(
            bad(Settings {
                retry_attempts: 0,
                ..Settings::default()
            }),
            "retry_attempts"
        );
        assert_eq!(
            bad(Settings {
                scalings_iterations_number: 0,
                ..Settings::default()
            }),
            "scalings_iterations_number"
        );
    }

    #[test]
    fn primality() {
        assert!(is_prime(FieldKind::MERSENNE_31));
        assert!(is_prime(65_521));
        assert!(!is_prime(65_521 * 65_521));
        assert!(!is_prime(1));
        assert!(is_prime((1 << 61) - 1));
    }

    #[test]
    fn dedicated_pool_is_optional() {
        assert!(Settings::default().thread_pool().unwrap().is_none());
        let s = Settings {
            threads: Some(2),
            ..Settings::default()
        };
        assert_eq!(s.thread_pool().unwrap().unwrap().current_num_threads(), 2);
    }
}
