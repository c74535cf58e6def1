use crate::error::ScalingError;

/// Least-squares slope of `log y` against `log x`, rounded to the nearest
/// integer.
///
/// # Errors
///
/// [`ScalingError::MalformedFit`] for fewer than two points, non-positive
/// or non-finite samples, degenerate abscissae, or a slope farther than
/// `tolerance` from an integer.
pub fn log_linear_fit(xs: &[f64], ys: &[f64], tolerance: f64) -> Result<i32, ScalingError> {
    let malformed = |reason: String| Err(ScalingError::MalformedFit { reason });
    if xs.len() != ys.len() || xs.len() < 2 {
        return malformed(format!("need two or more paired samples, got {} and {}", xs.len(), ys.len()));
    }
    let mut points = Vec::with_capacity(xs.len());
    for (&x, &y) in xs.iter().zip(ys) {
        if !(x > 0.0 && y > 0.0 && x.is_finite() && y.is_finite()) {
            return malformed(format!("sample ({x:e}, {y:e}) has no logarithm"));
        }
        points.push((x.ln(), y.ln()));
    }
    let n = points.len() as f64;
    let mean_x = points.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = points.iter().map(|(_, y)| y).sum::<f64>() / n;
    let sxx: f64 = points.iter().map(|(x, _)| (x - mean_x).powi(2)).sum();
    let sxy: f64 = points.iter().map(|(x, y)| (x - mean_x) * (y - mean_y)).sum();
    if sxx == 0.0 {
        return malformed("all samples share one abscissa".into());
    }
    let slope = sxy / sxx;
    let rounded = slope.round();
    if !slope.is_finite() || (slope - rounded).abs() > tolerance {
        return malformed(format!("slope {slope:.4} is not close to an integer"));
    }
    log::trace!("log-linear fit over {} points: slope {slope:.6}", points.len());
    Ok(rounded as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_power_laws() {
        let xs = [1e-3, 1e-4, 1e-5];
        for n in -4i32..=4 {
            let ys: Vec<f64> = xs.iter().map(|x: &f64| 7.0 * x.powi(n)).collect();
            assert_eq!(log_linear_fit(&xs, &ys, 0.2).unwrap(), n);
        }
    }

    #[test]
    fn noisy_slopes_round() {
        let xs = [1e-3, 1e-4, 1e-5];
        let ys = [1e-3 * 1.01, 1e-4 * 0.99, 1e-5 * 1.02];
        assert_eq!(log_linear_fit(&xs, &ys, 0.2).unwrap(), 1);
    }

    #[test]
    fn malformed_inputs() {
        assert!(log_linear_fit(&[1e-3], &[1.0], 0.2).is_err());
        assert!(log_linear_fit(&[1e-3, 1e-4], &[0.0, 1.0], 0.2).is_err());
        assert!(log_linear_fit(&[1e-3, 1e-3], &[1.0, 2.0], 0.2).is_err());
        // slope 1/2
        let xs = [1e-2, 1e-4];
        let ys = [1e-1, 1e-2];
        assert!(matches!(
            log_linear_fit(&xs, &ys, 0.2),
            Err(ScalingError::MalformedFit { .. })
        ));
    }
}
