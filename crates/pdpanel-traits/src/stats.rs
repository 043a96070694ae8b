//! Statistical helpers shared by the weighting strategies.

/// Arithmetic mean, `NaN` for empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Quantile with linear interpolation between order statistics.
///
/// `q` is clamped to `[0, 1]`. Returns `NaN` for empty input. Matches the
/// default ("linear") method of common numerical libraries: the quantile
/// sits at position `q * (n - 1)` of the sorted values.
///
/// # Examples
///
/// ```
/// use pdpanel_traits::stats::quantile;
///
/// let values = vec![4.0, 1.0, 3.0, 2.0];
/// assert!((quantile(&values, 0.5) - 2.5).abs() < 1e-12);
/// assert!((quantile(&values, 1.0) - 4.0).abs() < 1e-12);
/// ```
pub fn quantile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let position = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let weight = position - lower as f64;

    sorted[lower] + (sorted[upper] - sorted[lower]) * weight
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_mean() {
        assert_relative_eq!(mean(&[1.0, 2.0, 3.0]), 2.0);
        assert!(mean(&[]).is_nan());
    }

    #[test]
    fn test_quantile_interpolates() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_relative_eq!(quantile(&values, 0.0), 1.0);
        assert_relative_eq!(quantile(&values, 0.5), 3.0);
        assert_relative_eq!(quantile(&values, 0.95), 4.8, epsilon = 1e-12);
        assert_relative_eq!(quantile(&values, 1.0), 5.0);
    }

    #[test]
    fn test_quantile_single_value() {
        assert_relative_eq!(quantile(&[7.0], 0.3), 7.0);
    }

    #[test]
    fn test_quantile_empty() {
        assert!(quantile(&[], 0.5).is_nan());
    }
}
