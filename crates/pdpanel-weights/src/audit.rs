//! Audit summary of a weight vector.

use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// JSON-ready audit of a weight vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditReport {
    /// Mean weight
    pub mean: f64,
    /// Two-sample Kolmogorov-Smirnov p-value against an all-ones vector
    pub ks_pvalue: f64,
    /// Cap quantile applied, if any
    pub cap: Option<f64>,
}

impl AuditReport {
    /// Summarise `weights` produced under `cap`.
    pub fn new(weights: &Array1<f64>, cap: Option<f64>) -> Self {
        let values = weights.to_vec();
        let baseline = vec![1.0; values.len()];
        Self {
            mean: weights.mean().unwrap_or(f64::NAN),
            ks_pvalue: ks_two_sample(&values, &baseline).1,
            cap,
        }
    }
}

/// Two-sample Kolmogorov-Smirnov test.
///
/// Returns the statistic `D = sup |F_a - F_b|` and its two-sided p-value
/// from the asymptotic distribution with the usual small-sample
/// correction. Empty samples give `(0, 1)`.
pub fn ks_two_sample(a: &[f64], b: &[f64]) -> (f64, f64) {
    if a.is_empty() || b.is_empty() {
        return (0.0, 1.0);
    }

    let mut a = a.to_vec();
    let mut b = b.to_vec();
    a.sort_by(|x, y| x.total_cmp(y));
    b.sort_by(|x, y| x.total_cmp(y));

    let (n, m) = (a.len(), b.len());
    let (mut i, mut j) = (0usize, 0usize);
    let mut d: f64 = 0.0;
    while i < n && j < m {
        let x = a[i].min(b[j]);
        while i < n && a[i] <= x {
            i += 1;
        }
        while j < m && b[j] <= x {
            j += 1;
        }
        d = d.max((i as f64 / n as f64 - j as f64 / m as f64).abs());
    }

    let en = ((n * m) as f64 / (n + m) as f64).sqrt();
    (d, kolmogorov_q((en + 0.12 + 0.11 / en) * d))
}

/// Survival function of the Kolmogorov distribution.
fn kolmogorov_q(lambda: f64) -> f64 {
    if lambda < 1e-3 {
        return 1.0;
    }
    let a2 = -2.0 * lambda * lambda;
    let mut sum = 0.0;
    let mut sign = 1.0;
    let mut previous = 0.0;
    for j in 1..=100_i32 {
        let term = sign * 2.0 * (a2 * f64::from(j * j)).exp();
        sum += term;
        if term.abs() <= 1e-10 * previous || term.abs() <= 1e-16 * sum.abs() {
            return sum.clamp(0.0, 1.0);
        }
        sign = -sign;
        previous = term.abs();
    }
    1.0
}
