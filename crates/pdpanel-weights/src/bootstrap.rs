//! Majority-class undersampling expressed as weights.

use ndarray::Array1;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::warn;

use pdpanel_traits::Result;

use crate::stats::{WeightContext, WeightStats};
use crate::strategy::WeightStrategy;

/// Configuration for [`StratifiedBootstrap`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StratifiedBootstrapConfig {
    /// Seed for reproducible draws (default: seeded from the OS)
    pub random_state: Option<u64>,
}

/// Keeps every minority-class row and a random share of the majority class.
///
/// Minority rows get weight 1. Each majority row is kept with probability
/// `n_minority / n_majority` and then weighted by the inverse of that
/// probability; dropped rows get weight 0. When one class is absent every
/// row gets weight 1.
#[derive(Debug, Clone, Default)]
pub struct StratifiedBootstrap {
    config: StratifiedBootstrapConfig,
}

impl StratifiedBootstrap {
    /// Create the strategy.
    pub const fn new(config: StratifiedBootstrapConfig) -> Self {
        Self { config }
    }

    /// The strategy's configuration.
    pub const fn config(&self) -> &StratifiedBootstrapConfig {
        &self.config
    }

    fn rng(&self) -> ChaCha8Rng {
        match self.config.random_state {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        }
    }
}

impl WeightStrategy for StratifiedBootstrap {
    fn weights(&self, ctx: &WeightContext<'_>, _stats: &WeightStats) -> Result<Array1<f64>> {
        let n = ctx.len();
        let n_pos = (0..n).filter(|row| ctx.is_event(*row)).count();
        let n_neg = ctx.target().iter().filter(|t| **t == 0.0).count();
        if n_pos == 0 || n_neg == 0 {
            warn!(n_pos, n_neg, "single-class frame, bootstrap weights left at 1");
            return Ok(Array1::ones(n));
        }

        let positive_majority = n_pos > n_neg;
        let (n_majority, n_minority) = if positive_majority {
            (n_pos, n_neg)
        } else {
            (n_neg, n_pos)
        };
        let p_keep = n_minority as f64 / n_majority as f64;

        let mut rng = self.rng();
        let weights: Array1<f64> = (0..n)
            .map(|row| {
                if ctx.is_event(row) != positive_majority {
                    1.0
                } else if rng.r#gen::<f64>() < p_keep {
                    1.0 / p_keep
                } else {
                    0.0
                }
            })
            .collect();
        Ok(weights)
    }

    fn name(&self) -> &str {
        "stratified_bootstrap"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdpanel_traits::PanelFrame;
    use polars::prelude::*;

    fn panel(bad: &[i64]) -> PanelFrame {
        PanelFrame::new(
            df! {
                "vint" => vec![202401i64; bad.len()],
                "bad" => bad.to_vec(),
            }
            .unwrap(),
        )
    }

    fn run(panel: &PanelFrame, seed: u64) -> Array1<f64> {
        let ctx = WeightContext::new(panel, "vint", "bad").unwrap();
        let stats = WeightStats::fit(&ctx, None).unwrap();
        StratifiedBootstrap::new(StratifiedBootstrapConfig {
            random_state: Some(seed),
        })
        .weights(&ctx, &stats)
        .unwrap()
    }

    #[test]
    fn test_minority_rows_keep_unit_weight() {
        let mut bad = vec![0i64; 80];
        bad.extend(vec![1i64; 20]);
        let panel = panel(&bad);
        let w = run(&panel, 7);

        for row in 80..100 {
            assert_eq!(w[row], 1.0);
        }
        for row in 0..80 {
            assert!(w[row] == 0.0 || (w[row] - 4.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_seed_is_reproducible() {
        let mut bad = vec![0i64; 50];
        bad.extend(vec![1i64; 10]);
        let panel = panel(&bad);
        assert_eq!(run(&panel, 42), run(&panel, 42));
    }

    #[test]
    fn test_single_class_is_all_ones() {
        let panel = panel(&[0, 0, 0]);
        assert_eq!(run(&panel, 1), Array1::<f64>::ones(3));
    }
}
