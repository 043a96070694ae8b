//! Class-balancing weights.

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use pdpanel_traits::Result;

use crate::stats::{WeightContext, WeightStats};
use crate::strategy::{WeightStrategy, ensure_finite};

/// Configuration for [`Balanced`]. The strategy has no parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalancedConfig {}

/// Gives both classes the same total weight.
///
/// With global event rate `p`, events get `0.5 / p` and non-events
/// `0.5 / (1 - p)`, so the weights average to one over the fit rows.
#[derive(Debug, Clone, Default)]
pub struct Balanced {
    config: BalancedConfig,
}

impl Balanced {
    /// Create the strategy.
    pub const fn new(config: BalancedConfig) -> Self {
        Self { config }
    }

    /// The strategy's configuration.
    pub const fn config(&self) -> &BalancedConfig {
        &self.config
    }
}

impl WeightStrategy for Balanced {
    fn weights(&self, ctx: &WeightContext<'_>, stats: &WeightStats) -> Result<Array1<f64>> {
        let p = stats.global_er;
        let weights: Array1<f64> = (0..ctx.len())
            .map(|row| {
                if ctx.is_event(row) {
                    0.5 / p
                } else {
                    0.5 / (1.0 - p)
                }
            })
            .collect();
        ensure_finite(self.name(), &weights)?;
        Ok(weights)
    }

    fn name(&self) -> &str {
        "balanced"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pdpanel_traits::PanelFrame;
    use polars::prelude::*;

    #[test]
    fn test_balanced_factors() {
        let panel = PanelFrame::new(
            df! {
                "vint" => &[202401i64; 5],
                "bad" => &[1i64, 0, 0, 0, 0],
            }
            .unwrap(),
        );
        let ctx = WeightContext::new(&panel, "vint", "bad").unwrap();
        let stats = WeightStats::fit(&ctx, None).unwrap();
        let w = Balanced::default().weights(&ctx, &stats).unwrap();

        assert_relative_eq!(w[0], 2.5);
        assert_relative_eq!(w[1], 0.625);
        assert_relative_eq!(w.sum() / 5.0, 1.0);
    }

    #[test]
    fn test_single_class_is_finite() {
        let panel = PanelFrame::new(
            df! {
                "vint" => &[202401i64, 202401],
                "bad" => &[0i64, 0],
            }
            .unwrap(),
        );
        let ctx = WeightContext::new(&panel, "vint", "bad").unwrap();
        let stats = WeightStats::fit(&ctx, None).unwrap();
        let w = Balanced::default().weights(&ctx, &stats).unwrap();
        assert_relative_eq!(w[0], 0.5);
    }
}
