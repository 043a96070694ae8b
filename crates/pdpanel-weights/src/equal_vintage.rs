//! Equal contribution per vintage.

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use pdpanel_traits::Result;

use crate::stats::{WeightContext, WeightStats};
use crate::strategy::{WeightStrategy, ensure_finite};

/// Configuration for [`EqualVintage`]. The strategy has no parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EqualVintageConfig {}

/// Weights each row by `n / (k * n_v)`.
///
/// `n` is the number of fit rows, `k` the number of vintages and `n_v` the
/// size of the row's vintage, so every vintage carries `n / k` in total.
#[derive(Debug, Clone, Default)]
pub struct EqualVintage {
    config: EqualVintageConfig,
}

impl EqualVintage {
    /// Create the strategy.
    pub const fn new(config: EqualVintageConfig) -> Self {
        Self { config }
    }

    /// The strategy's configuration.
    pub const fn config(&self) -> &EqualVintageConfig {
        &self.config
    }
}

impl WeightStrategy for EqualVintage {
    fn weights(&self, ctx: &WeightContext<'_>, stats: &WeightStats) -> Result<Array1<f64>> {
        let n = stats.n_obs as f64;
        let k = stats.n_vintages() as f64;
        let weights = ctx
            .vintages()
            .iter()
            .map(|vintage| Ok(n / (k * stats.vintage_size(*vintage)? as f64)))
            .collect::<Result<Vec<f64>>>()?;
        let weights = Array1::from_vec(weights);
        ensure_finite(self.name(), &weights)?;
        Ok(weights)
    }

    fn name(&self) -> &str {
        "equal_vintage"
    }
}
