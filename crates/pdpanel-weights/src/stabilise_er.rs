//! Event-rate stabilisation across vintages.

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use pdpanel_traits::{PanelError, Result};

use crate::stats::{WeightContext, WeightStats};
use crate::strategy::{WeightStrategy, ensure_finite};

const RATE_FLOOR: f64 = 1e-12;

/// Configuration for [`StabiliseEr`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StabiliseErConfig {
    /// Event rate every vintage is moved to (default: the global event rate)
    pub target_er: Option<f64>,
}

impl StabiliseErConfig {
    pub(crate) fn validate(&self) -> Result<()> {
        match self.target_er {
            Some(rate) if !(0.0..=1.0).contains(&rate) => Err(PanelError::Configuration(
                format!("stabilise_er target_er must be in [0, 1], got {rate}"),
            )),
            _ => Ok(()),
        }
    }
}

/// Moves every vintage's weighted event rate to a common target.
///
/// Events in vintage `v` get `target / er_v`, non-events
/// `(1 - target) / (1 - er_v)`, with both denominators floored at `1e-12`.
#[derive(Debug, Clone, Default)]
pub struct StabiliseEr {
    config: StabiliseErConfig,
}

impl StabiliseEr {
    /// Create the strategy.
    pub const fn new(config: StabiliseErConfig) -> Self {
        Self { config }
    }

    /// The strategy's configuration.
    pub const fn config(&self) -> &StabiliseErConfig {
        &self.config
    }
}

impl WeightStrategy for StabiliseEr {
    fn weights(&self, ctx: &WeightContext<'_>, stats: &WeightStats) -> Result<Array1<f64>> {
        let target = self.config.target_er.unwrap_or(stats.global_er);
        let weights = ctx
            .vintages()
            .iter()
            .enumerate()
            .map(|(row, vintage)| {
                let rate = stats.vintage_rate(*vintage)?;
                Ok(if ctx.is_event(row) {
                    target / rate.max(RATE_FLOOR)
                } else {
                    (1.0 - target) / (1.0 - rate).max(RATE_FLOOR)
                })
            })
            .collect::<Result<Vec<f64>>>()?;
        let weights = Array1::from_vec(weights);
        ensure_finite(self.name(), &weights)?;
        Ok(weights)
    }

    fn name(&self) -> &str {
        "stabilise_er"
    }
}
