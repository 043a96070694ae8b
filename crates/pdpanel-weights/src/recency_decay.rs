//! Exponential decay towards older vintages.

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use pdpanel_traits::{PanelError, Result};

use crate::stats::{WeightContext, WeightStats};
use crate::strategy::{WeightStrategy, ensure_finite};

/// Half-life in months used when neither parameter is given.
pub const DEFAULT_HALF_LIFE: f64 = 6.0;

/// Configuration for [`RecencyDecay`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecencyDecayConfig {
    /// Months after which the weight halves (default: 6)
    pub half_life: Option<f64>,
    /// Decay rate per month; takes precedence over `half_life`
    #[serde(alias = "lambda_")]
    pub lambda: Option<f64>,
}

impl RecencyDecayConfig {
    /// The decay rate per month.
    pub fn lambda(&self) -> f64 {
        self.lambda.unwrap_or_else(|| {
            std::f64::consts::LN_2 / self.half_life.unwrap_or(DEFAULT_HALF_LIFE).max(1e-6)
        })
    }

    pub(crate) fn validate(&self) -> Result<()> {
        let lambda = self.lambda();
        if lambda.is_finite() && lambda >= 0.0 {
            Ok(())
        } else {
            Err(PanelError::Configuration(format!(
                "recency_decay rate must be finite and non-negative, got {lambda}"
            )))
        }
    }
}

/// Weights each row by `exp(-lambda * age)`, where `age` is the number of
/// months between the row's vintage and the latest vintage seen at fit time.
#[derive(Debug, Clone, Default)]
pub struct RecencyDecay {
    config: RecencyDecayConfig,
}

impl RecencyDecay {
    /// Create the strategy.
    pub const fn new(config: RecencyDecayConfig) -> Self {
        Self { config }
    }

    /// The strategy's configuration.
    pub const fn config(&self) -> &RecencyDecayConfig {
        &self.config
    }
}

impl WeightStrategy for RecencyDecay {
    fn weights(&self, ctx: &WeightContext<'_>, stats: &WeightStats) -> Result<Array1<f64>> {
        let lambda = stats.recency_lambda.unwrap_or_else(|| self.config.lambda());
        let latest = stats
            .latest_vintage()
            .ok_or_else(|| PanelError::NotFitted("no vintages were fitted".to_string()))?;

        let weights: Array1<f64> = ctx
            .vintages()
            .iter()
            .map(|vintage| (-lambda * latest.periods_since(vintage) as f64).exp())
            .collect();
        ensure_finite(self.name(), &weights)?;
        Ok(weights)
    }

    fn name(&self) -> &str {
        "recency_decay"
    }
}
