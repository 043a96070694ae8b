//! Cost-sensitive weights from exposure and loss given default.

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use pdpanel_traits::{PanelError, Result};

use crate::stats::{WeightContext, WeightStats};
use crate::strategy::{WeightStrategy, ensure_finite};

/// Configuration for [`ExpectedLoss`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpectedLossConfig {
    /// Exposure at default column (required)
    pub ead_col: Option<String>,
    /// Loss given default column, multiplied in when set
    pub lgd_col: Option<String>,
    /// Divide by the mean so the factors average to one (default: true)
    pub scale_to_mean: bool,
}

impl Default for ExpectedLossConfig {
    fn default() -> Self {
        Self {
            ead_col: None,
            lgd_col: None,
            scale_to_mean: true,
        }
    }
}

impl ExpectedLossConfig {
    /// Configuration reading exposure from `ead_col`.
    pub fn new(ead_col: impl Into<String>) -> Self {
        Self {
            ead_col: Some(ead_col.into()),
            ..Self::default()
        }
    }

    /// Multiply by loss given default from `lgd_col`.
    pub fn with_lgd(mut self, lgd_col: impl Into<String>) -> Self {
        self.lgd_col = Some(lgd_col.into());
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        match self.ead_col {
            Some(_) => Ok(()),
            None => Err(PanelError::Configuration(
                "expected_loss requires 'ead_col'".to_string(),
            )),
        }
    }
}

/// Weights each row by `ead * lgd`, optionally scaled to mean one.
#[derive(Debug, Clone)]
pub struct ExpectedLoss {
    config: ExpectedLossConfig,
}

impl ExpectedLoss {
    /// Create the strategy.
    pub const fn new(config: ExpectedLossConfig) -> Self {
        Self { config }
    }

    /// The strategy's configuration.
    pub const fn config(&self) -> &ExpectedLossConfig {
        &self.config
    }
}

impl WeightStrategy for ExpectedLoss {
    fn weights(&self, ctx: &WeightContext<'_>, _stats: &WeightStats) -> Result<Array1<f64>> {
        self.config.validate()?;
        let panel = ctx.panel();

        let mut weights = Array1::from_vec(match &self.config.ead_col {
            Some(ead_col) => panel.required_f64_values(ead_col)?,
            None => vec![1.0; ctx.len()],
        });
        if let Some(lgd_col) = &self.config.lgd_col {
            weights *= &Array1::from_vec(panel.required_f64_values(lgd_col)?);
        }

        if self.config.scale_to_mean {
            let mean = weights.mean().unwrap_or(0.0);
            if mean == 0.0 || !mean.is_finite() {
                return Err(PanelError::InvalidData(format!(
                    "expected_loss cannot scale weights with mean {mean}"
                )));
            }
            weights /= mean;
        }

        ensure_finite(self.name(), &weights)?;
        Ok(weights)
    }

    fn name(&self) -> &str {
        "expected_loss"
    }
}
