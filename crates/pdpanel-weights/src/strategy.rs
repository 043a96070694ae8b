//! Strategy abstraction and the name lookup table.

use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use pdpanel_traits::{PanelError, Result};

use crate::balanced::{Balanced, BalancedConfig};
use crate::bootstrap::{StratifiedBootstrap, StratifiedBootstrapConfig};
use crate::equal_vintage::{EqualVintage, EqualVintageConfig};
use crate::expected_loss::{ExpectedLoss, ExpectedLossConfig};
use crate::recency_decay::{RecencyDecay, RecencyDecayConfig};
use crate::stabilise_er::{StabiliseEr, StabiliseErConfig};
use crate::stats::{WeightContext, WeightStats};

/// Computes one multiplicative weight factor per row.
///
/// Implementors are pure functions of the rows, the statistics gathered at
/// fit time and their own configuration. All implementations must be
/// thread-safe (Send + Sync).
///
/// # Examples
///
/// ```rust,no_run
/// use ndarray::Array1;
/// use pdpanel_weights::{WeightContext, WeightStats, WeightStrategy};
///
/// struct Flat;
///
/// impl WeightStrategy for Flat {
///     fn weights(
///         &self,
///         ctx: &WeightContext<'_>,
///         _stats: &WeightStats,
///     ) -> pdpanel_traits::Result<Array1<f64>> {
///         Ok(Array1::ones(ctx.len()))
///     }
///
///     fn name(&self) -> &str {
///         "flat"
///     }
/// }
/// ```
pub trait WeightStrategy: Send + Sync {
    /// Weight factor for every row of `ctx`, aligned to its rows.
    ///
    /// # Errors
    ///
    /// Returns an error if a required column is absent, a row falls in a
    /// vintage unseen at fit time, or the factors are not finite.
    fn weights(&self, ctx: &WeightContext<'_>, stats: &WeightStats) -> Result<Array1<f64>>;

    /// Name of the strategy, as used in configuration.
    fn name(&self) -> &str;
}

/// The closed set of weighting strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Class balancing
    Balanced,
    /// Equal contribution per vintage
    EqualVintage,
    /// Equal event rate across vintages
    StabiliseEr,
    /// Exponential decay towards older vintages
    RecencyDecay,
    /// Cost-sensitive weighting by exposure and loss given default
    ExpectedLoss,
    /// Majority-class undersampling
    StratifiedBootstrap,
}

impl StrategyKind {
    /// Every strategy, in registry order.
    pub const ALL: [Self; 6] = [
        Self::Balanced,
        Self::EqualVintage,
        Self::StabiliseEr,
        Self::RecencyDecay,
        Self::ExpectedLoss,
        Self::StratifiedBootstrap,
    ];

    /// Configuration name of the strategy.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Balanced => "balanced",
            Self::EqualVintage => "equal_vintage",
            Self::StabiliseEr => "stabilise_er",
            Self::RecencyDecay => "recency_decay",
            Self::ExpectedLoss => "expected_loss",
            Self::StratifiedBootstrap => "stratified_bootstrap",
        }
    }

    /// Look a strategy up by configuration name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StrategyKind {
    type Err = PanelError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s).ok_or_else(|| {
            let allowed: Vec<&str> = Self::ALL.iter().map(Self::name).collect();
            PanelError::Configuration(format!(
                "unknown strategy {s:?}; allowed: {}, combo",
                allowed.join(", ")
            ))
        })
    }
}

/// Metadata about a strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyInfo {
    /// Strategy kind
    pub kind: StrategyKind,

    /// Configuration name
    pub name: &'static str,

    /// Human-readable description
    pub description: &'static str,

    /// Whether the strategy reads the binary target
    pub uses_target: bool,

    /// Whether the strategy reads per-vintage statistics
    pub uses_vintages: bool,
}

/// Get information about all available strategies.
#[must_use]
pub fn available_strategies() -> Vec<StrategyInfo> {
    vec![
        StrategyInfo {
            kind: StrategyKind::Balanced,
            name: StrategyKind::Balanced.name(),
            description: "0.5/p for events and 0.5/(1-p) otherwise, p the global event rate",
            uses_target: true,
            uses_vintages: false,
        },
        StrategyInfo {
            kind: StrategyKind::EqualVintage,
            name: StrategyKind::EqualVintage.name(),
            description: "n / (k * n_v): every vintage contributes the same total weight",
            uses_target: false,
            uses_vintages: true,
        },
        StrategyInfo {
            kind: StrategyKind::StabiliseEr,
            name: StrategyKind::StabiliseEr.name(),
            description: "Rescales each vintage's event rate to a common target rate",
            uses_target: true,
            uses_vintages: true,
        },
        StrategyInfo {
            kind: StrategyKind::RecencyDecay,
            name: StrategyKind::RecencyDecay.name(),
            description: "exp(-lambda * months since the latest vintage)",
            uses_target: false,
            uses_vintages: true,
        },
        StrategyInfo {
            kind: StrategyKind::ExpectedLoss,
            name: StrategyKind::ExpectedLoss.name(),
            description: "Exposure at default times loss given default, scaled to mean 1",
            uses_target: false,
            uses_vintages: false,
        },
        StrategyInfo {
            kind: StrategyKind::StratifiedBootstrap,
            name: StrategyKind::StratifiedBootstrap.name(),
            description: "Undersamples the majority class, reweighting the kept rows",
            uses_target: true,
            uses_vintages: false,
        },
    ]
}

/// A strategy together with its hyper-parameters.
///
/// Serialized externally tagged, so `{"stabilise_er": {"target_er": 0.1}}`
/// reads as [`StrategyConfig::StabiliseEr`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyConfig {
    /// See [`Balanced`]
    Balanced(BalancedConfig),
    /// See [`EqualVintage`]
    EqualVintage(EqualVintageConfig),
    /// See [`StabiliseEr`]
    StabiliseEr(StabiliseErConfig),
    /// See [`RecencyDecay`]
    RecencyDecay(RecencyDecayConfig),
    /// See [`ExpectedLoss`]
    ExpectedLoss(ExpectedLossConfig),
    /// See [`StratifiedBootstrap`]
    StratifiedBootstrap(StratifiedBootstrapConfig),
}

impl StrategyConfig {
    /// Default hyper-parameters for a strategy.
    pub fn default_for(kind: StrategyKind) -> Self {
        match kind {
            StrategyKind::Balanced => Self::Balanced(BalancedConfig::default()),
            StrategyKind::EqualVintage => Self::EqualVintage(EqualVintageConfig::default()),
            StrategyKind::StabiliseEr => Self::StabiliseEr(StabiliseErConfig::default()),
            StrategyKind::RecencyDecay => Self::RecencyDecay(RecencyDecayConfig::default()),
            StrategyKind::ExpectedLoss => Self::ExpectedLoss(ExpectedLossConfig::default()),
            StrategyKind::StratifiedBootstrap => {
                Self::StratifiedBootstrap(StratifiedBootstrapConfig::default())
            }
        }
    }

    /// Parse one `name => parameters` entry of a JSON strategy document.
    ///
    /// # Errors
    ///
    /// [`PanelError::Configuration`] for an unknown name or parameters that
    /// do not fit the strategy.
    pub fn from_json(name: &str, params: serde_json::Value) -> Result<Self> {
        let kind: StrategyKind = name.parse()?;
        let params = if params.is_null() {
            serde_json::Value::Object(serde_json::Map::new())
        } else {
            params
        };
        let mut tagged = serde_json::Map::new();
        tagged.insert(kind.name().to_string(), params);
        serde_json::from_value(serde_json::Value::Object(tagged)).map_err(|e| {
            PanelError::Configuration(format!("invalid parameters for {kind}: {e}"))
        })
    }

    /// The strategy this configures.
    pub const fn kind(&self) -> StrategyKind {
        match self {
            Self::Balanced(_) => StrategyKind::Balanced,
            Self::EqualVintage(_) => StrategyKind::EqualVintage,
            Self::StabiliseEr(_) => StrategyKind::StabiliseEr,
            Self::RecencyDecay(_) => StrategyKind::RecencyDecay,
            Self::ExpectedLoss(_) => StrategyKind::ExpectedLoss,
            Self::StratifiedBootstrap(_) => StrategyKind::StratifiedBootstrap,
        }
    }

    /// Check parameters that can be validated without data.
    ///
    /// # Errors
    ///
    /// [`PanelError::Configuration`] for out-of-range parameters.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::StabiliseEr(config) => config.validate(),
            Self::RecencyDecay(config) => config.validate(),
            Self::ExpectedLoss(config) => config.validate(),
            Self::Balanced(_) | Self::EqualVintage(_) | Self::StratifiedBootstrap(_) => Ok(()),
        }
    }

    /// Instantiate the strategy.
    pub fn strategy(&self) -> Box<dyn WeightStrategy> {
        match self {
            Self::Balanced(config) => Box::new(Balanced::new(config.clone())),
            Self::EqualVintage(config) => Box::new(EqualVintage::new(config.clone())),
            Self::StabiliseEr(config) => Box::new(StabiliseEr::new(config.clone())),
            Self::RecencyDecay(config) => Box::new(RecencyDecay::new(config.clone())),
            Self::ExpectedLoss(config) => Box::new(ExpectedLoss::new(config.clone())),
            Self::StratifiedBootstrap(config) => {
                Box::new(StratifiedBootstrap::new(config.clone()))
            }
        }
    }
}

/// Fail if any factor is NaN or infinite.
pub(crate) fn ensure_finite(name: &str, weights: &Array1<f64>) -> Result<()> {
    match weights.iter().position(|w| !w.is_finite()) {
        Some(row) => Err(PanelError::InvalidData(format!(
            "{name} produced a non-finite weight at row {row}"
        ))),
        None => Ok(()),
    }
}
