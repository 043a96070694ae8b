//! Sample weighting for behaviour PD training sets.
//!
//! [`SampleWeighter`] fits dataset-level statistics (global and per-vintage
//! event rates, vintage sizes) and multiplies a configurable sequence of
//! strategies into one weight per row, then caps and rescales the result.
//!
//! Strategies form a closed set ([`StrategyKind`]) looked up by name:
//! `balanced`, `equal_vintage`, `stabilise_er`, `recency_decay`,
//! `expected_loss` and `stratified_bootstrap`.
//!
//! # Examples
//!
//! ```rust,no_run
//! use pdpanel_weights::{SampleWeighter, WeighterConfig};
//!
//! let config = WeighterConfig::new("vintage", "bad").with_strategies_json(
//!     r#"{"balanced": {}, "recency_decay": {"half_life": 12}}"#,
//! )?;
//! let mut weighter = SampleWeighter::new(config)?;
//! # let panel: pdpanel_traits::PanelFrame = unimplemented!();
//! let weights = weighter.fit_transform(&panel)?;
//! println!("{}", serde_json::to_string(&weighter.audit_report(&weights))?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

mod audit;
mod balanced;
mod bootstrap;
mod equal_vintage;
mod expected_loss;
mod recency_decay;
mod stabilise_er;
mod stats;
mod strategy;
mod weighter;

// Re-export main types
pub use audit::{AuditReport, ks_two_sample};
pub use balanced::{Balanced, BalancedConfig};
pub use bootstrap::{StratifiedBootstrap, StratifiedBootstrapConfig};
pub use equal_vintage::{EqualVintage, EqualVintageConfig};
pub use expected_loss::{ExpectedLoss, ExpectedLossConfig};
pub use recency_decay::{DEFAULT_HALF_LIFE, RecencyDecay, RecencyDecayConfig};
pub use stabilise_er::{StabiliseEr, StabiliseErConfig};
pub use stats::{WeightContext, WeightStats};
pub use strategy::{
    StrategyConfig, StrategyInfo, StrategyKind, WeightStrategy, available_strategies,
};
pub use weighter::{COMBO_KEY, SAMPLE_WEIGHT_COL, SampleWeighter, WeighterConfig};
