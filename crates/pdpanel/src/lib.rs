#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/pdpanel/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! ## Crate Organization
//!
//! - [`traits`] - Core types ([`PanelFrame`], [`Period`], [`Frequency`]) and the [`PanelTransform`] trait
//! - [`spells`] - Spell segmentation and the behaviour PD population builder
//! - [`targets`] - EVER/OVER target labelling
//! - [`weights`] - Sample weighting strategies
//!
//! ## Data Flow
//!
//! 1. **Period Normalizer** maps `YYYYMM` integers, strings and dates to [`Period`]s
//! 2. **Target Builder** labels every row with its EVER/OVER targets
//! 3. **Behaviour PD Builder** keeps the performing rows that belong to a spell
//! 4. **Sample Weighter** weights the final population for model training
//!
//! Steps 2 and 3 are independent and can run in either order.

/// Version information for the pdpanel crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

mod pipeline;

pub use pipeline::Pipeline;

// ============================================================================
// Core Types
// ============================================================================

/// Core types and the transform abstraction.
///
/// # Example
///
/// ```ignore
/// use pdpanel::traits::{Frequency, PanelFrame, Period};
/// ```
pub mod traits {
    pub use pdpanel_traits::*;
}

// Re-export core types at top level for convenience
pub use pdpanel_traits::{
    Frequency, PanelError, PanelFrame, PanelTransform, Period, PeriodEncoding, Result,
};

// ============================================================================
// Stages
// ============================================================================

/// Spell segmentation.
///
/// The [`SpellSegmenter`](spells::SpellSegmenter) works on one entity's
/// default flags; the [`BehaviorPdBuilder`](spells::BehaviorPdBuilder) runs
/// it over a whole panel and adds `spell_id`, `months_elapsed` and
/// `censored`.
pub mod spells {
    pub use pdpanel_spells::*;
}

/// EVER/OVER targets.
///
/// Target names read `{EVER|OVER}{dpd}{M|Q|Y|D}{horizon}`: `EVER90M12` is 1
/// when days past due reach 90 in the current or any of the next eleven
/// months.
pub mod targets {
    pub use pdpanel_targets::*;
}

/// Sample weights.
pub mod weights {
    pub use pdpanel_weights::*;
}

pub use pdpanel_spells::{BehaviorPdBuilder, BehaviorPdConfig, CensoringRule};
pub use pdpanel_targets::{TargetBuilder, TargetBuilderConfig};
pub use pdpanel_weights::{SampleWeighter, WeighterConfig};

// ============================================================================
// Prelude
// ============================================================================

/// Prelude module for convenient imports.
///
/// ```ignore
/// use pdpanel::prelude::*;
/// ```
pub mod prelude {
    pub use crate::Pipeline;
    pub use crate::{BehaviorPdBuilder, BehaviorPdConfig, CensoringRule};
    pub use crate::{Frequency, PanelError, PanelFrame, PanelTransform, PeriodEncoding, Result};
    pub use crate::{SampleWeighter, WeighterConfig};
    pub use crate::{TargetBuilder, TargetBuilderConfig};
}
