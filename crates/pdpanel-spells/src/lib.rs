//! Spell segmentation for behaviour PD populations.
//!
//! This crate turns an entity-period table of default flags into the
//! performing population of a behaviour PD model:
//! - [`SpellSegmenter`]: pure per-entity spell assignment with the cure-gap rule
//! - [`BehaviorPdBuilder`]: the panel-level stage adding `spell_id`,
//!   `months_elapsed` and `censored`
//!
//! # Example
//!
//! ```ignore
//! use pdpanel_spells::{BehaviorPdBuilder, BehaviorPdConfig};
//! use pdpanel_traits::PanelTransform;
//!
//! let builder = BehaviorPdBuilder::new(BehaviorPdConfig::new("contract", "ref", "bad"))?;
//! let population = builder.transform(&panel)?;
//! ```

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod builder;
pub mod segmenter;

// Re-export key types
pub use builder::{
    BehaviorPdBuilder, BehaviorPdConfig, CENSORED_COL, CensoringRule, MONTHS_ELAPSED_COL,
    SPELL_ID_COL,
};
pub use segmenter::{Segmentation, Spell, SpellSegmenter, run_lengths};
