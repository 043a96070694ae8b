//! EVER/OVER delinquency targets for PD panels.
//!
//! This crate labels an entity-period panel with forward-looking (`EVER`)
//! and backward-looking (`OVER`) threshold targets:
//! - [`window_labels`]: the per-entity rolling-window engine
//! - [`TargetRegistry`]: named target definitions, seeded with defaults
//! - [`TargetBuilder`]: the panel-level stage adding one `i8` column per target
//!
//! # Example
//!
//! ```ignore
//! use pdpanel_targets::{TargetBuilder, TargetBuilderConfig};
//! use pdpanel_traits::PanelTransform;
//!
//! let config = TargetBuilderConfig::new("contract", "ref").with_targets(["EVER90M12"]);
//! let labelled = TargetBuilder::new(config)?.transform(&panel)?;
//! ```

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod builder;
pub mod registry;
pub mod window;

// Re-export key types
pub use builder::{TargetBuilder, TargetBuilderConfig};
pub use registry::{TargetDefinition, TargetRegistry, parse_target_name};
pub use window::{Direction, window_labels};
