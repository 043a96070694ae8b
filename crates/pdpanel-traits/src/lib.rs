#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/pdpanel/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core types for preparing credit-behaviour panels for PD modelling.
//!
//! This crate provides the error taxonomy, the canonical period type and its
//! normalizer, the panel container, and the transform abstraction shared by
//! the spell builder and the target builder.

/// The version of the pdpanel-traits crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Module declarations
pub mod error;
pub mod partition;
pub mod period;
pub mod stats;
pub mod transform;
pub mod types;

// Re-exports
pub use error::{PanelError, Result};
pub use partition::{EntityPartition, partition_sorted, sort_by_entity_period};
pub use period::{PeriodEncoding, normalize_column};
pub use transform::PanelTransform;
pub use types::{Date, Frequency, PanelFrame, Period};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
        assert!(VERSION.contains('.'));
    }
}
