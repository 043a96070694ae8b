//! The `PanelTransform` trait.
//!
//! Every stage that turns an entity-period table into an annotated table
//! (spell segmentation, target labelling) implements [`PanelTransform`], so
//! callers can chain stages without knowing their concrete types.

use crate::{PanelFrame, Result};

/// A deterministic, in-memory transformation of an entity-period table.
///
/// Implementations should be thread-safe (`Send + Sync`) and must not keep
/// state between calls: the same input always yields the same output.
///
/// # Example
///
/// ```no_run
/// use pdpanel_traits::{PanelFrame, PanelTransform, Result};
///
/// struct Identity;
///
/// impl PanelTransform for Identity {
///     fn name(&self) -> &str {
///         "identity"
///     }
///
///     fn transform(&self, panel: &PanelFrame) -> Result<PanelFrame> {
///         Ok(panel.clone())
///     }
///
///     fn required_columns(&self) -> Vec<&str> {
///         Vec::new()
///     }
/// }
/// ```
pub trait PanelTransform: Send + Sync {
    /// Returns the name of this stage, used in logs.
    fn name(&self) -> &str;

    /// Transforms the panel.
    ///
    /// # Errors
    ///
    /// Returns an error if required columns are missing, a period value
    /// cannot be parsed, or the underlying frame operations fail. No partial
    /// output is produced on failure.
    fn transform(&self, panel: &PanelFrame) -> Result<PanelFrame>;

    /// Returns the columns that must be present in the input.
    fn required_columns(&self) -> Vec<&str>;

    /// Checks the input for the required columns.
    fn validate(&self, panel: &PanelFrame) -> Result<()> {
        panel.require_columns(&self.required_columns())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PanelError;
    use polars::prelude::*;

    struct DropFirstRow;

    impl PanelTransform for DropFirstRow {
        fn name(&self) -> &str {
            "drop_first_row"
        }

        fn transform(&self, panel: &PanelFrame) -> Result<PanelFrame> {
            self.validate(panel)?;
            let height = panel.len();
            Ok(PanelFrame::new(panel.data().slice(1, height.saturating_sub(1))))
        }

        fn required_columns(&self) -> Vec<&str> {
            vec!["id"]
        }
    }

    #[test]
    fn test_transform_runs() {
        let panel = PanelFrame::new(df! { "id" => &[1, 2, 3] }.unwrap());
        let out = DropFirstRow.transform(&panel).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(DropFirstRow.name(), "drop_first_row");
    }

    #[test]
    fn test_validate_reports_missing_column() {
        let panel = PanelFrame::new(df! { "other" => &[1] }.unwrap());
        let err = DropFirstRow.transform(&panel).unwrap_err();
        assert!(matches!(err, PanelError::MissingColumn(ref c) if c == "id"));
    }

    #[test]
    fn test_transform_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Box<dyn PanelTransform>>();
    }
}
