//! Sequential composition of panel stages.

use std::fmt;

use tracing::debug;

use pdpanel_traits::{PanelFrame, PanelTransform, Result};

/// An ordered chain of [`PanelTransform`] stages.
///
/// Each stage receives the previous stage's output. A failing stage aborts
/// the run and no partial output is returned.
#[derive(Default)]
pub struct Pipeline {
    stages: Vec<Box<dyn PanelTransform>>,
}

impl Pipeline {
    /// Empty pipeline.
    pub const fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// Append a stage.
    pub fn with_stage(mut self, stage: impl PanelTransform + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Append a boxed stage.
    pub fn push(&mut self, stage: Box<dyn PanelTransform>) {
        self.stages.push(stage);
    }

    /// Stage names in execution order.
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    /// Number of stages.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Whether the pipeline has no stages.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Run every stage in order.
    ///
    /// # Errors
    ///
    /// Returns the first stage error.
    pub fn run(&self, panel: &PanelFrame) -> Result<PanelFrame> {
        let mut current = panel.clone();
        for stage in &self.stages {
            let rows_in = current.len();
            current = stage.transform(&current)?;
            debug!(
                stage = stage.name(),
                rows_in,
                rows_out = current.len(),
                "stage done"
            );
        }
        Ok(current)
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stage_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdpanel_traits::PanelError;
    use polars::prelude::*;

    struct DropFirst;

    impl PanelTransform for DropFirst {
        fn name(&self) -> &str {
            "drop_first"
        }

        fn transform(&self, panel: &PanelFrame) -> Result<PanelFrame> {
            let n = panel.len();
            Ok(PanelFrame::new(panel.data().slice(1, n.saturating_sub(1))))
        }

        fn required_columns(&self) -> Vec<&str> {
            vec![]
        }
    }

    struct Fails;

    impl PanelTransform for Fails {
        fn name(&self) -> &str {
            "fails"
        }

        fn transform(&self, _panel: &PanelFrame) -> Result<PanelFrame> {
            Err(PanelError::InvalidData("boom".to_string()))
        }

        fn required_columns(&self) -> Vec<&str> {
            vec![]
        }
    }

    fn panel() -> PanelFrame {
        PanelFrame::new(df! { "x" => &[1i64, 2, 3] }.unwrap())
    }

    #[test]
    fn test_stages_run_in_order() {
        let pipeline = Pipeline::new().with_stage(DropFirst).with_stage(DropFirst);
        assert_eq!(pipeline.stage_names(), vec!["drop_first", "drop_first"]);
        assert_eq!(pipeline.run(&panel()).unwrap().len(), 1);
    }

    #[test]
    fn test_empty_pipeline_is_identity() {
        let pipeline = Pipeline::new();
        assert!(pipeline.is_empty());
        assert_eq!(pipeline.run(&panel()).unwrap().len(), 3);
    }

    #[test]
    fn test_failure_aborts() {
        let pipeline = Pipeline::new().with_stage(Fails).with_stage(DropFirst);
        assert!(pipeline.run(&panel()).is_err());
        assert_eq!(
            format!("{pipeline:?}"),
            r#"Pipeline { stages: ["fails", "drop_first"] }"#
        );
    }
}
