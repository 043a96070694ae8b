//! Target construction over an entity-period panel.

use std::collections::HashMap;

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use pdpanel_traits::{
    EntityPartition, Frequency, PanelError, PanelFrame, PanelTransform, PeriodEncoding, Result,
    normalize_column, partition_sorted, sort_by_entity_period,
};

use crate::registry::{TargetDefinition, TargetRegistry};
use crate::window::window_labels;

/// Configuration for [`TargetBuilder`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetBuilderConfig {
    /// Entity identifier column
    pub id_col: String,
    /// Period reference column
    pub date_col: String,
    /// Days-past-due column (nulls count as not exceeding any threshold)
    pub dpd_col: String,
    /// Base frequency of the panel (default: month)
    pub freq: Frequency,
    /// Encoding of the period column (default: inferred from dtype)
    pub encoding: PeriodEncoding,
    /// Replaces the default registry when set
    pub mapping: Option<TargetRegistry>,
    /// Targets to build (default: every entry of the registry)
    pub targets: Option<Vec<String>>,
    /// Replace the period column with each period's start date (default: keep
    /// the raw values)
    #[serde(default)]
    pub normalize_dates: bool,
}

impl TargetBuilderConfig {
    /// Configuration with the given columns and the default targets.
    pub fn new(id_col: impl Into<String>, date_col: impl Into<String>) -> Self {
        Self {
            id_col: id_col.into(),
            date_col: date_col.into(),
            ..Self::default()
        }
    }

    /// Restrict the output to the named targets.
    pub fn with_targets<S: Into<String>>(mut self, targets: impl IntoIterator<Item = S>) -> Self {
        self.targets = Some(targets.into_iter().map(Into::into).collect());
        self
    }
}

impl Default for TargetBuilderConfig {
    fn default() -> Self {
        Self {
            id_col: "id".to_string(),
            date_col: "date".to_string(),
            dpd_col: "dpd".to_string(),
            freq: Frequency::Month,
            encoding: PeriodEncoding::Auto,
            mapping: None,
            targets: None,
            normalize_dates: false,
        }
    }
}

/// Label every entity's rows independently and concatenate in row order.
fn entity_labels(
    definition: &TargetDefinition,
    indicator: &[bool],
    entities: &[EntityPartition],
) -> Vec<i8> {
    let mut labels = Vec::with_capacity(indicator.len());
    for entity in entities {
        labels.extend(window_labels(
            &indicator[entity.rows.clone()],
            definition.direction,
            definition.horizon,
        ));
    }
    labels
}

/// Adds one `i8` column per EVER/OVER target.
///
/// Rows are returned sorted by entity and period. The period column keeps its
/// original values unless `normalize_dates` is set, in which case it holds
/// the first day of each period as a `Date`.
///
/// # Example
///
/// ```no_run
/// use pdpanel_targets::{TargetBuilder, TargetBuilderConfig};
/// use pdpanel_traits::{PanelFrame, PanelTransform};
/// use polars::prelude::*;
///
/// let df = df! {
///     "id" => &[1, 1, 1],
///     "date" => &[202001, 202002, 202003],
///     "dpd" => &[0, 45, 0],
/// }?;
///
/// let config = TargetBuilderConfig::new("id", "date").with_targets(["EVER30M4"]);
/// let labelled = TargetBuilder::new(config)?.transform(&PanelFrame::new(df))?;
/// assert!(labelled.has_column("EVER30M4"));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct TargetBuilder {
    config: TargetBuilderConfig,
    registry: TargetRegistry,
}

impl TargetBuilder {
    /// Resolve the requested targets against the registry.
    ///
    /// # Errors
    ///
    /// [`PanelError::Parse`] for a name that is neither registered nor
    /// parseable, [`PanelError::Configuration`] for a horizon that does not
    /// fit the base frequency or an empty target set.
    pub fn new(config: TargetBuilderConfig) -> Result<Self> {
        let registry = config
            .mapping
            .clone()
            .unwrap_or_else(TargetRegistry::defaults);
        let registry = match &config.targets {
            Some(targets) => registry.select(targets, config.freq)?,
            None => registry,
        };

        if registry.is_empty() {
            return Err(PanelError::Configuration(
                "no targets selected for construction".to_string(),
            ));
        }
        if let Some((name, _)) = registry.iter().find(|(_, def)| def.horizon == 0) {
            return Err(PanelError::Configuration(format!(
                "horizon of {name} must be positive"
            )));
        }

        Ok(Self { config, registry })
    }

    /// The resolved targets, in output order.
    pub const fn registry(&self) -> &TargetRegistry {
        &self.registry
    }

    /// The builder's configuration.
    pub const fn config(&self) -> &TargetBuilderConfig {
        &self.config
    }
}

impl PanelTransform for TargetBuilder {
    fn name(&self) -> &str {
        "targets"
    }

    fn transform(&self, panel: &PanelFrame) -> Result<PanelFrame> {
        self.validate(panel)?;
        let config = &self.config;

        let periods = normalize_column(
            panel.data().column(&config.date_col)?,
            config.freq,
            config.encoding,
        )?;
        let (mut sorted, sorted_periods) =
            sort_by_entity_period(panel.data(), &config.id_col, &periods, config.freq)?;
        if config.normalize_dates {
            let dates: Vec<_> = sorted_periods.iter().map(|p| p.start_date()).collect();
            sorted.with_column(Series::new(config.date_col.as_str().into(), dates))?;
        }
        let sorted = PanelFrame::new(sorted);

        let dpd = sorted.f64_values(&config.dpd_col)?;
        let ids = sorted.string_values(&config.id_col)?;
        let entities = partition_sorted(&ids);

        // One indicator per distinct threshold
        let indicators: HashMap<i64, Vec<bool>> = self
            .registry
            .thresholds()
            .into_iter()
            .map(|threshold| {
                let limit = threshold as f64;
                let flags = dpd
                    .iter()
                    .map(|value| value.is_some_and(|v| v >= limit))
                    .collect();
                (threshold, flags)
            })
            .collect();

        let mut out = sorted.into_inner();
        for (name, definition) in self.registry.iter() {
            let indicator = indicators.get(&definition.threshold).ok_or_else(|| {
                PanelError::Other(format!("no indicator for threshold {}", definition.threshold))
            })?;
            let labels = entity_labels(definition, indicator, &entities);
            out.with_column(Series::new(name.into(), labels))?;
        }

        debug!(
            stage = self.name(),
            rows = out.height(),
            entities = entities.len(),
            targets = self.registry.len(),
            thresholds = indicators.len(),
            "built targets"
        );

        Ok(PanelFrame::new(out))
    }

    fn required_columns(&self) -> Vec<&str> {
        vec![
            self.config.id_col.as_str(),
            self.config.date_col.as_str(),
            self.config.dpd_col.as_str(),
        ]
    }
}
