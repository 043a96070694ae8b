//! Behaviour PD panel construction.
//!
//! [`BehaviorPdBuilder`] turns a monthly (or other base-frequency) table of
//! default flags into the performing population of a behaviour PD model:
//! one row per performing period that belongs to a spell, with the spell id,
//! the elapsed time inside the spell and the spell's censoring flag.

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use pdpanel_traits::{
    Frequency, PanelError, PanelFrame, PanelTransform, PeriodEncoding, Result, normalize_column,
    partition_sorted, sort_by_entity_period,
};

use crate::segmenter::SpellSegmenter;

/// Output column holding `"{entity}_{spell}"`.
pub const SPELL_ID_COL: &str = "spell_id";
/// Output column holding the zero-based position inside the spell.
pub const MONTHS_ELAPSED_COL: &str = "months_elapsed";
/// Output column holding the spell's censoring flag.
pub const CENSORED_COL: &str = "censored";

/// How the per-spell censoring flag is derived.
///
/// The default, [`CensoringRule::FollowingDefault`], marks a spell that ends
/// in a default as observed, so `[0, 0, 1]` yields `censored = [0, 0]`.
/// Code expecting every kept row to be censored (`[1, 1]` for the same
/// history) should select [`CensoringRule::WithinSpell`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CensoringRule {
    /// `censored = 0` when a default row immediately follows the spell in the
    /// entity's history, `1` when the spell runs to the end of the history.
    #[default]
    FollowingDefault,
    /// `censored = 0` only when a default occurs inside the spell's own kept
    /// rows. Kept rows are performing, so every spell comes out censored.
    WithinSpell,
}

/// Configuration for [`BehaviorPdBuilder`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BehaviorPdConfig {
    /// Entity (contract) identifier column
    pub id_col: String,
    /// Period reference column (`YYYYMM` integers, strings, dates or datetimes)
    pub ref_col: String,
    /// Default flag column (`0` = performing)
    pub default_col: String,
    /// Already computed target column, placed after the spell columns
    pub target_col: Option<String>,
    /// Consecutive performing periods that define a cure (default: 3, `0` disables)
    pub cure_gap: i64,
    /// Base frequency of the panel (default: month)
    pub freq: Frequency,
    /// Encoding of the period column (default: inferred from dtype)
    pub encoding: PeriodEncoding,
    /// Censoring rule (default: a following default ends the spell uncensored)
    pub censoring: CensoringRule,
}

impl BehaviorPdConfig {
    /// Configuration with the given columns and default settings.
    pub fn new(
        id_col: impl Into<String>,
        ref_col: impl Into<String>,
        default_col: impl Into<String>,
    ) -> Self {
        Self {
            id_col: id_col.into(),
            ref_col: ref_col.into(),
            default_col: default_col.into(),
            ..Self::default()
        }
    }
}

impl Default for BehaviorPdConfig {
    fn default() -> Self {
        Self {
            id_col: "id".to_string(),
            ref_col: "ref".to_string(),
            default_col: "default".to_string(),
            target_col: None,
            cure_gap: 3,
            freq: Frequency::Month,
            encoding: PeriodEncoding::Auto,
            censoring: CensoringRule::FollowingDefault,
        }
    }
}

/// Builds the performing population of a behaviour PD panel.
///
/// # Example
///
/// ```no_run
/// use pdpanel_spells::{BehaviorPdBuilder, BehaviorPdConfig};
/// use pdpanel_traits::{PanelFrame, PanelTransform};
/// use polars::prelude::*;
///
/// let df = df! {
///     "contract" => &[1, 1, 1],
///     "ref" => &[202001, 202002, 202003],
///     "bad" => &[0, 0, 1],
/// }?;
///
/// let builder = BehaviorPdBuilder::new(BehaviorPdConfig::new("contract", "ref", "bad"))?;
/// let panel = builder.transform(&PanelFrame::new(df))?;
/// assert_eq!(panel.len(), 2);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct BehaviorPdBuilder {
    config: BehaviorPdConfig,
    segmenter: SpellSegmenter,
}

impl BehaviorPdBuilder {
    /// Create a builder, validating the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`PanelError::Configuration`] if `cure_gap` is negative.
    pub fn new(config: BehaviorPdConfig) -> Result<Self> {
        let cure_gap = usize::try_from(config.cure_gap).map_err(|_| {
            PanelError::Configuration(format!("cure_gap must be >= 0, got {}", config.cure_gap))
        })?;
        Ok(Self {
            segmenter: SpellSegmenter::new(cure_gap),
            config,
        })
    }

    /// The builder's configuration.
    pub const fn config(&self) -> &BehaviorPdConfig {
        &self.config
    }

    /// Output column order: the spell columns first, then every other input
    /// column in its original position.
    fn column_order(&self, columns: &[String]) -> Vec<String> {
        let mut front: Vec<String> = vec![
            self.config.id_col.clone(),
            SPELL_ID_COL.to_string(),
            self.config.ref_col.clone(),
            MONTHS_ELAPSED_COL.to_string(),
            CENSORED_COL.to_string(),
        ];
        if let Some(target) = &self.config.target_col {
            front.push(target.clone());
        }

        let mut order = Vec::with_capacity(columns.len() + 3);
        for name in front.into_iter().chain(columns.iter().cloned()) {
            if !order.contains(&name) {
                order.push(name);
            }
        }
        order
    }
}

impl PanelTransform for BehaviorPdBuilder {
    fn name(&self) -> &str {
        "behavior_pd"
    }

    fn transform(&self, panel: &PanelFrame) -> Result<PanelFrame> {
        self.validate(panel)?;
        let config = &self.config;
        let df = panel.data();

        let periods = normalize_column(df.column(&config.ref_col)?, config.freq, config.encoding)?;
        let (sorted, _) = sort_by_entity_period(df, &config.id_col, &periods, config.freq)?;
        let sorted = PanelFrame::new(sorted);

        let defaults = sorted.required_f64_values(&config.default_col)?;
        let performing: Vec<bool> = defaults.iter().map(|flag| *flag == 0.0).collect();
        let ids = sorted.string_values(&config.id_col)?;
        let entities = partition_sorted(&ids);

        let mut keep = vec![false; sorted.len()];
        let mut spell_ids = Vec::new();
        let mut elapsed = Vec::new();
        let mut censored = Vec::new();
        let mut n_spells = 0usize;

        for entity in &entities {
            let offset = entity.rows.start;
            let segmentation = self.segmenter.segment(&performing[entity.rows.clone()]);
            if segmentation.spells.is_empty() {
                warn!(entity = %entity.key, rows = entity.len(), "entity has no performing spell");
            }

            for spell in &segmentation.spells {
                let is_censored = match config.censoring {
                    CensoringRule::FollowingDefault => spell.is_censored(),
                    CensoringRule::WithinSpell => spell
                        .rows
                        .clone()
                        .all(|row| defaults[offset + row] == 0.0),
                };
                let spell_id = format!("{}_{}", entity.key, spell.seq);

                for (position, row) in spell.rows.clone().enumerate() {
                    keep[offset + row] = true;
                    spell_ids.push(spell_id.clone());
                    elapsed.push(position as i64);
                    censored.push(i32::from(is_censored));
                }
            }
            n_spells += segmentation.spells.len();
        }

        let mask: BooleanChunked = keep.into_iter().collect();
        let mut out = sorted.data().filter(&mask)?;
        out.with_column(Series::new(SPELL_ID_COL.into(), spell_ids))?;
        out.with_column(Series::new(MONTHS_ELAPSED_COL.into(), elapsed))?;
        out.with_column(Series::new(CENSORED_COL.into(), censored))?;

        let order = self.column_order(&panel.columns());
        let out = out.select(order)?;

        debug!(
            stage = self.name(),
            rows_in = panel.len(),
            rows_out = out.height(),
            entities = entities.len(),
            spells = n_spells,
            cure_gap = self.segmenter.cure_gap(),
            "built behaviour PD panel"
        );

        Ok(PanelFrame::new(out))
    }

    fn required_columns(&self) -> Vec<&str> {
        let mut columns = vec![
            self.config.id_col.as_str(),
            self.config.ref_col.as_str(),
            self.config.default_col.as_str(),
        ];
        if let Some(target) = &self.config.target_col {
            columns.push(target.as_str());
        }
        columns
    }
}
