//! The sample weighter: fit statistics, compose strategies, post-process.

use ndarray::Array1;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use pdpanel_traits::stats::quantile;
use pdpanel_traits::{PanelError, PanelFrame, PanelTransform, Result};

use crate::audit::AuditReport;
use crate::balanced::BalancedConfig;
use crate::equal_vintage::EqualVintageConfig;
use crate::stats::{WeightContext, WeightStats};
use crate::strategy::{StrategyConfig, StrategyKind};

/// Name of the weight column produced by [`SampleWeighter::transform_series`].
pub const SAMPLE_WEIGHT_COL: &str = "sample_weight";

/// Meta-key of a JSON strategy document holding the application order.
pub const COMBO_KEY: &str = "combo";

/// Configuration for [`SampleWeighter`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeighterConfig {
    /// Identifier columns, carried for logging only
    pub id_cols: Vec<String>,
    /// Reference date column; its calendar month is the row's vintage
    pub date_col: String,
    /// Binary target column (`1` = event)
    pub target_col: String,
    /// Configured strategies, applied in this order unless `combo_order` is set
    pub strategies: Vec<StrategyConfig>,
    /// Explicit application order; strategies missing from `strategies` run
    /// with default parameters
    pub combo_order: Option<Vec<StrategyKind>>,
    /// Rescale the final weights to mean one (default: true)
    pub normalise: bool,
    /// Cap weights at this quantile of their distribution, `0 < cap <= 1`
    /// (default: 0.95)
    pub cap: Option<f64>,
}

impl Default for WeighterConfig {
    fn default() -> Self {
        Self {
            id_cols: Vec::new(),
            date_col: "date".to_string(),
            target_col: "target".to_string(),
            strategies: vec![
                StrategyConfig::Balanced(BalancedConfig::default()),
                StrategyConfig::EqualVintage(EqualVintageConfig::default()),
            ],
            combo_order: None,
            normalise: true,
            cap: Some(0.95),
        }
    }
}

impl WeighterConfig {
    /// Configuration with the given columns and default strategies.
    pub fn new(date_col: impl Into<String>, target_col: impl Into<String>) -> Self {
        Self {
            date_col: date_col.into(),
            target_col: target_col.into(),
            ..Self::default()
        }
    }

    /// Replace the configured strategies.
    pub fn with_strategies(
        mut self,
        strategies: impl IntoIterator<Item = StrategyConfig>,
    ) -> Self {
        self.strategies = strategies.into_iter().collect();
        self
    }

    /// Set the application order.
    pub fn with_combo(mut self, order: impl IntoIterator<Item = StrategyKind>) -> Self {
        self.combo_order = Some(order.into_iter().collect());
        self
    }

    /// Replace strategies (and combo order) from a JSON object such as
    /// `{"balanced": {}, "recency_decay": {"half_life": 6}, "combo": {"order": ["recency_decay"]}}`.
    ///
    /// Keys keep their document order.
    ///
    /// # Errors
    ///
    /// [`PanelError::Configuration`] for malformed JSON, unknown strategy
    /// names or invalid parameters.
    pub fn with_strategies_json(mut self, json: &str) -> Result<Self> {
        let document: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| PanelError::Configuration(format!("invalid strategy JSON: {e}")))?;
        let serde_json::Value::Object(entries) = document else {
            return Err(PanelError::Configuration(
                "strategy JSON must be an object keyed by strategy name".to_string(),
            ));
        };

        let mut strategies = Vec::new();
        let mut combo_order = None;
        for (name, params) in entries {
            if name == COMBO_KEY {
                combo_order = Some(parse_combo(&params)?);
            } else {
                strategies.push(StrategyConfig::from_json(&name, params)?);
            }
        }

        self.strategies = strategies;
        self.combo_order = combo_order;
        Ok(self)
    }

    /// Strategies in application order, with parameters resolved.
    pub fn plan(&self) -> Vec<StrategyConfig> {
        match &self.combo_order {
            Some(order) => order
                .iter()
                .map(|kind| {
                    self.strategies
                        .iter()
                        .find(|config| config.kind() == *kind)
                        .cloned()
                        .unwrap_or_else(|| StrategyConfig::default_for(*kind))
                })
                .collect(),
            None => self.strategies.clone(),
        }
    }
}

fn parse_combo(params: &serde_json::Value) -> Result<Vec<StrategyKind>> {
    let order = match params.get("order") {
        None | Some(serde_json::Value::Null) => return Ok(Vec::new()),
        Some(serde_json::Value::Array(order)) => order,
        Some(other) => {
            return Err(PanelError::Configuration(format!(
                "combo order must be a list of strategy names, got {other}"
            )));
        }
    };

    order
        .iter()
        .filter(|name| name.as_str() != Some(COMBO_KEY))
        .map(|name| {
            name.as_str()
                .ok_or_else(|| {
                    PanelError::Configuration(format!("combo entry {name} is not a string"))
                })?
                .parse()
        })
        .collect()
}

/// Computes `sample_weight` vectors for behaviour PD training sets.
///
/// Usage follows fit/transform: [`fit`](Self::fit) gathers event rates and
/// vintage sizes, [`transform`](Self::transform) multiplies the configured
/// strategies together, caps the result at a quantile and rescales it to
/// mean one.
///
/// # Example
///
/// ```no_run
/// use pdpanel_traits::PanelFrame;
/// use pdpanel_weights::{SampleWeighter, WeighterConfig};
/// use polars::prelude::*;
///
/// let panel = PanelFrame::new(df! {
///     "vintage" => &[202401, 202401, 202402],
///     "bad" => &[1, 0, 0],
/// }?);
///
/// let mut weighter = SampleWeighter::new(WeighterConfig::new("vintage", "bad"))?;
/// let weights = weighter.fit_transform(&panel)?;
/// assert_eq!(weights.len(), 3);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct SampleWeighter {
    config: WeighterConfig,
    plan: Vec<StrategyConfig>,
    stats: Option<WeightStats>,
}

impl SampleWeighter {
    /// Create a weighter, validating the configuration.
    ///
    /// # Errors
    ///
    /// [`PanelError::Configuration`] for a cap outside `(0, 1]`, a strategy
    /// configured twice or invalid strategy parameters.
    pub fn new(config: WeighterConfig) -> Result<Self> {
        if let Some(cap) = config
            .cap
            .filter(|cap| cap.is_nan() || *cap <= 0.0 || *cap > 1.0)
        {
            return Err(PanelError::Configuration(format!(
                "cap must be in (0, 1], got {cap}"
            )));
        }

        for (i, strategy) in config.strategies.iter().enumerate() {
            if config.strategies[..i]
                .iter()
                .any(|other| other.kind() == strategy.kind())
            {
                return Err(PanelError::Configuration(format!(
                    "strategy {} configured more than once",
                    strategy.kind()
                )));
            }
        }

        let plan = config.plan();
        for strategy in &plan {
            strategy.validate()?;
        }

        Ok(Self {
            config,
            plan,
            stats: None,
        })
    }

    /// The weighter's configuration.
    pub const fn config(&self) -> &WeighterConfig {
        &self.config
    }

    /// Statistics from the last [`fit`](Self::fit), if any.
    pub const fn stats(&self) -> Option<&WeightStats> {
        self.stats.as_ref()
    }

    /// Whether [`fit`](Self::fit) has been called.
    pub const fn is_fitted(&self) -> bool {
        self.stats.is_some()
    }

    /// Gather the dataset-level statistics the strategies need.
    ///
    /// # Errors
    ///
    /// Fails if the date or target column is absent or unparseable, or the
    /// frame is empty.
    pub fn fit(&mut self, panel: &PanelFrame) -> Result<&mut Self> {
        let ctx = self.context(panel)?;
        let recency_lambda = self.plan.iter().find_map(|strategy| match strategy {
            StrategyConfig::RecencyDecay(config) => Some(config.lambda()),
            _ => None,
        });

        let stats = WeightStats::fit(&ctx, recency_lambda)?;
        debug!(
            rows = stats.n_obs,
            vintages = stats.n_vintages(),
            global_er = stats.global_er,
            "fitted sample weighter"
        );
        for (vintage, rate) in &stats.vintage_er {
            if *rate == 0.0 {
                warn!(%vintage, "vintage has no events");
            }
        }

        self.stats = Some(stats);
        Ok(self)
    }

    /// Weight every row of `panel`.
    ///
    /// # Errors
    ///
    /// [`PanelError::NotFitted`] before [`fit`](Self::fit); otherwise any
    /// strategy failure, or [`PanelError::InvalidData`] when the weights
    /// cannot be normalised.
    pub fn transform(&self, panel: &PanelFrame) -> Result<Array1<f64>> {
        let stats = self.stats.as_ref().ok_or_else(|| {
            PanelError::NotFitted("sample weighter used before fit".to_string())
        })?;
        let ctx = self.context(panel)?;

        let mut weights = Array1::<f64>::ones(ctx.len());
        for config in &self.plan {
            let strategy = config.strategy();
            let part = strategy.weights(&ctx, stats)?;
            debug!(
                strategy = strategy.name(),
                mean = part.mean().unwrap_or(f64::NAN),
                "applied weighting strategy"
            );
            weights *= &part;
        }

        if weights.is_empty() {
            return Ok(weights);
        }

        if let Some(cap) = self.config.cap {
            let limit = quantile(&weights.to_vec(), cap);
            weights.mapv_inplace(|w| w.min(limit));
        }

        if self.config.normalise {
            let mean = weights.mean().unwrap_or(0.0);
            if mean == 0.0 || !mean.is_finite() {
                return Err(PanelError::InvalidData(format!(
                    "cannot normalise weights with mean {mean}"
                )));
            }
            weights /= mean;
        }

        debug!(
            rows = weights.len(),
            id_cols = ?self.config.id_cols,
            strategies = self.plan.len(),
            "computed sample weights"
        );
        Ok(weights)
    }

    /// [`fit`](Self::fit) followed by [`transform`](Self::transform).
    ///
    /// # Errors
    ///
    /// See [`fit`](Self::fit) and [`transform`](Self::transform).
    pub fn fit_transform(&mut self, panel: &PanelFrame) -> Result<Array1<f64>> {
        self.fit(panel)?.transform(panel)
    }

    /// Weights as a series named `sample_weight`.
    ///
    /// # Errors
    ///
    /// See [`transform`](Self::transform).
    pub fn transform_series(&self, panel: &PanelFrame) -> Result<Series> {
        let weights = self.transform(panel)?;
        Ok(Series::new(SAMPLE_WEIGHT_COL.into(), weights.to_vec()))
    }

    /// Mean, KS p-value against all-ones and the configured cap.
    pub fn audit_report(&self, weights: &Array1<f64>) -> AuditReport {
        AuditReport::new(weights, self.config.cap)
    }

    fn context<'a>(&self, panel: &'a PanelFrame) -> Result<WeightContext<'a>> {
        WeightContext::new(panel, &self.config.date_col, &self.config.target_col)
    }
}

impl PanelTransform for SampleWeighter {
    fn name(&self) -> &str {
        "sample_weight"
    }

    /// Appends the `sample_weight` column. The weighter must be fitted.
    fn transform(&self, panel: &PanelFrame) -> Result<PanelFrame> {
        self.validate(panel)?;
        let series = self.transform_series(panel)?;
        let mut out = panel.data().clone();
        out.with_column(series)?;
        Ok(PanelFrame::new(out))
    }

    fn required_columns(&self) -> Vec<&str> {
        let mut columns = vec![self.config.date_col.as_str(), self.config.target_col.as_str()];
        for strategy in &self.plan {
            if let StrategyConfig::ExpectedLoss(config) = strategy {
                columns.extend(config.ead_col.as_deref());
                columns.extend(config.lgd_col.as_deref());
            }
        }
        columns
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expected_loss::ExpectedLossConfig;
    use crate::recency_decay::RecencyDecayConfig;
    use crate::stabilise_er::StabiliseErConfig;
    use approx::assert_relative_eq;

    /// 100 rows over two vintages (70/30) with 20 events, shuffled.
    fn simple_panel() -> PanelFrame {
        let mut vint = vec![202401i64; 70];
        vint.extend(vec![202402i64; 30]);
        let mut bad = vec![1i64; 20];
        bad.extend(vec![0i64; 80]);

        // Deterministic shuffle so vintage and target are not aligned
        let order: Vec<usize> = (0..100).map(|i| (i * 37) % 100).collect();
        let vint: Vec<i64> = order.iter().map(|i| vint[*i]).collect();
        let bad: Vec<i64> = order.iter().map(|i| bad[*i]).collect();

        PanelFrame::new(df! { "vint" => vint, "bad" => bad }.unwrap())
    }

    fn distinct(weights: &Array1<f64>, digits: i32) -> Vec<f64> {
        let scale = 10f64.powi(digits);
        let mut values: Vec<f64> = weights.iter().map(|w| (w * scale).round() / scale).collect();
        values.sort_by(|a, b| a.total_cmp(b));
        values.dedup();
        values
    }

    fn weighter(strategies: Vec<StrategyConfig>) -> SampleWeighter {
        SampleWeighter::new(WeighterConfig::new("vint", "bad").with_strategies(strategies))
            .unwrap()
    }

    #[test]
    fn test_balanced_weights() {
        let mut w = weighter(vec![StrategyConfig::Balanced(BalancedConfig::default())]);
        let weights = w.fit_transform(&simple_panel()).unwrap();

        assert_relative_eq!(weights.mean().unwrap(), 1.0, epsilon = 1e-12);
        assert_eq!(distinct(&weights, 3), vec![0.625, 2.5]);
    }

    #[test]
    fn test_equal_vintage() {
        let mut w = weighter(vec![StrategyConfig::EqualVintage(
            EqualVintageConfig::default(),
        )]);
        let weights = w.fit_transform(&simple_panel()).unwrap();

        assert_eq!(distinct(&weights, 4), vec![0.7143, 1.6667]);
        assert_relative_eq!(weights.mean().unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_combo_positive() {
        let json = r#"{
            "balanced": {},
            "equal_vintage": {},
            "stabilise_er": {"target_er": 0.18},
            "recency_decay": {"half_life": 6},
            "combo": {"order": ["balanced", "equal_vintage", "stabilise_er", "recency_decay"]}
        }"#;
        let config = WeighterConfig::new("vint", "bad")
            .with_strategies_json(json)
            .unwrap();
        let mut w = SampleWeighter::new(config).unwrap();
        let weights = w.fit_transform(&simple_panel()).unwrap();

        assert!(weights.iter().all(|x| *x > 0.0));
        assert_relative_eq!(weights.mean().unwrap(), 1.0, epsilon = 1e-12);
        assert_eq!(
            w.stats().unwrap().recency_lambda,
            Some(std::f64::consts::LN_2 / 6.0)
        );
    }

    #[test]
    fn test_expected_loss() {
        let panel = PanelFrame::new(
            df! {
                "vint" => &[202401i64, 202401, 202402, 202402],
                "bad" => &[1i64, 0, 1, 0],
                "ead" => &[100i64, 200, 150, 250],
                "lgd" => &[0.5, 0.6, 0.4, 0.7],
            }
            .unwrap(),
        );
        let config = WeighterConfig {
            cap: None,
            ..WeighterConfig::new("vint", "bad").with_strategies([StrategyConfig::ExpectedLoss(
                ExpectedLossConfig::new("ead").with_lgd("lgd"),
            )])
        };
        let weights = SampleWeighter::new(config)
            .unwrap()
            .fit_transform(&panel)
            .unwrap();

        let raw = [50.0, 120.0, 60.0, 175.0];
        let mean = raw.iter().sum::<f64>() / 4.0;
        assert_relative_eq!(weights.mean().unwrap(), 1.0, epsilon = 1e-12);
        for (weight, expected) in weights.iter().zip(raw) {
            assert_relative_eq!(*weight, expected / mean, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_cap_quantile() {
        let config = WeighterConfig {
            cap: Some(0.5),
            normalise: false,
            ..WeighterConfig::new("vint", "bad")
                .with_strategies([StrategyConfig::Balanced(BalancedConfig::default())])
        };
        let weights = SampleWeighter::new(config)
            .unwrap()
            .fit_transform(&simple_panel())
            .unwrap();

        // The median of the uncapped weights is 0.625
        assert!(weights.iter().all(|w| *w <= 0.625 + 1e-12));
    }

    #[test]
    fn test_cap_then_normalise_flattens() {
        let config = WeighterConfig {
            cap: Some(0.5),
            ..WeighterConfig::new("vint", "bad")
                .with_strategies([StrategyConfig::Balanced(BalancedConfig::default())])
        };
        let weights = SampleWeighter::new(config)
            .unwrap()
            .fit_transform(&simple_panel())
            .unwrap();
        assert!(weights.iter().all(|w| (*w - 1.0).abs() < 1e-12));
    }

    #[test]
    fn test_not_fitted() {
        let w = SampleWeighter::new(WeighterConfig::new("vint", "bad")).unwrap();
        let err = w.transform(&simple_panel()).unwrap_err();
        assert!(matches!(err, PanelError::NotFitted(_)));
        assert!(err.is_precondition());
        assert!(!w.is_fitted());
    }

    #[test]
    fn test_invalid_cap() {
        for cap in [0.0, 1.5, -0.1] {
            let config = WeighterConfig {
                cap: Some(cap),
                ..WeighterConfig::new("vint", "bad")
            };
            assert!(matches!(
                SampleWeighter::new(config),
                Err(PanelError::Configuration(_))
            ));
        }
    }

    #[test]
    fn test_unknown_strategy_in_json() {
        let err = WeighterConfig::new("vint", "bad")
            .with_strategies_json(r#"{"smote": {}}"#)
            .unwrap_err();
        assert!(matches!(err, PanelError::Configuration(_)));

        let err = WeighterConfig::new("vint", "bad")
            .with_strategies_json(r#"{"balanced": {}, "combo": {"order": ["smote"]}}"#)
            .unwrap_err();
        assert!(matches!(err, PanelError::Configuration(_)));
    }

    #[test]
    fn test_json_keeps_document_order() {
        let config = WeighterConfig::new("vint", "bad")
            .with_strategies_json(r#"{"stabilise_er": {}, "balanced": {}}"#)
            .unwrap();
        let kinds: Vec<StrategyKind> = config.plan().iter().map(StrategyConfig::kind).collect();
        assert_eq!(kinds, vec![StrategyKind::StabiliseEr, StrategyKind::Balanced]);
    }

    #[test]
    fn test_combo_defaults_missing_parameters() {
        let config = WeighterConfig::new("vint", "bad")
            .with_strategies([StrategyConfig::StabiliseEr(StabiliseErConfig {
                target_er: Some(0.1),
            })])
            .with_combo([StrategyKind::RecencyDecay, StrategyKind::StabiliseEr]);
        let plan = config.plan();
        assert_eq!(
            plan[0],
            StrategyConfig::RecencyDecay(RecencyDecayConfig::default())
        );
        assert_eq!(plan[1].kind(), StrategyKind::StabiliseEr);
    }

    #[test]
    fn test_combo_requiring_ead_fails_eagerly() {
        let config = WeighterConfig::new("vint", "bad").with_combo([StrategyKind::ExpectedLoss]);
        assert!(matches!(
            SampleWeighter::new(config),
            Err(PanelError::Configuration(_))
        ));
    }

    #[test]
    fn test_duplicate_strategy_rejected() {
        let config = WeighterConfig::new("vint", "bad").with_strategies([
            StrategyConfig::Balanced(BalancedConfig::default()),
            StrategyConfig::Balanced(BalancedConfig::default()),
        ]);
        assert!(SampleWeighter::new(config).is_err());
    }

    #[test]
    fn test_panel_transform_appends_column() {
        let panel = simple_panel();
        let mut w = SampleWeighter::new(WeighterConfig::new("vint", "bad")).unwrap();
        w.fit(&panel).unwrap();
        let out = PanelTransform::transform(&w, &panel).unwrap();

        assert!(out.has_column(SAMPLE_WEIGHT_COL));
        assert_eq!(out.len(), 100);
    }

    #[test]
    fn test_audit_report() {
        let panel = simple_panel();
        let mut w = weighter(vec![StrategyConfig::Balanced(BalancedConfig::default())]);
        let weights = w.fit_transform(&panel).unwrap();
        let report = w.audit_report(&weights);

        assert_relative_eq!(report.mean, 1.0, epsilon = 1e-12);
        assert!(report.ks_pvalue < 0.05);
        assert_eq!(report.cap, Some(0.95));
    }
}
