//! Sample weighting command implementation.

use anyhow::{Context, Result};
use clap::Args;
use pdpanel_traits::PanelFrame;
use pdpanel_weights::{SAMPLE_WEIGHT_COL, SampleWeighter, WeighterConfig};
use polars::prelude::*;
use std::fs;
use tracing::info;

use crate::data::{IoArgs, read_panel, write_panel};

/// Arguments of `pdpanel weights`.
#[derive(Debug, Args)]
pub(crate) struct WeightsArgs {
    #[command(flatten)]
    pub(crate) io: IoArgs,

    /// Identifier columns, reported in logs only
    #[arg(long, value_delimiter = ',')]
    pub(crate) id_cols: Vec<String>,

    /// Reference date column; its month is the row's vintage
    #[arg(long, default_value = "date")]
    pub(crate) date_col: String,

    /// Binary target column
    #[arg(long, default_value = "target")]
    pub(crate) target_col: String,

    /// Strategy configuration as JSON, or `@path` to a JSON file, e.g.
    /// `{"balanced": {}, "recency_decay": {"half_life": 12}}`
    #[arg(short, long)]
    pub(crate) strategies: Option<String>,

    /// Quantile at which weights are capped
    #[arg(long, default_value = "0.95", conflicts_with = "no_cap")]
    pub(crate) cap: f64,

    /// Do not cap weights
    #[arg(long)]
    pub(crate) no_cap: bool,

    /// Keep the raw scale instead of rescaling to mean one
    #[arg(long)]
    pub(crate) no_normalise: bool,

    /// Print the weight audit as JSON instead of writing the panel
    #[arg(long)]
    pub(crate) audit: bool,
}

impl WeightsArgs {
    fn config(&self) -> Result<WeighterConfig> {
        let mut config = WeighterConfig::new(&self.date_col, &self.target_col);
        if let Some(strategies) = &self.strategies {
            config = config.with_strategies_json(&strategy_document(strategies)?)?;
        }
        config.id_cols = self.id_cols.clone();
        config.cap = (!self.no_cap).then_some(self.cap);
        config.normalise = !self.no_normalise;
        Ok(config)
    }
}

/// Inline JSON, or the contents of the file named after a leading `@`.
fn strategy_document(value: &str) -> Result<String> {
    match value.strip_prefix('@') {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read strategy file {path}")),
        None => Ok(value.to_string()),
    }
}

/// Weight the input panel and write it with a `sample_weight` column.
pub(crate) fn run(args: WeightsArgs) -> Result<()> {
    let mut weighter = SampleWeighter::new(args.config()?)?;
    let panel = read_panel(&args.io.input)?;

    let weights = weighter.fit_transform(&panel)?;
    let report = weighter.audit_report(&weights);
    info!(
        rows = weights.len(),
        mean = report.mean,
        ks_pvalue = report.ks_pvalue,
        "computed sample weights"
    );

    if args.audit {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let mut df = panel.into_inner();
    df.with_column(Series::new(SAMPLE_WEIGHT_COL.into(), weights.to_vec()))?;
    write_panel(PanelFrame::new(df), args.io.output.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdpanel_weights::StrategyKind;

    fn args() -> WeightsArgs {
        WeightsArgs {
            io: IoArgs {
                input: "panel.csv".into(),
                output: None,
            },
            id_cols: vec!["ID".to_string()],
            date_col: "ref".to_string(),
            target_col: "bad".to_string(),
            strategies: None,
            cap: 0.9,
            no_cap: false,
            no_normalise: false,
            audit: false,
        }
    }

    #[test]
    fn test_default_config() {
        let config = args().config().unwrap();
        assert_eq!(config.date_col, "ref");
        assert_eq!(config.target_col, "bad");
        assert_eq!(config.id_cols, vec!["ID"]);
        assert_eq!(config.cap, Some(0.9));
        assert!(config.normalise);
    }

    #[test]
    fn test_inline_strategies() {
        let mut args = args();
        args.strategies =
            Some(r#"{"recency_decay": {"half_life": 3}, "balanced": {}}"#.to_string());
        args.no_cap = true;
        args.no_normalise = true;

        let config = args.config().unwrap();
        let kinds: Vec<StrategyKind> = config.plan().iter().map(|s| s.kind()).collect();
        assert_eq!(kinds, vec![StrategyKind::RecencyDecay, StrategyKind::Balanced]);
        assert_eq!(config.cap, None);
        assert!(!config.normalise);
    }

    #[test]
    fn test_strategy_file() {
        let path = std::env::temp_dir()
            .join(format!("pdpanel-strategies-{}.json", std::process::id()));
        fs::write(&path, r#"{"equal_vintage": {}}"#).unwrap();

        let mut args = args();
        args.strategies = Some(format!("@{}", path.display()));
        let config = args.config().unwrap();
        assert_eq!(config.plan().len(), 1);
        assert_eq!(config.plan()[0].kind(), StrategyKind::EqualVintage);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_unknown_strategy() {
        let mut args = args();
        args.strategies = Some(r#"{"magic": {}}"#.to_string());
        assert!(args.config().is_err());
    }
}
