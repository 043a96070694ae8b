//! Target labelling command implementation.

use anyhow::{Context, Result};
use clap::Args;
use pdpanel_targets::{TargetBuilder, TargetBuilderConfig, TargetDefinition, TargetRegistry};
use pdpanel_traits::{Frequency, PanelTransform};
use tracing::info;

use super::EncodingArg;
use crate::data::{IoArgs, read_panel, write_panel};

/// Arguments of `pdpanel targets`.
#[derive(Debug, Args)]
pub(crate) struct TargetsArgs {
    #[command(flatten)]
    pub(crate) io: IoArgs,

    /// Entity identifier column
    #[arg(long, default_value = "ID")]
    pub(crate) id_col: String,

    /// Period reference column
    #[arg(long, default_value = "date")]
    pub(crate) date_col: String,

    /// Days-past-due column
    #[arg(long, default_value = "dpd")]
    pub(crate) dpd_col: String,

    /// Base frequency: M, Q, Y or D
    #[arg(long, default_value = "M")]
    pub(crate) freq: Frequency,

    /// Encoding of the period column
    #[arg(long, value_enum, default_value_t)]
    pub(crate) encoding: EncodingArg,

    /// Targets to build, e.g. EVER90M12,OVER30M6 (default: the registry)
    #[arg(short, long, value_delimiter = ',')]
    pub(crate) targets: Vec<String>,

    /// Registry replacing the defaults, as a JSON object of
    /// `{"NAME": {"direction": "ever", "threshold": 90, "horizon": 12}}`
    #[arg(long)]
    pub(crate) mapping: Option<String>,

    /// Write each period's first day in place of the raw period values
    #[arg(long)]
    pub(crate) normalize_dates: bool,
}

impl TargetsArgs {
    fn config(&self) -> Result<TargetBuilderConfig> {
        let mapping = self.mapping.as_deref().map(parse_mapping).transpose()?;
        Ok(TargetBuilderConfig {
            dpd_col: self.dpd_col.clone(),
            freq: self.freq,
            encoding: self.encoding.into(),
            mapping,
            targets: (!self.targets.is_empty()).then(|| self.targets.clone()),
            normalize_dates: self.normalize_dates,
            ..TargetBuilderConfig::new(&self.id_col, &self.date_col)
        })
    }
}

/// Parse a JSON target mapping, keeping the document's entry order.
fn parse_mapping(json: &str) -> Result<TargetRegistry> {
    let document: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(json).context("target mapping must be a JSON object")?;

    document
        .into_iter()
        .map(|(name, value)| -> Result<(String, TargetDefinition)> {
            let definition: TargetDefinition = serde_json::from_value(value)
                .with_context(|| format!("invalid definition for target {name}"))?;
            Ok((name, definition))
        })
        .collect()
}

/// Append the requested target columns to the input panel.
pub(crate) fn run(args: TargetsArgs) -> Result<()> {
    let builder = TargetBuilder::new(args.config()?)?;
    let panel = read_panel(&args.io.input)?;

    let labelled = builder.transform(&panel)?;
    info!(
        rows = labelled.len(),
        targets = ?builder.registry().names(),
        "built targets"
    );

    write_panel(labelled, args.io.output.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdpanel_targets::Direction;

    #[test]
    fn test_parse_mapping_keeps_order() {
        let registry = parse_mapping(
            r#"{
                "LATE": {"direction": "over", "threshold": 30, "horizon": 3},
                "BAD": {"direction": "ever", "threshold": 90, "horizon": 12}
            }"#,
        )
        .unwrap();

        assert_eq!(registry.names(), vec!["LATE", "BAD"]);
        assert_eq!(
            registry.get("BAD"),
            Some(&TargetDefinition::new(Direction::Ever, 90, 12))
        );
    }

    #[test]
    fn test_parse_mapping_rejects_bad_definition() {
        let err = parse_mapping(r#"{"BAD": {"direction": "sometimes"}}"#).unwrap_err();
        assert!(err.to_string().contains("BAD"));
        assert!(parse_mapping("[1, 2]").is_err());
    }

    #[test]
    fn test_empty_target_list_means_all() {
        let args = TargetsArgs {
            io: IoArgs {
                input: "panel.csv".into(),
                output: None,
            },
            id_col: "ID".to_string(),
            date_col: "date".to_string(),
            dpd_col: "dpd".to_string(),
            freq: Frequency::Month,
            encoding: EncodingArg::Auto,
            targets: Vec::new(),
            mapping: None,
            normalize_dates: true,
        };
        let config = args.config().unwrap();
        assert!(config.targets.is_none());
        assert!(config.mapping.is_none());
        assert!(config.normalize_dates);
    }
}
