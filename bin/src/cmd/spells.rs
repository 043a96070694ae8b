//! Spell segmentation command implementation.

use anyhow::Result;
use clap::Args;
use pdpanel_spells::{BehaviorPdBuilder, BehaviorPdConfig};
use pdpanel_traits::{Frequency, PanelTransform};
use tracing::info;

use super::{CensoringArg, EncodingArg};
use crate::data::{IoArgs, read_panel, write_panel};

/// Arguments of `pdpanel spells`.
#[derive(Debug, Args)]
pub(crate) struct SpellsArgs {
    #[command(flatten)]
    pub(crate) io: IoArgs,

    /// Entity identifier column
    #[arg(long, default_value = "ID")]
    pub(crate) id_col: String,

    /// Period reference column
    #[arg(long, default_value = "ref")]
    pub(crate) ref_col: String,

    /// Default flag column (0 = performing)
    #[arg(long, default_value = "bad")]
    pub(crate) default_col: String,

    /// Target column to place after the spell columns
    #[arg(long)]
    pub(crate) target_col: Option<String>,

    /// Consecutive performing periods that define a cure (0 disables)
    #[arg(long, default_value = "3", allow_negative_numbers = true)]
    pub(crate) cure_gap: i64,

    /// Base frequency: M, Q, Y or D
    #[arg(long, default_value = "M")]
    pub(crate) freq: Frequency,

    /// Encoding of the period column
    #[arg(long, value_enum, default_value_t)]
    pub(crate) encoding: EncodingArg,

    /// How a spell is judged censored
    #[arg(long, value_enum, default_value_t)]
    pub(crate) censoring: CensoringArg,
}

impl SpellsArgs {
    fn config(&self) -> BehaviorPdConfig {
        BehaviorPdConfig {
            target_col: self.target_col.clone(),
            cure_gap: self.cure_gap,
            freq: self.freq,
            encoding: self.encoding.into(),
            censoring: self.censoring.into(),
            ..BehaviorPdConfig::new(&self.id_col, &self.ref_col, &self.default_col)
        }
    }
}

/// Build the behaviour PD population of the input panel.
pub(crate) fn run(args: SpellsArgs) -> Result<()> {
    let builder = BehaviorPdBuilder::new(args.config())?;
    let panel = read_panel(&args.io.input)?;

    let population = builder.transform(&panel)?;
    info!(
        input_rows = panel.len(),
        kept_rows = population.len(),
        "built behaviour PD population"
    );

    write_panel(population, args.io.output.as_deref())
}
