//! CLI subcommand modules.
//!
//! This module contains the implementations for all pdpanel CLI subcommands.

use clap::ValueEnum;
use pdpanel_spells::CensoringRule;
use pdpanel_traits::PeriodEncoding;

pub(crate) mod list;
pub(crate) mod spells;
pub(crate) mod targets;
pub(crate) mod weights;

/// Period column encoding as accepted on the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum EncodingArg {
    /// Infer from the column dtype
    #[default]
    Auto,
    /// `YYYYMM` integers or strings
    YearMonth,
    /// Pre-normalized period ordinals
    Ordinal,
}

impl From<EncodingArg> for PeriodEncoding {
    fn from(arg: EncodingArg) -> Self {
        match arg {
            EncodingArg::Auto => Self::Auto,
            EncodingArg::YearMonth => Self::YearMonth,
            EncodingArg::Ordinal => Self::Ordinal,
        }
    }
}

/// Censoring rule as accepted on the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum CensoringArg {
    /// A default right after the spell marks it uncensored
    #[default]
    FollowingDefault,
    /// Only a default inside the spell marks it uncensored
    WithinSpell,
}

impl From<CensoringArg> for CensoringRule {
    fn from(arg: CensoringArg) -> Self {
        match arg {
            CensoringArg::FollowingDefault => Self::FollowingDefault,
            CensoringArg::WithinSpell => Self::WithinSpell,
        }
    }
}
