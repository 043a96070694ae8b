//! Common types used throughout the pdpanel workspace.
//!
//! This module defines the base period frequency, the canonical discrete
//! [`Period`], and [`PanelFrame`], the tabular container every panel stage
//! consumes and produces.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{PanelError, Result};

// Re-export date type from chrono
pub use chrono::NaiveDate as Date;

/// Days between 0001-01-01 (CE day 1) and the Unix epoch.
pub(crate) const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Base frequency of a panel.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Frequency {
    /// Calendar day
    #[serde(rename = "D")]
    Day,
    /// Calendar month
    #[default]
    #[serde(rename = "M")]
    Month,
    /// Calendar quarter
    #[serde(rename = "Q")]
    Quarter,
    /// Calendar year
    #[serde(rename = "Y")]
    Year,
}

impl Frequency {
    /// All supported frequencies.
    pub const ALL: [Self; 4] = [Self::Day, Self::Month, Self::Quarter, Self::Year];

    /// Month-equivalent of one period.
    ///
    /// A day counts as one month, matching the unit table used by target names.
    pub const fn months(&self) -> u32 {
        match self {
            Self::Day | Self::Month => 1,
            Self::Quarter => 3,
            Self::Year => 12,
        }
    }

    /// Single-letter code (`D`, `M`, `Q`, `Y`).
    pub const fn code(&self) -> char {
        match self {
            Self::Day => 'D',
            Self::Month => 'M',
            Self::Quarter => 'Q',
            Self::Year => 'Y',
        }
    }

    /// Floor a calendar date to the period containing it.
    pub fn floor(&self, date: NaiveDate) -> Period {
        let years = i64::from(date.year()) - 1970;
        let month0 = i64::from(date.month0());
        let ordinal = match self {
            Self::Day => i64::from(date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE),
            Self::Month => years * 12 + month0,
            Self::Quarter => years * 4 + month0 / 3,
            Self::Year => years,
        };
        Period::new(*self, ordinal)
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Frequency {
    type Err = PanelError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "D" => Ok(Self::Day),
            "M" => Ok(Self::Month),
            "Q" => Ok(Self::Quarter),
            "Y" => Ok(Self::Year),
            other => Err(PanelError::Configuration(format!(
                "unsupported frequency {other:?}; use M, Q, Y or D"
            ))),
        }
    }
}

/// A canonical discrete period.
///
/// The ordinal counts periods since the Unix epoch (1970-01-01, 1970-01,
/// 1970Q1 or 1970 depending on the frequency), so periods of the same
/// frequency are totally ordered and their difference is a period count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Period {
    freq: Frequency,
    ordinal: i64,
}

impl Period {
    /// Create a period from its ordinal.
    pub const fn new(freq: Frequency, ordinal: i64) -> Self {
        Self { freq, ordinal }
    }

    /// The period's frequency.
    pub const fn freq(&self) -> Frequency {
        self.freq
    }

    /// Periods elapsed since the epoch period.
    pub const fn ordinal(&self) -> i64 {
        self.ordinal
    }

    /// The next period.
    #[must_use]
    pub const fn succ(&self) -> Self {
        Self::new(self.freq, self.ordinal + 1)
    }

    /// The previous period.
    #[must_use]
    pub const fn pred(&self) -> Self {
        Self::new(self.freq, self.ordinal - 1)
    }

    /// Number of periods from `other` to `self`.
    pub const fn periods_since(&self, other: &Self) -> i64 {
        self.ordinal - other.ordinal
    }

    /// First calendar day of the period, if representable.
    pub fn start_date(&self) -> Option<NaiveDate> {
        match self.freq {
            Frequency::Day => {
                let days = i32::try_from(self.ordinal).ok()?;
                NaiveDate::from_num_days_from_ce_opt(days.checked_add(UNIX_EPOCH_DAYS_FROM_CE)?)
            }
            Frequency::Month => {
                let year = 1970 + self.ordinal.div_euclid(12);
                let month = self.ordinal.rem_euclid(12) + 1;
                NaiveDate::from_ymd_opt(i32::try_from(year).ok()?, month as u32, 1)
            }
            Frequency::Quarter => {
                let year = 1970 + self.ordinal.div_euclid(4);
                let month = self.ordinal.rem_euclid(4) * 3 + 1;
                NaiveDate::from_ymd_opt(i32::try_from(year).ok()?, month as u32, 1)
            }
            Frequency::Year => {
                NaiveDate::from_ymd_opt(i32::try_from(1970 + self.ordinal).ok()?, 1, 1)
            }
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(start) = self.start_date() else {
            return write!(f, "{}#{}", self.freq, self.ordinal);
        };
        match self.freq {
            Frequency::Day => write!(f, "{}", start.format("%Y-%m-%d")),
            Frequency::Month => write!(f, "{}", start.format("%Y-%m")),
            Frequency::Quarter => write!(f, "{}Q{}", start.year(), start.month0() / 3 + 1),
            Frequency::Year => write!(f, "{}", start.year()),
        }
    }
}

/// Container for an entity-period table.
///
/// `PanelFrame` wraps a Polars DataFrame holding one row per entity and
/// period. Columns beyond the ones a stage needs are carried through
/// untouched.
#[derive(Debug, Clone, Default)]
pub struct PanelFrame {
    data: DataFrame,
}

impl PanelFrame {
    /// Creates a new `PanelFrame` from a DataFrame.
    pub const fn new(data: DataFrame) -> Self {
        Self { data }
    }

    /// Returns a reference to the underlying DataFrame.
    pub const fn data(&self) -> &DataFrame {
        &self.data
    }

    /// Consumes self and returns the underlying DataFrame.
    pub fn into_inner(self) -> DataFrame {
        self.data
    }

    /// Returns the number of rows.
    pub fn len(&self) -> usize {
        self.data.height()
    }

    /// Returns whether the frame has no rows.
    pub fn is_empty(&self) -> bool {
        self.data.height() == 0
    }

    /// Returns the column names in order.
    pub fn columns(&self) -> Vec<String> {
        self.data
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    /// Checks if a column exists.
    pub fn has_column(&self, name: &str) -> bool {
        self.data
            .get_column_names()
            .iter()
            .any(|s| s.as_str() == name)
    }

    /// Gets a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.data.column(name).ok()
    }

    /// Fails with [`PanelError::MissingColumn`] for the first absent column.
    pub fn require_columns(&self, names: &[&str]) -> Result<()> {
        match names.iter().find(|name| !self.has_column(name)) {
            Some(missing) => Err(PanelError::MissingColumn((*missing).to_string())),
            None => Ok(()),
        }
    }

    /// Reads a column as `f64` values, casting numeric and boolean dtypes.
    ///
    /// Nulls are returned as `None`.
    pub fn f64_values(&self, name: &str) -> Result<Vec<Option<f64>>> {
        let column = self
            .column(name)
            .ok_or_else(|| PanelError::MissingColumn(name.to_string()))?;
        let series = column
            .as_materialized_series()
            .cast(&DataType::Float64)
            .map_err(|e| PanelError::InvalidData(format!("column {name:?} is not numeric: {e}")))?;
        Ok(series.f64()?.into_iter().collect())
    }

    /// Reads a column as `f64` values, failing on the first null.
    pub fn required_f64_values(&self, name: &str) -> Result<Vec<f64>> {
        self.f64_values(name)?
            .into_iter()
            .enumerate()
            .map(|(row, value)| {
                value.ok_or_else(|| {
                    PanelError::InvalidData(format!("null in column {name:?} at row {row}"))
                })
            })
            .collect()
    }

    /// Reads a column as strings, the form entity ids are compared and
    /// concatenated in.
    pub fn string_values(&self, name: &str) -> Result<Vec<String>> {
        let column = self
            .column(name)
            .ok_or_else(|| PanelError::MissingColumn(name.to_string()))?;
        let series = column.as_materialized_series().cast(&DataType::String)?;
        series
            .str()?
            .into_iter()
            .enumerate()
            .map(|(row, value)| {
                value.map(str::to_string).ok_or_else(|| {
                    PanelError::InvalidData(format!("null in column {name:?} at row {row}"))
                })
            })
            .collect()
    }
}

impl From<DataFrame> for PanelFrame {
    fn from(data: DataFrame) -> Self {
        Self::new(data)
    }
}

impl AsRef<DataFrame> for PanelFrame {
    fn as_ref(&self) -> &DataFrame {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frequency_from_str() {
        assert_eq!("m".parse::<Frequency>().unwrap(), Frequency::Month);
        assert_eq!("Q".parse::<Frequency>().unwrap(), Frequency::Quarter);
        assert_eq!(" y ".parse::<Frequency>().unwrap(), Frequency::Year);
        assert_eq!("D".parse::<Frequency>().unwrap(), Frequency::Day);

        let err = "W".parse::<Frequency>().unwrap_err();
        assert!(matches!(err, PanelError::Configuration(_)));
    }

    #[test]
    fn test_frequency_months() {
        assert_eq!(Frequency::Month.months(), 1);
        assert_eq!(Frequency::Quarter.months(), 3);
        assert_eq!(Frequency::Year.months(), 12);
        assert_eq!(Frequency::Day.months(), 1);
    }

    #[test]
    fn test_floor_month_and_quarter() {
        let date = NaiveDate::from_ymd_opt(2020, 5, 17).unwrap();
        let month = Frequency::Month.floor(date);
        assert_eq!(month.ordinal(), 50 * 12 + 4);
        assert_eq!(month.to_string(), "2020-05");

        let quarter = Frequency::Quarter.floor(date);
        assert_eq!(quarter.to_string(), "2020Q2");
        assert_eq!(quarter.start_date(), NaiveDate::from_ymd_opt(2020, 4, 1));

        let year = Frequency::Year.floor(date);
        assert_eq!(year.to_string(), "2020");
    }

    #[test]
    fn test_floor_day_round_trips_epoch() {
        let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
        assert_eq!(Frequency::Day.floor(epoch).ordinal(), 0);

        let date = NaiveDate::from_ymd_opt(2021, 3, 9).unwrap();
        let period = Frequency::Day.floor(date);
        assert_eq!(period.start_date(), Some(date));
        assert_eq!(period.to_string(), "2021-03-09");
    }

    #[test]
    fn test_period_arithmetic() {
        let jan = Frequency::Month.floor(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
        let dec = jan.pred();
        assert_eq!(dec.to_string(), "2019-12");
        assert_eq!(dec.succ(), jan);
        assert_eq!(jan.periods_since(&dec), 1);
        assert!(dec < jan);
    }

    #[test]
    fn test_panel_frame_columns() {
        let df = df! {
            "id" => &[1, 2],
            "dpd" => &[0.0, 30.0],
        }
        .unwrap();

        let panel = PanelFrame::from(df);
        assert_eq!(panel.len(), 2);
        assert!(panel.has_column("dpd"));
        assert!(!panel.has_column("date"));
        assert_eq!(panel.columns(), vec!["id".to_string(), "dpd".to_string()]);
    }

    #[test]
    fn test_require_columns_reports_first_missing() {
        let panel = PanelFrame::new(df! { "id" => &[1] }.unwrap());
        let err = panel.require_columns(&["id", "ref", "flag"]).unwrap_err();
        assert!(matches!(err, PanelError::MissingColumn(ref c) if c == "ref"));
    }

    #[test]
    fn test_value_accessors() {
        let panel = PanelFrame::new(
            df! {
                "id" => &[7i64, 8],
                "flag" => &[Some(1i32), None],
            }
            .unwrap(),
        );

        assert_eq!(panel.string_values("id").unwrap(), vec!["7", "8"]);
        assert_eq!(panel.f64_values("flag").unwrap(), vec![Some(1.0), None]);
        assert!(matches!(
            panel.required_f64_values("flag"),
            Err(PanelError::InvalidData(_))
        ));
    }
}
