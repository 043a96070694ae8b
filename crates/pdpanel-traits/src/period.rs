//! Period normalization.
//!
//! Turns a column of heterogeneous time references into canonical
//! [`Period`]s of one base [`Frequency`]. Three encodings are understood:
//!
//! - integer `YYYYMM` values (zero-padded to six digits, first day of the month)
//! - native `Date` / `Datetime` values, floored to the base frequency
//! - pre-normalized integer ordinals, passed through unchanged
//!
//! String columns are accepted as `YYYYMM`, `YYYY-MM` or `YYYY-MM-DD`.

use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::types::UNIX_EPOCH_DAYS_FROM_CE;
use crate::{Frequency, PanelError, Period, Result};

/// How the period column is encoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodEncoding {
    /// Dispatch on the column dtype: integers as `YYYYMM`, dates and
    /// datetimes floored, strings parsed.
    #[default]
    Auto,
    /// Integers or strings holding `YYYYMM`.
    YearMonth,
    /// Integers that already are period ordinals of the base frequency.
    Ordinal,
}

/// Normalize a period column into one [`Period`] per row.
///
/// # Errors
///
/// Returns [`PanelError::Parse`] for the first value that cannot be read
/// under the encoding (including nulls), and [`PanelError::InvalidData`] for
/// dtypes that carry no period information.
pub fn normalize_column(
    column: &Column,
    freq: Frequency,
    encoding: PeriodEncoding,
) -> Result<Vec<Period>> {
    let series = column.as_materialized_series();
    let name = series.name().to_string();

    match (encoding, series.dtype()) {
        (PeriodEncoding::Ordinal, _) => integer_values(series, &name)?
            .into_iter()
            .map(|ordinal| Ok(Period::new(freq, ordinal)))
            .collect(),
        (_, DataType::String) => {
            let values = series.str()?;
            values
                .into_iter()
                .enumerate()
                .map(|(row, value)| {
                    let value = value.ok_or_else(|| null_period(&name, row))?;
                    match encoding {
                        PeriodEncoding::YearMonth => {
                            let digits = value.trim().parse::<i64>().map_err(|_| {
                                PanelError::Parse(format!("{value:?} is not a YYYYMM value"))
                            })?;
                            parse_year_month(digits, freq)
                        }
                        _ => parse_period_str(value, freq),
                    }
                })
                .collect()
        }
        (PeriodEncoding::Auto, DataType::Date) => {
            let days = series.cast(&DataType::Int32)?;
            days.i32()?
                .into_iter()
                .enumerate()
                .map(|(row, value)| {
                    let days = value.ok_or_else(|| null_period(&name, row))?;
                    date_from_epoch_days(i64::from(days))
                        .map(|date| freq.floor(date))
                        .ok_or_else(|| PanelError::Parse(format!("date out of range in {name:?}")))
                })
                .collect()
        }
        (PeriodEncoding::Auto, DataType::Datetime(unit, _)) => {
            let per_day = units_per_day(*unit);
            let raw = series.cast(&DataType::Int64)?;
            raw.i64()?
                .into_iter()
                .enumerate()
                .map(|(row, value)| {
                    let value = value.ok_or_else(|| null_period(&name, row))?;
                    date_from_epoch_days(value.div_euclid(per_day))
                        .map(|date| freq.floor(date))
                        .ok_or_else(|| {
                            PanelError::Parse(format!("datetime out of range in {name:?}"))
                        })
                })
                .collect()
        }
        (_, dtype) if dtype.is_integer() || dtype.is_float() => integer_values(series, &name)?
            .into_iter()
            .map(|value| parse_year_month(value, freq))
            .collect(),
        (_, dtype) => Err(PanelError::InvalidData(format!(
            "column {name:?} has dtype {dtype} which cannot hold periods"
        ))),
    }
}

/// Parse an integer `YYYYMM` value into the period containing its first day.
pub fn parse_year_month(value: i64, freq: Frequency) -> Result<Period> {
    if value < 0 {
        return Err(PanelError::Parse(format!("{value} is not a YYYYMM value")));
    }
    let year = value / 100;
    let month = value % 100;
    if !(1..=12).contains(&month) || !(1..=9999).contains(&year) {
        return Err(PanelError::Parse(format!(
            "{value:06} is not a valid YYYYMM value"
        )));
    }
    NaiveDate::from_ymd_opt(year as i32, month as u32, 1)
        .map(|date| freq.floor(date))
        .ok_or_else(|| PanelError::Parse(format!("{value:06} is not a valid YYYYMM value")))
}

/// Parse a textual period: `YYYYMM`, `YYYY-MM`, or a date / datetime whose
/// first ten characters are `YYYY-MM-DD`.
pub fn parse_period_str(value: &str, freq: Frequency) -> Result<Period> {
    let trimmed = value.trim();

    if !trimmed.is_empty() && trimmed.len() <= 6 && trimmed.bytes().all(|b| b.is_ascii_digit()) {
        let digits = trimmed
            .parse::<i64>()
            .map_err(|e| PanelError::Parse(format!("{value:?}: {e}")))?;
        return parse_year_month(digits, freq);
    }

    if trimmed.len() == 7 {
        if let Ok(date) = NaiveDate::parse_from_str(&format!("{trimmed}-01"), "%Y-%m-%d") {
            return Ok(freq.floor(date));
        }
    }

    trimmed
        .get(..10)
        .and_then(|head| NaiveDate::parse_from_str(head, "%Y-%m-%d").ok())
        .map(|date| freq.floor(date))
        .ok_or_else(|| PanelError::Parse(format!("cannot parse period from {value:?}")))
}

/// Build an `Int64` series of period ordinals.
pub fn ordinal_series(name: &str, periods: &[Period]) -> Series {
    let ordinals: Vec<i64> = periods.iter().map(Period::ordinal).collect();
    Series::new(name.into(), ordinals)
}

fn integer_values(series: &Series, name: &str) -> Result<Vec<i64>> {
    let floats = series.cast(&DataType::Float64)?;
    floats
        .f64()?
        .into_iter()
        .enumerate()
        .map(|(row, value)| {
            let value = value.ok_or_else(|| null_period(name, row))?;
            if value.fract() != 0.0 || !value.is_finite() {
                return Err(PanelError::Parse(format!(
                    "{value} in {name:?} is not an integer period"
                )));
            }
            Ok(value as i64)
        })
        .collect()
}

fn date_from_epoch_days(days: i64) -> Option<NaiveDate> {
    let days = i32::try_from(days).ok()?;
    NaiveDate::from_num_days_from_ce_opt(days.checked_add(UNIX_EPOCH_DAYS_FROM_CE)?)
}

const fn units_per_day(unit: TimeUnit) -> i64 {
    match unit {
        TimeUnit::Nanoseconds => 86_400_000_000_000,
        TimeUnit::Microseconds => 86_400_000_000,
        TimeUnit::Milliseconds => 86_400_000,
    }
}

fn null_period(name: &str, row: usize) -> PanelError {
    PanelError::Parse(format!("null period in column {name:?} at row {row}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn month(year: i32, month: u32) -> Period {
        Frequency::Month.floor(NaiveDate::from_ymd_opt(year, month, 1).unwrap())
    }

    #[test]
    fn test_year_month_integers() {
        let df = df! { "ref" => &[202001i64, 202002, 202012] }.unwrap();
        let periods =
            normalize_column(df.column("ref").unwrap(), Frequency::Month, PeriodEncoding::Auto)
                .unwrap();

        assert_eq!(periods, vec![month(2020, 1), month(2020, 2), month(2020, 12)]);
        assert_eq!(periods[1].periods_since(&periods[0]), 1);
    }

    #[test]
    fn test_year_month_floors_to_quarter() {
        let df = df! { "ref" => &[202001i32, 202003, 202004] }.unwrap();
        let periods =
            normalize_column(df.column("ref").unwrap(), Frequency::Quarter, PeriodEncoding::Auto)
                .unwrap();

        assert_eq!(periods[0], periods[1]);
        assert_eq!(periods[2], periods[1].succ());
        assert_eq!(periods[2].to_string(), "2020Q2");
    }

    #[test]
    fn test_invalid_month_is_parse_error() {
        let df = df! { "ref" => &[202013i64] }.unwrap();
        let err =
            normalize_column(df.column("ref").unwrap(), Frequency::Month, PeriodEncoding::Auto)
                .unwrap_err();
        assert!(matches!(err, PanelError::Parse(_)));
    }

    #[test]
    fn test_null_is_parse_error() {
        let df = df! { "ref" => &[Some(202001i64), None] }.unwrap();
        let err =
            normalize_column(df.column("ref").unwrap(), Frequency::Month, PeriodEncoding::Auto)
                .unwrap_err();
        assert!(matches!(err, PanelError::Parse(ref msg) if msg.contains("row 1")));
    }

    #[test]
    fn test_native_dates_are_floored() {
        let dates = [
            NaiveDate::from_ymd_opt(2020, 1, 15).unwrap(),
            NaiveDate::from_ymd_opt(2020, 2, 29).unwrap(),
        ];
        let df = df! { "date" => &dates }.unwrap();
        let periods =
            normalize_column(df.column("date").unwrap(), Frequency::Month, PeriodEncoding::Auto)
                .unwrap();

        assert_eq!(periods, vec![month(2020, 1), month(2020, 2)]);
    }

    #[test]
    fn test_native_datetimes_are_floored() {
        let stamps = [
            NaiveDate::from_ymd_opt(2021, 6, 30)
                .unwrap()
                .and_hms_opt(23, 59, 0)
                .unwrap(),
        ];
        let df = df! { "ts" => &stamps }.unwrap();
        let periods =
            normalize_column(df.column("ts").unwrap(), Frequency::Month, PeriodEncoding::Auto)
                .unwrap();

        assert_eq!(periods, vec![month(2021, 6)]);
    }

    #[test]
    fn test_string_forms() {
        assert_eq!(parse_period_str("202003", Frequency::Month).unwrap(), month(2020, 3));
        assert_eq!(parse_period_str("2020-03", Frequency::Month).unwrap(), month(2020, 3));
        assert_eq!(parse_period_str("2020-03-31", Frequency::Month).unwrap(), month(2020, 3));
        assert_eq!(
            parse_period_str("2020-03-31 12:00:00", Frequency::Month).unwrap(),
            month(2020, 3)
        );
        assert!(parse_period_str("March 2020", Frequency::Month).is_err());
    }

    #[test]
    fn test_zero_padded_year_month() {
        // "020201" after zero-padding: year 202, month 1
        let period = parse_year_month(20201, Frequency::Month).unwrap();
        assert_eq!(period.start_date(), NaiveDate::from_ymd_opt(202, 1, 1));
    }

    #[test]
    fn test_ordinals_pass_through() {
        let df = df! { "p" => &[600i64, 601] }.unwrap();
        let periods =
            normalize_column(df.column("p").unwrap(), Frequency::Month, PeriodEncoding::Ordinal)
                .unwrap();

        assert_eq!(periods[0], month(2020, 1));
        assert_eq!(periods[1], month(2020, 2));
    }

    #[test]
    fn test_boolean_column_rejected() {
        let df = df! { "flag" => &[true, false] }.unwrap();
        let err =
            normalize_column(df.column("flag").unwrap(), Frequency::Month, PeriodEncoding::Auto)
                .unwrap_err();
        assert!(matches!(err, PanelError::InvalidData(_)));
    }

    #[test]
    fn test_ordinal_series() {
        let series = ordinal_series("_ref", &[month(1970, 1), month(1970, 3)]);
        let values: Vec<Option<i64>> = series.i64().unwrap().into_iter().collect();
        assert_eq!(values, vec![Some(0), Some(2)]);
    }
}
