//! Entity partitioning of a panel.
//!
//! Panel stages run a per-entity sequence function over each entity's
//! chronologically ordered rows. [`sort_by_entity_period`] produces that
//! order once for the whole frame (stable on ties), and
//! [`partition_sorted`] slices it into contiguous entity ranges that can be
//! processed independently and written back in place.

use std::ops::Range;

use polars::prelude::*;

use crate::period::ordinal_series;
use crate::{Frequency, Period, Result};

/// Internal column holding period ordinals while a frame is being sorted.
pub const PERIOD_HELPER_COLUMN: &str = "__period";

/// One entity's contiguous row range in a sorted frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityPartition {
    /// Entity id in its string form.
    pub key: String,
    /// Rows belonging to the entity.
    pub rows: Range<usize>,
}

impl EntityPartition {
    /// Number of rows for the entity.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the entity has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Split a key column, already grouped so equal keys are adjacent, into
/// entity ranges in order of first appearance.
pub fn partition_sorted(keys: &[String]) -> Vec<EntityPartition> {
    let mut partitions: Vec<EntityPartition> = Vec::new();
    for (row, key) in keys.iter().enumerate() {
        match partitions.last_mut() {
            Some(last) if &last.key == key => last.rows.end = row + 1,
            _ => partitions.push(EntityPartition {
                key: key.clone(),
                rows: row..row + 1,
            }),
        }
    }
    partitions
}

/// Stable-sort a frame by entity id then period.
///
/// `periods` must be aligned with the frame's rows. Returns the sorted frame
/// (without any helper column) and the periods in the new row order.
pub fn sort_by_entity_period(
    df: &DataFrame,
    id_col: &str,
    periods: &[Period],
    freq: Frequency,
) -> Result<(DataFrame, Vec<Period>)> {
    let mut keyed = df.clone();
    keyed.with_column(ordinal_series(PERIOD_HELPER_COLUMN, periods))?;

    let sorted = keyed.sort(
        [id_col, PERIOD_HELPER_COLUMN],
        SortMultipleOptions::default().with_maintain_order(true),
    )?;

    let sorted_periods = sorted
        .column(PERIOD_HELPER_COLUMN)?
        .as_materialized_series()
        .i64()?
        .into_iter()
        .map(|ordinal| Period::new(freq, ordinal.unwrap_or_default()))
        .collect();

    Ok((sorted.drop(PERIOD_HELPER_COLUMN)?, sorted_periods))
}
