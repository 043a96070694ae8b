//! Row context and fit-time statistics shared by the strategies.

use std::collections::BTreeMap;

use pdpanel_traits::stats::mean;
use pdpanel_traits::{
    Frequency, PanelError, PanelFrame, Period, PeriodEncoding, Result, normalize_column,
};

/// The rows being weighted, with their vintage and binary target resolved.
#[derive(Debug, Clone)]
pub struct WeightContext<'a> {
    panel: &'a PanelFrame,
    vintages: Vec<Period>,
    target: Vec<f64>,
}

impl<'a> WeightContext<'a> {
    /// Resolve the monthly vintage of `date_col` and the values of
    /// `target_col` for every row.
    ///
    /// # Errors
    ///
    /// [`PanelError::MissingColumn`] for an absent column,
    /// [`PanelError::Parse`] for an unparseable date and
    /// [`PanelError::InvalidData`] for a null or non-numeric target.
    pub fn new(panel: &'a PanelFrame, date_col: &str, target_col: &str) -> Result<Self> {
        panel.require_columns(&[date_col, target_col])?;
        let dates = panel
            .column(date_col)
            .ok_or_else(|| PanelError::MissingColumn(date_col.to_string()))?;
        let vintages = normalize_column(dates, Frequency::Month, PeriodEncoding::Auto)?;
        let target = panel.required_f64_values(target_col)?;
        Ok(Self {
            panel,
            vintages,
            target,
        })
    }

    /// The underlying rows.
    pub const fn panel(&self) -> &'a PanelFrame {
        self.panel
    }

    /// Monthly vintage per row.
    pub fn vintages(&self) -> &[Period] {
        &self.vintages
    }

    /// Target value per row.
    pub fn target(&self) -> &[f64] {
        &self.target
    }

    /// Whether row `row` is an event (`target == 1`).
    pub fn is_event(&self, row: usize) -> bool {
        self.target[row] == 1.0
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.target.len()
    }

    /// Whether there are no rows.
    pub fn is_empty(&self) -> bool {
        self.target.is_empty()
    }
}

/// Dataset-level statistics computed by `fit`.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightStats {
    /// Number of rows seen at fit time
    pub n_obs: usize,
    /// Mean of the target
    pub global_er: f64,
    /// Rows per vintage
    pub vintage_sizes: BTreeMap<Period, usize>,
    /// Mean of the target per vintage
    pub vintage_er: BTreeMap<Period, f64>,
    /// Decay rate per month, present when recency decay is configured
    pub recency_lambda: Option<f64>,
}

impl WeightStats {
    /// Gather statistics over the fit rows.
    ///
    /// # Errors
    ///
    /// [`PanelError::InvalidData`] when there are no rows.
    pub fn fit(ctx: &WeightContext<'_>, recency_lambda: Option<f64>) -> Result<Self> {
        if ctx.is_empty() {
            return Err(PanelError::InvalidData(
                "cannot fit sample weights on an empty frame".to_string(),
            ));
        }

        let mut vintage_sizes: BTreeMap<Period, usize> = BTreeMap::new();
        let mut vintage_events: BTreeMap<Period, f64> = BTreeMap::new();
        for (vintage, target) in ctx.vintages().iter().zip(ctx.target()) {
            *vintage_sizes.entry(*vintage).or_default() += 1;
            *vintage_events.entry(*vintage).or_default() += target;
        }

        let vintage_er = vintage_events
            .into_iter()
            .map(|(vintage, events)| (vintage, events / vintage_sizes[&vintage] as f64))
            .collect();

        Ok(Self {
            n_obs: ctx.len(),
            global_er: mean(ctx.target()),
            vintage_sizes,
            vintage_er,
            recency_lambda,
        })
    }

    /// Number of distinct vintages.
    pub fn n_vintages(&self) -> usize {
        self.vintage_sizes.len()
    }

    /// The most recent vintage.
    pub fn latest_vintage(&self) -> Option<Period> {
        self.vintage_sizes.keys().next_back().copied()
    }

    /// Rows in `vintage`, failing for vintages unseen at fit time.
    pub fn vintage_size(&self, vintage: Period) -> Result<usize> {
        self.vintage_sizes
            .get(&vintage)
            .copied()
            .ok_or_else(|| unseen(vintage))
    }

    /// Event rate of `vintage`, failing for vintages unseen at fit time.
    pub fn vintage_rate(&self, vintage: Period) -> Result<f64> {
        self.vintage_er
            .get(&vintage)
            .copied()
            .ok_or_else(|| unseen(vintage))
    }
}

fn unseen(vintage: Period) -> PanelError {
    PanelError::InvalidData(format!("vintage {vintage} was not present when fitting"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use polars::prelude::*;

    fn panel() -> PanelFrame {
        PanelFrame::new(
            df! {
                "vint" => &[202401i64, 202402, 202401, 202401],
                "bad" => &[1i64, 0, 0, 1],
            }
            .unwrap(),
        )
    }

    #[test]
    fn test_context() {
        let panel = panel();
        let ctx = WeightContext::new(&panel, "vint", "bad").unwrap();
        assert_eq!(ctx.len(), 4);
        assert!(ctx.is_event(0));
        assert!(!ctx.is_event(1));
        assert_eq!(ctx.vintages()[1].to_string(), "2024-02");
    }

    #[test]
    fn test_context_missing_column() {
        let panel = panel();
        let err = WeightContext::new(&panel, "vint", "target").unwrap_err();
        assert!(matches!(err, PanelError::MissingColumn(ref c) if c == "target"));
    }

    #[test]
    fn test_fit() {
        let panel = panel();
        let ctx = WeightContext::new(&panel, "vint", "bad").unwrap();
        let stats = WeightStats::fit(&ctx, None).unwrap();

        assert_eq!(stats.n_obs, 4);
        assert_relative_eq!(stats.global_er, 0.5);
        assert_eq!(stats.n_vintages(), 2);

        let jan = ctx.vintages()[0];
        let feb = ctx.vintages()[1];
        assert_eq!(stats.vintage_size(jan).unwrap(), 3);
        assert_relative_eq!(stats.vintage_rate(jan).unwrap(), 2.0 / 3.0);
        assert_relative_eq!(stats.vintage_rate(feb).unwrap(), 0.0);
        assert_eq!(stats.latest_vintage(), Some(feb));
        assert!(stats.vintage_size(feb.succ()).is_err());
    }

    #[test]
    fn test_fit_empty() {
        let panel = PanelFrame::new(
            df! {
                "vint" => Vec::<i64>::new(),
                "bad" => Vec::<i64>::new(),
            }
            .unwrap(),
        );
        let ctx = WeightContext::new(&panel, "vint", "bad").unwrap();
        assert!(WeightStats::fit(&ctx, None).is_err());
    }
}
