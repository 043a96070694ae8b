//! Rolling-window labels over one entity's history.
//!
//! Windows are counted in rows, not calendar time: a gap in an entity's
//! periods widens the calendar span a window covers. Windows near the start
//! or end of the history are clipped to the rows that exist.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use pdpanel_traits::PanelError;

/// Direction of a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Look ahead: rows `t ..= t + horizon - 1`.
    Ever,
    /// Look back: rows `t - horizon + 1 ..= t`.
    Over,
}

impl Direction {
    /// Upper-case prefix used in target names.
    pub const fn prefix(&self) -> &'static str {
        match self {
            Self::Ever => "EVER",
            Self::Over => "OVER",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

impl FromStr for Direction {
    type Err = PanelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "EVER" => Ok(Self::Ever),
            "OVER" => Ok(Self::Over),
            other => Err(PanelError::Parse(format!("unknown direction {other:?}"))),
        }
    }
}

/// Label each row `1` if the indicator is set anywhere in its window.
///
/// Equivalent to a rolling maximum with a minimum of one observation, run
/// forwards for [`Direction::Over`] and over the reversed sequence for
/// [`Direction::Ever`]. A `horizon` of zero is treated as one.
pub fn window_labels(indicator: &[bool], direction: Direction, horizon: usize) -> Vec<i8> {
    let horizon = horizon.max(1);
    let n = indicator.len();
    let mut labels = vec![0i8; n];

    match direction {
        Direction::Over => {
            let mut last_hit: Option<usize> = None;
            for t in 0..n {
                if indicator[t] {
                    last_hit = Some(t);
                }
                labels[t] = i8::from(last_hit.is_some_and(|hit| t - hit < horizon));
            }
        }
        Direction::Ever => {
            let mut next_hit: Option<usize> = None;
            for t in (0..n).rev() {
                if indicator[t] {
                    next_hit = Some(t);
                }
                labels[t] = i8::from(next_hit.is_some_and(|hit| hit - t < horizon));
            }
        }
    }

    labels
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags(raw: &[u8]) -> Vec<bool> {
        raw.iter().map(|v| *v == 1).collect()
    }

    #[test]
    fn test_ever_looks_ahead() {
        let labels = window_labels(&flags(&[0, 0, 1, 0, 0]), Direction::Ever, 4);
        assert_eq!(labels, vec![1, 1, 1, 0, 0]);
    }

    #[test]
    fn test_over_looks_back() {
        let labels = window_labels(&flags(&[0, 0, 1, 0, 0]), Direction::Over, 4);
        assert_eq!(labels, vec![0, 0, 1, 1, 1]);
    }

    #[test]
    fn test_window_edges() {
        let indicator = flags(&[1, 0, 0, 0, 0, 1]);
        assert_eq!(
            window_labels(&indicator, Direction::Ever, 2),
            vec![1, 0, 0, 0, 1, 1]
        );
        assert_eq!(
            window_labels(&indicator, Direction::Over, 2),
            vec![1, 1, 0, 0, 0, 1]
        );
    }

    #[test]
    fn test_horizon_one_is_identity() {
        let indicator = flags(&[0, 1, 1, 0, 1]);
        let expected: Vec<i8> = indicator.iter().map(|f| i8::from(*f)).collect();
        assert_eq!(window_labels(&indicator, Direction::Ever, 1), expected);
        assert_eq!(window_labels(&indicator, Direction::Over, 1), expected);
    }

    #[test]
    fn test_horizon_longer_than_history() {
        let indicator = flags(&[0, 0, 1]);
        assert_eq!(window_labels(&indicator, Direction::Ever, 12), vec![1, 1, 1]);
        assert_eq!(window_labels(&indicator, Direction::Over, 12), vec![0, 0, 1]);
    }

    #[test]
    fn test_empty_history() {
        assert!(window_labels(&[], Direction::Ever, 3).is_empty());
    }

    #[test]
    fn test_direction_parse() {
        assert_eq!("ever".parse::<Direction>().unwrap(), Direction::Ever);
        assert_eq!("OVER".parse::<Direction>().unwrap(), Direction::Over);
        assert!("under".parse::<Direction>().is_err());
        assert_eq!(Direction::Ever.to_string(), "EVER");
    }
}
