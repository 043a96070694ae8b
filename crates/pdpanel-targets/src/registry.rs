//! Target registry and target-name parsing.
//!
//! Target names follow `{EVER|OVER}{threshold}{unit}{horizon}`, where the unit
//! is one of `M` (months), `Q` (quarters), `Y` (years) or `D` (counted as one
//! month). `EVER30Q8` reads "days past due reached 30 in any of the next
//! eight quarters". The registry maps names to resolved definitions whose
//! horizon is expressed in periods of the panel's base frequency.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use pdpanel_traits::{Frequency, PanelError, Result};

use crate::window::Direction;

static TARGET_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(EVER|OVER)(\d+)([MDQY])(\d+)$").expect("target name pattern is valid")
});

/// A resolved target: direction, days-past-due threshold and horizon in base
/// periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetDefinition {
    /// Look-ahead (`Ever`) or look-back (`Over`)
    pub direction: Direction,
    /// Rows with `dpd >= threshold` count as exceeding
    pub threshold: i64,
    /// Window length in base periods, including the current one
    pub horizon: usize,
}

impl TargetDefinition {
    /// Create a definition.
    pub const fn new(direction: Direction, threshold: i64, horizon: usize) -> Self {
        Self {
            direction,
            threshold,
            horizon,
        }
    }
}

/// Parse a target name into a definition for the given base frequency.
///
/// # Errors
///
/// [`PanelError::Parse`] if the name does not follow the pattern, and
/// [`PanelError::Configuration`] if the horizon is zero or not a whole
/// number of base periods.
///
/// # Examples
///
/// ```
/// use pdpanel_targets::{Direction, parse_target_name};
/// use pdpanel_traits::Frequency;
///
/// let def = parse_target_name("EVER30Q8", Frequency::Month).unwrap();
/// assert_eq!(def.direction, Direction::Ever);
/// assert_eq!(def.threshold, 30);
/// assert_eq!(def.horizon, 24);
/// ```
pub fn parse_target_name(name: &str, base: Frequency) -> Result<TargetDefinition> {
    let captures = TARGET_NAME.captures(name).ok_or_else(|| {
        PanelError::Parse(format!(
            "invalid target name {name:?}; use EVER/OVER + <dpd> + M/Q/Y/D + <horizon>"
        ))
    })?;

    let direction: Direction = captures[1].parse()?;
    let threshold: i64 = captures[2]
        .parse()
        .map_err(|e| PanelError::Parse(format!("threshold in {name:?}: {e}")))?;
    let unit: Frequency = captures[3].parse()?;
    let horizon: u64 = captures[4]
        .parse()
        .map_err(|e| PanelError::Parse(format!("horizon in {name:?}: {e}")))?;

    if horizon == 0 {
        return Err(PanelError::Configuration(format!(
            "horizon of {name} must be positive"
        )));
    }

    let horizon_months = horizon
        .checked_mul(u64::from(unit.months()))
        .ok_or_else(|| PanelError::Parse(format!("horizon in {name:?} overflows")))?;
    let base_months = u64::from(base.months());
    if horizon_months % base_months != 0 {
        return Err(PanelError::Configuration(format!(
            "horizon of {name} ({horizon_months} months) is not a multiple of the base frequency {base}"
        )));
    }

    let horizon = usize::try_from(horizon_months / base_months)
        .map_err(|_| PanelError::Parse(format!("horizon in {name:?} overflows")))?;
    Ok(TargetDefinition::new(direction, threshold, horizon))
}

/// Ordered mapping of target names to definitions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetRegistry {
    entries: Vec<(String, TargetDefinition)>,
}

impl TargetRegistry {
    /// Empty registry.
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// The default targets, horizons in base periods.
    pub fn defaults() -> Self {
        [
            ("EVER30M4", Direction::Ever, 30, 4),
            ("EVER60M6", Direction::Ever, 60, 6),
            ("EVER90M12", Direction::Ever, 90, 12),
            ("OVER30M4", Direction::Over, 30, 4),
            ("OVER60M6", Direction::Over, 60, 6),
            ("OVER90M12", Direction::Over, 90, 12),
        ]
        .into_iter()
        .map(|(name, direction, threshold, horizon)| {
            (name.to_string(), TargetDefinition::new(direction, threshold, horizon))
        })
        .collect()
    }

    /// Insert or override a target. Overrides keep the original position.
    pub fn insert(&mut self, name: impl Into<String>, definition: TargetDefinition) {
        let name = name.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = definition,
            None => self.entries.push((name, definition)),
        }
    }

    /// Look up a target by name.
    pub fn get(&self, name: &str) -> Option<&TargetDefinition> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, definition)| definition)
    }

    /// Whether the registry knows `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Restrict to the requested names, parsing the ones not yet registered.
    ///
    /// Registered targets keep their registry order; newly parsed ones follow
    /// in request order.
    pub fn select<S: AsRef<str>>(mut self, requested: &[S], base: Frequency) -> Result<Self> {
        for name in requested {
            let name = name.as_ref();
            if !self.contains(name) {
                let definition = parse_target_name(name, base)?;
                self.insert(name, definition);
            }
        }
        self.entries
            .retain(|(name, _)| requested.iter().any(|r| r.as_ref() == name));
        Ok(self)
    }

    /// Distinct thresholds in order of first use.
    pub fn thresholds(&self) -> Vec<i64> {
        let mut thresholds: Vec<i64> = Vec::new();
        for (_, definition) in &self.entries {
            if !thresholds.contains(&definition.threshold) {
                thresholds.push(definition.threshold);
            }
        }
        thresholds
    }

    /// Target names in order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Iterate over `(name, definition)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TargetDefinition)> {
        self.entries
            .iter()
            .map(|(name, definition)| (name.as_str(), definition))
    }

    /// Number of targets.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, TargetDefinition)> for TargetRegistry {
    fn from_iter<I: IntoIterator<Item = (String, TargetDefinition)>>(iter: I) -> Self {
        let mut registry = Self::new();
        for (name, definition) in iter {
            registry.insert(name, definition);
        }
        registry
    }
}
