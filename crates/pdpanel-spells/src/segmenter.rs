//! Spell segmentation of one entity's history.
//!
//! A spell is a maximal run of performing periods, bounded by defaults. Spells
//! are numbered by counting run starts, so a run that keeps no rows still
//! consumes its number. A performing row directly after a default is
//! disqualified while its run is shorter than `cure_gap`; later rows of the
//! same run are kept. The leading run of an entity's history is never gated.

use std::ops::Range;

/// One spell inside an entity's history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spell {
    /// Number of performing runs started up to and including this spell.
    pub seq: u32,
    /// Kept rows of the spell, as positions in the entity's sequence.
    pub rows: Range<usize>,
    /// Whether a default row immediately follows the spell.
    pub followed_by_default: bool,
}

impl Spell {
    /// Number of kept rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the spell has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Whether the spell runs to the end of the observed history.
    pub const fn is_censored(&self) -> bool {
        !self.followed_by_default
    }
}

/// Result of segmenting one entity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Segmentation {
    /// Spell number per row; `None` for defaults and disqualified rows.
    pub spell_seq: Vec<Option<u32>>,
    /// Spells in chronological order.
    pub spells: Vec<Spell>,
}

impl Segmentation {
    /// Per-row keep flag: performing and assigned to a spell.
    pub fn keep(&self) -> Vec<bool> {
        self.spell_seq.iter().map(Option::is_some).collect()
    }

    /// Number of kept rows.
    pub fn kept_rows(&self) -> usize {
        self.spells.iter().map(Spell::len).sum()
    }
}

/// Assigns performing periods to spells under the cure-gap rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpellSegmenter {
    cure_gap: usize,
}

impl SpellSegmenter {
    /// Create a segmenter. A `cure_gap` of zero disables the cure rule.
    pub const fn new(cure_gap: usize) -> Self {
        Self { cure_gap }
    }

    /// The configured cure gap.
    pub const fn cure_gap(&self) -> usize {
        self.cure_gap
    }

    /// Segment one entity's chronologically ordered rows.
    ///
    /// `performing[t]` is true when row `t` is not in default.
    pub fn segment(&self, performing: &[bool]) -> Segmentation {
        let runs = run_lengths(performing);
        let mut spell_seq = vec![None; performing.len()];
        let mut spells: Vec<Spell> = Vec::new();
        let mut starts = 0u32;

        for (t, &is_performing) in performing.iter().enumerate() {
            if !is_performing {
                continue;
            }
            let follows_default = t > 0 && !performing[t - 1];
            if t == 0 || follows_default {
                starts += 1;
            }

            if self.cure_gap > 0 && follows_default && runs[t] < self.cure_gap {
                continue;
            }

            match spells.last_mut() {
                Some(spell) if spell.seq == starts => spell.rows.end = t + 1,
                _ => spells.push(Spell {
                    seq: starts,
                    rows: t..t + 1,
                    followed_by_default: false,
                }),
            }
            spell_seq[t] = Some(starts);
        }

        for spell in &mut spells {
            spell.followed_by_default = spell.rows.end < performing.len();
        }

        Segmentation { spell_seq, spells }
    }
}

impl Default for SpellSegmenter {
    fn default() -> Self {
        Self::new(3)
    }
}

/// Length of the run of equal values ending at each position.
///
/// `[true, true, false, true]` yields `[1, 2, 1, 1]`.
pub fn run_lengths(values: &[bool]) -> Vec<usize> {
    let mut lengths = Vec::with_capacity(values.len());
    let mut current = 0usize;
    for (t, value) in values.iter().enumerate() {
        current = if t > 0 && values[t - 1] == *value {
            current + 1
        } else {
            1
        };
        lengths.push(current);
    }
    lengths
}
