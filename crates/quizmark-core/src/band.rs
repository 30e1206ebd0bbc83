//! Correct-count to proficiency band conversion.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::BandError;
use crate::model::Skill;

/// A descending step table against a canonical question count.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandTable {
    pub skill: Skill,
    pub canonical_total: usize,
    /// Band for counts below the lowest threshold.
    pub minimum: f64,
    /// `(minimum correct, band)` pairs, strictly descending in both fields.
    pub steps: &'static [(usize, f64)],
}

pub const LISTENING: BandTable = BandTable {
    skill: Skill::Listening,
    canonical_total: 40,
    minimum: 0.0,
    steps: &[
        (39, 9.0),
        (37, 8.5),
        (35, 8.0),
        (32, 7.5),
        (30, 7.0),
        (26, 6.5),
        (23, 6.0),
        (18, 5.5),
        (16, 5.0),
        (13, 4.5),
        (11, 4.0),
        (8, 3.5),
        (6, 3.0),
        (4, 2.5),
        (3, 2.0),
        (2, 1.5),
        (1, 1.0),
    ],
};

pub const READING: BandTable = BandTable {
    skill: Skill::Reading,
    canonical_total: 40,
    minimum: 2.5,
    steps: &[
        (39, 9.0),
        (37, 8.5),
        (35, 8.0),
        (33, 7.5),
        (30, 7.0),
        (27, 6.5),
        (23, 6.0),
        (19, 5.5),
        (15, 5.0),
        (13, 4.5),
        (10, 4.0),
        (7, 3.5),
        (5, 3.0),
    ],
};

/// The step table of a table-scored skill.
pub fn table_for(skill: Skill) -> Result<&'static BandTable, BandError> {
    match skill {
        Skill::Listening => Ok(&LISTENING),
        Skill::Reading => Ok(&READING),
        Skill::Writing | Skill::Speaking => Err(BandError::NotTableScored(skill)),
    }
}

/// Band for `correct` out of `total` questions of `skill`.
pub fn band_score(skill: Skill, correct: usize, total: usize) -> Result<f64, BandError> {
    Ok(table_for(skill)?.band(correct, total))
}

impl BandTable {
    /// Rescale a count to the canonical total: `round(correct / total * canonical)`.
    /// A zero total scales to zero.
    pub fn scale(&self, correct: usize, total: usize) -> usize {
        if total == 0 {
            return 0;
        }
        let correct = correct.min(total);
        if total == self.canonical_total {
            return correct;
        }
        (correct as f64 / total as f64 * self.canonical_total as f64).round() as usize
    }

    pub fn band(&self, correct: usize, total: usize) -> f64 {
        let scaled = self.scale(correct, total);
        self.steps
            .iter()
            .find(|(threshold, _)| scaled >= *threshold)
            .map_or(self.minimum, |(_, band)| *band)
    }
}

/// Coarse label for a band, used to colour results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BandTier {
    Excellent,
    Good,
    Fair,
    Low,
}

impl BandTier {
    pub fn from_band(band: f64) -> Self {
        if band >= 8.0 {
            BandTier::Excellent
        } else if band >= 6.5 {
            BandTier::Good
        } else if band >= 5.5 {
            BandTier::Fair
        } else {
            BandTier::Low
        }
    }

    /// CSS colour used by report renderers.
    pub fn color(self) -> &'static str {
        match self {
            BandTier::Excellent => "#16a34a",
            BandTier::Good => "#2563eb",
            BandTier::Fair => "#d97706",
            BandTier::Low => "#dc2626",
        }
    }
}

impl fmt::Display for BandTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BandTier::Excellent => "excellent",
            BandTier::Good => "good",
            BandTier::Fair => "fair",
            BandTier::Low => "low",
        };
        f.write_str(label)
    }
}
