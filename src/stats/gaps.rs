//! Skill gap classification.
//!
//! Bands (first match wins):
//! - score < 0.50 → high
//! - score < 0.75 → med
//! - score < 0.85 → low
//! - otherwise no gap

use serde::{Deserialize, Serialize};

use crate::stats::mastery::MasteryEntry;

/// Gap thresholds.
pub mod thresholds {
    /// Below this a gap is high severity.
    pub const HIGH: f64 = 0.50;
    /// Below this a gap is medium severity.
    pub const MED: f64 = 0.75;
    /// At or above this a skill has no gap.
    pub const SUFFICIENT: f64 = 0.85;
}

/// Gap severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Score below 0.50.
    High,
    /// Score in [0.50, 0.75).
    Med,
    /// Score in [0.75, 0.85).
    Low,
}

impl Severity {
    /// Classify a mastery score; `None` means no gap.
    pub fn classify(score: f64) -> Option<Self> {
        if score < thresholds::HIGH {
            Some(Self::High)
        } else if score < thresholds::MED {
            Some(Self::Med)
        } else if score < thresholds::SUFFICIENT {
            Some(Self::Low)
        } else {
            None
        }
    }

    /// Display name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Med => "med",
            Self::Low => "low",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A skill below the sufficiency threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gap {
    /// Skill identifier.
    pub skill_id: String,
    /// Severity band.
    pub severity: Severity,
}

/// Classify every mastery entry, keeping mastery-vector order.
pub fn classify_gaps(mastery: &[MasteryEntry]) -> Vec<Gap> {
    mastery
        .iter()
        .filter_map(|m| {
            Severity::classify(m.score).map(|severity| Gap {
                skill_id: m.skill_id.clone(),
                severity,
            })
        })
        .collect()
}
