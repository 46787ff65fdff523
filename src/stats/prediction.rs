//! Outcome prediction.
//!
//! The pass probability is the mean mastery score across skills, mapped to a
//! letter band. Band cut-offs (0.85 / 0.70 / 0.50) differ from the gap
//! thresholds on purpose; the two scales are reported independently.
//!
//! Confidence is one minus the mean posterior variance, clamped to [0, 1].

use serde::{Deserialize, Serialize};

use crate::stats::mastery::{MasteryEntry, SCORE_PLACES};
use crate::util::round_to;

/// Subject reported when none is configured.
pub const DEFAULT_SUBJECT: &str = "general";

/// Prediction horizon when none is configured.
pub const DEFAULT_HORIZON_DAYS: u32 = 30;

/// Band cut-offs, evaluated high to low.
pub mod bands {
    /// Lowest pass probability for band A.
    pub const A: f64 = 0.85;
    /// Lowest pass probability for band B.
    pub const B: f64 = 0.70;
    /// Lowest pass probability for band C.
    pub const C: f64 = 0.50;
}

/// Letter band for a pass probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Band {
    /// At least 0.85.
    A,
    /// At least 0.70.
    B,
    /// At least 0.50.
    C,
    /// Below 0.50.
    D,
}

impl Band {
    /// Band for a (rounded) pass probability.
    pub fn from_probability(prob_pass: f64) -> Self {
        if prob_pass >= bands::A {
            Self::A
        } else if prob_pass >= bands::B {
            Self::B
        } else if prob_pass >= bands::C {
            Self::C
        } else {
            Self::D
        }
    }

    /// Letter.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
        }
    }
}

impl std::fmt::Display for Band {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregate pass prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Subject the prediction covers.
    pub subject: String,
    /// Horizon in days.
    pub horizon_days: u32,
    /// Pass probability, rounded to 3 places.
    pub prob_pass: f64,
    /// Letter band.
    pub band: Band,
}

/// Where the prediction applies.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionScope {
    /// Subject label.
    pub subject: String,
    /// Horizon in days.
    pub horizon_days: u32,
}

impl Default for PredictionScope {
    fn default() -> Self {
        Self {
            subject: DEFAULT_SUBJECT.to_string(),
            horizon_days: DEFAULT_HORIZON_DAYS,
        }
    }
}

fn mean(values: impl ExactSizeIterator<Item = f64>) -> f64 {
    let n = values.len();
    if n == 0 {
        return 0.0;
    }
    values.sum::<f64>() / n as f64
}

/// Predict the pass outcome from the mastery vector.
pub fn predict(mastery: &[MasteryEntry], scope: &PredictionScope) -> Prediction {
    let prob_pass = round_to(mean(mastery.iter().map(|m| m.score)), SCORE_PLACES);
    Prediction {
        subject: scope.subject.clone(),
        horizon_days: scope.horizon_days,
        prob_pass,
        band: Band::from_probability(prob_pass),
    }
}

/// Overall confidence: `1 - mean(uncertainty)`, clamped and rounded.
///
/// An empty mastery vector has no uncertainty and scores 1.0.
pub fn confidence_score(mastery: &[MasteryEntry]) -> f64 {
    let avg_uncertainty = mean(mastery.iter().map(|m| m.uncertainty));
    round_to((1.0 - avg_uncertainty).clamp(0.0, 1.0), SCORE_PLACES)
}
