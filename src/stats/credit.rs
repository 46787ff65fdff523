//! Per-item credit scoring.
//!
//! Each response item earns a credit in [0, 1] according to its type:
//! - mcq: exact match, 1.0 or 0.0
//! - msq: fraction of the key's choices that were selected
//! - numeric: 1.0 within an absolute tolerance of 1e-3
//! - short/long: case-insensitive containment of the key in the answer
//!
//! Scoring is total. Answers that cannot be compared produce a
//! [`CreditOutcome::Degraded`] carrying the reason, which counts as 0.0.

use std::fmt;

use crate::core::{AnswerValue, ItemType, ResponseItem};

/// Absolute tolerance for numeric answers (inclusive).
pub const NUMERIC_TOLERANCE: f64 = 1e-3;

/// Why an item could not be scored normally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Degradation {
    /// The msq answer key has no choices.
    EmptyKey,
    /// An msq answer or key is not a list of scalar choices.
    NotAChoiceList,
    /// A numeric answer or key has no numeric form.
    NotNumeric,
    /// A text item has no answer key.
    MissingKey,
    /// A text answer or key has no string form.
    NotText,
    /// The item type has no scoring rule.
    UnsupportedType(String),
}

impl fmt::Display for Degradation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyKey => write!(f, "answer key has no choices"),
            Self::NotAChoiceList => write!(f, "value is not a list of choices"),
            Self::NotNumeric => write!(f, "value is not numeric"),
            Self::MissingKey => write!(f, "answer key is missing"),
            Self::NotText => write!(f, "value has no text form"),
            Self::UnsupportedType(t) => write!(f, "unsupported item type '{}'", t),
        }
    }
}

/// Result of scoring one item.
#[derive(Debug, Clone, PartialEq)]
pub enum CreditOutcome {
    /// The item was compared; credit in [0, 1].
    Scored(f64),
    /// The item could not be compared; credit is 0.0.
    Degraded(Degradation),
}

impl CreditOutcome {
    /// The credit this outcome contributes.
    pub fn credit(&self) -> f64 {
        match self {
            Self::Scored(credit) => *credit,
            Self::Degraded(_) => 0.0,
        }
    }

    /// Whether scoring fell back to zero.
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded(_))
    }
}

/// Score a response item.
pub fn score_item(item: &ResponseItem) -> CreditOutcome {
    let outcome = match &item.item_type {
        ItemType::Mcq => score_mcq(&item.answer, &item.correct),
        ItemType::Msq => score_msq(&item.answer, &item.correct),
        ItemType::Numeric => score_numeric(&item.answer, &item.correct),
        ItemType::Short | ItemType::Long => score_text(&item.answer, &item.correct),
        ItemType::Other(raw) => CreditOutcome::Degraded(Degradation::UnsupportedType(raw.clone())),
    };

    if let CreditOutcome::Degraded(reason) = &outcome {
        tracing::debug!(
            item_id = %item.item_id,
            item_type = %item.item_type,
            reason = %reason,
            "credit degraded to zero"
        );
    }

    outcome
}

/// Credit for a response item in [0, 1]. Never fails.
pub fn compute_credit(item: &ResponseItem) -> f64 {
    score_item(item).credit()
}

fn score_mcq(answer: &AnswerValue, correct: &AnswerValue) -> CreditOutcome {
    CreditOutcome::Scored(if answer == correct { 1.0 } else { 0.0 })
}

/// Selected choices over key choices. Extra selections are not penalized.
fn score_msq(answer: &AnswerValue, correct: &AnswerValue) -> CreditOutcome {
    let (Some(selected), Some(key)) = (answer.choice_set(), correct.choice_set()) else {
        return CreditOutcome::Degraded(Degradation::NotAChoiceList);
    };
    if key.is_empty() {
        return CreditOutcome::Degraded(Degradation::EmptyKey);
    }

    let hits = key.iter().filter(|choice| selected.contains(*choice)).count();
    CreditOutcome::Scored(hits as f64 / key.len() as f64)
}

fn score_numeric(answer: &AnswerValue, correct: &AnswerValue) -> CreditOutcome {
    let (Some(given), Some(expected)) = (answer.as_number(), correct.as_number()) else {
        return CreditOutcome::Degraded(Degradation::NotNumeric);
    };
    // NaN fails the comparison and scores zero.
    CreditOutcome::Scored(if (given - expected).abs() <= NUMERIC_TOLERANCE {
        1.0
    } else {
        0.0
    })
}

fn score_text(answer: &AnswerValue, correct: &AnswerValue) -> CreditOutcome {
    if correct.is_missing() {
        return CreditOutcome::Degraded(Degradation::MissingKey);
    }
    let (Some(given), Some(expected)) = (answer.text_form(), correct.text_form()) else {
        return CreditOutcome::Degraded(Degradation::NotText);
    };

    let contains = given.to_lowercase().contains(&expected.to_lowercase());
    CreditOutcome::Scored(if contains { 1.0 } else { 0.0 })
}
