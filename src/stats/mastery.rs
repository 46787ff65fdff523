//! Per-skill mastery estimation.
//!
//! Credits are accumulated per skill reference, then turned into a
//! Beta-Binomial posterior under a uniform Beta(1, 1) prior:
//!
//! - mean = (c + α) / (n + α + β)
//! - variance = (c + α)(n − c + β) / ((n + α + β)² (n + α + β + 1))
//!
//! where `c` is the summed credit and `n` the number of items that touched
//! the skill. An item that references k skills contributes its full credit to
//! each of them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::core::ResponseItem;
use crate::stats::credit::score_item;
use crate::util::round_to;

/// Decimal places kept for mastery scores.
pub const SCORE_PLACES: u32 = 3;

/// Decimal places kept for mastery variances.
pub const UNCERTAINTY_PLACES: u32 = 6;

/// Beta prior hyperparameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BetaPrior {
    /// Pseudo-count of successes.
    pub alpha: f64,
    /// Pseudo-count of failures.
    pub beta: f64,
}

impl BetaPrior {
    /// The uniform prior, Beta(1, 1).
    pub const UNIFORM: Self = Self {
        alpha: 1.0,
        beta: 1.0,
    };

    /// Posterior mean given summed credit and observation count.
    pub fn posterior_mean(&self, correct: f64, total: u32) -> f64 {
        let n = f64::from(total);
        (correct + self.alpha) / (n + self.alpha + self.beta)
    }

    /// Posterior variance given summed credit and observation count.
    pub fn posterior_variance(&self, correct: f64, total: u32) -> f64 {
        let n = f64::from(total);
        let a = correct + self.alpha;
        let b = n - correct + self.beta;
        let s = a + b;
        (a * b) / (s * s * (s + 1.0))
    }
}

impl Default for BetaPrior {
    fn default() -> Self {
        Self::UNIFORM
    }
}

/// Running credit for one skill.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SkillAccumulator {
    /// Summed credit.
    pub correct: f64,
    /// Number of items that referenced the skill.
    pub total: u32,
}

impl SkillAccumulator {
    /// Record one item's credit.
    pub fn record(&mut self, credit: f64) {
        self.total += 1;
        self.correct += credit;
    }
}

/// Skill accumulators in first-encounter order.
///
/// Emission order of the mastery vector follows insertion order, so this
/// keeps an explicit entry list with a side index instead of a hash map.
#[derive(Debug, Clone, Default)]
pub struct SkillLedger {
    entries: Vec<(String, SkillAccumulator)>,
    index: HashMap<String, usize>,
    degraded_items: usize,
}

impl SkillLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a ledger from a response list, scoring each item once.
    pub fn from_responses(responses: &[ResponseItem]) -> Self {
        let mut ledger = Self::new();
        for item in responses {
            let outcome = score_item(item);
            if outcome.is_degraded() {
                ledger.degraded_items += 1;
            }
            let credit = outcome.credit();
            for skill_id in &item.skill_refs {
                ledger.record(skill_id, credit);
            }
        }
        ledger
    }

    /// Add a credit to a skill, creating its accumulator on first use.
    pub fn record(&mut self, skill_id: &str, credit: f64) {
        let slot = match self.index.get(skill_id) {
            Some(&slot) => slot,
            None => {
                self.entries
                    .push((skill_id.to_string(), SkillAccumulator::default()));
                let slot = self.entries.len() - 1;
                self.index.insert(skill_id.to_string(), slot);
                slot
            }
        };
        self.entries[slot].1.record(credit);
    }

    /// Look up a skill's accumulator.
    pub fn get(&self, skill_id: &str) -> Option<&SkillAccumulator> {
        self.index.get(skill_id).map(|&slot| &self.entries[slot].1)
    }

    /// Number of distinct skills.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Number of items whose credit fell back to zero.
    pub fn degraded_items(&self) -> usize {
        self.degraded_items
    }

    /// Whether no skill has been recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate skills in first-encounter order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SkillAccumulator)> {
        self.entries.iter().map(|(id, acc)| (id.as_str(), acc))
    }

    /// Convert every accumulator into a rounded mastery entry.
    pub fn into_mastery(self, prior: &BetaPrior) -> Vec<MasteryEntry> {
        self.entries
            .into_iter()
            .map(|(skill_id, acc)| MasteryEntry::from_accumulator(skill_id, &acc, prior))
            .collect()
    }
}

/// Posterior mastery for one skill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MasteryEntry {
    /// Skill identifier.
    pub skill_id: String,
    /// Posterior mean, rounded to 3 places.
    pub score: f64,
    /// Posterior variance, rounded to 6 places.
    pub uncertainty: f64,
}

impl MasteryEntry {
    /// Build an entry from an accumulator.
    pub fn from_accumulator(
        skill_id: impl Into<String>,
        acc: &SkillAccumulator,
        prior: &BetaPrior,
    ) -> Self {
        Self {
            skill_id: skill_id.into(),
            score: round_to(prior.posterior_mean(acc.correct, acc.total), SCORE_PLACES),
            uncertainty: round_to(
                prior.posterior_variance(acc.correct, acc.total),
                UNCERTAINTY_PLACES,
            ),
        }
    }
}

/// Estimate mastery for every referenced skill, in first-encounter order.
pub fn estimate_mastery(responses: &[ResponseItem]) -> Vec<MasteryEntry> {
    SkillLedger::from_responses(responses).into_mastery(&BetaPrior::UNIFORM)
}
