//! Curriculum planning.
//!
//! Picks the weakest skills (stable ascending sort on score, so ties keep
//! encounter order) and emits one objective and one practice activity per
//! selected skill.

use serde::{Deserialize, Serialize};

use crate::stats::mastery::{MasteryEntry, SCORE_PLACES};
use crate::util::round_to;

/// Default number of activities in a plan.
pub const DEFAULT_MAX_ACTIVITIES: usize = 5;

/// Ceiling for objective target scores.
pub const TARGET_CAP: f64 = 0.85;

/// Improvement asked of each objective.
pub const TARGET_LIFT: f64 = 0.20;

/// Minutes budgeted per practice activity.
pub const ACTIVITY_MINUTES: u32 = 30;

/// Rationale attached to every plan.
pub const RATIONALE: &str =
    "Baseline: address lowest mastery skills first; conservative targets.";

/// How many of the ranked skills a plan may select.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityLimit {
    /// At most this many skills.
    AtMost(usize),
    /// Every skill except this many at the strong end of the ranking.
    AllBut(usize),
}

impl Default for ActivityLimit {
    fn default() -> Self {
        Self::AtMost(DEFAULT_MAX_ACTIVITIES)
    }
}

impl ActivityLimit {
    /// Limit from a signed count; negative counts drop from the end.
    pub fn from_signed(count: i64) -> Self {
        let magnitude = usize::try_from(count.unsigned_abs()).unwrap_or(usize::MAX);
        if count < 0 {
            Self::AllBut(magnitude)
        } else {
            Self::AtMost(magnitude)
        }
    }

    /// Number of skills selected out of `available`.
    pub fn resolve(self, available: usize) -> usize {
        match self {
            Self::AtMost(n) => n.min(available),
            Self::AllBut(n) => available.saturating_sub(n),
        }
    }
}

/// A learning objective for one skill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Objective {
    /// Objective id (`o1`, `o2`, ...).
    pub id: String,
    /// Skill identifier.
    pub skill_id: String,
    /// Score to reach.
    pub target_score: f64,
}

/// A practice activity for one skill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    /// Activity id (`a1`, `a2`, ...).
    pub id: String,
    /// Human-readable label.
    pub label: String,
    /// Time budget in minutes.
    pub estimated_minutes: u32,
    /// Skills practiced.
    pub skill_refs: Vec<String>,
}

/// Objectives and activities with the plan rationale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurriculumPlan {
    /// Objectives, weakest skill first.
    pub objectives: Vec<Objective>,
    /// Activities, parallel to `objectives`.
    pub activities: Vec<Activity>,
    /// Why these skills were chosen.
    pub rationale: String,
}

impl CurriculumPlan {
    /// Whether the plan selects no skills.
    pub fn is_empty(&self) -> bool {
        self.objectives.is_empty()
    }
}

/// Target score for a skill currently at `score`.
pub fn target_score(score: f64) -> f64 {
    round_to(TARGET_CAP.min(score + TARGET_LIFT), SCORE_PLACES)
}

/// Build a plan over the `max_activities` lowest-mastery skills.
pub fn plan(mastery: &[MasteryEntry], max_activities: usize) -> CurriculumPlan {
    let mut ranked: Vec<&MasteryEntry> = mastery.iter().collect();
    // sort_by is stable; equal scores keep encounter order
    ranked.sort_by(|a, b| a.score.total_cmp(&b.score));

    let (objectives, activities): (Vec<Objective>, Vec<Activity>) = ranked
        .into_iter()
        .take(max_activities)
        .enumerate()
        .map(|(i, m)| {
            let n = i + 1;
            (
                Objective {
                    id: format!("o{}", n),
                    skill_id: m.skill_id.clone(),
                    target_score: target_score(m.score),
                },
                Activity {
                    id: format!("a{}", n),
                    label: format!("Practice: {}", m.skill_id),
                    estimated_minutes: ACTIVITY_MINUTES,
                    skill_refs: vec![m.skill_id.clone()],
                },
            )
        })
        .unzip();

    CurriculumPlan {
        objectives,
        activities,
        rationale: RATIONALE.to_string(),
    }
}
