//! Scoring and estimation for skillgap.
//!
//! Per-item credit feeds a Beta-Binomial mastery estimate per skill. The
//! mastery vector then drives gap classification, curriculum planning and
//! the pass prediction.

pub mod credit;
pub mod curriculum;
pub mod gaps;
pub mod mastery;
pub mod prediction;

pub use credit::{compute_credit, score_item, CreditOutcome, Degradation, NUMERIC_TOLERANCE};
pub use curriculum::{plan as plan_curriculum, Activity, ActivityLimit, CurriculumPlan, Objective};
pub use gaps::{classify_gaps, thresholds, Gap, Severity};
pub use mastery::{
    estimate_mastery, BetaPrior, MasteryEntry, SkillAccumulator, SkillLedger, SCORE_PLACES,
    UNCERTAINTY_PLACES,
};
pub use prediction::{
    bands, confidence_score, predict, Band, Prediction, PredictionScope, DEFAULT_HORIZON_DAYS,
    DEFAULT_SUBJECT,
};
