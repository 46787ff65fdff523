//! The diagnostic pipeline.
//!
//! responses → credit (per item) → mastery (per skill) →
//! {gaps, curriculum, prediction} → envelope.
//!
//! Every run builds its own skill ledger; nothing is shared between runs.

use std::time::Instant;

use crate::config::Config;
use crate::core::envelope::{DiagnosticEnvelope, Diagnosis};
use crate::core::request::{DiagnosticRequest, ResponseItem};
use crate::error::Result;
use crate::stats::{
    classify_gaps, confidence_score, curriculum, predict, ActivityLimit, BetaPrior,
    PredictionScope, SkillLedger,
};

/// Tunables for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagnosticOptions {
    /// How many skills the plan selects.
    pub activity_limit: ActivityLimit,
    /// Subject and horizon of the prediction.
    pub scope: PredictionScope,
}

impl Default for DiagnosticOptions {
    fn default() -> Self {
        Self {
            activity_limit: ActivityLimit::default(),
            scope: PredictionScope::default(),
        }
    }
}

impl DiagnosticOptions {
    /// Options from loaded configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            activity_limit: ActivityLimit::AtMost(config.planner.max_activities as usize),
            scope: PredictionScope {
                subject: config.prediction.subject.clone(),
                horizon_days: config.prediction.horizon_days,
            },
        }
    }

    /// Cap the plan at `max_activities` skills.
    pub fn with_max_activities(self, max_activities: usize) -> Self {
        self.with_activity_limit(ActivityLimit::AtMost(max_activities))
    }

    /// Replace the activity limit.
    pub fn with_activity_limit(mut self, activity_limit: ActivityLimit) -> Self {
        self.activity_limit = activity_limit;
        self
    }

    /// Apply the request's `options.max_activities` override, if any.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` if the override is not integer-convertible.
    pub fn for_request(self, request: &DiagnosticRequest) -> Result<Self> {
        Ok(match request.max_activities_override()? {
            Some(limit) => self.with_activity_limit(limit),
            None => self,
        })
    }
}

/// Run the deterministic part of the pipeline.
pub fn evaluate(responses: &[ResponseItem], options: &DiagnosticOptions) -> Diagnosis {
    let ledger = SkillLedger::from_responses(responses);
    let degraded = ledger.degraded_items();
    let mastery_vector = ledger.into_mastery(&BetaPrior::UNIFORM);

    let gaps = classify_gaps(&mastery_vector);
    let selected = options.activity_limit.resolve(mastery_vector.len());
    let curriculum_plan = curriculum::plan(&mastery_vector, selected);
    let prediction = predict(&mastery_vector, &options.scope);
    let confidence_score = confidence_score(&mastery_vector);

    tracing::debug!(
        responses = responses.len(),
        skills = mastery_vector.len(),
        degraded,
        "mastery estimated"
    );

    Diagnosis {
        mastery_vector,
        gaps,
        curriculum_plan,
        predictions: vec![prediction],
        confidence_score,
    }
}

/// Run the full pipeline for a validated request.
///
/// The caller resolves `options` (including any request override) first;
/// from here on nothing can fail.
pub fn diagnose(request: &DiagnosticRequest, options: &DiagnosticOptions) -> DiagnosticEnvelope {
    let started = Instant::now();
    let diagnosis = evaluate(&request.responses, options);
    let envelope = DiagnosticEnvelope::assemble(diagnosis, started);

    tracing::info!(
        primary_id = %envelope.primary_id,
        assessment_id = %request.assessment_id,
        student_id = %request.student_id,
        skills = envelope.main_response.content.mastery_vector.len(),
        gaps = envelope.main_response.content.gaps.len(),
        band = %envelope.prediction().map(|p| p.band.as_str()).unwrap_or("-"),
        processing_ms = envelope.performance_metrics.processing_ms,
        "diagnosis complete"
    );

    envelope
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{AnswerValue, ItemType};
    use crate::stats::{Band, Gap, MasteryEntry, Objective, Severity};
    use serde_json::json;

    fn mcq(id: &str, answer: &str, skills: &[&str]) -> ResponseItem {
        ResponseItem::new(
            id,
            ItemType::Mcq,
            AnswerValue::text(answer),
            AnswerValue::text("B"),
        )
        .with_skills(skills.iter().copied())
    }

    fn sample_responses() -> Vec<ResponseItem> {
        vec![
            mcq("q1", "B", &["algebra.1"]),
            mcq("q2", "A", &["geometry.2"]),
            ResponseItem::new(
                "q3",
                ItemType::Numeric,
                AnswerValue::text("12.0004"),
                AnswerValue::Number(12.0),
            )
            .with_skills(["algebra.1", "arith.3"]),
            ResponseItem::new(
                "q4",
                ItemType::Msq,
                AnswerValue::choices(["a", "c"]),
                AnswerValue::choices(["a", "b", "c"]),
            )
            .with_skills(["geometry.2"]),
            ResponseItem::new(
                "q5",
                ItemType::Long,
                AnswerValue::text("Photosynthesis converts light"),
                AnswerValue::text("light"),
            )
            .with_skills(["bio.1"]),
            ResponseItem::new(
                "q6",
                ItemType::parse("hotspot"),
                AnswerValue::text("x"),
                AnswerValue::text("x"),
            )
            .with_skills(["bio.1"]),
        ]
    }

    #[test]
    fn test_single_mcq_end_to_end() {
        let request = DiagnosticRequest::new("quiz", "s1", vec![mcq("q1", "B", &["algebra.1"])]);
        let envelope = diagnose(&request, &DiagnosticOptions::default());
        let content = &envelope.main_response.content;

        assert_eq!(
            content.mastery_vector,
            vec![MasteryEntry {
                skill_id: "algebra.1".to_string(),
                score: 0.667,
                uncertainty: 0.055556,
            }]
        );
        assert_eq!(
            content.gaps,
            vec![Gap {
                skill_id: "algebra.1".to_string(),
                severity: Severity::Med,
            }]
        );
        assert_eq!(
            content.curriculum_plan.objectives,
            vec![Objective {
                id: "o1".to_string(),
                skill_id: "algebra.1".to_string(),
                target_score: 0.85,
            }]
        );
        let prediction = envelope.prediction().unwrap();
        assert_eq!(prediction.prob_pass, 0.667);
        assert_eq!(prediction.band, Band::C);
        assert_eq!(envelope.main_response.confidence_score, 0.944);
    }

    #[test]
    fn test_empty_responses() {
        let diagnosis = evaluate(&[], &DiagnosticOptions::default());

        assert!(diagnosis.mastery_vector.is_empty());
        assert!(diagnosis.gaps.is_empty());
        assert!(diagnosis.curriculum_plan.objectives.is_empty());
        assert!(diagnosis.curriculum_plan.activities.is_empty());
        assert_eq!(diagnosis.predictions.len(), 1);
        assert_eq!(diagnosis.predictions[0].prob_pass, 0.0);
        assert_eq!(diagnosis.predictions[0].band, Band::D);
        assert_eq!(diagnosis.confidence_score, 1.0);
    }

    #[test]
    fn test_mixed_item_types() {
        let diagnosis = evaluate(&sample_responses(), &DiagnosticOptions::default());

        let scores: Vec<(&str, f64)> = diagnosis
            .mastery_vector
            .iter()
            .map(|m| (m.skill_id.as_str(), m.score))
            .collect();
        // algebra.1: 2/2 -> 3/4; geometry.2: 0 + 2/3 over 2 -> 0.417;
        // arith.3: 1/1 -> 0.667; bio.1: 1 + 0 over 2 -> 0.5
        assert_eq!(
            scores,
            vec![
                ("algebra.1", 0.75),
                ("geometry.2", 0.417),
                ("arith.3", 0.667),
                ("bio.1", 0.5),
            ]
        );

        let plan_order: Vec<&str> = diagnosis
            .curriculum_plan
            .objectives
            .iter()
            .map(|o| o.skill_id.as_str())
            .collect();
        assert_eq!(plan_order, vec!["geometry.2", "bio.1", "arith.3", "algebra.1"]);

        let severities: Vec<Severity> = diagnosis.gaps.iter().map(|g| g.severity).collect();
        assert_eq!(
            severities,
            vec![Severity::Low, Severity::High, Severity::Med, Severity::Med]
        );

        // (0.75 + 0.417 + 0.667 + 0.5) / 4 = 0.5835
        assert_eq!(diagnosis.predictions[0].band, Band::C);
    }

    #[test]
    fn test_max_activities_option_limits_plan() {
        let options = DiagnosticOptions::default().with_max_activities(2);
        let diagnosis = evaluate(&sample_responses(), &options);
        assert_eq!(diagnosis.curriculum_plan.objectives.len(), 2);
        assert_eq!(diagnosis.curriculum_plan.activities.len(), 2);
    }

    #[test]
    fn test_for_request_applies_override() {
        let request = DiagnosticRequest::new("quiz", "s1", sample_responses())
            .with_option("max_activities", json!("1"));
        let options = DiagnosticOptions::default().for_request(&request).unwrap();
        assert_eq!(options.activity_limit, ActivityLimit::AtMost(1));
    }

    #[test]
    fn test_for_request_rejects_bad_override() {
        let request = DiagnosticRequest::new("quiz", "s1", vec![])
            .with_option("max_activities", json!("lots"));
        let err = DiagnosticOptions::default()
            .for_request(&request)
            .unwrap_err();
        assert!(err.is_caller_error());
    }

    #[test]
    fn test_negative_override_drops_strongest_skill() {
        let request = DiagnosticRequest::new("quiz", "s1", sample_responses())
            .with_option("max_activities", json!(-1));
        let options = DiagnosticOptions::default().for_request(&request).unwrap();
        let diagnosis = evaluate(&request.responses, &options);

        let plan_order: Vec<&str> = diagnosis
            .curriculum_plan
            .objectives
            .iter()
            .map(|o| o.skill_id.as_str())
            .collect();
        assert_eq!(plan_order, vec!["geometry.2", "bio.1", "arith.3"]);
    }

    #[test]
    fn test_null_override_is_rejected() {
        let request = DiagnosticRequest::new("quiz", "s1", vec![])
            .with_option("max_activities", serde_json::Value::Null);
        let err = DiagnosticOptions::default()
            .for_request(&request)
            .unwrap_err();
        assert!(err.is_caller_error());
    }

    #[test]
    fn test_for_request_without_override_keeps_config() {
        let request = DiagnosticRequest::new("quiz", "s1", vec![]);
        let options = DiagnosticOptions::default()
            .with_max_activities(7)
            .for_request(&request)
            .unwrap();
        assert_eq!(options.activity_limit, ActivityLimit::AtMost(7));
    }

    #[test]
    fn test_from_config() {
        let mut config = Config::default();
        config.planner.max_activities = 3;
        config.prediction.subject = "physics".to_string();
        config.prediction.horizon_days = 7;

        let options = DiagnosticOptions::from_config(&config);
        assert_eq!(options.activity_limit, ActivityLimit::AtMost(3));
        assert_eq!(options.scope.subject, "physics");
        assert_eq!(options.scope.horizon_days, 7);
    }

    #[test]
    fn test_repeated_runs_are_identical() {
        let request = DiagnosticRequest::new("quiz", "s1", sample_responses());
        let options = DiagnosticOptions::default();

        let first = diagnose(&request, &options);
        let second = diagnose(&request, &options);

        assert_eq!(first.diagnosis(), second.diagnosis());
        assert_ne!(first.primary_id, second.primary_id);
    }

    #[test]
    fn test_concurrent_runs_do_not_share_state() {
        let responses = sample_responses();
        let expected = evaluate(&responses, &DiagnosticOptions::default());

        let results: Vec<Diagnosis> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| scope.spawn(|| evaluate(&responses, &DiagnosticOptions::default())))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        for result in results {
            assert_eq!(result, expected);
        }
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn arb_item() -> impl Strategy<Value = ResponseItem> {
            (
                prop_oneof![Just("A"), Just("B"), Just("C")],
                prop::collection::vec(prop_oneof![Just("s1"), Just("s2"), Just("s3")], 0..3),
            )
                .prop_map(|(answer, skills)| mcq("q", answer, &skills))
        }

        proptest! {
            // Property: evaluation is a pure function of its input
            #[test]
            fn prop_evaluate_idempotent(items in prop::collection::vec(arb_item(), 0..20)) {
                let options = DiagnosticOptions::default();
                prop_assert_eq!(evaluate(&items, &options), evaluate(&items, &options));
            }

            // Property: gaps never include sufficient skills
            #[test]
            fn prop_gaps_exclude_sufficient(items in prop::collection::vec(arb_item(), 0..20)) {
                let diagnosis = evaluate(&items, &DiagnosticOptions::default());
                for gap in &diagnosis.gaps {
                    let entry = diagnosis
                        .mastery_vector
                        .iter()
                        .find(|m| m.skill_id == gap.skill_id)
                        .unwrap();
                    prop_assert!(entry.score < 0.85);
                }
            }
        }
    }
}
