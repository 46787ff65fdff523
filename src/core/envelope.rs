//! Result envelope for a diagnostic run.
//!
//! The envelope shape is fixed: callers read `main_response.content` for the
//! diagnosis and the surrounding blocks for identity, timing and provenance.

use std::time::Instant;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::stats::{CurriculumPlan, Gap, MasteryEntry, Prediction};

/// Model identifier reported in `system_metadata`.
pub const MODEL_INFO: &str = "baseline-beta-binomial";

/// Strategy identifier reported in `system_metadata`.
pub const STRATEGY_INFO: &str = "mvp";

/// Metadata key for the alignment version.
pub const ALIGNMENT_VERSION_KEY: &str = "alignment_version";

/// Alignment version value.
pub const ALIGNMENT_VERSION: &str = "v1";

/// The deterministic part of a diagnosis.
///
/// Identical responses and options always produce an identical `Diagnosis`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnosis {
    /// Per-skill mastery in first-encounter order.
    pub mastery_vector: Vec<MasteryEntry>,
    /// Skills below the sufficiency threshold.
    pub gaps: Vec<Gap>,
    /// Remediation plan.
    pub curriculum_plan: CurriculumPlan,
    /// Pass predictions (always exactly one).
    pub predictions: Vec<Prediction>,
    /// Overall confidence in [0, 1].
    pub confidence_score: f64,
}

/// A key/value metadata pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataEntry {
    /// Key.
    pub key: String,
    /// Value.
    pub value: String,
}

impl MetadataEntry {
    /// Create a metadata entry.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Diagnosis payload inside the main response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticContent {
    /// Per-skill mastery in first-encounter order.
    pub mastery_vector: Vec<MasteryEntry>,
    /// Skills below the sufficiency threshold.
    pub gaps: Vec<Gap>,
    /// Remediation plan.
    pub curriculum_plan: CurriculumPlan,
    /// Exactly one pass prediction.
    pub predictions: Vec<Prediction>,
}

/// The main response block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MainResponse {
    /// The diagnosis itself.
    pub content: DiagnosticContent,
    /// Holds only the alignment version.
    pub metadata: Vec<MetadataEntry>,
    /// Overall confidence in [0, 1].
    pub confidence_score: f64,
    /// Always empty.
    pub uncertainty_factors: Vec<String>,
}

/// Timing and cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// Same as `processing_ms`.
    pub latency_ms: u64,
    /// Wall-clock time from pipeline start to assembly.
    pub processing_ms: u64,
    /// Always 0.0 (no metered resources).
    pub cost_units: f64,
}

/// Provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemMetadata {
    /// Always [`MODEL_INFO`].
    pub model_info: String,
    /// Always [`STRATEGY_INFO`].
    pub strategy_info: String,
    /// ISO-8601 UTC with a trailing `Z`.
    pub timestamp: String,
}

/// The full response envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticEnvelope {
    /// Fresh identifier for this run.
    pub primary_id: String,
    /// Diagnosis payload with confidence.
    pub main_response: MainResponse,
    /// Always empty.
    pub supporting_data: Vec<serde_json::Value>,
    /// Timing and cost.
    pub performance_metrics: PerformanceMetrics,
    /// Model, strategy and timestamp.
    pub system_metadata: SystemMetadata,
}

impl DiagnosticEnvelope {
    /// Wrap a diagnosis, stamping id, timing and timestamp.
    ///
    /// `started` marks the beginning of the pipeline.
    pub fn assemble(diagnosis: Diagnosis, started: Instant) -> Self {
        let Diagnosis {
            mastery_vector,
            gaps,
            curriculum_plan,
            predictions,
            confidence_score,
        } = diagnosis;

        let processing_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        Self {
            primary_id: Uuid::new_v4().to_string(),
            main_response: MainResponse {
                content: DiagnosticContent {
                    mastery_vector,
                    gaps,
                    curriculum_plan,
                    predictions,
                },
                metadata: vec![MetadataEntry::new(ALIGNMENT_VERSION_KEY, ALIGNMENT_VERSION)],
                confidence_score,
                uncertainty_factors: Vec::new(),
            },
            supporting_data: Vec::new(),
            performance_metrics: PerformanceMetrics {
                latency_ms: processing_ms,
                processing_ms,
                cost_units: 0.0,
            },
            system_metadata: SystemMetadata {
                model_info: MODEL_INFO.to_string(),
                strategy_info: STRATEGY_INFO.to_string(),
                timestamp: Utc::now().format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string(),
            },
        }
    }

    /// The deterministic part of this envelope.
    pub fn diagnosis(&self) -> Diagnosis {
        let content = &self.main_response.content;
        Diagnosis {
            mastery_vector: content.mastery_vector.clone(),
            gaps: content.gaps.clone(),
            curriculum_plan: content.curriculum_plan.clone(),
            predictions: content.predictions.clone(),
            confidence_score: self.main_response.confidence_score,
        }
    }

    /// The single prediction.
    pub fn prediction(&self) -> Option<&Prediction> {
        self.main_response.content.predictions.first()
    }

    /// Pretty-printed JSON, as written by `diagnose --json`.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::{curriculum, Band, Severity};

    fn sample_diagnosis() -> Diagnosis {
        let mastery_vector = vec![MasteryEntry {
            skill_id: "algebra.1".to_string(),
            score: 0.667,
            uncertainty: 0.055556,
        }];
        Diagnosis {
            gaps: vec![Gap {
                skill_id: "algebra.1".to_string(),
                severity: Severity::Med,
            }],
            curriculum_plan: curriculum::plan(&mastery_vector, 5),
            predictions: vec![Prediction {
                subject: "general".to_string(),
                horizon_days: 30,
                prob_pass: 0.667,
                band: Band::C,
            }],
            confidence_score: 0.944,
            mastery_vector,
        }
    }

    #[test]
    fn test_assemble_fixed_fields() {
        let envelope = DiagnosticEnvelope::assemble(sample_diagnosis(), Instant::now());

        assert_eq!(
            envelope.main_response.metadata,
            vec![MetadataEntry::new("alignment_version", "v1")]
        );
        assert!(envelope.main_response.uncertainty_factors.is_empty());
        assert!(envelope.supporting_data.is_empty());
        assert_eq!(envelope.performance_metrics.cost_units, 0.0);
        assert_eq!(
            envelope.performance_metrics.latency_ms,
            envelope.performance_metrics.processing_ms
        );
        assert_eq!(envelope.system_metadata.model_info, "baseline-beta-binomial");
        assert_eq!(envelope.system_metadata.strategy_info, "mvp");
    }

    #[test]
    fn test_assemble_stamps_unique_ids() {
        let a = DiagnosticEnvelope::assemble(sample_diagnosis(), Instant::now());
        let b = DiagnosticEnvelope::assemble(sample_diagnosis(), Instant::now());
        assert_ne!(a.primary_id, b.primary_id);
        assert!(Uuid::parse_str(&a.primary_id).is_ok());
    }

    #[test]
    fn test_timestamp_is_utc_iso8601() {
        let envelope = DiagnosticEnvelope::assemble(sample_diagnosis(), Instant::now());
        let ts = &envelope.system_metadata.timestamp;
        assert!(ts.ends_with('Z'));
        assert!(chrono::NaiveDateTime::parse_from_str(ts, "%Y-%m-%dT%H:%M:%S%.fZ").is_ok());
    }

    #[test]
    fn test_diagnosis_roundtrip_through_envelope() {
        let diagnosis = sample_diagnosis();
        let envelope = DiagnosticEnvelope::assemble(diagnosis.clone(), Instant::now());
        assert_eq!(envelope.diagnosis(), diagnosis);
        assert_eq!(envelope.prediction().map(|p| p.band), Some(Band::C));
    }

    #[test]
    fn test_envelope_json_shape() {
        let envelope = DiagnosticEnvelope::assemble(sample_diagnosis(), Instant::now());
        let json = serde_json::to_value(&envelope).unwrap();

        let content = &json["main_response"]["content"];
        assert_eq!(content["mastery_vector"][0]["score"], 0.667);
        assert_eq!(content["gaps"][0]["severity"], "med");
        assert_eq!(content["curriculum_plan"]["objectives"][0]["id"], "o1");
        assert_eq!(content["curriculum_plan"]["activities"][0]["estimated_minutes"], 30);
        assert_eq!(content["predictions"][0]["band"], "C");
        assert_eq!(json["main_response"]["confidence_score"], 0.944);
        assert_eq!(json["performance_metrics"]["cost_units"], 0.0);
        assert!(json["supporting_data"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_to_json_pretty_parses_back() {
        let envelope = DiagnosticEnvelope::assemble(sample_diagnosis(), Instant::now());
        let text = envelope.to_json_pretty().unwrap();

        assert!(text.contains("\n  \"primary_id\""));
        let parsed: DiagnosticEnvelope = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, envelope);
    }
}
