//! skillgap - skill-gap diagnostics for assessment responses
//!
//! Scores each response item, estimates per-skill mastery with a
//! Beta-Binomial posterior, classifies gaps, plans remediation and predicts
//! a pass outcome. Results are wrapped in a fixed JSON envelope.
//!
//! ```ignore
//! use skillgap::{diagnose, DiagnosticOptions, DiagnosticRequest};
//!
//! let request = DiagnosticRequest::from_json(body)?;
//! let options = DiagnosticOptions::default().for_request(&request)?;
//! let envelope = diagnose(&request, &options);
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod logging;
pub mod stats;
pub mod util;

pub use config::Config;
pub use core::{
    diagnose, evaluate, AnswerValue, DiagnosticEnvelope, DiagnosticOptions, DiagnosticRequest,
    Diagnosis, ItemType, ResponseItem,
};
pub use error::{FailOpen, Result, SkillGapError};
pub use stats::{
    classify_gaps, compute_credit, confidence_score, estimate_mastery, plan_curriculum, predict,
    Band, CurriculumPlan, Gap, MasteryEntry, Prediction, PredictionScope, Severity,
};

// CLI commands
pub use cli::{DiagnoseCommand, HealthCommand, InitCommand};
