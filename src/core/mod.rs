//! Core types and logic for skillgap.
//!
//! This module contains the request model, the diagnostic pipeline, and the
//! result envelope the pipeline produces.

pub mod envelope;
pub mod pipeline;
pub mod request;

pub use envelope::{
    DiagnosticContent, DiagnosticEnvelope, Diagnosis, MainResponse, MetadataEntry,
    PerformanceMetrics, SystemMetadata, ALIGNMENT_VERSION, MODEL_INFO, STRATEGY_INFO,
};
pub use pipeline::{diagnose, evaluate, DiagnosticOptions};
pub use request::{AnswerValue, DiagnosticRequest, ItemType, ResponseItem, MAX_ACTIVITIES_OPTION};
