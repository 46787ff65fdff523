//! Diagnose command for skillgap.
//!
//! Reads a diagnostic request (file or stdin), runs the pipeline and prints
//! either a human-readable report or the full JSON envelope.

use serde::{Deserialize, Serialize};
use std::io;
use std::path::PathBuf;

use crate::config::Config;
use crate::core::{diagnose, DiagnosticEnvelope, DiagnosticOptions, DiagnosticRequest};
use crate::error::{exit_codes, FailOpen, Result, SkillGapError};
use crate::util::{read_limited, read_to_string_limited, MAX_FILE_SIZE};

/// Options for the diagnose command.
#[derive(Debug, Clone, Default)]
pub struct DiagnoseOptions {
    /// Output the envelope as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
    /// Request file; stdin when absent.
    pub input: Option<PathBuf>,
    /// Activity cap; wins over the request's own option.
    pub max_activities: Option<usize>,
}

/// Output format for the diagnose command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnoseOutput {
    /// Whether the diagnosis ran.
    pub success: bool,
    /// Assessment the request was for.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assessment_id: Option<String>,
    /// Learner the request was for.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_id: Option<String>,
    /// The result envelope.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub envelope: Option<DiagnosticEnvelope>,
    /// Error message if the diagnosis did not run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Whether the failure was the request's fault.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub rejected: bool,
}

impl DiagnoseOutput {
    /// Create a successful output.
    pub fn success(request: &DiagnosticRequest, envelope: DiagnosticEnvelope) -> Self {
        Self {
            success: true,
            assessment_id: Some(request.assessment_id.clone()),
            student_id: Some(request.student_id.clone()),
            envelope: Some(envelope),
            error: None,
            rejected: false,
        }
    }

    /// Create a failed output.
    pub fn failure(error: &SkillGapError) -> Self {
        Self {
            success: false,
            assessment_id: None,
            student_id: None,
            envelope: None,
            error: Some(error.to_string()),
            rejected: error.is_caller_error(),
        }
    }

    /// Process exit code for this outcome.
    pub fn exit_code(&self) -> i32 {
        if self.success {
            exit_codes::SUCCESS
        } else if self.rejected {
            exit_codes::INVALID_REQUEST
        } else {
            exit_codes::FAILURE
        }
    }
}

/// The diagnose command implementation.
pub struct DiagnoseCommand {
    config: Config,
}

impl DiagnoseCommand {
    /// Create a new diagnose command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Run the diagnose command, reading the request from the configured source.
    pub fn run(&self, options: &DiagnoseOptions) -> DiagnoseOutput {
        match self.read_input(options) {
            Ok(input) => self.run_with_input(&input, options),
            Err(e) => DiagnoseOutput::failure(&e),
        }
    }

    /// Run the diagnose command on a request body.
    pub fn run_with_input(&self, input: &str, options: &DiagnoseOptions) -> DiagnoseOutput {
        let request = match DiagnosticRequest::from_json(input) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!(error = %e, "rejected request");
                return DiagnoseOutput::failure(&e);
            }
        };

        match self.resolve_options(&request, options) {
            Ok(resolved) => {
                let envelope = diagnose(&request, &resolved);
                DiagnoseOutput::success(&request, envelope)
            }
            Err(e) => {
                tracing::warn!(error = %e, assessment_id = %request.assessment_id, "rejected request");
                DiagnoseOutput::failure(&e)
            }
        }
    }

    /// Config, then the request's option, then the command line.
    fn resolve_options(
        &self,
        request: &DiagnosticRequest,
        options: &DiagnoseOptions,
    ) -> Result<DiagnosticOptions> {
        let resolved = DiagnosticOptions::from_config(&self.config).for_request(request)?;
        Ok(match options.max_activities {
            Some(n) => resolved.with_max_activities(n),
            None => resolved,
        })
    }

    fn read_input(&self, options: &DiagnoseOptions) -> Result<String> {
        match &options.input {
            Some(path) => read_to_string_limited(path),
            None => read_limited(io::stdin().lock(), MAX_FILE_SIZE),
        }
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &DiagnoseOutput, options: &DiagnoseOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            let value = match &output.envelope {
                Some(envelope) => envelope.to_json_pretty(),
                None => serde_json::to_string_pretty(output).map_err(SkillGapError::from),
            };
            value.fail_open_with("serializing diagnose output", "{}".to_string())
        } else {
            self.format_human_readable(output)
        }
    }

    /// Format output as human-readable text.
    fn format_human_readable(&self, output: &DiagnoseOutput) -> String {
        let Some(envelope) = output.envelope.as_ref().filter(|_| output.success) else {
            return format!(
                "Diagnosis failed: {}\n",
                output.error.as_deref().unwrap_or("unknown error")
            );
        };

        let main = &envelope.main_response;
        let content = &main.content;
        let mut lines = Vec::new();

        lines.push(format!(
            "Diagnosis for student {} (assessment {})",
            output.student_id.as_deref().unwrap_or("?"),
            output.assessment_id.as_deref().unwrap_or("?")
        ));
        lines.push(format!("  id: {}", envelope.primary_id));
        lines.push(String::new());

        if content.mastery_vector.is_empty() {
            lines.push("Mastery: no skills referenced".to_string());
        } else {
            lines.push("Mastery:".to_string());
            let width = content
                .mastery_vector
                .iter()
                .map(|m| m.skill_id.len())
                .max()
                .unwrap_or(0);
            for m in &content.mastery_vector {
                lines.push(format!(
                    "  {:<width$}  {:.3}  (variance {:.6})",
                    m.skill_id,
                    m.score,
                    m.uncertainty,
                    width = width
                ));
            }
        }
        lines.push(String::new());

        if content.gaps.is_empty() {
            lines.push("Gaps: none".to_string());
        } else {
            lines.push("Gaps:".to_string());
            for gap in &content.gaps {
                lines.push(format!("  [{}] {}", gap.severity, gap.skill_id));
            }
        }
        lines.push(String::new());

        let plan = &content.curriculum_plan;
        if plan.is_empty() {
            lines.push("Plan: nothing to practice".to_string());
        } else {
            lines.push("Plan:".to_string());
            for (objective, activity) in plan.objectives.iter().zip(&plan.activities) {
                lines.push(format!(
                    "  {}. {} -> {:.3} ({}, {} min)",
                    objective.id,
                    objective.skill_id,
                    objective.target_score,
                    activity.label,
                    activity.estimated_minutes
                ));
            }
            lines.push(format!("  {}", plan.rationale));
        }
        lines.push(String::new());

        for prediction in &content.predictions {
            lines.push(format!(
                "Prediction ({}, {} days): pass {:.3}, band {}",
                prediction.subject, prediction.horizon_days, prediction.prob_pass, prediction.band
            ));
        }
        lines.push(format!("Confidence: {:.3}", main.confidence_score));

        lines.join("\n") + "\n"
    }
}
