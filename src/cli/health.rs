//! Health command for skillgap.
//!
//! Liveness only; no computation runs.

use serde::{Deserialize, Serialize};

/// Status reported by a live process.
pub const STATUS_OK: &str = "ok";

/// Options for the health command.
#[derive(Debug, Clone, Default)]
pub struct HealthOptions {
    /// Output as JSON.
    pub json: bool,
}

/// Output format for the health command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthOutput {
    /// Liveness status.
    pub status: String,
}

/// The health command implementation.
#[derive(Debug, Default)]
pub struct HealthCommand;

impl HealthCommand {
    /// Create a new health command.
    pub fn new() -> Self {
        Self
    }

    /// Run the health command.
    pub fn run(&self) -> HealthOutput {
        HealthOutput {
            status: STATUS_OK.to_string(),
        }
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &HealthOutput, options: &HealthOptions) -> String {
        if options.json {
            serde_json::to_string(output).unwrap_or_else(|_| "{}".to_string())
        } else {
            format!("{}\n", output.status)
        }
    }
}
