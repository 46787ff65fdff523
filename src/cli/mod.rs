//! CLI commands for skillgap.
//!
//! Each command follows the same shape: `run` produces a serializable
//! output and `format_output` renders it as JSON, human-readable text, or
//! nothing (quiet).

pub mod diagnose;
pub mod health;
pub mod init;

pub use diagnose::{DiagnoseCommand, DiagnoseOptions, DiagnoseOutput};
pub use health::{HealthCommand, HealthOptions, HealthOutput};
pub use init::{InitCommand, InitOptions, InitOutput};
