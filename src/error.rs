//! Unified error types for SkillGap.
//!
//! The scoring core never fails: malformed answers degrade to zero credit
//! inside the credit scorer. Errors only arise at the edges (reading the
//! request, validating its shape, loading configuration). Configuration
//! problems are fail-open: they are logged and replaced with defaults so a
//! broken config file never blocks a diagnosis.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for SkillGap operations.
#[derive(Error, Debug)]
pub enum SkillGapError {
    /// I/O errors reading requests or writing config files.
    #[error("storage error at {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// JSON or TOML parsing/serialization errors.
    #[error("serialization error: {message}")]
    Serde { message: String },

    /// Configuration loading errors.
    #[error("config error: {message}")]
    Config { message: String },

    /// The request broke the caller contract (shape or option coercion).
    #[error("invalid request: {message}")]
    InvalidRequest { message: String },
}

/// A specialized Result type for SkillGap operations.
pub type Result<T> = std::result::Result<T, SkillGapError>;

impl SkillGapError {
    /// Create a storage error from an I/O error.
    pub fn storage(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            source,
        }
    }

    /// Create a serialization error.
    pub fn serde(message: impl Into<String>) -> Self {
        Self::Serde {
            message: message.into(),
        }
    }

    /// Create a config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid request error.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Whether the caller is at fault (as opposed to the environment).
    pub fn is_caller_error(&self) -> bool {
        matches!(self, Self::InvalidRequest { .. })
    }
}

impl From<io::Error> for SkillGapError {
    fn from(err: io::Error) -> Self {
        Self::Storage {
            path: PathBuf::new(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for SkillGapError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde {
            message: err.to_string(),
        }
    }
}

/// Trait for fail-open error handling.
///
/// Logs the error as a warning and substitutes a safe value.
pub trait FailOpen<T> {
    /// Handle an error by logging a warning and returning the default value.
    fn fail_open_default(self, context: &str) -> T
    where
        T: Default;

    /// Handle an error by logging a warning and returning the provided fallback.
    fn fail_open_with(self, context: &str, fallback: T) -> T;
}

impl<T> FailOpen<T> for Result<T> {
    fn fail_open_default(self, context: &str) -> T
    where
        T: Default,
    {
        match self {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!("{}: {} (fail-open: using default)", context, err);
                T::default()
            }
        }
    }

    fn fail_open_with(self, context: &str, fallback: T) -> T {
        match self {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!("{}: {} (fail-open: using fallback)", context, err);
                fallback
            }
        }
    }
}

/// Exit codes for the SkillGap CLI.
pub mod exit_codes {
    /// The command completed.
    pub const SUCCESS: i32 = 0;

    /// The command failed for an environmental reason (I/O, config).
    pub const FAILURE: i32 = 1;

    /// The request was rejected before the pipeline ran.
    pub const INVALID_REQUEST: i32 = 2;

    /// The process panicked.
    pub const CRASH: i32 = 3;
}
