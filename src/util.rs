//! Utility functions for SkillGap.
//!
//! This module provides common utilities used across SkillGap modules.

use std::fs;
use std::io::Read;
use std::path::Path;

use crate::error::{Result, SkillGapError};

/// Maximum request size that can be read into memory (10 MB).
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024; // 10 MB

/// Round to a number of decimal places.
///
/// Rounds on the exact decimal expansion of the value rather than on a
/// scaled product, so `x * 10^places` error cannot push a value across a
/// rounding boundary.
pub fn round_to(value: f64, places: u32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    format!("{:.*}", places as usize, value)
        .parse()
        .unwrap_or(value)
}

/// Read a file into a string with size limit protection.
///
/// # Errors
///
/// Returns an error if:
/// * The file cannot be read (doesn't exist, permission denied, etc.)
/// * The file exceeds `MAX_FILE_SIZE`
pub fn read_to_string_limited(path: &Path) -> Result<String> {
    read_to_string_with_limit(path, MAX_FILE_SIZE)
}

/// Read a file into a string with a custom size limit.
///
/// # Errors
///
/// Returns an error if the file exceeds `max_size` or cannot be read.
pub fn read_to_string_with_limit(path: &Path, max_size: u64) -> Result<String> {
    let metadata = fs::metadata(path).map_err(|e| SkillGapError::storage(path, e))?;

    let size = metadata.len();
    if size > max_size {
        return Err(SkillGapError::invalid_request(format!(
            "request file {} is too large ({} bytes, max {} bytes)",
            path.display(),
            size,
            max_size
        )));
    }

    fs::read_to_string(path).map_err(|e| SkillGapError::storage(path, e))
}

/// Read a reader to the end with a size limit.
///
/// Reads at most one byte past the limit to detect oversize input.
pub fn read_limited<R: Read>(reader: R, max_size: u64) -> Result<String> {
    let mut buf = String::new();
    reader
        .take(max_size + 1)
        .read_to_string(&mut buf)
        .map_err(|e| SkillGapError::storage("stdin", e))?;

    if buf.len() as u64 > max_size {
        return Err(SkillGapError::invalid_request(format!(
            "request is too large (max {} bytes)",
            max_size
        )));
    }
    Ok(buf)
}
