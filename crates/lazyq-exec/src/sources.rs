//! Source rows from JSON: a top-level array of flat objects.
//!
//! Values map onto `Scalar` (null, bool, integer, float, string, list);
//! nested objects are rejected.

use std::path::Path;

use lazyq_core::types::Record;

use crate::runtime::ExecError;

pub fn parse_json_rows(name: &str, text: &str) -> Result<Vec<Record>, ExecError> {
    serde_json::from_str(text).map_err(|e| ExecError::Load {
        name: name.to_string(),
        reason: e.to_string(),
    })
}

pub fn load_json_file(name: &str, path: &Path) -> Result<Vec<Record>, ExecError> {
    let text = std::fs::read_to_string(path).map_err(|e| ExecError::Load {
        name: name.to_string(),
        reason: format!("{}: {e}", path.display()),
    })?;
    parse_json_rows(name, &text)
}

/// Enforce `max_source_rows`.
pub fn check_row_cap(name: &str, rows: usize, limit: Option<usize>) -> Result<(), ExecError> {
    match limit {
        Some(limit) if rows > limit => Err(ExecError::TooManyRows {
            name: name.to_string(),
            rows,
            limit,
        }),
        _ => Ok(()),
    }
}
