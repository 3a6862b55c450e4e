//! Shared helpers for command handlers.

use std::path::Path;

use serde_json::Value;

use crate::error::CliError;

/// Parse a `--data` argument: inline JSON, or `@path` to a JSON file.
pub fn read_data(arg: &str) -> Result<Value, CliError> {
    let text = match arg.strip_prefix('@') {
        Some(path) => read_file(Path::new(path))?,
        None => arg.to_owned(),
    };
    let value: Value = serde_json::from_str(&text).map_err(|e| CliError::Validation {
        field: "data".into(),
        reason: format!("invalid JSON: {e}"),
    })?;
    if !value.is_object() {
        return Err(CliError::Validation {
            field: "data".into(),
            reason: "expected a JSON object".into(),
        });
    }
    Ok(value)
}

fn read_file(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|e| CliError::Validation {
        field: "data".into(),
        reason: format!("cannot read {}: {e}", path.display()),
    })
}

/// Map a dialoguer / interactive I/O failure into CliError.
pub fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}
