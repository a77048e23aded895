//! Request and row shapes for the collections exposed over HTTP.

pub mod activity_log;
pub mod field_report;
pub mod profile;
pub mod project;
pub mod vba;

use crate::error::FieldcheckError;

/// Trimmed, non-empty text or a validation error naming the field.
pub(crate) fn require_text(field: &str, value: Option<String>) -> Result<String, FieldcheckError> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(FieldcheckError::Validation(format!("{field} is required"))),
    }
}
