//! Input validation utilities.
//!
//! Centralized validation helpers used by the service layer before any
//! state is touched.

use validator::Validate;

/// Human-readable aggregate of field validation errors.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct ValidationFailure(pub String);

/// Validate a request carrier, returning a [`ValidationFailure`] on failure.
pub fn validate_request<T: Validate>(body: &T) -> Result<(), ValidationFailure> {
    body.validate().map_err(|e| ValidationFailure(format_validation_errors(e)))
}

/// Format validation errors into a human-readable string.
fn format_validation_errors(errors: validator::ValidationErrors) -> String {
    errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value for '{field}'"))
            })
        })
        .collect::<Vec<_>>()
        .join("; ")
}
