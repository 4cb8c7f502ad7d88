//! Validation error types returned when a client request falls outside the
//! enumerated `(period, hotel, room)` domain.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The set of messages that apply to a single rejected field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Name of the offending field (`"period"`, `"hotel"`, or `"room"`).
    pub field: String,
    /// Human-readable messages, one per violated rule.
    pub messages: Vec<String>,
}

impl FieldError {
    /// Construct a single-message field error.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            messages: vec![message.into()],
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.messages.join(" "))
    }
}

impl std::error::Error for FieldError {}

/// The full set of field-level errors for one rejected request.
///
/// A request is rejected as soon as any one of `period`, `hotel`, `room`
/// fails to parse; all three are validated independently so a caller sees
/// every offending field at once rather than one at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("request failed validation: {}", self.summary())]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    /// Build an empty error set.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// True if no field errors have been recorded.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Record one field's error.
    pub fn push(&mut self, error: FieldError) {
        self.0.push(error);
    }

    fn summary(&self) -> String {
        self.0
            .iter()
            .map(|e| e.field.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Default for ValidationErrors {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_errors_has_no_summary() {
        assert!(ValidationErrors::new().is_empty());
    }

    #[test]
    fn push_accumulates_fields() {
        let mut errs = ValidationErrors::new();
        errs.push(FieldError::new("period", "bad period"));
        errs.push(FieldError::new("hotel", "bad hotel"));
        assert_eq!(errs.0.len(), 2);
        assert!(!errs.is_empty());
    }
}
