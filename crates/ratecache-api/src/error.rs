//! RFC 7807 problem-document error handling.
//!
//! The engine and validation layers never leak internal detail (stack
//! traces, raw Redis/HTTP errors) across this boundary — `ApiError` is the
//! narrow, already-sanitized surface described in spec §7.

use std::collections::HashMap;

use axum::http::StatusCode;
use ratecache_domain::ValidationErrors;
use ratecache_engine::EngineError;
use serde::Serialize;

/// The RFC 7807 problem document returned for every non-2xx response.
#[derive(Debug, Clone, Serialize)]
pub struct ProblemDetails {
    /// A URI identifying the problem type.
    #[serde(rename = "type")]
    pub problem_type: String,
    /// A short, human-readable summary of the problem.
    pub title: String,
    /// The request path (and query) that produced this problem.
    pub instance: String,
    /// Correlation id for this request, for cross-referencing logs.
    #[serde(rename = "traceId")]
    pub trace_id: String,
    /// Field name -> messages, present only for validation failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<HashMap<String, Vec<String>>>,
}

/// The errors this core's request handler (C7) can emit, already mapped to
/// an HTTP status and an RFC 7807 shape.
#[derive(Debug)]
pub enum ApiError {
    /// One or more query parameters fell outside their enumerated domain.
    Validation(ValidationErrors),
    /// The engine could not produce an answer (quota exhausted, or lock
    /// contention exhausted retries).
    ServiceUnavailable(EngineError),
    /// Anything else unexpected. Never carries internal detail outward.
    Internal,
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        ApiError::ServiceUnavailable(err)
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(err: ValidationErrors) -> Self {
        ApiError::Validation(err)
    }
}

impl ApiError {
    /// The HTTP status this error renders as.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::ServiceUnavailable(_) | ApiError::Internal => {
                StatusCode::SERVICE_UNAVAILABLE
            }
        }
    }

    fn problem_type(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "https://ratecache.example/problems/validation-error",
            ApiError::ServiceUnavailable(EngineError::NoQuota) => {
                "https://ratecache.example/problems/quota-exhausted"
            }
            ApiError::ServiceUnavailable(EngineError::LockUnavailable) => {
                "https://ratecache.example/problems/lock-unavailable"
            }
            ApiError::Internal => "https://ratecache.example/problems/internal-error",
        }
    }

    fn title(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "Validation Failed",
            ApiError::ServiceUnavailable(_) | ApiError::Internal => {
                "Service Temporarily Unavailable"
            }
        }
    }

    fn field_errors(&self) -> Option<HashMap<String, Vec<String>>> {
        match self {
            ApiError::Validation(errors) => {
                let mut by_field: HashMap<String, Vec<String>> = HashMap::new();
                for field_error in &errors.0 {
                    by_field
                        .entry(field_error.field.clone())
                        .or_default()
                        .extend(field_error.messages.clone());
                }
                Some(by_field)
            }
            ApiError::ServiceUnavailable(_) | ApiError::Internal => None,
        }
    }

    /// Render this error as the problem document for a given request.
    pub fn to_problem(&self, instance: impl Into<String>, trace_id: impl Into<String>) -> ProblemDetails {
        ProblemDetails {
            problem_type: self.problem_type().to_string(),
            title: self.title().to_string(),
            instance: instance.into(),
            trace_id: trace_id.into(),
            errors: self.field_errors(),
        }
    }
}
