//! Observable request lifecycle state.

use serde::Deserialize;

/// The lifecycle state of one call site's most recent request.
///
/// Transitions `idle → loading → (success | failed)`. Exactly one of
/// `is_loading`, `is_success`, `is_failed` is set outside the idle state.
#[derive(Debug, Clone)]
pub struct ResponseState<T> {
    /// The decoded response payload, set on success.
    pub data: Option<T>,
    /// The server's structured failure payload, when it sent one.
    pub error: Option<ErrorBody>,
    /// Human-readable failure message.
    pub message: Option<String>,
    /// The HTTP status of the last completed response.
    pub status_code: Option<u16>,
    /// A request is in flight.
    pub is_loading: bool,
    /// The last request completed successfully.
    pub is_success: bool,
    /// The last request failed.
    pub is_failed: bool,
}

impl<T> ResponseState<T> {
    /// The initial state before any request has been sent.
    pub fn idle() -> Self {
        Self {
            data: None,
            error: None,
            message: None,
            status_code: None,
            is_loading: false,
            is_success: false,
            is_failed: false,
        }
    }
}

impl<T> Default for ResponseState<T> {
    fn default() -> Self {
        Self::idle()
    }
}

/// Structured failure payload returned by the API.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    /// Machine-readable error code.
    pub code: Option<i64>,
    /// Human-readable message.
    pub message: Option<String>,
    /// Per-field validation failures.
    #[serde(default)]
    pub details: Vec<FieldError>,
}

/// A validation failure attached to a single field.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldError {
    /// The field the failure applies to.
    pub field: String,
    /// What is wrong with it.
    pub message: String,
}
