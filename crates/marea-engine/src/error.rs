//! # Engine Error Types
//!
//! Error surface of the engine crate: transport failures from the
//! [`ApiClient`](crate::ports::ApiClient) port and the submission
//! protocol's own failure modes.
//!
//! ## Error Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  ApiFailure      transport-level: HTTP status or network error     │
//! │  EngineError     protocol-level: blocked, in flight, serialization │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use marea_core::{CartError, PaymentIssue, SubmitBlock};

// =============================================================================
// Transport Failures
// =============================================================================

/// Failure reported by the [`ApiClient`](crate::ports::ApiClient) port.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiFailure {
    /// The server answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// The request never produced a response (DNS, refused, timeout).
    #[error("Network error: {0}")]
    Network(String),
}

impl ApiFailure {
    /// HTTP status code, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiFailure::Status { status, .. } => Some(*status),
            ApiFailure::Network(_) => None,
        }
    }

    /// Whether this failure means the session is no longer valid.
    /// Exactly 401: a 403 is an authorization problem, not an expired
    /// session.
    pub fn is_session_expired(&self) -> bool {
        self.status() == Some(401)
    }

    /// Whether a retry could plausibly succeed. Auth failures (401/403)
    /// are never retried: replaying a rejected credential cannot help.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiFailure::Network(_) => true,
            ApiFailure::Status { status, .. } => !matches!(status, 401 | 403),
        }
    }
}

// =============================================================================
// Engine Errors
// =============================================================================

/// Errors surfaced by the engine's workflows.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Pre-submit revalidation found violations. The sale state is
    /// untouched.
    #[error("Submission blocked by {} validation issue(s)", .0.len())]
    Blocked(Vec<SubmitBlock>),

    /// Payment validation found problems with the selected method.
    #[error("Payment is incomplete: {} issue(s)", .0.len())]
    Payment(Vec<PaymentIssue>),

    /// A submission for this terminal is already running.
    #[error("A submission is already in progress")]
    SubmissionInFlight,

    /// The product id is not present in the injected catalog.
    #[error("Unknown product: {0}")]
    UnknownProduct(String),

    /// A cart edit violated an item invariant.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// Transport failure from the API port.
    #[error(transparent)]
    Api(#[from] ApiFailure),

    /// Payload or response (de)serialization failed.
    #[error("Serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;

// =============================================================================
// Unit Tests
// =============================================================================
