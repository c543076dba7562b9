// ── Core error types ──
//
// Errors surfaced by the coordinator. Consumers never see raw driver
// errors; the `From<hdmatrix_api::Error>` impl folds transport failures
// into coordinator-level variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach matrix: {reason}")]
    ConnectionFailed { reason: String },

    #[error("Matrix connection timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Device errors ────────────────────────────────────────────────
    #[error("Matrix rejected {operation}: {message}")]
    DeviceRejected { operation: String, message: String },

    #[error("Unsupported matrix model: {name}")]
    UnsupportedModel { name: String },

    #[error("Refresh failed: {reason}")]
    RefreshFailed { reason: String },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Validation failed: {message}")]
    Validation { message: String },

    #[error("Coordinator is not ready (bootstrap has not completed)")]
    NotReady,

    #[error("Coordinator has been shut down")]
    Stopped,

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Returns `true` if the failure came from the link rather than from
    /// the caller or the device's answer.
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Self::ConnectionFailed { .. } | Self::Timeout { .. })
    }

    pub(crate) fn rejected(operation: &str) -> Self {
        Self::DeviceRejected {
            operation: operation.into(),
            message: "device returned a negative acknowledgement".into(),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<hdmatrix_api::Error> for CoreError {
    fn from(err: hdmatrix_api::Error) -> Self {
        match err {
            hdmatrix_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            hdmatrix_api::Error::Rejected { message } => CoreError::DeviceRejected {
                operation: "request".into(),
                message,
            },
            hdmatrix_api::Error::Protocol { message } => {
                CoreError::Internal(format!("Protocol error: {message}"))
            }
            e @ (hdmatrix_api::Error::Connect { .. }
            | hdmatrix_api::Error::Disconnected
            | hdmatrix_api::Error::NotConnected
            | hdmatrix_api::Error::Io(_)) => CoreError::ConnectionFailed {
                reason: e.to_string(),
            },
        }
    }
}
