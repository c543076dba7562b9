use thiserror::Error;

/// Top-level error type for the `hdmatrix-api` crate.
///
/// Covers every failure mode a matrix driver can report: establishing the
/// link, losing it mid-operation, raw I/O, and replies the driver could not
/// make sense of. `hdmatrix-core` maps these into coordinator-level errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── Link ────────────────────────────────────────────────────────
    /// The link could not be established (refused, unreachable, DNS).
    #[error("Cannot connect to {addr}: {reason}")]
    Connect { addr: String, reason: String },

    /// The link dropped while an operation was in flight.
    #[error("Connection to device lost")]
    Disconnected,

    /// An operation was attempted without an open link.
    #[error("Not connected")]
    NotConnected,

    /// Socket-level failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The transport gave up waiting for a reply.
    #[error("Device did not reply within {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Protocol ────────────────────────────────────────────────────
    /// The device replied with something the driver could not parse.
    #[error("Unexpected reply from device: {message}")]
    Protocol { message: String },

    /// The device understood the request and refused it.
    #[error("Device rejected command: {message}")]
    Rejected { message: String },
}

impl Error {
    /// Returns `true` if the link itself is gone and a fresh connection
    /// might succeed where this attempt failed.
    pub fn is_link_failure(&self) -> bool {
        matches!(
            self,
            Self::Connect { .. }
                | Self::Disconnected
                | Self::NotConnected
                | Self::Io(_)
                | Self::Timeout { .. }
        )
    }
}
