// ── Command API ──
//
// All device writes flow through a unified `Command` enum. The
// coordinator's command processor executes them one at a time against
// the connection guard.

use crate::error::CoreError;

/// A command envelope sent through the command channel.
/// Contains the command and a oneshot response channel.
pub(crate) struct CommandEnvelope {
    pub command: Command,
    pub response_tx: tokio::sync::oneshot::Sender<Result<CommandResult, CoreError>>,
}

/// All possible write operations against a matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    // ── Power ────────────────────────────────────────────────────────
    PowerOn,
    PowerOff,

    // ── Routing ──────────────────────────────────────────────────────
    /// Enable `output`, then switch it to `input`. Both are 1-based.
    RouteInput { input: u8, output: u8 },
}

impl Command {
    /// Short name used in logs and error messages.
    pub fn name(self) -> &'static str {
        match self {
            Self::PowerOn => "power on",
            Self::PowerOff => "power off",
            Self::RouteInput { .. } => "route",
        }
    }
}

/// Result of a command execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandResult {
    Ok,
    /// The route was applied and cached.
    Routed { input: u8, output: u8 },
}
