use crate::shutdown::ShutdownReason;
use crate::supervisor::ExitOutcome;

/// Component name under which the supervised daemon is tracked
pub const LND_COMPONENT: &str = "lnd";

/// Component name of the task forwarding the daemon's log lines
pub const DRAIN_COMPONENT: &str = "log_drain";

/// Component lifecycle states
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentState {
    Stopped,
    Starting,
    Running,
    Stopping,
    Failed,
}

/// Phase of a single orchestrated run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestratorState {
    Starting,
    Supervising,
    ShuttingDown,
}

/// How a run that did not fail came to an end
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// Only the version was queried; nothing was supervised
    VersionRequested { version: String },
    /// Supervision ended through the shutdown signal
    Stopped {
        reason: ShutdownReason,
        outcome: ExitOutcome,
    },
}

/// Why the drain loop returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainEnd {
    /// Shutdown was requested
    Cancelled,
    /// The child closed its output
    EndOfStream,
    /// Reading the child's output failed
    ReadError,
}

/// Summary of one drain loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrainReport {
    /// Lines translated and handed to the sink
    pub forwarded: usize,
    /// Lines outside the log grammar
    pub dropped: usize,
    pub end: DrainEnd,
}
