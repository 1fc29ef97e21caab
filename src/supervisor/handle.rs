use std::fmt;
use std::process::ExitStatus;
use tokio::process::Child;

/// How the child process ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    Success,
    Failure {
        code: Option<i32>,
        /// Terminating signal (Unix only)
        signal: Option<i32>,
    },
}

impl ExitOutcome {
    pub fn success(&self) -> bool {
        matches!(self, ExitOutcome::Success)
    }
}

impl From<ExitStatus> for ExitOutcome {
    fn from(status: ExitStatus) -> Self {
        if status.success() {
            return ExitOutcome::Success;
        }

        #[cfg(unix)]
        let signal = {
            use std::os::unix::process::ExitStatusExt;
            status.signal()
        };
        #[cfg(not(unix))]
        let signal = None;

        ExitOutcome::Failure {
            code: status.code(),
            signal,
        }
    }
}

impl fmt::Display for ExitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitOutcome::Success => f.write_str("exited successfully"),
            ExitOutcome::Failure {
                code: Some(code), ..
            } => write!(f, "exited with code {}", code),
            ExitOutcome::Failure {
                signal: Some(signal),
                ..
            } => write!(f, "terminated by signal {}", signal),
            ExitOutcome::Failure { .. } => f.write_str("exited with unknown status"),
        }
    }
}

/// The one live child owned by a supervisor
pub(super) struct ProcessHandle {
    pub(super) child: Child,
    pub(super) pid: Option<u32>,
    pub(super) outcome: Option<ExitOutcome>,
}

impl ProcessHandle {
    pub(super) fn new(child: Child) -> Self {
        let pid = child.id();
        Self {
            child,
            pid,
            outcome: None,
        }
    }
}
