use crate::supervisor::ExitOutcome;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConduitError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("{binary} command not found. Please install {binary} to use conduit")]
    NotFound { binary: String },

    #[error("Failed to start {binary}: {message}")]
    SpawnFailed { binary: String, message: String },

    #[error("Process supervisor already started a child process")]
    AlreadyStarted,

    #[error("Process supervisor has no running child process")]
    NotStarted,

    #[error("Version query failed: child {outcome}")]
    VersionQuery { outcome: ExitOutcome },

    #[error("Child process exited unexpectedly: {outcome}")]
    UnexpectedExit { outcome: ExitOutcome },

    #[error("System error: {message}")]
    System { message: String },
}

impl ConduitError {
    pub fn system<S: Into<String>>(message: S) -> Self {
        Self::System {
            message: message.into(),
        }
    }

    pub fn spawn_failed<S: Into<String>>(binary: S, message: S) -> Self {
        Self::SpawnFailed {
            binary: binary.into(),
            message: message.into(),
        }
    }

    /// Process exit code reported by the `conduit` binary for this error.
    ///
    /// Always non-zero. A child that exited with its own code passes it
    /// through so service managers can tell crashes apart.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NotFound { .. } => 127,
            Self::SpawnFailed { .. } => 126,
            Self::UnexpectedExit {
                outcome: ExitOutcome::Failure {
                    code: Some(code), ..
                },
            } if *code != 0 => *code,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, ConduitError>;
