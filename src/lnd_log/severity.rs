use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Canonical six-level severity used by the structured sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

impl Severity {
    /// Map an lnd bracketed level code onto a severity.
    ///
    /// Case-sensitive; anything outside the six known codes is `None`.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "TRC" => Some(Severity::Trace),
            "DBG" => Some(Severity::Debug),
            "INF" => Some(Severity::Info),
            "WRN" => Some(Severity::Warn),
            "ERR" => Some(Severity::Error),
            "CRT" => Some(Severity::Fatal),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Trace => "trace",
            Severity::Debug => "debug",
            Severity::Info => "info",
            Severity::Warn => "warn",
            Severity::Error => "error",
            Severity::Fatal => "fatal",
        }
    }

    /// Closest `tracing` level; tracing has nothing above ERROR.
    pub fn tracing_level(&self) -> tracing::Level {
        match self {
            Severity::Trace => tracing::Level::TRACE,
            Severity::Debug => tracing::Level::DEBUG,
            Severity::Info => tracing::Level::INFO,
            Severity::Warn => tracing::Level::WARN,
            Severity::Error | Severity::Fatal => tracing::Level::ERROR,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(Severity::Trace),
            "debug" => Ok(Severity::Debug),
            "info" => Ok(Severity::Info),
            "warn" | "warning" => Ok(Severity::Warn),
            "error" => Ok(Severity::Error),
            "fatal" | "critical" => Ok(Severity::Fatal),
            other => Err(format!(
                "unknown log level '{}' (expected trace, debug, info, warn, error or fatal)",
                other
            )),
        }
    }
}
