use super::Severity;
use chrono::NaiveDateTime;

/// Origin tag attached to every record translated from child output
pub const CHILD_PROCESS_ORIGIN: &str = "lnd";

/// One structured log entry parsed from a line of child output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// Timestamp written by the child (its local clock, no zone)
    pub timestamp: NaiveDateTime,
    pub severity: Severity,
    /// Subsystem code, verbatim
    pub subsystem: String,
    pub message: String,
    /// Which process produced the line
    pub origin: &'static str,
}

impl LogRecord {
    pub fn new(
        timestamp: NaiveDateTime,
        severity: Severity,
        subsystem: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            severity,
            subsystem: subsystem.into(),
            message: message.into(),
            origin: CHILD_PROCESS_ORIGIN,
        }
    }
}
