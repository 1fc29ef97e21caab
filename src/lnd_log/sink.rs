use super::{LogRecord, Severity};
use parking_lot::Mutex;
use tracing::{debug, error, info, trace, warn};

/// Tracing target for records forwarded from the child process.
pub const CHILD_LOG_TARGET: &str = "conduit::lnd";

/// Destination for translated child log records
pub trait LogSink: Send + Sync {
    fn forward(&self, record: LogRecord);
}

/// Emits each record as a `tracing` event so it lands in the same
/// subscriber (file + console) as the supervisor's own logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn forward(&self, record: LogRecord) {
        let LogRecord {
            timestamp,
            severity,
            subsystem,
            message,
            origin,
        } = record;

        match severity {
            Severity::Trace => trace!(
                target: CHILD_LOG_TARGET,
                process = origin,
                subsystem = %subsystem,
                logged_at = %timestamp,
                "{}",
                message
            ),
            Severity::Debug => debug!(
                target: CHILD_LOG_TARGET,
                process = origin,
                subsystem = %subsystem,
                logged_at = %timestamp,
                "{}",
                message
            ),
            Severity::Info => info!(
                target: CHILD_LOG_TARGET,
                process = origin,
                subsystem = %subsystem,
                logged_at = %timestamp,
                "{}",
                message
            ),
            Severity::Warn => warn!(
                target: CHILD_LOG_TARGET,
                process = origin,
                subsystem = %subsystem,
                logged_at = %timestamp,
                "{}",
                message
            ),
            Severity::Error => error!(
                target: CHILD_LOG_TARGET,
                process = origin,
                subsystem = %subsystem,
                logged_at = %timestamp,
                "{}",
                message
            ),
            // Critical lines are logged, never acted on; the child decides
            // whether it exits and the orchestrator reacts to that.
            Severity::Fatal => error!(
                target: CHILD_LOG_TARGET,
                process = origin,
                subsystem = %subsystem,
                logged_at = %timestamp,
                fatal = true,
                "{}",
                message
            ),
        }
    }
}

/// Keeps every forwarded record in memory, in arrival order.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<LogRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

impl LogSink for MemorySink {
    fn forward(&self, record: LogRecord) {
        self.records.lock().push(record);
    }
}
