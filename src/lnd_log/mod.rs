//! Translation of lnd's textual log lines into structured records.
//!
//! lnd writes lines shaped like
//! `2024-01-01 00:00:00.000 [INF] RPCS: started`. Anything else it prints
//! (banners, panics, stray diagnostics) is dropped without error.

mod record;
mod severity;
mod sink;

#[cfg(test)]
mod tests;

pub use record::{LogRecord, CHILD_PROCESS_ORIGIN};
pub use severity::Severity;
pub use sink::{LogSink, MemorySink, TracingSink, CHILD_LOG_TARGET};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;

static LND_LOG_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<date>[0-9]{4}-[0-9]{2}-[0-9]{2})\s(?P<time>[0-9]{2}:[0-9]{2}:[0-9]{2}\.[0-9]{3})\s\[(?P<level>[^\]]*)\]\s(?P<subsystem>[A-Z][A-Z0-9]{1,7}):\s(?P<text>.+)$",
    )
    .expect("lnd log pattern is valid")
});

/// Stateless parser from one raw line to zero or one [`LogRecord`].
#[derive(Debug, Default, Clone, Copy)]
pub struct LogTranslator;

impl LogTranslator {
    pub fn new() -> Self {
        Self
    }

    /// Parse `line`, returning `None` for anything outside the grammar.
    pub fn translate(&self, line: &str) -> Option<LogRecord> {
        let captures = LND_LOG_LINE.captures(line)?;

        let severity = Severity::from_code(captures.name("level")?.as_str())?;
        let date = NaiveDate::parse_from_str(captures.name("date")?.as_str(), "%Y-%m-%d").ok()?;
        let time =
            NaiveTime::parse_from_str(captures.name("time")?.as_str(), "%H:%M:%S%.3f").ok()?;

        Some(LogRecord::new(
            NaiveDateTime::new(date, time),
            severity,
            captures.name("subsystem")?.as_str(),
            captures.name("text")?.as_str(),
        ))
    }
}
