use super::*;
use chrono::{Datelike, Timelike};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::Layer;

fn line(code: &str) -> String {
    format!("2024-01-01 00:00:00.000 [{}] RPCS: started", code)
}

#[test]
fn test_level_code_table() {
    let table = [
        ("TRC", Severity::Trace),
        ("DBG", Severity::Debug),
        ("INF", Severity::Info),
        ("WRN", Severity::Warn),
        ("ERR", Severity::Error),
        ("CRT", Severity::Fatal),
    ];

    let translator = LogTranslator::new();
    for (code, expected) in table {
        let record = translator
            .translate(&line(code))
            .unwrap_or_else(|| panic!("{} line did not translate", code));
        assert_eq!(record.severity, expected, "code {}", code);
        assert_eq!(record.subsystem, "RPCS");
        assert_eq!(record.message, "started");
        assert_eq!(record.origin, CHILD_PROCESS_ORIGIN);
    }
}

#[test]
fn test_fields_are_captured_verbatim() {
    let translator = LogTranslator::new();
    let record = translator
        .translate("2023-11-30 17:45:09.123 [WRN] HSWC: ChannelLink(abc:0): unable to  forward: [timeout]")
        .unwrap();

    assert_eq!(record.severity, Severity::Warn);
    assert_eq!(record.subsystem, "HSWC");
    assert_eq!(
        record.message,
        "ChannelLink(abc:0): unable to  forward: [timeout]"
    );
    assert_eq!(record.timestamp.year(), 2023);
    assert_eq!(record.timestamp.month(), 11);
    assert_eq!(record.timestamp.day(), 30);
    assert_eq!(record.timestamp.hour(), 17);
    assert_eq!(record.timestamp.second(), 9);
    assert_eq!(record.timestamp.nanosecond(), 123_000_000);
}

#[test]
fn test_non_matching_lines_are_dropped() {
    let translator = LogTranslator::new();
    let rejects = [
        "",
        "garbage line",
        "2024-01-01 00:00:00.000 INF RPCS: started",
        "2024-01-01 00:00:00.000 [inf] RPCS: started",
        "2024-01-01 00:00:00.000 [XYZ] RPCS: started",
        "2024-01-01 00:00:00.000 [INFO] RPCS: started",
        "2024-01-01 00:00:00.000 [INF] RPCS:",
        "2024-01-01 00:00:00.000 [INF] RPCS: ",
        "2024-01-01 00:00:00.000 [INF] rpcs: started",
        "2024-01-01 00:00:00.000 [INF",
        "2024-01-01 00:00:00 [INF] RPCS: started",
        "2024-13-01 00:00:00.000 [INF] RPCS: started",
        "Attempting automatic RPC configuration to btcd",
    ];

    for reject in rejects {
        assert!(
            translator.translate(reject).is_none(),
            "unexpected record for {:?}",
            reject
        );
    }
}

#[test]
fn test_subsystem_length_is_not_fixed() {
    let translator = LogTranslator::new();
    for subsystem in ["DB", "BTCN", "LNWALLET", "WTCL2"] {
        let raw = format!("2024-01-01 00:00:00.000 [DBG] {}: opened", subsystem);
        let record = translator.translate(&raw).unwrap();
        assert_eq!(record.subsystem, subsystem);
    }

    assert!(translator
        .translate("2024-01-01 00:00:00.000 [DBG] X: opened")
        .is_none());
}

#[test]
fn test_severity_from_code_is_case_sensitive() {
    assert_eq!(Severity::from_code("ERR"), Some(Severity::Error));
    assert_eq!(Severity::from_code("err"), None);
    assert_eq!(Severity::from_code(""), None);
}

#[test]
fn test_severity_parses_config_names() {
    assert_eq!("info".parse::<Severity>(), Ok(Severity::Info));
    assert_eq!("WARNING".parse::<Severity>(), Ok(Severity::Warn));
    assert_eq!("critical".parse::<Severity>(), Ok(Severity::Fatal));
    assert!("loud".parse::<Severity>().is_err());
}

#[test]
fn test_severity_ordering_and_tracing_level() {
    assert!(Severity::Trace < Severity::Debug);
    assert!(Severity::Error < Severity::Fatal);
    assert_eq!(Severity::Fatal.tracing_level(), tracing::Level::ERROR);
    assert_eq!(Severity::Warn.tracing_level(), tracing::Level::WARN);
}

#[test]
fn test_memory_sink_keeps_order() {
    let translator = LogTranslator::new();
    let sink = MemorySink::new();
    for text in ["one", "two", "three"] {
        let raw = format!("2024-01-01 00:00:00.000 [INF] RPCS: {}", text);
        sink.forward(translator.translate(&raw).unwrap());
    }

    let messages: Vec<String> = sink.records().into_iter().map(|r| r.message).collect();
    assert_eq!(messages, vec!["one", "two", "three"]);
}

/// Fields of one event, rendered to strings
#[derive(Default)]
struct FieldCollector(HashMap<String, String>);

impl Visit for FieldCollector {
    fn record_bool(&mut self, field: &Field, value: bool) {
        self.0.insert(field.name().to_string(), value.to_string());
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.insert(field.name().to_string(), value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.0.insert(field.name().to_string(), format!("{:?}", value));
    }
}

struct CapturedEvent {
    level: Level,
    target: String,
    fields: HashMap<String, String>,
}

#[derive(Clone, Default)]
struct EventCapture(Arc<Mutex<Vec<CapturedEvent>>>);

impl<S: Subscriber> Layer<S> for EventCapture {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut fields = FieldCollector::default();
        event.record(&mut fields);
        self.0.lock().push(CapturedEvent {
            level: *event.metadata().level(),
            target: event.metadata().target().to_string(),
            fields: fields.0,
        });
    }
}

#[test]
fn test_tracing_sink_maps_severity_to_level() {
    let translator = LogTranslator::new();
    let capture = EventCapture::default();

    let subscriber = tracing_subscriber::registry().with(capture.clone());
    tracing::subscriber::with_default(subscriber, || {
        for code in ["TRC", "DBG", "INF", "WRN", "ERR", "CRT"] {
            TracingSink.forward(translator.translate(&line(code)).unwrap());
        }
    });

    let events = capture.0.lock();
    let levels: Vec<Level> = events.iter().map(|e| e.level).collect();
    assert_eq!(
        levels,
        vec![
            Level::TRACE,
            Level::DEBUG,
            Level::INFO,
            Level::WARN,
            Level::ERROR,
            Level::ERROR
        ]
    );

    for event in events.iter() {
        assert_eq!(event.target, CHILD_LOG_TARGET);
        assert_eq!(event.fields.get("subsystem").map(String::as_str), Some("RPCS"));
        assert_eq!(event.fields.get("message").map(String::as_str), Some("started"));
        assert_eq!(
            event.fields.get("process").map(String::as_str),
            Some(CHILD_PROCESS_ORIGIN)
        );
    }

    // only the critical line is marked fatal
    let fatal: Vec<bool> = events
        .iter()
        .map(|e| e.fields.get("fatal").map(String::as_str) == Some("true"))
        .collect();
    assert_eq!(fatal, vec![false, false, false, false, false, true]);
}
