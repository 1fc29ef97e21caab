//! Process-wide tracing setup.
//!
//! Everything conduit logs, including records translated from the daemon's
//! output, goes to `<conduit_dir>/logfile.log`. With console output enabled
//! the same events are mirrored to stderr, leaving stdout to the version
//! query. `RUST_LOG` overrides the configured level.

use crate::config::{ConduitConfig, LOG_FILE_NAME};
use crate::error::{ConduitError, Result};
use crate::lnd_log::Severity;
use crate::utils::ensure_dir;
use std::str::FromStr;
use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::{self, MakeWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer};

/// Output format of a log layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Compact,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

/// Filter directives used when `RUST_LOG` is not set
pub fn filter_directives(level: Severity) -> String {
    let level = level.tracing_level().to_string().to_lowercase();
    format!("conduit={},conduitcli={}", level, level)
}

fn env_filter(level: Severity) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter_directives(level)))
}

fn format_layer<S, W>(
    format: Option<LogFormat>,
    writer: W,
    ansi: bool,
) -> Box<dyn Layer<S> + Send + Sync + 'static>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    match format {
        Some(LogFormat::Json) => fmt::layer()
            .json()
            .with_writer(writer)
            .with_target(true)
            .with_thread_ids(true)
            .boxed(),
        Some(LogFormat::Compact) => fmt::layer()
            .compact()
            .with_writer(writer)
            .with_ansi(ansi)
            .with_target(true)
            .boxed(),
        Some(LogFormat::Pretty) => fmt::layer()
            .pretty()
            .with_writer(writer)
            .with_ansi(ansi)
            .with_target(true)
            .boxed(),
        None => fmt::layer()
            .with_writer(writer)
            .with_ansi(ansi)
            .with_target(true)
            .boxed(),
    }
}

/// Build the subscriber without installing it.
///
/// The returned guard flushes the logfile when dropped and must outlive
/// every event that should reach the file.
pub fn build_subscriber(
    config: &ConduitConfig,
) -> Result<(impl Subscriber + Send + Sync + 'static, WorkerGuard)> {
    let format = match config.log_format.as_deref() {
        Some(format) => Some(LogFormat::from_str(format).map_err(ConduitError::system)?),
        None => None,
    };

    ensure_dir(&config.conduit_dir)?;
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(LOG_FILE_NAME)
        .build(&config.conduit_dir)
        .map_err(|e| ConduitError::system(format!("Failed to open log file: {}", e)))?;
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    // The file keeps the plain layout unless JSON was asked for
    let file_format = format.filter(|format| *format == LogFormat::Json);
    let file_layer = format_layer(file_format, file_writer, false);

    let console_layer = if config.console_output {
        Some(format_layer(
            Some(format.unwrap_or(LogFormat::Pretty)),
            std::io::stderr,
            true,
        ))
    } else {
        None
    };

    let subscriber = tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .with(env_filter(config.log_level));

    Ok((subscriber, guard))
}

/// Install the global subscriber described by `config`.
pub fn init_logging(config: &ConduitConfig) -> Result<WorkerGuard> {
    let (subscriber, guard) = build_subscriber(config)?;
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| ConduitError::system(format!("Failed to install logger: {}", e)))?;
    Ok(guard)
}
