use super::types::{DrainEnd, DrainReport};
use crate::lnd_log::{LogSink, LogTranslator};
use crate::shutdown::ShutdownSignal;
use crate::supervisor::LineStream;
use std::sync::Arc;
use tokio::io::AsyncRead;
use tracing::{debug, warn};

/// Forward the child's log lines to `sink` until shutdown or end of output.
///
/// The shutdown notification is always checked before the next read, and a
/// read still pending when it fires is abandoned, so nothing reaches the sink
/// once shutdown has been observed. Records are forwarded in arrival order.
///
/// The stream is handed back so the caller can keep the pipe empty while the
/// child winds down.
pub async fn drain_lines<R>(
    mut lines: LineStream<R>,
    translator: LogTranslator,
    sink: Arc<dyn LogSink>,
    shutdown: ShutdownSignal,
) -> (LineStream<R>, DrainReport)
where
    R: AsyncRead + Unpin,
{
    let mut forwarded = 0;
    let mut dropped = 0;

    let end = loop {
        let line = tokio::select! {
            biased;
            _ = shutdown.done() => break DrainEnd::Cancelled,
            line = lines.next_line() => line,
        };

        match line {
            Ok(Some(line)) => match translator.translate(&line) {
                Some(record) => {
                    sink.forward(record);
                    forwarded += 1;
                }
                None => {
                    debug!("Skipping unrecognized output line: {}", line);
                    dropped += 1;
                }
            },
            Ok(None) => break DrainEnd::EndOfStream,
            Err(e) => {
                warn!("Failed to read child output: {}", e);
                break DrainEnd::ReadError;
            }
        }
    };

    debug!(
        "Drain loop finished ({:?}): {} forwarded, {} dropped",
        end, forwarded, dropped
    );

    (
        lines,
        DrainReport {
            forwarded,
            dropped,
            end,
        },
    )
}
