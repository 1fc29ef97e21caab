use std::io;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tracing::warn;

/// Longest line kept, in bytes, not counting the terminator
pub const MAX_LINE_LEN: usize = 64 * 1024;

/// Newline-delimited view over a child's output.
///
/// Lines come back without their `\n` / `\r\n` terminator. Bytes that are
/// not valid UTF-8 are replaced rather than failing the stream, so a single
/// bad byte from the child can't stop log forwarding. Lines longer than the
/// limit are skipped whole.
pub struct LineStream<R> {
    reader: BufReader<R>,
    buf: Vec<u8>,
    max_line_len: usize,
    oversized: bool,
}

impl<R: AsyncRead + Unpin> LineStream<R> {
    pub fn new(reader: R) -> Self {
        Self::with_max_line_len(reader, MAX_LINE_LEN)
    }

    pub fn with_max_line_len(reader: R, max_line_len: usize) -> Self {
        Self {
            reader: BufReader::new(reader),
            buf: Vec::new(),
            max_line_len,
            oversized: false,
        }
    }

    /// Next line, or `None` once the writer closed its end.
    ///
    /// Cancel safe: bytes of a line read before the future is dropped stay
    /// buffered and are returned by the next call.
    pub async fn next_line(&mut self) -> io::Result<Option<String>> {
        loop {
            let available = self.reader.fill_buf().await?;
            if available.is_empty() {
                if self.oversized {
                    self.skip_oversized();
                    return Ok(None);
                }
                if self.buf.is_empty() {
                    return Ok(None);
                }
                return Ok(Some(self.take_line(false)));
            }

            match available.iter().position(|b| *b == b'\n') {
                Some(end) => {
                    if !self.oversized && self.buf.len() + end <= self.max_line_len {
                        self.buf.extend_from_slice(&available[..end]);
                        self.reader.consume(end + 1);
                        return Ok(Some(self.take_line(true)));
                    }
                    self.reader.consume(end + 1);
                    self.skip_oversized();
                }
                None => {
                    let len = available.len();
                    if !self.oversized {
                        self.buf.extend_from_slice(available);
                        if self.buf.len() > self.max_line_len {
                            self.oversized = true;
                            self.buf.clear();
                        }
                    }
                    self.reader.consume(len);
                }
            }
        }
    }

    fn skip_oversized(&mut self) {
        warn!(
            "Skipped an output line longer than {} bytes",
            self.max_line_len
        );
        self.oversized = false;
        self.buf.clear();
    }

    fn take_line(&mut self, terminated: bool) -> String {
        if terminated && self.buf.last() == Some(&b'\r') {
            self.buf.pop();
        }
        let line = String::from_utf8_lossy(&self.buf).into_owned();
        self.buf.clear();
        line
    }
}
