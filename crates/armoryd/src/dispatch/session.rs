//! The request loop: one JSON request per line in, one reply per line out.

use std::io::{self, BufRead, Write};

use tracing::{debug, warn};

use super::errors::DispatchError;
use super::reply::{Reply, ReplyWriter};
use super::request::Request;
use super::router::{DISPATCH_TARGET, Dispatcher};

/// Counts of the replies a session produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    /// Request lines answered.
    pub requests: usize,
    /// Replies with a 4xx status.
    pub rejected: usize,
    /// Replies with a 5xx status.
    pub failed: usize,
}

impl SessionSummary {
    fn record(&mut self, reply: &Reply) {
        self.requests += 1;
        if reply.is_rejection() {
            self.rejected += 1;
        } else if reply.is_failure() {
            self.failed += 1;
        }
    }
}

/// A request line as read from the input.
#[derive(Debug, PartialEq, Eq)]
pub(super) enum RequestLine {
    /// The line, without its delimiter.
    Complete(Vec<u8>),
    /// The line exceeded the limit; its content was discarded.
    Oversized {
        /// Bytes the line held.
        size: usize,
    },
}

/// Answers requests until the input is exhausted.
pub struct Session<'d> {
    dispatcher: Dispatcher<'d>,
    max_request_bytes: usize,
}

impl<'d> Session<'d> {
    /// Creates a session bounded by `max_request_bytes` per line.
    #[must_use]
    pub const fn new(dispatcher: Dispatcher<'d>, max_request_bytes: usize) -> Self {
        Self {
            dispatcher,
            max_request_bytes,
        }
    }

    /// Reads requests from `input` and writes replies to `output`.
    ///
    /// Blank lines are skipped. Oversized and malformed lines are answered
    /// with a 400 reply and the loop continues.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Io`] when reading or writing fails and
    /// [`DispatchError::SerializeReply`] when a reply cannot be written.
    pub fn run<R: BufRead, W: Write>(
        &self,
        mut input: R,
        output: W,
    ) -> Result<SessionSummary, DispatchError> {
        let mut writer = ReplyWriter::new(output);
        let mut summary = SessionSummary::default();

        while let Some(line) = read_request_line(&mut input, self.max_request_bytes)? {
            let reply = match line {
                RequestLine::Complete(bytes) if bytes.trim_ascii().is_empty() => continue,
                RequestLine::Complete(bytes) => self.answer(&bytes)?,
                RequestLine::Oversized { size } => {
                    let error = DispatchError::request_too_large(size, self.max_request_bytes);
                    warn!(target: DISPATCH_TARGET, %error, "oversized request");
                    Reply::dispatch_error(&error)
                }
            };
            writer.write_reply(&reply)?;
            summary.record(&reply);
        }

        debug!(target: DISPATCH_TARGET, requests = summary.requests, "input exhausted");
        Ok(summary)
    }

    fn answer(&self, line: &[u8]) -> Result<Reply, DispatchError> {
        match Request::parse(line) {
            Ok(request) => self.dispatcher.handle(request),
            Err(error) => {
                warn!(target: DISPATCH_TARGET, %error, "malformed request");
                Ok(Reply::dispatch_error(&error))
            }
        }
    }
}

/// Reads one line, keeping at most `max_bytes` of it in memory.
///
/// Returns `Ok(None)` at end of input. A final line without a newline is
/// still returned.
pub(super) fn read_request_line<R: BufRead>(
    input: &mut R,
    max_bytes: usize,
) -> io::Result<Option<RequestLine>> {
    let mut buffer = Vec::new();
    let mut size = 0_usize;
    let mut read_any = false;

    loop {
        let available = match input.fill_buf() {
            Ok(available) => available,
            Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
            Err(error) => return Err(error),
        };
        if available.is_empty() {
            return Ok(read_any.then(|| finish_line(buffer, size, max_bytes)));
        }
        read_any = true;

        let newline = available.iter().position(|byte| *byte == b'\n');
        let (chunk, _) = available.split_at(newline.unwrap_or(available.len()));
        size += chunk.len();
        if size <= max_bytes {
            buffer.extend_from_slice(chunk);
        } else {
            buffer.clear();
        }

        let consumed = chunk.len() + usize::from(newline.is_some());
        input.consume(consumed);
        if newline.is_some() {
            return Ok(Some(finish_line(buffer, size, max_bytes)));
        }
    }
}

fn finish_line(buffer: Vec<u8>, size: usize, max_bytes: usize) -> RequestLine {
    if size > max_bytes {
        RequestLine::Oversized { size }
    } else {
        RequestLine::Complete(buffer)
    }
}

