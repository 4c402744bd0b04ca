//! Line protocol between the daemon and its host.
//!
//! Input is one JSON command per line on stdin. Output is one JSON object per
//! line on stdout: session events, or an `error` object for a rejected command.

use artifact_core::{ArtifactEvent, MetadataPatch, StreamPart, VersionChange};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

/// Maximum command line size (50MB). `LineReader` never buffers more than this.
pub const MAX_LINE_SIZE: usize = 50 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Malformed command: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Command too large: {0} bytes")]
    TooLarge(usize),

    #[error("Command is not valid UTF-8")]
    InvalidUtf8,
}

fn default_debounce() -> bool {
    true
}

/// A command read from the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Command {
    /// Producer stream part
    Stream { part: StreamPart },
    /// Local edit from the editor surface
    Edit {
        content: String,
        #[serde(default = "default_debounce")]
        debounce: bool,
    },
    /// Explicit save: flush pending edits now
    Save,
    /// Version navigation or diff toggle
    Version { change: VersionChange },
    /// Shallow-merge UI metadata
    Metadata { patch: MetadataPatch },
    TogglePreview,
}

impl Command {
    /// Parse one input line.
    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(line)?)
    }
}

/// Splits input into lines without buffering more than a size limit.
///
/// Oversized and non-UTF-8 lines come back as protocol errors so the caller can
/// report them and keep reading. Partial reads stay in the buffer, so
/// `next_line` is cancel safe inside `select!`.
pub struct LineReader<R> {
    input: R,
    limit: usize,
    buf: Vec<u8>,
    /// Bytes already dropped from the current oversized line
    oversized: Option<usize>,
}

impl<R: AsyncBufRead + Unpin> LineReader<R> {
    pub fn new(input: R) -> Self {
        Self::with_limit(input, MAX_LINE_SIZE)
    }

    pub fn with_limit(input: R, limit: usize) -> Self {
        Self {
            input,
            limit,
            buf: Vec::new(),
            oversized: None,
        }
    }

    /// Read the next line. `None` at end of input.
    pub async fn next_line(&mut self) -> std::io::Result<Option<Result<String, ProtocolError>>> {
        loop {
            let remaining = (self.limit + 1).saturating_sub(self.buf.len()) as u64;
            let mut bounded = (&mut self.input).take(remaining);
            let read = bounded.read_until(b'\n', &mut self.buf).await?;
            let ended = self.buf.last() == Some(&b'\n');

            if read == 0 && !ended {
                if self.buf.is_empty() {
                    return Ok(self.oversized.take().map(|size| Err(ProtocolError::TooLarge(size))));
                }
                // Last line without a trailing newline
            } else if !ended {
                if self.buf.len() > self.limit {
                    *self.oversized.get_or_insert(0) += self.buf.len();
                    self.buf.clear();
                }
                continue;
            }

            let mut line = std::mem::take(&mut self.buf);
            if let Some(dropped) = self.oversized.take() {
                return Ok(Some(Err(ProtocolError::TooLarge(dropped + line.len()))));
            }

            if line.last() == Some(&b'\n') {
                line.pop();
                if line.last() == Some(&b'\r') {
                    line.pop();
                }
            }
            return Ok(Some(String::from_utf8(line).map_err(|_| ProtocolError::InvalidUtf8)));
        }
    }
}

/// A line written to the host.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Output {
    Event(ArtifactEvent),
    Error(ErrorLine),
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorLine {
    /// Always "error"
    #[serde(rename = "type")]
    pub msg_type: &'static str,
    pub message: String,
}

impl Output {
    pub fn error(message: impl Into<String>) -> Self {
        Output::Error(ErrorLine {
            msg_type: "error",
            message: message.into(),
        })
    }

    /// Serialize as a single JSON line, newline included.
    pub fn to_line(&self) -> Result<String, ProtocolError> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}
