//! JSONL bus over files and standard streams
//!
//! Backs local runs: requests come from a JSONL file or stdin, resolved
//! records leave as JSON lines on stdout. One object per line, blank lines
//! ignored.

use std::path::Path;

use async_trait::async_trait;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader, Lines, Stdin, Stdout};
use tokio::sync::Mutex;
use tracing::warn;

use super::{BusError, MagnetMessage, MagnetPublisher, PartitionConsumer, ResolutionRequest};

/// Request source reading one JSON object per line.
#[derive(Debug)]
pub struct JsonlConsumer<R> {
    lines: Lines<BufReader<R>>,
}

impl JsonlConsumer<File> {
    /// Opens a JSONL file as a request source.
    ///
    /// # Errors
    ///
    /// - `BusError::Consume` - If the file cannot be opened
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, BusError> {
        let path = path.as_ref();
        let file = File::open(path).await.map_err(|e| BusError::Consume {
            reason: format!("cannot open {}: {}", path.display(), e),
        })?;
        Ok(Self::new(file))
    }
}

impl JsonlConsumer<Stdin> {
    /// Reads requests from standard input until EOF.
    pub fn stdin() -> Self {
        Self::new(tokio::io::stdin())
    }
}

impl<R: AsyncRead + Unpin + Send> JsonlConsumer<R> {
    fn new(reader: R) -> Self {
        Self {
            lines: BufReader::new(reader).lines(),
        }
    }
}

#[async_trait]
impl<R: AsyncRead + Unpin + Send> PartitionConsumer for JsonlConsumer<R> {
    async fn next_request(&mut self) -> Result<Option<ResolutionRequest>, BusError> {
        loop {
            let line = self
                .lines
                .next_line()
                .await
                .map_err(|e| BusError::Consume {
                    reason: e.to_string(),
                })?;

            let Some(line) = line else {
                return Ok(None);
            };
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str(trimmed) {
                Ok(request) => return Ok(Some(request)),
                Err(e) => warn!("Skipping malformed request line: {}", e),
            }
        }
    }
}

/// Publisher writing one JSON line per record to stdout.
///
/// Writes are serialized through a lock so concurrently enriched
/// candidates cannot interleave partial lines.
#[derive(Debug)]
pub struct StdoutPublisher {
    stdout: Mutex<Stdout>,
}

impl StdoutPublisher {
    /// Creates a publisher over the process stdout.
    pub fn new() -> Self {
        Self {
            stdout: Mutex::new(tokio::io::stdout()),
        }
    }
}

impl Default for StdoutPublisher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MagnetPublisher for StdoutPublisher {
    async fn publish(&self, _key: &str, message: &MagnetMessage) -> Result<(), BusError> {
        let publish_error = |reason: String| BusError::Publish { reason };

        let mut line = serde_json::to_string(message).map_err(|e| publish_error(e.to_string()))?;
        line.push('\n');

        let mut stdout = self.stdout.lock().await;
        stdout
            .write_all(line.as_bytes())
            .await
            .map_err(|e| publish_error(e.to_string()))?;
        stdout.flush().await.map_err(|e| publish_error(e.to_string()))
    }
}
