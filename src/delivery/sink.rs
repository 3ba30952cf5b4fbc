//! Destinations for received audio bytes.

use crate::player::PlaybackSession;
use crate::{Error, Result};
use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::trace;

/// Something that consumes audio chunks in arrival order.
#[async_trait]
pub trait AudioSink: Send {
    async fn write_chunk(&mut self, chunk: &[u8]) -> Result<()>;
}

#[async_trait]
impl AudioSink for PlaybackSession {
    async fn write_chunk(&mut self, chunk: &[u8]) -> Result<()> {
        self.feed(chunk).await;
        Ok(())
    }
}

/// Output file written as chunks arrive.
pub struct FileSink {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl FileSink {
    /// Create (or truncate) the file at `path`.
    pub async fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)
            .await
            .map_err(|e| Error::file_system(path, e))?;
        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush buffered bytes and sync the file to disk before releasing it.
    pub async fn close(mut self) -> Result<()> {
        self.writer
            .flush()
            .await
            .map_err(|e| Error::file_system(&self.path, e))?;
        self.writer
            .get_mut()
            .sync_all()
            .await
            .map_err(|e| Error::file_system(&self.path, e))
    }
}

#[async_trait]
impl AudioSink for FileSink {
    async fn write_chunk(&mut self, chunk: &[u8]) -> Result<()> {
        self.writer
            .write_all(chunk)
            .await
            .map_err(|e| Error::file_system(&self.path, e))
    }
}

/// Pump `body` into every sink, chunk by chunk, in sink order. Returns the byte count.
///
/// Stops at the first body or sink error; nothing after the failing chunk is forwarded.
pub async fn forward<S>(mut body: S, sinks: &mut [&mut dyn AudioSink]) -> Result<u64>
where
    S: Stream<Item = Result<Bytes>> + Unpin,
{
    let mut total = 0u64;
    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        for sink in sinks.iter_mut() {
            sink.write_chunk(&chunk).await?;
        }
        total += chunk.len() as u64;
        trace!(chunk = chunk.len(), total, "forwarded audio chunk");
    }
    Ok(total)
}
