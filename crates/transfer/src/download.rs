//! Windowed download of a stored file.
//!
//! The file is read as consecutive `[offset, offset + window)` ranges. The
//! returned stream is lazy: a window is only requested when the consumer
//! asks for the next chunk, so at most one window is buffered.

use std::sync::Arc;

use futures_util::{Stream, TryStreamExt, stream};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use tgbucket_protocol::{CallRoute, GetFile, InputFileLocation, RemoteLocation, UploadFile};

use crate::TransferError;
use crate::caller::RemoteCaller;
use crate::config::{ConfigError, TransferConfig};
use crate::executor::ResilientExecutor;
use crate::progress::{Direction, ProgressReporter, TransferProgress};
use crate::validation::validate_window_size;

/// Downloads stored files window by window through a [`ResilientExecutor`].
pub struct ChunkedDownloader<C> {
    executor: Arc<ResilientExecutor<C>>,
    window_size: usize,
    cancel: Option<CancellationToken>,
    progress: Option<mpsc::Sender<TransferProgress>>,
}

impl<C: RemoteCaller> ChunkedDownloader<C> {
    /// Fails if `config.window_size` is not a positive 4 KiB multiple that
    /// divides 1 MiB.
    pub fn new(
        executor: Arc<ResilientExecutor<C>>,
        config: &TransferConfig,
    ) -> Result<Self, ConfigError> {
        validate_window_size(config.window_size)?;
        Ok(Self {
            executor,
            window_size: config.window_size,
            cancel: None,
            progress: None,
        })
    }

    /// Stops requesting windows once `cancel` fires.
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Sends a [`TransferProgress`] after every delivered window.
    pub fn with_progress(mut self, tx: mpsc::Sender<TransferProgress>) -> Self {
        self.progress = Some(tx);
        self
    }

    /// Streams the file at `location` in offset order.
    ///
    /// With `total_size`, exactly `ceil(total_size / window)` windows are
    /// requested and the output is exactly `total_size` bytes long (the
    /// last window is accepted whatever its length). Without it, windows
    /// are requested until one comes back shorter than the window size.
    ///
    /// The first error ends the stream. Each call starts from offset zero.
    pub fn download(
        &self,
        location: &RemoteLocation,
        total_size: Option<u64>,
    ) -> impl Stream<Item = Result<Vec<u8>, TransferError>> + Send + use<C> {
        info!(
            file_id = %location.file_id,
            total_size = ?total_size,
            window = self.window_size,
            "downloading file"
        );

        let total_units = total_size
            .and_then(|size| u32::try_from(size.div_ceil(self.window_size as u64)).ok());
        let cursor = WindowCursor {
            executor: Arc::clone(&self.executor),
            location: InputFileLocation::from(location),
            window: self.window_size,
            offset: 0,
            remaining: total_size,
            finished: false,
            cancel: self.cancel.clone(),
            progress: ProgressReporter::new(
                self.progress.clone(),
                Direction::Download,
                location.file_id.clone(),
                total_units,
                total_size,
            ),
        };

        stream::try_unfold(cursor, |mut cursor| async move {
            let next = cursor.next_window().await?;
            Ok(next.map(|bytes| (bytes, cursor)))
        })
    }

    /// Drains [`download`](Self::download) into `writer` and returns the
    /// number of bytes written.
    pub async fn download_to<W>(
        &self,
        location: &RemoteLocation,
        total_size: Option<u64>,
        mut writer: W,
    ) -> Result<u64, TransferError>
    where
        W: AsyncWrite + Unpin,
    {
        let mut chunks = std::pin::pin!(self.download(location, total_size));
        let mut written: u64 = 0;

        while let Some(chunk) = chunks.try_next().await? {
            writer.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        writer.flush().await?;

        info!(file_id = %location.file_id, written, "download complete");
        Ok(written)
    }
}

/// Iteration state of one download stream.
struct WindowCursor<C> {
    executor: Arc<ResilientExecutor<C>>,
    location: InputFileLocation,
    window: usize,
    offset: u64,
    /// Declared bytes not yet delivered; `None` when the size is unknown.
    remaining: Option<u64>,
    finished: bool,
    cancel: Option<CancellationToken>,
    progress: ProgressReporter,
}

impl<C: RemoteCaller> WindowCursor<C> {
    /// Fetches the next window. `Ok(None)` ends the stream.
    async fn next_window(&mut self) -> Result<Option<Vec<u8>>, TransferError> {
        if self.finished || self.remaining == Some(0) {
            return Ok(None);
        }
        self.check_cancelled()?;

        let request = GetFile {
            offset: self.offset,
            limit: self.window as u32,
            location: self.location.clone(),
        };
        debug!(offset = self.offset, limit = self.window, "fetching window");

        let UploadFile { mut bytes, .. } = self
            .executor
            .call_until(&request, CallRoute::default_dc(), self.cancel.as_ref())
            .await?;
        self.check_cancelled()?;

        match self.remaining {
            Some(remaining) => {
                let is_last = remaining <= self.window as u64;
                let expected = remaining.min(self.window as u64) as usize;
                if bytes.len() > expected {
                    bytes.truncate(expected);
                } else if bytes.len() < expected {
                    if !is_last {
                        return Err(TransferError::UnexpectedEof {
                            offset: self.offset,
                            expected,
                            actual: bytes.len(),
                        });
                    }
                    warn!(
                        offset = self.offset,
                        expected,
                        actual = bytes.len(),
                        "final window shorter than declared size"
                    );
                }
                self.remaining = Some(remaining - expected as u64);
                self.finished = is_last;
            }
            None => {
                bytes.truncate(self.window);
                self.finished = bytes.len() < self.window;
            }
        }
        self.offset += self.window as u64;

        if bytes.is_empty() {
            return Ok(None);
        }
        self.progress.advance(bytes.len());
        Ok(Some(bytes))
    }

    fn check_cancelled(&self) -> Result<(), TransferError> {
        match &self.cancel {
            Some(token) if token.is_cancelled() => Err(TransferError::Cancelled),
            _ => Ok(()),
        }
    }
}
