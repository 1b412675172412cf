//! Part-by-part upload of a byte stream.
//!
//! The source is pulled one part at a time: a part is read, sent, and
//! acknowledged before the next byte of the source is read. Memory stays
//! at one part buffer no matter how large the payload is.

use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use tgbucket_protocol::{CallRoute, RemoteFileHandle, SaveBigFilePart};

use crate::TransferError;
use crate::caller::RemoteCaller;
use crate::config::TransferConfig;
use crate::executor::ResilientExecutor;
use crate::progress::{Direction, ProgressReporter, TransferProgress};
use crate::types::{UploadState, next_file_id};
use crate::validation::validate_part_size;

/// Uploads byte streams as ordered parts through a [`ResilientExecutor`].
pub struct ChunkedUploader<C> {
    executor: Arc<ResilientExecutor<C>>,
    part_size: usize,
    max_file_size: u64,
    cancel: Option<CancellationToken>,
    progress: Option<mpsc::Sender<TransferProgress>>,
}

impl<C: RemoteCaller> ChunkedUploader<C> {
    pub fn new(executor: Arc<ResilientExecutor<C>>, config: &TransferConfig) -> Self {
        Self {
            executor,
            part_size: config.part_size,
            max_file_size: config.max_file_size,
            cancel: None,
            progress: None,
        }
    }

    /// Stops issuing parts once `cancel` fires.
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Sends a [`TransferProgress`] after every acknowledged part.
    pub fn with_progress(mut self, tx: mpsc::Sender<TransferProgress>) -> Self {
        self.progress = Some(tx);
        self
    }

    /// Uploads `total_size` bytes from `source` using the configured part size.
    pub async fn upload<R>(
        &self,
        source: R,
        total_size: u64,
    ) -> Result<RemoteFileHandle, TransferError>
    where
        R: AsyncRead + Unpin,
    {
        self.upload_with_part_size(source, total_size, self.part_size)
            .await
    }

    /// Uploads `total_size` bytes from `source` in parts of `part_size` bytes.
    ///
    /// Parts go out strictly in index order, one at a time. An empty payload
    /// is sent as a single zero-length part. The source must yield exactly
    /// `total_size` bytes, otherwise [`TransferError::SizeMismatch`].
    pub async fn upload_with_part_size<R>(
        &self,
        mut source: R,
        total_size: u64,
        part_size: usize,
    ) -> Result<RemoteFileHandle, TransferError>
    where
        R: AsyncRead + Unpin,
    {
        validate_part_size(part_size)?;
        if total_size > self.max_file_size {
            return Err(TransferError::FileTooLarge {
                size: total_size,
                max: self.max_file_size,
            });
        }

        let mut state = UploadState::new(next_file_id(), total_size, part_size)?;
        info!(
            file_id = state.file_id,
            total_size,
            total_parts = state.total_parts,
            "uploading file"
        );

        let mut progress = ProgressReporter::new(
            self.progress.clone(),
            Direction::Upload,
            state.file_id.to_string(),
            Some(state.total_parts),
            Some(total_size),
        );
        let mut buf = Vec::with_capacity(part_size);

        loop {
            self.check_cancelled()?;

            buf.clear();
            (&mut source)
                .take(part_size as u64)
                .read_to_end(&mut buf)
                .await?;

            let empty_payload = total_size == 0 && state.next_index == 0;
            if buf.is_empty() && !empty_payload {
                break;
            }

            // A short read means the source is exhausted, so this is the
            // last part and the running total must match exactly.
            let len = buf.len();
            let read_so_far = state.bytes_sent + len as u64;
            if read_so_far > total_size || (len < part_size && read_so_far != total_size) {
                return Err(TransferError::SizeMismatch {
                    declared: total_size,
                    actual: read_so_far,
                });
            }

            buf = self.send_part(&state, buf).await?;
            self.check_cancelled()?;

            state.advance(len);
            progress.advance(len);

            if len < part_size {
                break;
            }
        }

        if !state.is_complete() || state.bytes_sent != total_size {
            return Err(TransferError::SizeMismatch {
                declared: total_size,
                actual: state.bytes_sent,
            });
        }

        info!(
            file_id = state.file_id,
            total_parts = state.total_parts,
            "upload complete"
        );
        Ok(state.handle())
    }

    /// Sends the part at `state.next_index` and hands the buffer back for reuse.
    async fn send_part(
        &self,
        state: &UploadState,
        bytes: Vec<u8>,
    ) -> Result<Vec<u8>, TransferError> {
        let request = SaveBigFilePart {
            file_id: state.file_id,
            file_part: state.next_index,
            file_total_parts: state.total_parts,
            bytes,
        };
        debug!(
            file_id = state.file_id,
            part = state.next_index,
            total_parts = state.total_parts,
            len = request.bytes.len(),
            "sending part"
        );

        let acked = self
            .executor
            .call_until(&request, CallRoute::default_dc(), self.cancel.as_ref())
            .await?;
        if !acked {
            warn!(file_id = state.file_id, part = state.next_index, "part rejected");
            return Err(TransferError::PartUploadFailed {
                index: state.next_index,
            });
        }
        Ok(request.bytes)
    }

    fn check_cancelled(&self) -> Result<(), TransferError> {
        match &self.cancel {
            Some(token) if token.is_cancelled() => Err(TransferError::Cancelled),
            _ => Ok(()),
        }
    }
}
