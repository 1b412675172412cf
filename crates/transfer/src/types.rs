use std::sync::LazyLock;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use tgbucket_protocol::RemoteFileHandle;

use crate::TransferError;

/// Next file id to hand out. Seeded from the wall clock so ids also differ
/// from those issued by earlier runs of the process.
static NEXT_FILE_ID: LazyLock<AtomicI64> = LazyLock::new(|| {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(1);
    AtomicI64::new(millis)
});

/// Allocates a file id no other upload in this process has used.
pub fn next_file_id() -> i64 {
    NEXT_FILE_ID.fetch_add(1, Ordering::Relaxed)
}

/// Bookkeeping for one in-flight upload.
///
/// Owned by a single upload call and dropped when it finishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadState {
    pub file_id: i64,
    pub total_parts: u32,
    /// Index of the next part to send.
    pub next_index: u32,
    /// Bytes acknowledged so far.
    pub bytes_sent: u64,
}

impl UploadState {
    /// Starts an upload of `total_size` bytes cut into `part_size` parts.
    ///
    /// An empty payload still counts as one (empty) part. Fails with
    /// [`TransferError::FileTooLarge`] when the part count overflows `u32`.
    pub fn new(file_id: i64, total_size: u64, part_size: usize) -> Result<Self, TransferError> {
        let Some(total_parts) = total_parts(total_size, part_size) else {
            return Err(TransferError::FileTooLarge {
                size: total_size,
                max: u64::from(u32::MAX).saturating_mul(part_size as u64),
            });
        };
        Ok(Self {
            file_id,
            total_parts,
            next_index: 0,
            bytes_sent: 0,
        })
    }

    /// Records an acknowledged part of `len` bytes.
    pub fn advance(&mut self, len: usize) {
        self.next_index += 1;
        self.bytes_sent += len as u64;
    }

    pub fn is_complete(&self) -> bool {
        self.next_index == self.total_parts
    }

    pub fn handle(&self) -> RemoteFileHandle {
        RemoteFileHandle {
            id: self.file_id,
            total_parts: self.total_parts,
        }
    }
}

/// `ceil(total_size / part_size)`, with a floor of one part. `None` if the
/// count does not fit the wire's `u32`.
pub(crate) fn total_parts(total_size: u64, part_size: usize) -> Option<u32> {
    u32::try_from(total_size.div_ceil(part_size as u64).max(1)).ok()
}
