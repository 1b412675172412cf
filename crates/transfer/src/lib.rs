//! Chunked transfers over a part-oriented remote interface.
//!
//! Uploads are cut into fixed-size parts and sent one at a time; downloads
//! are fetched as consecutive offset/limit windows. Every remote call goes
//! through [`ResilientExecutor`], which absorbs rate-limit waits and
//! datacenter redirects before surfacing an error.

mod caller;
mod config;
mod download;
mod executor;
mod progress;
mod types;
mod upload;
mod validation;

#[cfg(test)]
mod fake;

pub use caller::{CallError, RemoteCaller};
pub use config::{ConfigError, TransferConfig};
pub use download::ChunkedDownloader;
pub use executor::{ResilientExecutor, RetryPolicy};
pub use progress::{Direction, SpeedCalculator, TransferProgress};
pub use types::{UploadState, next_file_id};
pub use upload::ChunkedUploader;
pub use validation::{validate_part_size, validate_window_size};

use tgbucket_protocol::RpcError;

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("remote call {method} failed: {source}")]
    Remote {
        method: String,
        #[source]
        source: RpcError,
    },

    #[error("transport failure during {method}: {message}")]
    Transport { method: String, message: String },

    #[error("{method} still failing after {attempts} attempts: {last}")]
    RetriesExhausted {
        method: String,
        attempts: u32,
        last: RpcError,
    },

    #[error("failed to upload part {index}")]
    PartUploadFailed { index: u32 },

    #[error("source size mismatch: declared {declared} bytes, read {actual}")]
    SizeMismatch { declared: u64, actual: u64 },

    #[error("file too large: {size} bytes (max {max})")]
    FileTooLarge { size: u64, max: u64 },

    #[error("short window at offset {offset}: expected {expected} bytes, got {actual}")]
    UnexpectedEof {
        offset: u64,
        expected: usize,
        actual: usize,
    },

    #[error("malformed payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cancelled")]
    Cancelled,

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl TransferError {
    /// Structured remote error carried by this failure, if any.
    pub fn rpc_error(&self) -> Option<&RpcError> {
        match self {
            TransferError::Remote { source, .. } => Some(source),
            TransferError::RetriesExhausted { last, .. } => Some(last),
            _ => None,
        }
    }
}
