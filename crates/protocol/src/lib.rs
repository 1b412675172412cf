//! Payload and error types for the part-oriented remote file interface.
//!
//! Nothing here performs I/O: these types describe what goes over the
//! remote-call collaborator and how its structured errors are classified.

pub mod constants;
pub mod error;
pub mod messages;
pub mod types;

// Re-export primary types for convenience.
pub use error::{MigrateScope, Migration, Recovery, RpcError};
pub use messages::{GetFile, InputFileLocation, RpcMethod, SaveBigFilePart, UploadFile};
pub use types::{CallRoute, RemoteFileHandle, RemoteLocation};
