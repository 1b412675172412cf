/// Stores one part of a large file upload.
pub const SAVE_BIG_FILE_PART: &str = "upload.saveBigFilePart";

/// Reads a window of a stored file.
pub const GET_FILE: &str = "upload.getFile";

/// Error code returned when the caller is being rate limited.
pub const FLOOD_WAIT_CODE: i32 = 420;

/// Error code returned when the call must be repeated on another datacenter.
pub const SEE_OTHER_CODE: i32 = 303;

/// Marker preceding the wait duration (seconds) in a rate-limit message.
pub const FLOOD_WAIT_MARKER: &str = "FLOOD_WAIT_";

/// Marker separating the redirect type from the datacenter id in a
/// migration message (`<TYPE>_MIGRATE_<dc>`).
pub const MIGRATE_MARKER: &str = "_MIGRATE_";

/// Redirect type issued while the session is being authorized.
///
/// Following the redirect only for the current call is not enough here:
/// the next auth step must land on the same datacenter, so the default
/// datacenter has to move.
pub const AUTH_MIGRATE_TYPE: &str = "PHONE";

/// Default upload part size (512 KiB).
pub const DEFAULT_PART_SIZE: usize = 512 * 1024;

/// Largest part size the remote side accepts (512 KiB).
pub const MAX_PART_SIZE: usize = 512 * 1024;

/// Part sizes must be a multiple of this value.
pub const PART_SIZE_ALIGN: usize = 1024;

/// Default download window size (512 KiB).
pub const DEFAULT_WINDOW_SIZE: usize = 512 * 1024;

/// Largest window the remote side serves in one read (1 MiB).
pub const MAX_WINDOW_SIZE: usize = 1024 * 1024;

/// Window sizes must be a multiple of this value.
pub const WINDOW_SIZE_ALIGN: usize = 4096;

/// Largest payload accepted for upload (2000 MiB).
pub const MAX_FILE_SIZE: u64 = 2000 * 1024 * 1024;
