use tgbucket_protocol::constants::{
    MAX_PART_SIZE, MAX_WINDOW_SIZE, PART_SIZE_ALIGN, WINDOW_SIZE_ALIGN,
};

use crate::ConfigError;

/// Validates an upload part size against the remote interface limits.
///
/// Rejects:
/// - Zero
/// - Sizes that are not a multiple of 1 KiB
/// - Sizes above 512 KiB, or that do not divide 512 KiB evenly
pub fn validate_part_size(part_size: usize) -> Result<(), ConfigError> {
    check_size("part_size", part_size, PART_SIZE_ALIGN, MAX_PART_SIZE)
}

/// Validates a download window size against the remote interface limits.
///
/// Windows must be a positive multiple of 4 KiB that divides 1 MiB, so no
/// window ever straddles a 1 MiB boundary.
pub fn validate_window_size(window_size: usize) -> Result<(), ConfigError> {
    check_size("window_size", window_size, WINDOW_SIZE_ALIGN, MAX_WINDOW_SIZE)
}

fn check_size(
    field: &'static str,
    size: usize,
    align: usize,
    max: usize,
) -> Result<(), ConfigError> {
    if size == 0 {
        return Err(ConfigError::InvalidSize {
            field,
            size,
            reason: "must be positive".into(),
        });
    }
    if size % align != 0 {
        return Err(ConfigError::InvalidSize {
            field,
            size,
            reason: format!("must be a multiple of {align}"),
        });
    }
    if size > max || max % size != 0 {
        return Err(ConfigError::InvalidSize {
            field,
            size,
            reason: format!("must evenly divide {max}"),
        });
    }
    Ok(())
}
