//! Structured remote errors and their recovery classification.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    AUTH_MIGRATE_TYPE, FLOOD_WAIT_CODE, FLOOD_WAIT_MARKER, MIGRATE_MARKER, SEE_OTHER_CODE,
};

/// Structured error returned by the remote side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("remote error ({code}) {message}")]
pub struct RpcError {
    pub code: i32,
    pub message: String,
}

/// How a recoverable [`RpcError`] should be absorbed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    /// Wait this long, then repeat the identical call.
    FloodWait(Duration),
    /// Repeat the call on another datacenter.
    Migrate(Migration),
}

/// Destination of a migration redirect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Migration {
    pub scope: MigrateScope,
    pub dc_id: i32,
}

/// Whether a redirect moves the whole session or only the current call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrateScope {
    /// Authentication-phase redirect: the default datacenter moves.
    Session,
    /// Redirect local to the call chain that received it.
    Call,
}

impl RpcError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Classifies this error. `None` means it is fatal and must not be retried.
    ///
    /// A 420 or 303 whose message cannot be parsed is treated as fatal.
    pub fn recovery(&self) -> Option<Recovery> {
        match self.code {
            FLOOD_WAIT_CODE => self.flood_wait().map(Recovery::FloodWait),
            SEE_OTHER_CODE => self.migration().map(Recovery::Migrate),
            _ => None,
        }
    }

    /// Parses `...FLOOD_WAIT_<seconds>`.
    pub fn flood_wait(&self) -> Option<Duration> {
        let (_, seconds) = self.message.split_once(FLOOD_WAIT_MARKER)?;
        seconds.trim().parse::<u64>().ok().map(Duration::from_secs)
    }

    /// Parses `<TYPE>_MIGRATE_<dc>`.
    pub fn migration(&self) -> Option<Migration> {
        let (kind, dc) = self.message.split_once(MIGRATE_MARKER)?;
        let dc_id = dc.trim().parse::<i32>().ok()?;
        let scope = if kind == AUTH_MIGRATE_TYPE {
            MigrateScope::Session
        } else {
            MigrateScope::Call
        };
        Some(Migration { scope, dc_id })
    }

    /// The redirect type token (`USER`, `PHONE`, `FILE`, ...), if this is a
    /// migration message.
    pub fn migrate_type(&self) -> Option<&str> {
        self.message
            .split_once(MIGRATE_MARKER)
            .map(|(kind, _)| kind)
    }
}
