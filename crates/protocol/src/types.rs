use serde::{Deserialize, Serialize};

use crate::messages::base64_bytes;

/// Addresses a stored file for download.
///
/// Supplied by the caller and never modified by the transfer engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteLocation {
    pub file_id: String,
    pub access_hash: String,
    #[serde(with = "base64_bytes")]
    pub file_reference: Vec<u8>,
}

impl RemoteLocation {
    pub fn new(
        file_id: impl Into<String>,
        access_hash: impl Into<String>,
        file_reference: Vec<u8>,
    ) -> Self {
        Self {
            file_id: file_id.into(),
            access_hash: access_hash.into(),
            file_reference,
        }
    }
}

/// Handle returned once every part of an upload has been acknowledged.
///
/// Serializes as the remote side's `inputFileBig` object so it can be
/// attached to a follow-up call unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "_", rename = "inputFileBig")]
pub struct RemoteFileHandle {
    pub id: i64,
    #[serde(rename = "parts")]
    pub total_parts: u32,
}

/// Routing override threaded through the retry chain of one logical call.
///
/// Starts empty; only the retry layer sets `dc_id`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallRoute {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dc_id: Option<i32>,
}

impl CallRoute {
    /// Route with no override: the call goes to the default datacenter.
    pub fn default_dc() -> Self {
        Self::default()
    }

    /// Returns a copy of this route pinned to `dc_id`.
    pub fn redirected(self, dc_id: i32) -> Self {
        Self { dc_id: Some(dc_id) }
    }
}
