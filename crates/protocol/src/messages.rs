use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::constants::{GET_FILE, SAVE_BIG_FILE_PART};
use crate::types::RemoteLocation;

/// A remote method: its request payload, wire name, and response type.
pub trait RpcMethod: Serialize {
    /// Method name passed to the remote-call collaborator.
    const NAME: &'static str;

    type Response: DeserializeOwned;
}

// ---------------------------------------------------------------------------
// Request payloads
// ---------------------------------------------------------------------------

/// Stores one part of a large file.
///
/// The remote side aggregates parts by `file_id`; `bytes` is base64-encoded
/// in JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveBigFilePart {
    pub file_id: i64,
    pub file_part: u32,
    pub file_total_parts: u32,
    #[serde(with = "base64_bytes")]
    pub bytes: Vec<u8>,
}

impl RpcMethod for SaveBigFilePart {
    const NAME: &'static str = SAVE_BIG_FILE_PART;
    type Response = bool;
}

/// Reads `limit` bytes starting at `offset` of a stored file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetFile {
    pub offset: u64,
    pub limit: u32,
    pub location: InputFileLocation,
}

impl RpcMethod for GetFile {
    const NAME: &'static str = GET_FILE;
    type Response = UploadFile;
}

/// Location object embedded in [`GetFile`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "_")]
pub enum InputFileLocation {
    #[serde(rename = "inputDocumentFileLocation")]
    Document {
        id: String,
        access_hash: String,
        #[serde(with = "base64_bytes")]
        file_reference: Vec<u8>,
    },
}

impl From<&RemoteLocation> for InputFileLocation {
    fn from(loc: &RemoteLocation) -> Self {
        InputFileLocation::Document {
            id: loc.file_id.clone(),
            access_hash: loc.access_hash.clone(),
            file_reference: loc.file_reference.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Response payloads
// ---------------------------------------------------------------------------

/// One window of file content returned by [`GetFile`].
///
/// A window shorter than the requested limit marks the end of the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadFile {
    #[serde(with = "base64_bytes")]
    pub bytes: Vec<u8>,
    #[serde(default, skip_serializing_if = "is_zero_i32")]
    pub mtime: i32,
}

fn is_zero_i32(v: &i32) -> bool {
    *v == 0
}

/// Serde adapter encoding byte fields as base64 strings.
pub(crate) mod base64_bytes {
    use base64::{Engine, engine::general_purpose::STANDARD};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        STANDARD.encode(data).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        STANDARD.decode(&s).map_err(serde::de::Error::custom)
    }
}
