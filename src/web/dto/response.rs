//! Response DTOs for the listing API.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::listing::FileEntry;

/// Entry of `GET /api/files`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileResponse {
    /// File name (object key).
    pub key: String,
    /// Size in bytes.
    pub size: u64,
    /// Last modification time (RFC 3339).
    pub last_modified: DateTime<Utc>,
    /// Proxied download URL.
    pub download_url: String,
}

impl From<FileEntry> for FileResponse {
    fn from(entry: FileEntry) -> Self {
        Self {
            key: entry.name,
            size: entry.size_bytes,
            last_modified: entry.modified_at,
            download_url: entry.download_url,
        }
    }
}

/// Entry of `GET /files` (local backend).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocalFileResponse {
    /// Root-relative file name.
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    /// Human-readable size.
    pub size_formatted: String,
    /// Last modification time (RFC 3339).
    pub modified: DateTime<Utc>,
    /// Proxied download URL.
    pub download_url: String,
    /// Direct static URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub static_url: Option<String>,
}

impl From<FileEntry> for LocalFileResponse {
    fn from(entry: FileEntry) -> Self {
        Self {
            name: entry.name,
            size: entry.size_bytes,
            size_formatted: entry.size,
            modified: entry.modified_at,
            download_url: entry.download_url,
            static_url: entry.static_url,
        }
    }
}

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Human-readable message.
    pub error: String,
}
