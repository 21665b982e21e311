//! Listing assembly.
//!
//! Turns a backend enumeration into display-ready [`FileEntry`] values.
//! Entry order is the backend's order; nothing is re-sorted.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::datetime::format_time_in;
use crate::size::format_size;
use crate::storage::{Backend, RawEntry};
use crate::{FiledropError, Result};

/// Path prefix of the proxied download route.
pub const DOWNLOAD_PREFIX: &str = "/download/";

/// Path prefix of the static download route (local backend only).
pub const STATIC_PREFIX: &str = "/downloads/";

/// How listings are formatted.
#[derive(Debug, Clone)]
pub struct ListingOptions {
    /// Timezone used for display timestamps.
    pub timezone: String,
    /// Prefix of download URLs.
    pub download_prefix: String,
    /// Prefix of direct static URLs, when static serving is enabled.
    pub static_prefix: Option<String>,
}

impl Default for ListingOptions {
    fn default() -> Self {
        Self {
            timezone: "UTC".to_string(),
            download_prefix: DOWNLOAD_PREFIX.to_string(),
            static_prefix: None,
        }
    }
}

impl ListingOptions {
    /// Enable direct static URLs under the default prefix.
    pub fn with_static_urls(mut self) -> Self {
        self.static_prefix = Some(STATIC_PREFIX.to_string());
        self
    }

    /// Set the display timezone.
    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = timezone.into();
        self
    }
}

/// A display-ready file listing entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileEntry {
    /// File name, unique within one listing.
    pub name: String,
    /// Size in bytes.
    pub size_bytes: u64,
    /// Human-readable size, e.g. `2.0 KB`.
    pub size: String,
    /// Modification time.
    pub modified_at: DateTime<Utc>,
    /// Display modification time, e.g. `Jan 02, 2006 15:04:05`.
    pub modified: String,
    /// Proxied download URL.
    pub download_url: String,
    /// Direct static URL, if static serving is enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub static_url: Option<String>,
}

/// Percent-encode each `/`-separated segment of a name, keeping separators.
pub fn encode_path(name: &str) -> String {
    name.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Build one entry.
pub fn build_entry(raw: RawEntry, options: &ListingOptions) -> FileEntry {
    let encoded = encode_path(&raw.name);
    FileEntry {
        size: format_size(raw.size),
        modified: format_time_in(&raw.modified, &options.timezone),
        download_url: format!("{}{}", options.download_prefix, encoded),
        static_url: options
            .static_prefix
            .as_ref()
            .map(|prefix| format!("{prefix}{encoded}")),
        size_bytes: raw.size,
        modified_at: raw.modified,
        name: raw.name,
    }
}

/// Format raw entries, preserving their order.
pub fn assemble(raw: Vec<RawEntry>, options: &ListingOptions) -> Vec<FileEntry> {
    raw.into_iter()
        .map(|entry| build_entry(entry, options))
        .collect()
}

/// Enumerate a backend and format the result.
///
/// Any backend failure aborts the whole listing with a single
/// `FiledropError::Backend`.
pub async fn list_files(backend: &dyn Backend, options: &ListingOptions) -> Result<Vec<FileEntry>> {
    let raw = backend.list().await.map_err(|e| match e {
        FiledropError::Backend(msg) => FiledropError::Backend(msg),
        other => FiledropError::Backend(other.to_string()),
    })?;
    Ok(assemble(raw, options))
}
