//! Storage backends.
//!
//! A backend owns file bytes and metadata. Handlers only see the [`Backend`]
//! trait:
//! - [`S3Backend`]: objects in an S3 bucket
//! - [`LocalBackend`]: files under a local directory tree

mod local;
mod s3;

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::io::AsyncRead;

pub use crate::config::BackendKind;
pub use local::{locate_file, LocalBackend};
pub use s3::S3Backend;

use crate::Result;

/// One file as enumerated by a backend, before any formatting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    /// Name (S3 key, or root-relative path with `/` separators).
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    /// Last modification time.
    pub modified: DateTime<Utc>,
}

impl RawEntry {
    /// Create a new raw entry.
    pub fn new(name: impl Into<String>, size: u64, modified: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            size,
            modified,
        }
    }
}

/// An open read stream on a backend file.
///
/// Dropping the stream releases the underlying connection or file handle.
pub struct ObjectStream {
    /// Byte source.
    pub reader: Box<dyn AsyncRead + Send + Unpin>,
    /// Content type reported by the backend, if any.
    pub content_type: Option<String>,
    /// Content length reported by the backend, if known.
    pub content_length: Option<u64>,
}

impl ObjectStream {
    /// Wrap a reader with no metadata.
    pub fn new(reader: impl AsyncRead + Send + Unpin + 'static) -> Self {
        Self {
            reader: Box::new(reader),
            content_type: None,
            content_length: None,
        }
    }

    /// Set the content type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Set the content length.
    pub fn with_content_length(mut self, length: u64) -> Self {
        self.content_length = Some(length);
        self
    }
}

impl fmt::Debug for ObjectStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectStream")
            .field("content_type", &self.content_type)
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// A storage system that can enumerate files and open them for reading.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Which kind of backend this is.
    fn kind(&self) -> BackendKind;

    /// Enumerate every visible file, in the backend's own order.
    async fn list(&self) -> Result<Vec<RawEntry>>;

    /// Open a file for reading.
    ///
    /// Returns `FiledropError::NotFound` when no such file exists; no
    /// stream is opened in that case.
    async fn open(&self, name: &str) -> Result<ObjectStream>;
}
