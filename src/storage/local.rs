//! Local directory backend.

use std::fs::Metadata;
use std::io;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use walkdir::{DirEntry, WalkDir};

use super::{Backend, BackendKind, ObjectStream, RawEntry};
use crate::{FiledropError, Result};

/// Serves files found under a root directory.
///
/// Names are root-relative paths with `/` separators:
/// ```text
/// {root}/
/// ├── report.txt        -> "report.txt"
/// └── 2024/
///     └── q1.csv        -> "2024/q1.csv"
/// ```
/// Entries whose name starts with `.` are neither listed nor served.
#[derive(Debug, Clone)]
pub struct LocalBackend {
    root: PathBuf,
}

impl LocalBackend {
    /// Create a backend rooted at an existing directory.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(FiledropError::Config(format!(
                "files directory '{}' is not a directory",
                root.display()
            )));
        }
        Ok(Self { root })
    }

    /// Root directory of this backend.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Map a name to a path under `root`.
///
/// Returns `None` for names that are empty, absolute, or contain empty,
/// hidden (`.`, `..`, `.git`) or backslash-bearing segments, so a name
/// can never escape the root.
fn resolve(root: &Path, name: &str) -> Option<PathBuf> {
    if name.is_empty() || name.starts_with('/') {
        return None;
    }

    let mut path = root.to_path_buf();
    for segment in name.split('/') {
        if segment.is_empty() || segment.starts_with('.') || segment.contains('\\') {
            return None;
        }
        path.push(segment);
    }
    Some(path)
}

/// Find the regular file `name` refers to under `root`.
///
/// Applies the same rules as the listing: hidden segments are refused, and
/// so is any symbolic link between the root and the file, since the walk
/// never follows links. Anything that does not lead to a plain file is
/// `NotFound`.
pub async fn locate_file(root: &Path, name: &str) -> Result<(PathBuf, Metadata)> {
    let not_found = || FiledropError::NotFound(format!("File: {name}"));
    let path = resolve(root, name).ok_or_else(not_found)?;

    let mut current = root.to_path_buf();
    let mut segments = name.split('/').peekable();
    while let Some(segment) = segments.next() {
        current.push(segment);
        let metadata = tokio::fs::symlink_metadata(&current)
            .await
            .map_err(|e| not_found_or_backend(name, e))?;

        if metadata.file_type().is_symlink() {
            tracing::debug!(path = %current.display(), "Refusing to follow symlink");
            return Err(not_found());
        }
        if segments.peek().is_none() {
            return if metadata.is_file() {
                Ok((path, metadata))
            } else {
                Err(not_found())
            };
        }
        if !metadata.is_dir() {
            return Err(not_found());
        }
    }

    Err(not_found())
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .map(|s| s.starts_with('.'))
            .unwrap_or(false)
}

fn relative_name(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let segments: Option<Vec<&str>> = relative.components().map(|c| c.as_os_str().to_str()).collect();
    Some(segments?.join("/"))
}

fn walk(root: &Path) -> Result<Vec<RawEntry>> {
    let mut entries = Vec::new();

    for entry in WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .filter_entry(|e| !is_hidden(e))
    {
        let entry = entry.map_err(|e| {
            FiledropError::Backend(format!("failed to read directory {}: {e}", root.display()))
        })?;

        if !entry.file_type().is_file() {
            continue;
        }

        let Some(name) = relative_name(root, entry.path()) else {
            tracing::warn!(path = %entry.path().display(), "Skipping file with non UTF-8 name");
            continue;
        };

        let metadata = entry.metadata().map_err(|e| {
            FiledropError::Backend(format!("failed to stat {}: {e}", entry.path().display()))
        })?;
        let modified = metadata
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| DateTime::<Utc>::from(UNIX_EPOCH));

        entries.push(RawEntry::new(name, metadata.len(), modified));
    }

    Ok(entries)
}

fn not_found_or_backend(name: &str, e: io::Error) -> FiledropError {
    if e.kind() == io::ErrorKind::NotFound {
        FiledropError::NotFound(format!("File: {name}"))
    } else {
        FiledropError::Backend(format!("failed to open {name}: {e}"))
    }
}

#[async_trait]
impl Backend for LocalBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Local
    }

    async fn list(&self) -> Result<Vec<RawEntry>> {
        let root = self.root.clone();
        let entries = tokio::task::spawn_blocking(move || walk(&root))
            .await
            .map_err(|e| FiledropError::Backend(format!("directory walk aborted: {e}")))??;

        tracing::debug!(
            "Listed {} files in directory: {}",
            entries.len(),
            self.root.display()
        );

        Ok(entries)
    }

    async fn open(&self, name: &str) -> Result<ObjectStream> {
        let (path, metadata) = locate_file(&self.root, name).await?;

        let file = tokio::fs::File::open(&path)
            .await
            .map_err(|e| not_found_or_backend(name, e))?;

        let content_type = mime_guess::from_path(&path)
            .first_or_octet_stream()
            .to_string();

        Ok(ObjectStream::new(file)
            .with_content_type(content_type)
            .with_content_length(metadata.len()))
    }
}
