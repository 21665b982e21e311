//! Test helpers for web API tests.
//!
//! Provides an in-memory backend that records stream lifetimes, and helpers
//! to build a test server around it.

#![allow(dead_code)]

use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use async_trait::async_trait;
use axum_test::TestServer;
use chrono::{DateTime, TimeZone, Utc};
use tokio::io::{AsyncRead, ReadBuf};

use filedrop::storage::{Backend, BackendKind, ObjectStream, RawEntry};
use filedrop::web::create_router;
use filedrop::{AppState, FiledropError, Result};

/// Fixed modification time used by fixtures: Jan 02, 2006 15:04:05 UTC.
pub fn reference_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2006, 1, 2, 15, 4, 5).unwrap()
}

/// A stored object.
#[derive(Debug, Clone)]
pub struct MemoryObject {
    pub name: String,
    pub content: Vec<u8>,
    pub modified: DateTime<Utc>,
    pub content_type: Option<String>,
    /// Fail with an I/O error after this many bytes.
    pub fail_after: Option<usize>,
}

impl MemoryObject {
    pub fn new(name: &str, content: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.to_string(),
            content: content.into(),
            modified: reference_time(),
            content_type: None,
            fail_after: None,
        }
    }

    pub fn with_content_type(mut self, content_type: &str) -> Self {
        self.content_type = Some(content_type.to_string());
        self
    }

    pub fn failing_after(mut self, bytes: usize) -> Self {
        self.fail_after = Some(bytes);
        self
    }
}

/// Counters shared between the backend and the readers it hands out.
#[derive(Debug, Default)]
pub struct StreamStats {
    pub opened: AtomicUsize,
    pub closed: AtomicUsize,
}

impl StreamStats {
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Reader over an object's bytes that counts its own drop.
struct TrackedReader {
    content: Vec<u8>,
    pos: usize,
    fail_after: Option<usize>,
    stats: Arc<StreamStats>,
}

impl AsyncRead for TrackedReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let end = match self.fail_after {
            Some(limit) if self.pos >= limit => {
                return Poll::Ready(Err(io::Error::new(
                    io::ErrorKind::ConnectionReset,
                    "backend connection reset",
                )));
            }
            Some(limit) => limit.min(self.content.len()),
            None => self.content.len(),
        };

        let n = (end - self.pos).min(buf.remaining());
        let start = self.pos;
        buf.put_slice(&self.content[start..start + n]);
        self.pos += n;
        Poll::Ready(Ok(()))
    }
}

impl Drop for TrackedReader {
    fn drop(&mut self) {
        self.stats.closed.fetch_add(1, Ordering::SeqCst);
    }
}

/// In-memory backend. Lists objects in insertion order.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    objects: Vec<MemoryObject>,
    list_error: Option<String>,
    pub stats: Arc<StreamStats>,
}

impl MemoryBackend {
    pub fn new(objects: Vec<MemoryObject>) -> Self {
        Self {
            objects,
            ..Self::default()
        }
    }

    /// A backend whose enumeration always fails.
    pub fn unavailable(message: &str) -> Self {
        Self {
            list_error: Some(message.to_string()),
            ..Self::default()
        }
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::S3
    }

    async fn list(&self) -> Result<Vec<RawEntry>> {
        if let Some(message) = &self.list_error {
            return Err(FiledropError::Backend(message.clone()));
        }
        Ok(self
            .objects
            .iter()
            .map(|o| RawEntry::new(o.name.clone(), o.content.len() as u64, o.modified))
            .collect())
    }

    async fn open(&self, name: &str) -> Result<ObjectStream> {
        let object = self
            .objects
            .iter()
            .find(|o| o.name == name)
            .ok_or_else(|| FiledropError::NotFound(format!("File: {name}")))?;

        self.stats.opened.fetch_add(1, Ordering::SeqCst);
        let reader = TrackedReader {
            content: object.content.clone(),
            pos: 0,
            fail_after: object.fail_after,
            stats: self.stats.clone(),
        };

        let mut stream = ObjectStream::new(reader);
        stream.content_type = object.content_type.clone();
        if object.fail_after.is_none() {
            stream.content_length = Some(object.content.len() as u64);
        }
        Ok(stream)
    }
}

/// Build the app state around an in-memory backend.
pub fn memory_state(objects: Vec<MemoryObject>) -> (Arc<AppState>, Arc<StreamStats>) {
    let backend = MemoryBackend::new(objects);
    let stats = backend.stats.clone();
    let state = AppState::new(Arc::new(backend)).expect("Failed to create app state");
    (Arc::new(state), stats)
}

/// Create a test server around an in-memory backend.
pub fn create_test_server(objects: Vec<MemoryObject>) -> (TestServer, Arc<StreamStats>) {
    let (state, stats) = memory_state(objects);
    let server = TestServer::new(create_router(state)).expect("Failed to create test server");
    (server, stats)
}

/// Create a test server around a backend whose listing fails.
pub fn create_unavailable_server(message: &str) -> TestServer {
    let state = AppState::new(Arc::new(MemoryBackend::unavailable(message)))
        .expect("Failed to create app state");
    TestServer::new(create_router(Arc::new(state))).expect("Failed to create test server")
}
