//! HTTP handlers.

pub mod download;
pub mod listing;

pub use download::*;
pub use listing::*;

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{BackendKind, Config};
use crate::listing::ListingOptions;
use crate::storage::{Backend, LocalBackend, S3Backend};
use crate::template::TemplateEngine;
use crate::Result;

/// Default page title.
pub const DEFAULT_TITLE: &str = "Files";

/// Application state shared across handlers.
///
/// Built once at startup and never mutated afterwards.
pub struct AppState {
    /// Storage backend.
    pub backend: Arc<dyn Backend>,
    /// Parsed HTML templates.
    pub templates: TemplateEngine,
    /// Listing formatting options.
    pub listing: ListingOptions,
    /// Page title.
    pub title: String,
    /// Directory served at `/downloads` (local backend only).
    pub static_root: Option<PathBuf>,
}

impl AppState {
    /// Create a state around a backend with the built-in templates.
    pub fn new(backend: Arc<dyn Backend>) -> Result<Self> {
        Ok(Self {
            backend,
            templates: TemplateEngine::with_builtin()?,
            listing: ListingOptions::default(),
            title: DEFAULT_TITLE.to_string(),
            static_root: None,
        })
    }

    /// Build the backend and state described by a validated configuration.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let state = match config.storage.backend {
            BackendKind::S3 => {
                let backend = S3Backend::connect(&config.storage).await?;
                let title = format!("Files in {}", backend.bucket());
                Self::new(Arc::new(backend))?.with_title(title)
            }
            BackendKind::Local => {
                let backend = LocalBackend::new(config.root_path())?;
                let root = backend.root().to_path_buf();
                Self::new(Arc::new(backend))?.with_static_root(root)
            }
        };

        Ok(state
            .with_templates(TemplateEngine::from_dir(&config.templates.path)?)
            .with_timezone(&config.display.timezone))
    }

    /// Replace the template engine.
    pub fn with_templates(mut self, templates: TemplateEngine) -> Self {
        self.templates = templates;
        self
    }

    /// Set the display timezone.
    pub fn with_timezone(mut self, timezone: &str) -> Self {
        self.listing.timezone = timezone.to_string();
        self
    }

    /// Set the page title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Serve `root` statically at `/downloads` and advertise direct URLs.
    pub fn with_static_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.static_root = Some(root.into());
        self.listing = self.listing.with_static_urls();
        self
    }
}
