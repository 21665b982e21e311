//! filedrop - list and stream files over HTTP.
//!
//! Serves the files of an S3 bucket or of a local directory tree: an HTML
//! and JSON listing with human-readable sizes and timestamps, and a download
//! route that streams each file straight from the backend.

pub mod config;
pub mod datetime;
pub mod error;
pub mod listing;
pub mod logging;
pub mod size;
pub mod storage;
pub mod template;
pub mod web;

pub use config::{BackendKind, Config};
pub use datetime::{format_time, format_time_in};
pub use error::{FiledropError, Result};
pub use listing::{assemble, list_files, FileEntry, ListingOptions};
pub use size::{format_size, parse_size, SizeUnit};
pub use storage::{Backend, LocalBackend, ObjectStream, RawEntry, S3Backend};
pub use web::{AppState, WebServer};
