//! HTTP interface.
//!
//! Serves the listing page, the JSON listings and the download proxy on top
//! of a storage backend.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use handlers::AppState;
pub use router::create_router;
pub use server::WebServer;
