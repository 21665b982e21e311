//! Listing handlers.

use axum::{extract::State, http::StatusCode, response::Html, Json};
use std::sync::Arc;

use crate::listing::{list_files, FileEntry};
use crate::template::{TemplateContext, Value, INDEX_TEMPLATE};
use crate::web::dto::{FileResponse, LocalFileResponse};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

fn entry_value(entry: &FileEntry) -> Value {
    Value::object([
        ("name", Value::from(entry.name.as_str())),
        ("size", Value::from(entry.size.as_str())),
        ("modified", Value::from(entry.modified.as_str())),
        ("download_url", Value::from(entry.download_url.as_str())),
        ("static_url", Value::from(entry.static_url.clone())),
    ])
}

/// GET / - HTML listing page.
///
/// A backend failure still renders the page, with the error message and a
/// 500 status.
pub async fn index(
    State(state): State<Arc<AppState>>,
) -> Result<(StatusCode, Html<String>), ApiError> {
    let mut context = TemplateContext::new();
    context.set("title", Value::from(state.title.as_str()));

    let status = match list_files(state.backend.as_ref(), &state.listing).await {
        Ok(files) => {
            context.set(
                "files",
                Value::List(files.iter().map(entry_value).collect()),
            );
            StatusCode::OK
        }
        Err(e) => {
            tracing::error!("Failed to list files: {}", e);
            context.set("error", Value::from(format!("Error listing files: {e}")));
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    let html = state.templates.render(INDEX_TEMPLATE, &context).map_err(|e| {
        tracing::error!("Failed to render listing page: {}", e);
        ApiError::internal("Failed to render page").plain()
    })?;

    Ok((status, Html(html)))
}

/// GET /api/files - JSON listing.
pub async fn api_files(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<FileResponse>>, ApiError> {
    let files = list_files(state.backend.as_ref(), &state.listing).await?;
    Ok(Json(files.into_iter().map(FileResponse::from).collect()))
}

/// GET /files - JSON listing with proxied and direct URLs (local backend).
pub async fn local_files(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<LocalFileResponse>>, ApiError> {
    let files = list_files(state.backend.as_ref(), &state.listing).await?;
    Ok(Json(files.into_iter().map(LocalFileResponse::from).collect()))
}
