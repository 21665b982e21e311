//! Download handler.
//!
//! Relays a backend read stream to the client without buffering the file.

use axum::{
    body::Body,
    extract::{Path, State},
    http::header,
    response::Response,
};
use futures::TryStreamExt;
use std::sync::Arc;
use tokio_util::io::ReaderStream;

use crate::storage::ObjectStream;
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::FiledropError;

/// RFC 7230 token characters allowed in a bare `filename=` value.
///
/// `%`, `'` and `*` are left out so a bare value is never mistaken for an
/// extended parameter.
fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "!#$&+-.^_`|~".contains(c)
}

/// Generate the Content-Disposition header value for a download.
///
/// Only the last `/` segment of the name is suggested to the client.
/// Plain names are sent bare (`attachment; filename=report.txt`). Any other
/// name gets a quoted ASCII fallback with control characters removed and
/// quotes, backslashes and non-ASCII characters replaced by `_`, plus an
/// RFC 5987 `filename*` parameter carrying the exact UTF-8 name.
pub fn content_disposition_header(name: &str) -> String {
    let filename = name.rsplit('/').next().unwrap_or(name);

    if !filename.is_empty() && filename.chars().all(is_token_char) {
        return format!("attachment; filename={filename}");
    }

    let fallback: String = filename
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| match c {
            '"' | '\\' => '_',
            c if !c.is_ascii() => '_',
            c => c,
        })
        .collect();

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(filename)
    )
}

/// GET /download/*filename - Stream a file from the backend.
///
/// A missing file yields a plain-text 404 and no stream is opened. Once the
/// headers are sent, a read failure can only be logged: the body ends early
/// and the client sees a truncated transfer. The backend stream is owned by
/// the response body and is released when the body is dropped, whether the
/// copy finished, failed or the client went away.
pub async fn download(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    let ObjectStream {
        reader,
        content_type,
        content_length,
    } = state.backend.open(&filename).await.map_err(|e| match e {
        FiledropError::NotFound(_) => {
            ApiError::not_found(format!("File not found: {filename}")).plain()
        }
        other => {
            tracing::error!(file = %filename, "Failed to open file: {}", other);
            ApiError::internal(format!("Error opening file: {other}")).plain()
        }
    })?;

    let content_type = content_type.unwrap_or_else(|| {
        mime_guess::from_path(&filename)
            .first_or_octet_stream()
            .to_string()
    });

    let file = filename.clone();
    let body = ReaderStream::new(reader).inspect_err(move |e| {
        tracing::warn!(file = %file, "Error streaming file: {}", e);
    });

    let mut builder = Response::builder()
        .header(header::CONTENT_TYPE, content_type)
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_header(&filename),
        );
    if let Some(length) = content_length {
        builder = builder.header(header::CONTENT_LENGTH, length);
    }

    builder.body(Body::from_stream(body)).map_err(|e| {
        tracing::error!("Failed to build response: {}", e);
        ApiError::internal("Failed to build response").plain()
    })
}
