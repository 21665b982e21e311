//! Router configuration.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::path::PathBuf;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use super::handlers::{api_files, download, index, local_files, AppState};
use crate::storage::locate_file;

/// Create the main router.
///
/// Listing routes are gzip-compressed. Download routes are not, so bytes
/// and `Content-Length` reach the client untouched.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    let mut listing_routes: Router<Arc<AppState>> = Router::new()
        .route("/", get(index))
        .route("/api/files", get(api_files));

    if app_state.static_root.is_some() {
        listing_routes = listing_routes.route("/files", get(local_files));
    }

    let download_routes: Router<Arc<AppState>> =
        Router::new().route("/download/*filename", get(download));

    let mut router = Router::new()
        .merge(listing_routes.layer(CompressionLayer::new()))
        .merge(download_routes)
        .with_state(app_state.clone());

    if let Some(root) = &app_state.static_root {
        let static_files = ServiceBuilder::new()
            .layer(middleware::from_fn_with_state(
                Arc::new(root.clone()),
                guard_static,
            ))
            .service(ServeDir::new(root));
        router = router.nest_service("/downloads", static_files);
    }

    router
        .merge(create_health_router())
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}

/// Only let through static requests for files the local backend would also
/// proxy: no hidden segments, no symlinks, regular files only.
async fn guard_static(
    State(root): State<Arc<PathBuf>>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_owned();
    let allowed = match urlencoding::decode(path.trim_start_matches('/')) {
        Ok(name) => locate_file(&root, &name).await.is_ok(),
        Err(_) => false,
    };

    if !allowed {
        tracing::debug!(path = %path, "Static file request refused");
        return StatusCode::NOT_FOUND.into_response();
    }
    next.run(request).await
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use tower::util::ServiceExt;

    use crate::storage::LocalBackend;

    fn local_router(dir: &std::path::Path) -> Router {
        std::fs::write(dir.join("notes.txt"), "some notes ".repeat(200)).unwrap();
        let backend = LocalBackend::new(dir).unwrap();
        let state = AppState::new(Arc::new(backend))
            .unwrap()
            .with_static_root(dir);
        create_router(Arc::new(state))
    }

    async fn get(router: Router, uri: &str, gzip: bool) -> axum::response::Response {
        let mut request = Request::builder().uri(uri);
        if gzip {
            request = request.header(header::ACCEPT_ENCODING, "gzip");
        }
        router
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_check() {
        let response = create_health_router()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_listing_is_compressed() {
        let dir = tempfile::tempdir().unwrap();
        let response = get(local_router(dir.path()), "/api/files", true).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_ENCODING], "gzip");
    }

    #[tokio::test]
    async fn test_download_is_not_compressed() {
        let dir = tempfile::tempdir().unwrap();
        let response = get(local_router(dir.path()), "/download/notes.txt", true).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(header::CONTENT_ENCODING).is_none());
        assert_eq!(response.headers()[header::CONTENT_LENGTH], "2200");
    }

    #[tokio::test]
    async fn test_static_route_refuses_hidden_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".env"), "SECRET=1").unwrap();
        std::fs::create_dir_all(dir.path().join(".git")).unwrap();
        std::fs::write(dir.path().join(".git/config"), "[core]").unwrap();
        let router = local_router(dir.path());

        for uri in ["/downloads/.env", "/downloads/%2Eenv", "/downloads/.git/config"] {
            let response = get(router.clone(), uri, false).await;
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
        }

        let response = get(router, "/downloads/notes.txt", false).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let dir = tempfile::tempdir().unwrap();
        let response = get(local_router(dir.path()), "/nope", false).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
