//! The single page served for every HTTP request

use axum::{
    extract::State,
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use std::path::PathBuf;
use std::sync::Arc;

/// Body of the 500 response when the page cannot be read
pub const PAGE_ERROR: &str = "Error loading index.html";

/// State for the page handler
pub struct PageState {
    pub path: PathBuf,
}

/// Serve the configured page regardless of the requested path
///
/// The file is read on every request, so edits show up on reload.
pub async fn serve_page(State(state): State<Arc<PageState>>, uri: Uri) -> Response {
    tracing::info!("url is {}", uri.path().trim_start_matches('/'));

    match tokio::fs::read(&state.path).await {
        Ok(data) => {
            let mime = mime_guess::from_path(&state.path).first_or_octet_stream();
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, mime.to_string())],
                data,
            )
                .into_response()
        }
        Err(e) => {
            tracing::warn!("Failed to read {:?}: {}", state.path, e);
            (StatusCode::INTERNAL_SERVER_ERROR, PAGE_ERROR).into_response()
        }
    }
}
