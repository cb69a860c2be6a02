//! Stored file retrieval endpoint.

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tokio_util::io::ReaderStream;
use tracing::error;

use clipferry_core::FileStoreError;

use crate::state::AppState;

/// Streams a stored file back to the client. Each handle works once;
/// retrieved and expired files answer 404.
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    Path(handle): Path<String>,
) -> Response {
    match state.store().retrieve(&handle).await {
        Ok(retrieved) => {
            let headers = [
                (
                    header::CONTENT_TYPE,
                    "application/octet-stream".to_string(),
                ),
                (
                    header::CONTENT_DISPOSITION,
                    format!(
                        "attachment; filename=\"{}\"",
                        sanitize_filename(&retrieved.original_name)
                    ),
                ),
                (header::CONTENT_LENGTH, retrieved.size_bytes.to_string()),
            ];
            let body = Body::from_stream(ReaderStream::new(retrieved.file));
            (headers, body).into_response()
        }
        Err(FileStoreError::NotFound { .. }) => {
            (StatusCode::NOT_FOUND, "File not found or expired").into_response()
        }
        Err(e) => {
            error!("Failed to retrieve stored file {}: {}", handle, e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal error").into_response()
        }
    }
}

/// Keeps the Content-Disposition header well formed whatever the
/// original title contained.
fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '"' | '\\' | '\r' | '\n' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}
