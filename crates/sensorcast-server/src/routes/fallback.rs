//! Fallback for requests no route matches.

use axum::http::Uri;

use crate::error::ServerError;

/// Answer unmatched paths with a JSON `404`.
pub async fn not_found_handler(uri: Uri) -> ServerError {
    ServerError::NotFound(format!("no route for {}", uri.path()))
}
