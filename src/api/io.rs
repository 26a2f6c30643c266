use std::sync::Arc;

use axum::body::Body;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;

use crate::error::ArchitectError;
use crate::state::AppState;
use crate::storage::Store;

pub(crate) fn parse_json_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, ArchitectError> {
    serde_json::from_slice(body)
        .map_err(|e| ArchitectError::InvalidRequest(format!("Invalid JSON body: {e}")))
}

pub(crate) fn json_response<T: Serialize>(status: StatusCode, value: &T) -> Response {
    match serde_json::to_vec(value) {
        Ok(bytes) => {
            let mut response = Response::new(Body::from(bytes));
            *response.status_mut() = status;
            response.headers_mut().insert(
                http::header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            );
            response
        }
        Err(e) => {
            ArchitectError::Internal(format!("Failed to encode response: {e}")).into_response()
        }
    }
}

pub(crate) fn not_found(what: &str, id: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        axum::Json(json!({
            "error": {
                "message": format!("{what} '{id}' not found"),
                "type": "not_found_error",
            }
        })),
    )
        .into_response()
}

pub(crate) fn sse_ok_response(body: Body) -> Response {
    let mut response = Response::new(body);
    *response.status_mut() = StatusCode::OK;
    let headers = response.headers_mut();
    headers.insert(
        http::header::CONTENT_TYPE,
        HeaderValue::from_static("text/event-stream"),
    );
    headers.insert(
        http::header::CACHE_CONTROL,
        HeaderValue::from_static("no-cache"),
    );
    headers.insert(
        http::header::CONNECTION,
        HeaderValue::from_static("keep-alive"),
    );
    response
}

/// Run a store call on the blocking pool.
pub(crate) async fn with_store<T, F>(state: &Arc<AppState>, f: F) -> Result<T, ArchitectError>
where
    T: Send + 'static,
    F: FnOnce(&Store) -> Result<T, ArchitectError> + Send + 'static,
{
    let state = Arc::clone(state);
    tokio::task::spawn_blocking(move || f(&state.store))
        .await
        .map_err(|e| ArchitectError::Internal(format!("Storage task failed: {e}")))?
}
