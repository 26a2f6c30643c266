use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use bytes::Bytes;

use super::io::{json_response, parse_json_body, with_store};
use crate::state::AppState;
use crate::storage::{Store, StoredSettings};

/// `GET /api/settings`: the stored record, or `null` when none was saved.
pub async fn get_handler(state: Arc<AppState>) -> Response {
    match with_store(&state, Store::get_settings).await {
        Ok(settings) => json_response(StatusCode::OK, &settings),
        Err(err) => err.into_response(),
    }
}

/// `PUT /api/settings`: replace the stored record.
pub async fn put_handler(state: Arc<AppState>, body: Bytes) -> Response {
    let settings: StoredSettings = match parse_json_body(&body) {
        Ok(settings) => settings,
        Err(err) => return err.into_response(),
    };
    let saved = settings.clone();
    match with_store(&state, move |store| store.save_settings(&settings)).await {
        Ok(()) => {
            tracing::info!(
                protocol = %crate::protocol::ProviderKind::classify(&saved.base_url),
                model = %saved.model,
                "settings saved"
            );
            json_response(StatusCode::OK, &saved)
        }
        Err(err) => err.into_response(),
    }
}

