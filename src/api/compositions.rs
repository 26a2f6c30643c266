use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use serde::Deserialize;

use super::io::{json_response, not_found, parse_json_body, with_store};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SaveCompositionBody {
    blueprint_id: String,
    content: String,
}

pub async fn get_handler(state: Arc<AppState>, id: String) -> Response {
    let lookup = id.clone();
    match with_store(&state, move |store| store.get_composition(&lookup)).await {
        Ok(Some(record)) => json_response(StatusCode::OK, &record),
        Ok(None) => not_found("Composition", &id),
        Err(err) => err.into_response(),
    }
}

pub async fn put_handler(state: Arc<AppState>, id: String, body: Bytes) -> Response {
    let request: SaveCompositionBody = match parse_json_body(&body) {
        Ok(request) => request,
        Err(err) => return err.into_response(),
    };
    match with_store(&state, move |store| {
        store.save_composition(&id, &request.blueprint_id, &request.content)
    })
    .await
    {
        Ok(record) => json_response(StatusCode::OK, &record),
        Err(err) => err.into_response(),
    }
}
