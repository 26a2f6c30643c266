use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use serde::Deserialize;

use super::io::{json_response, not_found, parse_json_body, with_store};
use crate::state::AppState;
use crate::storage::Store;

#[derive(Debug, Deserialize)]
struct SaveBlueprintBody {
    title: String,
    content: String,
}

pub async fn list_handler(state: Arc<AppState>) -> Response {
    match with_store(&state, Store::list_blueprints).await {
        Ok(records) => json_response(StatusCode::OK, &records),
        Err(err) => err.into_response(),
    }
}

pub async fn get_handler(state: Arc<AppState>, id: String) -> Response {
    let lookup = id.clone();
    match with_store(&state, move |store| store.get_blueprint(&lookup)).await {
        Ok(Some(record)) => json_response(StatusCode::OK, &record),
        Ok(None) => not_found("Blueprint", &id),
        Err(err) => err.into_response(),
    }
}

pub async fn put_handler(state: Arc<AppState>, id: String, body: Bytes) -> Response {
    let request: SaveBlueprintBody = match parse_json_body(&body) {
        Ok(request) => request,
        Err(err) => return err.into_response(),
    };
    match with_store(&state, move |store| {
        store.save_blueprint(&id, &request.title, &request.content)
    })
    .await
    {
        Ok(record) => {
            tracing::debug!(id = %record.id, bytes = record.content.len(), "blueprint saved");
            json_response(StatusCode::OK, &record)
        }
        Err(err) => err.into_response(),
    }
}

pub async fn delete_handler(state: Arc<AppState>, id: String) -> Response {
    let target = id.clone();
    match with_store(&state, move |store| store.delete_blueprint(&target)).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => not_found("Blueprint", &id),
        Err(err) => err.into_response(),
    }
}

/// `GET /api/blueprints/{id}/compositions`.
pub async fn compositions_handler(state: Arc<AppState>, blueprint_id: String) -> Response {
    match with_store(&state, move |store| {
        store.list_compositions_by_blueprint(&blueprint_id)
    })
    .await
    {
        Ok(records) => json_response(StatusCode::OK, &records),
        Err(err) => err.into_response(),
    }
}
