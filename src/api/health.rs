use std::sync::Arc;

use axum::response::Json;
use serde_json::{json, Value};

use crate::state::AppState;

/// Health check handler.
/// Returns JSON with status and config summary.
pub fn health_handler(state: &Arc<AppState>) -> Json<Value> {
    let config = &state.config;
    Json(json!({
        "status": "paper-architect is running",
        "config": {
            "default_provider": config.provider.as_ref().map(|provider| json!({
                "protocol": provider.provider_kind().as_str(),
                "model": provider.model,
            })),
            "storage_path": config.storage.path,
            "features": {
                "log_level": config.features.log_level,
                "max_output_tokens": config.features.max_output_tokens,
            }
        }
    }))
}
