use std::convert::Infallible;
use std::sync::Arc;

use axum::body::Body;
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use futures_util::StreamExt;
use serde::Deserialize;
use serde_json::json;

use super::io::{parse_json_body, sse_ok_response};
use crate::error::ArchitectError;
use crate::generate::{GenerationRequest, GenerationStream, ProviderConfig};
use crate::prompt::WorkflowStep;
use crate::protocol::canonical::StreamEvent;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateBody {
    step: WorkflowStep,
    user_input: String,
    #[serde(default)]
    blueprint: Option<String>,
    #[serde(default)]
    composed_text: Option<String>,
    #[serde(default)]
    reference_text: Option<String>,
    #[serde(default)]
    config: Option<ProviderConfig>,
}

pub async fn handler(state: Arc<AppState>, body: Bytes) -> Response {
    match start_generation(&state, &body).await {
        Ok(stream) => sse_ok_response(Body::from_stream(sse_frames(stream))),
        Err(err) => {
            tracing::warn!(error = %err, "generation request failed before streaming");
            err.into_response()
        }
    }
}

async fn start_generation(
    state: &Arc<AppState>,
    body: &[u8],
) -> Result<GenerationStream, ArchitectError> {
    let body: GenerateBody = parse_json_body(body)?;
    let provider = match body.config {
        Some(provider) => provider,
        None => {
            let state = Arc::clone(state);
            tokio::task::spawn_blocking(move || state.default_provider())
                .await
                .map_err(|e| ArchitectError::Internal(format!("Storage task failed: {e}")))??
        }
    };
    if provider.credential.trim().is_empty() {
        return Err(ArchitectError::InvalidRequest(
            "Provider api_key cannot be empty".to_string(),
        ));
    }

    let mut request = GenerationRequest::new(body.step, body.user_input, provider);
    request.prior_blueprint = body.blueprint;
    request.prior_composition = body.composed_text;
    request.reference_text = body.reference_text;

    state.generator.generate(&request).await
}

fn sse_frames(
    stream: GenerationStream,
) -> impl futures_util::Stream<Item = Result<Bytes, Infallible>> + Send + 'static {
    stream.map(|event| Ok(encode_frame(event)))
}

/// One SSE frame: `data:` for text, `event: done` or `event: error` otherwise.
fn encode_frame(event: Result<StreamEvent, ArchitectError>) -> Bytes {
    let (name, payload) = match event {
        Ok(StreamEvent::Fragment(text)) => (None, json!({ "text": text })),
        Ok(StreamEvent::Complete(termination)) => {
            (Some("done"), json!({ "termination": termination }))
        }
        Err(err) => (Some("error"), json!({ "message": err.to_string() })),
    };
    let mut frame = String::new();
    if let Some(name) = name {
        frame.push_str("event: ");
        frame.push_str(name);
        frame.push('\n');
    }
    frame.push_str("data: ");
    frame.push_str(&payload.to_string());
    frame.push_str("\n\n");
    Bytes::from(frame)
}
