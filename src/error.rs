use serde_json::json;

/// Error type shared by every module of the crate.
///
/// Malformed JSON on an individual stream line is deliberately absent: the
/// provider adapters drop such lines instead of failing the generation.
#[derive(Debug, thiserror::Error)]
pub enum ArchitectError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Provider error: status={status}, body={body}")]
    ProviderHttp { status: u16, body: String },
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Broad error category for status code selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    InvalidRequest,
    Authentication,
    Permission,
    NotFound,
    RateLimit,
    Upstream,
    ServerError,
}

/// Map a provider HTTP status code to an error category.
#[must_use]
pub fn category_from_provider_status(status: u16) -> ErrorCategory {
    match status {
        400 => ErrorCategory::InvalidRequest,
        401 => ErrorCategory::Authentication,
        403 => ErrorCategory::Permission,
        404 => ErrorCategory::NotFound,
        429 => ErrorCategory::RateLimit,
        _ => ErrorCategory::Upstream,
    }
}

impl ArchitectError {
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            ArchitectError::InvalidRequest(_) => ErrorCategory::InvalidRequest,
            ArchitectError::Transport(_) => ErrorCategory::Upstream,
            ArchitectError::Config(_)
            | ArchitectError::Storage(_)
            | ArchitectError::Internal(_) => ErrorCategory::ServerError,
            ArchitectError::ProviderHttp { status, .. } => category_from_provider_status(*status),
        }
    }
}

impl From<crate::config::ConfigError> for ArchitectError {
    fn from(err: crate::config::ConfigError) -> Self {
        ArchitectError::Config(err.to_string())
    }
}

impl From<rusqlite::Error> for ArchitectError {
    fn from(err: rusqlite::Error) -> Self {
        ArchitectError::Storage(err.to_string())
    }
}

fn http_status_for_category(cat: ErrorCategory) -> http::StatusCode {
    match cat {
        ErrorCategory::InvalidRequest => http::StatusCode::BAD_REQUEST,
        ErrorCategory::Authentication => http::StatusCode::UNAUTHORIZED,
        ErrorCategory::Permission => http::StatusCode::FORBIDDEN,
        ErrorCategory::NotFound => http::StatusCode::NOT_FOUND,
        ErrorCategory::RateLimit => http::StatusCode::TOO_MANY_REQUESTS,
        ErrorCategory::Upstream => http::StatusCode::BAD_GATEWAY,
        ErrorCategory::ServerError => http::StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_type_for_category(cat: ErrorCategory) -> &'static str {
    match cat {
        ErrorCategory::InvalidRequest => "invalid_request_error",
        ErrorCategory::Authentication => "authentication_error",
        ErrorCategory::Permission => "permission_error",
        ErrorCategory::NotFound => "not_found_error",
        ErrorCategory::RateLimit => "rate_limit_error",
        ErrorCategory::Upstream => "provider_error",
        ErrorCategory::ServerError => "server_error",
    }
}

/// Format an error as `(status_code, JSON body)` for the UI.
#[must_use]
pub fn format_error(err: &ArchitectError) -> (http::StatusCode, serde_json::Value) {
    let cat = err.category();
    let mut body = json!({
        "error": {
            "message": err.to_string(),
            "type": error_type_for_category(cat),
        }
    });
    if let ArchitectError::ProviderHttp { status, body: text } = err {
        body["error"]["provider_status"] = json!(status);
        body["error"]["provider_body"] = json!(text);
    }
    (http_status_for_category(cat), body)
}

impl axum::response::IntoResponse for ArchitectError {
    fn into_response(self) -> axum::response::Response {
        let (status, body) = format_error(&self);
        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_status_maps_to_category() {
        assert_eq!(
            category_from_provider_status(401),
            ErrorCategory::Authentication
        );
        assert_eq!(category_from_provider_status(429), ErrorCategory::RateLimit);
        assert_eq!(category_from_provider_status(500), ErrorCategory::Upstream);
    }

    #[test]
    fn provider_error_body_carries_upstream_details() {
        let err = ArchitectError::ProviderHttp {
            status: 401,
            body: "unauthorized".to_string(),
        };
        let (status, body) = format_error(&err);
        assert_eq!(status, http::StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["type"], "authentication_error");
        assert_eq!(body["error"]["provider_status"], 401);
        assert_eq!(body["error"]["provider_body"], "unauthorized");
    }

    #[test]
    fn config_errors_are_server_errors() {
        let err: ArchitectError =
            crate::config::ConfigError::Validation("bad".into()).into();
        assert!(matches!(err, ArchitectError::Config(_)));
        assert_eq!(err.category(), ErrorCategory::ServerError);
    }

    #[test]
    fn transport_errors_are_bad_gateway() {
        let (status, _) = format_error(&ArchitectError::Transport("reset".into()));
        assert_eq!(status, http::StatusCode::BAD_GATEWAY);
    }
}
