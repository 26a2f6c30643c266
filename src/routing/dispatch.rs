use std::borrow::Cow;
use std::convert::Infallible;
use std::sync::Arc;

use axum::body::{self, Body};
use axum::http::{Method, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use percent_encoding::percent_decode_str;

use crate::api::{blueprints, compositions, generate, health, settings};
use crate::state::AppState;

// Reference texts extracted from PDFs can be large.
const DEFAULT_BODY_LIMIT_BYTES: usize = 2 * 1024 * 1024;

#[derive(Debug, PartialEq, Eq)]
enum RouteMatch<'a> {
    Health,
    Generate,
    GetSettings,
    PutSettings,
    ListBlueprints,
    GetBlueprint { id: Cow<'a, str> },
    PutBlueprint { id: Cow<'a, str> },
    DeleteBlueprint { id: Cow<'a, str> },
    BlueprintCompositions { blueprint_id: Cow<'a, str> },
    GetComposition { id: Cow<'a, str> },
    PutComposition { id: Cow<'a, str> },
    MethodNotAllowed,
    NotFound,
}

/// Dispatch a raw HTTP request to the matching handler.
///
/// # Errors
///
/// This function currently never returns `Err` and uses `Infallible`.
pub async fn dispatch_request(
    state: Arc<AppState>,
    request: Request<Body>,
) -> Result<Response, Infallible> {
    let (parts, body) = request.into_parts();
    let route = match_route(&parts.method, parts.uri.path());
    tracing::debug!(method = %parts.method, path = parts.uri.path(), route = ?route, "dispatch");

    let response = match route {
        RouteMatch::Health => health::health_handler(&state).into_response(),
        RouteMatch::Generate => {
            let body_bytes = match read_request_body(body).await {
                Ok(bytes) => bytes,
                Err(response) => return Ok(response),
            };
            generate::handler(state, body_bytes).await
        }
        RouteMatch::GetSettings => settings::get_handler(state).await,
        RouteMatch::PutSettings => {
            let body_bytes = match read_request_body(body).await {
                Ok(bytes) => bytes,
                Err(response) => return Ok(response),
            };
            settings::put_handler(state, body_bytes).await
        }
        RouteMatch::ListBlueprints => blueprints::list_handler(state).await,
        RouteMatch::GetBlueprint { id } => blueprints::get_handler(state, id.into_owned()).await,
        RouteMatch::PutBlueprint { id } => {
            let body_bytes = match read_request_body(body).await {
                Ok(bytes) => bytes,
                Err(response) => return Ok(response),
            };
            blueprints::put_handler(state, id.into_owned(), body_bytes).await
        }
        RouteMatch::DeleteBlueprint { id } => {
            blueprints::delete_handler(state, id.into_owned()).await
        }
        RouteMatch::BlueprintCompositions { blueprint_id } => {
            blueprints::compositions_handler(state, blueprint_id.into_owned()).await
        }
        RouteMatch::GetComposition { id } => {
            compositions::get_handler(state, id.into_owned()).await
        }
        RouteMatch::PutComposition { id } => {
            let body_bytes = match read_request_body(body).await {
                Ok(bytes) => bytes,
                Err(response) => return Ok(response),
            };
            compositions::put_handler(state, id.into_owned(), body_bytes).await
        }
        RouteMatch::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED.into_response(),
        RouteMatch::NotFound => StatusCode::NOT_FOUND.into_response(),
    };

    Ok(response)
}

async fn read_request_body(body: Body) -> Result<bytes::Bytes, Response> {
    body::to_bytes(body, DEFAULT_BODY_LIMIT_BYTES)
        .await
        .map_err(|_| {
            (
                StatusCode::PAYLOAD_TOO_LARGE,
                "Request body too large (max 2MiB)",
            )
                .into_response()
        })
}

fn match_route<'a>(method: &Method, path: &'a str) -> RouteMatch<'a> {
    match path {
        "/" => {
            if method == Method::GET {
                RouteMatch::Health
            } else {
                RouteMatch::MethodNotAllowed
            }
        }
        "/api/generate" => {
            if method == Method::POST {
                RouteMatch::Generate
            } else {
                RouteMatch::MethodNotAllowed
            }
        }
        "/api/settings" => match *method {
            Method::GET => RouteMatch::GetSettings,
            Method::PUT => RouteMatch::PutSettings,
            _ => RouteMatch::MethodNotAllowed,
        },
        "/api/blueprints" => {
            if method == Method::GET {
                RouteMatch::ListBlueprints
            } else {
                RouteMatch::MethodNotAllowed
            }
        }
        _ => {
            if let Some(rest) = path.strip_prefix("/api/blueprints/") {
                match_blueprint_route(method, rest)
            } else if let Some(segment) = path.strip_prefix("/api/compositions/") {
                let Some(id) = decode_record_id(segment) else {
                    return RouteMatch::NotFound;
                };
                match *method {
                    Method::GET => RouteMatch::GetComposition { id },
                    Method::PUT => RouteMatch::PutComposition { id },
                    _ => RouteMatch::MethodNotAllowed,
                }
            } else {
                RouteMatch::NotFound
            }
        }
    }
}

fn match_blueprint_route<'a>(method: &Method, rest: &'a str) -> RouteMatch<'a> {
    if let Some(segment) = rest.strip_suffix("/compositions") {
        let Some(blueprint_id) = decode_record_id(segment) else {
            return RouteMatch::NotFound;
        };
        return if method == Method::GET {
            RouteMatch::BlueprintCompositions { blueprint_id }
        } else {
            RouteMatch::MethodNotAllowed
        };
    }
    let Some(id) = decode_record_id(rest) else {
        return RouteMatch::NotFound;
    };
    match *method {
        Method::GET => RouteMatch::GetBlueprint { id },
        Method::PUT => RouteMatch::PutBlueprint { id },
        Method::DELETE => RouteMatch::DeleteBlueprint { id },
        _ => RouteMatch::MethodNotAllowed,
    }
}

/// Percent-decoded id from a single raw path segment.
fn decode_record_id(segment: &str) -> Option<Cow<'_, str>> {
    if segment.is_empty() || segment.contains('/') {
        return None;
    }
    let id = percent_decode_str(segment).decode_utf8().ok()?;
    if id.is_empty() {
        return None;
    }
    Some(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_routes() {
        assert_eq!(match_route(&Method::GET, "/"), RouteMatch::Health);
        assert_eq!(match_route(&Method::POST, "/api/generate"), RouteMatch::Generate);
        assert_eq!(
            match_route(&Method::GET, "/api/generate"),
            RouteMatch::MethodNotAllowed
        );
        assert_eq!(match_route(&Method::PUT, "/api/settings"), RouteMatch::PutSettings);
        assert_eq!(match_route(&Method::GET, "/api/blueprints"), RouteMatch::ListBlueprints);
        assert_eq!(match_route(&Method::GET, "/v1/models"), RouteMatch::NotFound);
    }

    #[test]
    fn test_record_routes() {
        assert_eq!(
            match_route(&Method::DELETE, "/api/blueprints/bp-1"),
            RouteMatch::DeleteBlueprint { id: "bp-1".into() }
        );
        assert_eq!(
            match_route(&Method::GET, "/api/blueprints/bp-1/compositions"),
            RouteMatch::BlueprintCompositions {
                blueprint_id: "bp-1".into()
            }
        );
        assert_eq!(
            match_route(&Method::PUT, "/api/compositions/c-9"),
            RouteMatch::PutComposition { id: "c-9".into() }
        );
        assert_eq!(
            match_route(&Method::POST, "/api/compositions/c-9"),
            RouteMatch::MethodNotAllowed
        );
    }

    #[test]
    fn test_malformed_ids_are_not_found() {
        assert_eq!(match_route(&Method::GET, "/api/blueprints/"), RouteMatch::NotFound);
        assert_eq!(match_route(&Method::GET, "/api/blueprints/a/b"), RouteMatch::NotFound);
        assert_eq!(
            match_route(&Method::GET, "/api/blueprints//compositions"),
            RouteMatch::NotFound
        );
        assert_eq!(match_route(&Method::GET, "/api/compositions/"), RouteMatch::NotFound);
        assert_eq!(match_route(&Method::GET, "/api/blueprints/%FF"), RouteMatch::NotFound);
    }

    #[test]
    fn test_ids_are_percent_decoded() {
        assert_eq!(
            match_route(&Method::GET, "/api/blueprints/my%20bp"),
            RouteMatch::GetBlueprint { id: "my bp".into() }
        );
        assert_eq!(
            match_route(&Method::GET, "/api/blueprints/caf%C3%A9/compositions"),
            RouteMatch::BlueprintCompositions {
                blueprint_id: "café".into()
            }
        );
        assert_eq!(
            match_route(&Method::PUT, "/api/compositions/a%2Fb"),
            RouteMatch::PutComposition { id: "a/b".into() }
        );
    }
}
