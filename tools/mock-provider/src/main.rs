use std::convert::Infallible;
use std::env;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures_util::StreamExt;
use http::{header, HeaderValue, Method, Request, Response, StatusCode};
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Full, StreamBody};
use hyper::body::{Frame, Incoming};
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as AutoBuilder;
use tokio::net::TcpListener;

const DEFAULT_PORT: u16 = 19_001;
const DEFAULT_DELAY_MS: u64 = 80;
const WORDS: &[&str] = &[
    "The ", "argument ", "proceeds ", "in ", "three ", "movements: ", "premise, ", "evidence, ",
    "and ", "qualified ", "conclusion.",
];

#[derive(Copy, Clone)]
enum MockScenario {
    Text,
    Cut,
    Unauthorized,
}

#[derive(Copy, Clone)]
enum Protocol {
    OpenAiChat,
    Gemini,
}

struct MockState {
    scenario: MockScenario,
    delay: Duration,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let port = env_parse("MOCK_PORT", DEFAULT_PORT);
    let state = Arc::new(MockState {
        scenario: parse_scenario(),
        delay: Duration::from_millis(env_parse("MOCK_DELAY_MS", DEFAULT_DELAY_MS)),
    });

    let listener = TcpListener::bind(("127.0.0.1", port))
        .await
        .unwrap_or_else(|err| panic!("failed to bind mock provider on 127.0.0.1:{port}: {err}"));
    eprintln!("mock provider listening on 127.0.0.1:{port}");

    let conn_builder = AutoBuilder::new(TokioExecutor::new());
    loop {
        let (stream, remote_addr) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(err) => {
                eprintln!("accept error: {err}");
                continue;
            }
        };
        let io = TokioIo::new(stream);
        let conn_builder = conn_builder.clone();
        let service_state = Arc::clone(&state);
        let service = service_fn(move |request: Request<Incoming>| {
            let state_ref = Arc::clone(&service_state);
            async move { Ok::<_, Infallible>(handle_request(request, &state_ref).await) }
        });

        tokio::spawn(async move {
            if let Err(err) = conn_builder.serve_connection(io, service).await {
                eprintln!("mock provider connection error from {remote_addr}: {err}");
            }
        });
    }
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<T>().ok())
        .unwrap_or(default)
}

fn parse_scenario() -> MockScenario {
    match env::var("MOCK_SCENARIO").as_deref() {
        Ok("cut") => MockScenario::Cut,
        Ok("unauthorized") => MockScenario::Unauthorized,
        Ok("text") | Err(_) => MockScenario::Text,
        Ok(other) => {
            eprintln!("unknown MOCK_SCENARIO '{other}', fallback to text");
            MockScenario::Text
        }
    }
}

fn protocol_for_path(path: &str) -> Option<Protocol> {
    if path.ends_with("/chat/completions") {
        return Some(Protocol::OpenAiChat);
    }
    if path.contains("/v1beta/models/") && path.ends_with(":streamGenerateContent") {
        return Some(Protocol::Gemini);
    }
    None
}

async fn handle_request(
    request: Request<Incoming>,
    state: &MockState,
) -> Response<UnsyncBoxBody<Bytes, Infallible>> {
    let (parts, body) = request.into_parts();
    drain_request_body(body).await;

    if parts.method != Method::POST {
        return simple_response(StatusCode::METHOD_NOT_ALLOWED, r#"{"error":"method_not_allowed"}"#);
    }
    let Some(protocol) = protocol_for_path(parts.uri.path()) else {
        return simple_response(StatusCode::NOT_FOUND, r#"{"error":"not_found"}"#);
    };
    if matches!(state.scenario, MockScenario::Unauthorized) {
        return simple_response(StatusCode::UNAUTHORIZED, r#"{"error":"invalid api key"}"#);
    }

    let mut frames: Vec<Bytes> = WORDS
        .iter()
        .map(|word| Bytes::from(data_line(protocol, word)))
        .collect();
    if matches!(protocol, Protocol::OpenAiChat) && matches!(state.scenario, MockScenario::Text) {
        frames.push(Bytes::from_static(b"data: [DONE]\n\n"));
    }

    let delay = state.delay;
    let stream = futures_util::stream::iter(frames).then(move |frame| async move {
        tokio::time::sleep(delay).await;
        Ok::<_, Infallible>(Frame::data(frame))
    });

    let mut response = Response::new(StreamBody::new(stream).boxed_unsync());
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/event-stream"),
    );
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    response
}

fn data_line(protocol: Protocol, word: &str) -> String {
    match protocol {
        Protocol::OpenAiChat => format!(
            "data: {{\"id\":\"chatcmpl-mock\",\"object\":\"chat.completion.chunk\",\"choices\":[{{\"index\":0,\"delta\":{{\"content\":\"{word}\"}},\"finish_reason\":null}}]}}\n\n"
        ),
        Protocol::Gemini => format!(
            "data: {{\"candidates\":[{{\"content\":{{\"parts\":[{{\"text\":\"{word}\"}}],\"role\":\"model\"}},\"index\":0}}]}}\r\n\r\n"
        ),
    }
}

async fn drain_request_body(mut body: Incoming) {
    while let Some(frame_result) = body.frame().await {
        if frame_result.is_err() {
            break;
        }
    }
}

fn simple_response(
    status: StatusCode,
    body: &'static str,
) -> Response<UnsyncBoxBody<Bytes, Infallible>> {
    let mut response = Response::new(Full::new(Bytes::from_static(body.as_bytes())).boxed_unsync());
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    response
}
