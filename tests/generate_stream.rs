use std::convert::Infallible;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::response::Response;
use axum::routing::post;
use axum::Router;
use bytes::Bytes;
use futures_util::StreamExt;
use parking_lot::Mutex;
use paper_architect::config::ServerConfig;
use paper_architect::error::ArchitectError;
use paper_architect::generate::{collect_text, GenerationRequest, Generator, ProviderConfig};
use paper_architect::prompt::{templates, WorkflowStep};
use paper_architect::protocol::{ProviderKind, StreamEvent, Termination};
use paper_architect::transport::HttpTransport;

#[derive(Default)]
struct Captured {
    uri: Option<Uri>,
    headers: Option<HeaderMap>,
    body: Option<serde_json::Value>,
}

fn sse_response(chunks: Vec<&'static str>) -> Response {
    let stream = futures_util::stream::iter(
        chunks
            .into_iter()
            .map(|chunk| Ok::<_, Infallible>(Bytes::from_static(chunk.as_bytes()))),
    );
    Response::builder()
        .status(StatusCode::OK)
        .header("content-type", "text/event-stream")
        .body(Body::from_stream(stream))
        .expect("build sse response")
}

async fn spawn_mock(route: &str, chunks: Vec<&'static str>) -> (String, Arc<Mutex<Captured>>) {
    let captured = Arc::new(Mutex::new(Captured::default()));
    let capture = Arc::clone(&captured);
    let app = Router::new().route(
        route,
        post(move |uri: Uri, headers: HeaderMap, body: Bytes| {
            let capture = Arc::clone(&capture);
            let chunks = chunks.clone();
            async move {
                {
                    let mut captured = capture.lock();
                    captured.uri = Some(uri);
                    captured.headers = Some(headers);
                    captured.body = serde_json::from_slice(&body).ok();
                }
                sse_response(chunks)
            }
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock provider");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("http://{addr}"), captured)
}

fn generator() -> Generator {
    Generator::new(HttpTransport::new(&ServerConfig::default()), 8192)
}

fn provider(base: String, model: &str) -> ProviderConfig {
    ProviderConfig {
        credential: "test-key".to_string(),
        endpoint_base: base,
        model: model.to_string(),
    }
}

#[tokio::test]
async fn test_openai_stream_yields_fragments_then_sentinel() {
    let (base, captured) = spawn_mock(
        "/v1/chat/completions",
        vec![
            "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n\ndata: {\"choi",
            "ces\":[{\"delta\":{\"content\":\"lo\"}}]}\n\n",
            "data: [DONE]\n\n",
        ],
    )
    .await;

    let generator = generator();
    let request = GenerationRequest::new(
        WorkflowStep::Strategist,
        "raw notes",
        provider(format!("{base}/v1/"), "gpt-4o-mini"),
    );
    let stream = generator.generate(&request).await.expect("generate");
    assert_eq!(stream.provider(), ProviderKind::OpenAiChat);
    let events: Vec<StreamEvent> = stream.map(|event| event.expect("event")).collect().await;
    assert_eq!(
        events,
        vec![
            StreamEvent::Fragment("Hel".into()),
            StreamEvent::Fragment("lo".into()),
            StreamEvent::Complete(Termination::Sentinel),
        ]
    );

    let captured = captured.lock();
    let headers = captured.headers.as_ref().expect("headers");
    assert_eq!(headers["authorization"], "Bearer test-key");
    let body = captured.body.as_ref().expect("json body");
    assert_eq!(body["model"], "gpt-4o-mini");
    assert_eq!(body["stream"], true);
    assert_eq!(body["max_tokens"], 8192);
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][0]["content"], templates::STRATEGIST);
    assert_eq!(body["messages"][1]["role"], "user");
    assert_eq!(body["messages"][1]["content"], "raw notes");
}

#[tokio::test]
async fn test_openai_stream_without_sentinel_ends_at_end_of_stream() {
    let (base, _) = spawn_mock(
        "/v1/chat/completions",
        vec![
            "data: {\"choices\":[{\"delta\":{\"content\":\"partial\"}}]}\n\n",
            "data: {broken\n\n",
        ],
    )
    .await;
    let generator = generator();
    let request = GenerationRequest::new(
        WorkflowStep::Composer,
        "write",
        provider(format!("{base}/v1"), "m"),
    )
    .with_blueprint("BP");
    let stream = generator.generate(&request).await.expect("generate");
    let (text, termination) = collect_text(stream).await.expect("collect");
    assert_eq!(text, "partial");
    assert_eq!(termination, Termination::EndOfStream);
}

#[tokio::test]
async fn test_gemini_stream_uses_query_credential_and_single_message() {
    let (base, captured) = spawn_mock(
        "/googleapis.com/v1beta/models/{model_action}",
        vec![
            "data: {\"candidates\":[{\"content\":{\"role\":\"model\",\"parts\":[{\"text\":\"Gut\"}]}}]}\r\n\r\n",
            "data: {\"candidates\":[{\"content\":{\"role\":\"model\",\"parts\":[{\"text\":\"en Tag\"}]},\"finishReason\":\"STOP\"}]}\r\n\r\n",
        ],
    )
    .await;

    let generator = generator();
    let request = GenerationRequest::new(
        WorkflowStep::Reviewer,
        "be strict",
        provider(format!("{base}/googleapis.com"), "gemini-2.0-flash"),
    )
    .with_composition("Draft text.");
    let stream = generator.generate(&request).await.expect("generate");
    assert_eq!(stream.provider(), ProviderKind::Gemini);
    let (text, termination) = collect_text(stream).await.expect("collect");
    assert_eq!(text, "Guten Tag");
    assert_eq!(termination, Termination::EndOfStream);

    let captured = captured.lock();
    let uri = captured.uri.as_ref().expect("uri");
    assert_eq!(
        uri.path(),
        "/googleapis.com/v1beta/models/gemini-2.0-flash:streamGenerateContent"
    );
    assert_eq!(uri.query(), Some("alt=sse&key=test-key"));
    let headers = captured.headers.as_ref().expect("headers");
    assert!(headers.get("authorization").is_none());
    let body = captured.body.as_ref().expect("json body");
    assert_eq!(body["contents"].as_array().map(Vec::len), Some(1));
    let text = body["contents"][0]["parts"][0]["text"]
        .as_str()
        .expect("text part");
    assert!(text.starts_with(templates::REVIEWER));
    assert!(text.ends_with("\n\n[COMPOSED TEXT]\nDraft text.\n\n[USER INSTRUCTIONS]\nbe strict"));
    assert_eq!(body["generationConfig"]["maxOutputTokens"], 8192);
}

#[tokio::test]
async fn test_provider_rejection_fails_before_any_fragment() {
    let app = Router::new().route(
        "/v1/chat/completions",
        post(|| async { (StatusCode::UNAUTHORIZED, "unauthorized") }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock provider");
    let addr = listener.local_addr().expect("local addr");
    let server = tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    let generator = generator();
    let request = GenerationRequest::new(
        WorkflowStep::Strategist,
        "x",
        provider(format!("http://{addr}/v1"), "m"),
    );
    match generator.generate(&request).await {
        Err(ArchitectError::ProviderHttp { status, body }) => {
            assert_eq!(status, 401);
            assert_eq!(body, "unauthorized");
        }
        Err(other) => panic!("expected provider error, got {other:?}"),
        Ok(_) => panic!("expected provider error, got a stream"),
    }

    server.abort();
}

#[tokio::test]
async fn test_unreachable_provider_is_transport_error_without_key() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("reserve port");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);

    let generator = generator();
    let request = GenerationRequest::new(
        WorkflowStep::Strategist,
        "x",
        provider(format!("http://{addr}/googleapis.com"), "gemini"),
    );
    match generator.generate(&request).await {
        Err(ArchitectError::Transport(message)) => {
            assert!(!message.contains("test-key"), "credential leaked: {message}");
        }
        Err(other) => panic!("expected transport error, got {other:?}"),
        Ok(_) => panic!("expected transport error, got a stream"),
    }
}

struct DropFlag(Arc<AtomicBool>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// Mock whose body sends one fragment and then never ends. The flag is set
/// once the server drops the body.
async fn spawn_open_ended_mock(route: &str) -> (String, Arc<AtomicBool>) {
    let dropped = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&dropped);
    let app = Router::new().route(
        route,
        post(move || {
            let guard = DropFlag(Arc::clone(&flag));
            async move {
                let first = Bytes::from_static(
                    b"data: {\"choices\":[{\"delta\":{\"content\":\"one\"}}]}\n\n",
                );
                let body = futures_util::stream::iter([Ok::<_, Infallible>(first)])
                    .chain(futures_util::stream::pending())
                    .map(move |item| {
                        let _held = &guard;
                        item
                    });
                Response::builder()
                    .status(StatusCode::OK)
                    .header("content-type", "text/event-stream")
                    .body(Body::from_stream(body))
                    .expect("build sse response")
            }
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock provider");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("http://{addr}"), dropped)
}

#[tokio::test]
async fn test_close_releases_stream_early() {
    let (base, dropped) = spawn_open_ended_mock("/v1/chat/completions").await;
    let generator = generator();
    let request = GenerationRequest::new(
        WorkflowStep::Strategist,
        "x",
        provider(format!("{base}/v1"), "m"),
    );
    let mut stream = generator.generate(&request).await.expect("generate");
    let first = stream.next().await.expect("first item").expect("first event");
    assert_eq!(first, StreamEvent::Fragment("one".into()));
    assert!(!dropped.load(Ordering::SeqCst));

    stream.close();

    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !dropped.load(Ordering::SeqCst) && tokio::time::Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(dropped.load(Ordering::SeqCst), "provider body still open after close");
}
