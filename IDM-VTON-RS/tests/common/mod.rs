// Mock Gradio Space for integration tests
#![allow(dead_code)]

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use axum::{
    body::{Body, Bytes},
    extract::{Json, Path, State},
    http::{header, HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use futures_util::stream::{self, StreamExt};
use serde_json::{json, Value};

pub const PERSON_BYTES: &[u8] = b"\xff\xd8\xff\xe0person-jpeg";
pub const GARMENT_BYTES: &[u8] = b"\xff\xd8\xff\xe0garment-jpeg";
pub const RESULT_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nresult-png";

/// How the mock answers the prediction stream.
#[derive(Clone, Debug)]
pub enum Reply {
    /// `complete` with a result and a mask, both as FileData objects.
    WithMask,
    /// `complete` with one bare path string.
    Single,
    /// `error` event carrying this message as a JSON string.
    Error(String),
    /// `error` event with a null payload.
    NullError,
    /// Stream closes without a terminal event.
    Truncated,
    /// Stream stays open forever after one heartbeat.
    Hang,
}

struct Shared {
    base: String,
    reply: Reply,
    uploads: Mutex<Vec<String>>,
    calls: Mutex<Vec<Value>>,
    auth: Mutex<Vec<Option<String>>>,
    output_auth: Mutex<Vec<Option<String>>>,
    file_requests: Mutex<Vec<String>>,
    predictions: AtomicUsize,
}

/// A running mock Space. The server stops when this is dropped.
pub struct MockSpace {
    pub url: String,
    shared: Arc<Shared>,
    handle: tokio::task::JoinHandle<()>,
}

impl MockSpace {
    pub async fn start(reply: Reply) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock space");
        let url = format!("http://{}", listener.local_addr().expect("local addr"));

        let shared = Arc::new(Shared {
            base: url.clone(),
            reply,
            uploads: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
            auth: Mutex::new(Vec::new()),
            output_auth: Mutex::new(Vec::new()),
            file_requests: Mutex::new(Vec::new()),
            predictions: AtomicUsize::new(0),
        });

        let app = Router::new()
            .route("/images/person.jpg", get(|| async { PERSON_BYTES }))
            .route("/images/garment.jpg", get(|| async { GARMENT_BYTES }))
            .route("/outputs/result.png", get(output_handler))
            .route("/api/spaces/{owner}/{name}/host", get(host_handler))
            .route("/config", get(config_handler))
            .route("/gradio_api/upload", post(upload_handler))
            .route("/gradio_api/call/tryon", post(call_handler))
            .route("/gradio_api/call/tryon/{event_id}", get(stream_handler))
            .fallback(fallback_handler)
            .with_state(shared.clone());

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("Mock space error: {}", e);
            }
        });

        Self {
            url,
            shared,
            handle,
        }
    }

    pub fn image_url(&self, name: &str) -> String {
        format!("{}/images/{}", self.url, name)
    }

    /// File names seen by `/upload`, in order.
    pub fn uploads(&self) -> Vec<String> {
        self.shared.uploads.lock().unwrap().clone()
    }

    /// `data` arrays posted to `/call/tryon`.
    pub fn calls(&self) -> Vec<Value> {
        self.shared.calls.lock().unwrap().clone()
    }

    /// `Authorization` headers sent with each prediction.
    pub fn auth_headers(&self) -> Vec<Option<String>> {
        self.shared.auth.lock().unwrap().clone()
    }

    /// `Authorization` headers sent when fetching `/outputs/result.png`.
    pub fn output_auth_headers(&self) -> Vec<Option<String>> {
        self.shared.output_auth.lock().unwrap().clone()
    }

    /// Raw request paths (still percent-encoded) served by `/file=`.
    pub fn file_requests(&self) -> Vec<String> {
        self.shared.file_requests.lock().unwrap().clone()
    }

    pub fn prediction_count(&self) -> usize {
        self.shared.predictions.load(Ordering::SeqCst)
    }
}

impl Drop for MockSpace {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}

async fn output_handler(State(s): State<Arc<Shared>>, headers: HeaderMap) -> &'static [u8] {
    s.output_auth.lock().unwrap().push(bearer(&headers));
    RESULT_BYTES
}

async fn host_handler(
    State(s): State<Arc<Shared>>,
    Path((owner, name)): Path<(String, String)>,
) -> Json<Value> {
    Json(json!({
        "subdomain": format!("{}-{}", owner, name).to_lowercase(),
        "host": format!("{}/", s.base),
    }))
}

async fn config_handler() -> Json<Value> {
    Json(json!({
        "version": "4.44.1",
        "api_prefix": "/gradio_api",
        "components": [],
    }))
}

async fn upload_handler(State(s): State<Arc<Shared>>, body: Bytes) -> Json<Value> {
    let text = String::from_utf8_lossy(&body);
    let name = text
        .split("filename=\"")
        .nth(1)
        .and_then(|rest| rest.split('"').next())
        .unwrap_or("blob")
        .to_string();

    let mut uploads = s.uploads.lock().unwrap();
    uploads.push(name.clone());
    Json(json!([format!("/tmp/gradio/upload-{}/{}", uploads.len(), name)]))
}

async fn call_handler(
    State(s): State<Arc<Shared>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    s.predictions.fetch_add(1, Ordering::SeqCst);
    s.calls.lock().unwrap().push(body["data"].clone());
    s.auth.lock().unwrap().push(bearer(&headers));
    Json(json!({"event_id": "evt-42"}))
}

fn sse(events: &[(&str, String)]) -> String {
    events
        .iter()
        .map(|(event, data)| format!("event: {}\ndata: {}\n\n", event, data))
        .collect()
}

async fn stream_handler(State(s): State<Arc<Shared>>, Path(event_id): Path<String>) -> Response {
    if event_id != "evt-42" {
        return StatusCode::NOT_FOUND.into_response();
    }

    let heartbeat = ("heartbeat", "null".to_string());
    let generating = ("generating", "null".to_string());

    let body = match &s.reply {
        Reply::WithMask => {
            let outputs = json!([
                {
                    "path": "/tmp/gradio/out/result.png",
                    "url": format!("{}/outputs/result.png", s.base),
                    "orig_name": "result.png",
                    "meta": {"_type": "gradio.FileData"}
                },
                {
                    "path": "/tmp/gradio/out/mask.png",
                    "url": format!("{}/outputs/mask.png", s.base),
                    "orig_name": "mask.png",
                    "meta": {"_type": "gradio.FileData"}
                }
            ]);
            Body::from(sse(&[heartbeat, generating, ("complete", outputs.to_string())]))
        }
        Reply::Single => Body::from(sse(&[
            generating,
            ("complete", json!(["/tmp/gradio/out/image.png"]).to_string()),
        ])),
        Reply::Error(msg) => Body::from(sse(&[
            heartbeat,
            ("error", serde_json::to_string(msg).unwrap()),
        ])),
        Reply::NullError => Body::from(sse(&[("error", "null".to_string())])),
        Reply::Truncated => Body::from(sse(&[heartbeat, generating])),
        Reply::Hang => {
            let first = stream::once(async {
                Ok::<_, std::io::Error>(Bytes::from_static(b"event: heartbeat\ndata: null\n\n"))
            });
            Body::from_stream(first.chain(stream::pending()))
        }
    };

    ([(header::CONTENT_TYPE, "text/event-stream")], body).into_response()
}

async fn fallback_handler(State(s): State<Arc<Shared>>, uri: Uri) -> Response {
    if uri.path().starts_with("/gradio_api/file=") {
        s.file_requests.lock().unwrap().push(uri.path().to_string());
        return RESULT_BYTES.into_response();
    }
    StatusCode::NOT_FOUND.into_response()
}
