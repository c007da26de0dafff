use futures_util::StreamExt;
use reqwest::{Client, RequestBuilder};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{GradioError, Result};
use crate::types::{FileData, SpaceInfo};

fn normalize(endpoint: &str) -> String {
    endpoint.trim_end_matches('/').to_string()
}

fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}

fn is_url(space: &str) -> bool {
    space.starts_with("http://") || space.starts_with("https://")
}

fn with_token(req: RequestBuilder, token: Option<&str>) -> RequestBuilder {
    match token {
        Some(t) => req.bearer_auth(t),
        None => req,
    }
}

/// Async client for a Gradio app, usually a Hugging Face Space.
///
/// Covers the subset of the Gradio HTTP API needed to drive a single
/// prediction: file upload, the `/call/{api}` queue with its server-sent
/// event stream, and output file download.
///
/// # Example
/// ```no_run
/// use idm_vton::GradioClient;
/// use serde_json::json;
///
/// # async fn example() -> idm_vton::error::Result<()> {
/// let http = reqwest::Client::new();
/// let client = GradioClient::connect(http, "yisol/IDM-VTON", "https://huggingface.co", None).await?;
/// let outputs = client.predict("/tryon", vec![json!("...")], None).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct GradioClient {
    http: Client,
    info: SpaceInfo,
    token: Option<String>,
}

impl GradioClient {
    /// Connect to a Space by id (`owner/name`) or by direct app URL.
    ///
    /// Space ids are resolved to their host through the Hub API. The app's
    /// `/config` is then read to pick up its API route prefix.
    pub async fn connect(
        http: Client,
        space: &str,
        hub_endpoint: &str,
        token: Option<String>,
    ) -> Result<Self> {
        let host = if is_url(space) {
            normalize(space)
        } else {
            resolve_space_host(&http, space, &normalize(hub_endpoint), token.as_deref()).await?
        };

        let info = fetch_config(&http, &host, token.as_deref()).await?;
        info!(
            host = %info.host,
            version = info.version.as_deref().unwrap_or("unknown"),
            "Loaded as API"
        );

        Ok(Self { http, info, token })
    }

    /// Build a client from already-known connection details.
    pub fn from_info(http: Client, info: SpaceInfo, token: Option<String>) -> Self {
        Self { http, info, token }
    }

    /// Returns the resolved app connection details.
    pub fn info(&self) -> &SpaceInfo {
        &self.info
    }

    fn get(&self, url: &str) -> RequestBuilder {
        with_token(self.http.get(url), self.token.as_deref())
    }

    fn post(&self, url: &str) -> RequestBuilder {
        with_token(self.http.post(url), self.token.as_deref())
    }

    // ── Upload ──────────────────────────────────────────────────────

    /// Upload a local file and return a reference usable as an input.
    pub async fn upload(&self, path: &Path) -> Result<FileData> {
        let bytes = tokio::fs::read(path).await.map_err(|e| GradioError::Io {
            context: format!("Cannot read {}", path.display()),
            source: e,
        })?;
        let size = bytes.len() as u64;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());

        let part = reqwest::multipart::Part::bytes(bytes).file_name(name.clone());
        let form = reqwest::multipart::Form::new().part("files", part);

        let url = self.info.route("/upload");
        let resp = self
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| GradioError::Network {
                context: format!("Failed to upload {} to {}", name, self.info.host),
                source: e,
            })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(GradioError::Http { status, body });
        }

        let paths: Vec<String> = resp.json().await.map_err(|e| GradioError::Network {
            context: "Failed to parse Gradio /upload response".into(),
            source: e,
        })?;

        let server_path = paths
            .into_iter()
            .next()
            .ok_or_else(|| GradioError::InvalidResponse("Upload returned no paths".into()))?;
        debug!(local = %path.display(), remote = %server_path, "uploaded file");

        Ok(FileData {
            orig_name: Some(name),
            size: Some(size),
            ..FileData::new(server_path)
        })
    }

    // ── Prediction ──────────────────────────────────────────────────

    /// Run one prediction against a named endpoint and return its outputs.
    ///
    /// With `timeout` set to `None` this waits for as long as the Space
    /// keeps the event stream open.
    pub async fn predict(
        &self,
        api_name: &str,
        data: Vec<Value>,
        timeout: Option<Duration>,
    ) -> Result<Vec<Value>> {
        match timeout {
            Some(limit) => tokio::time::timeout(limit, self.predict_inner(api_name, data))
                .await
                .map_err(|_| GradioError::Timeout(limit))?,
            None => self.predict_inner(api_name, data).await,
        }
    }

    async fn predict_inner(&self, api_name: &str, data: Vec<Value>) -> Result<Vec<Value>> {
        let api = api_name.trim_start_matches('/');
        let event_id = self.submit(api, data).await?;
        info!(api = %api, event_id = %event_id, "prediction queued");

        let url = self.info.route(&format!("/call/{}/{}", api, event_id));
        let resp = self
            .get(&url)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(|e| GradioError::Network {
                context: format!("Failed to open result stream for {}", event_id),
                source: e,
            })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(GradioError::Http { status, body });
        }

        let mut parser = SseParser::default();
        let mut stream = resp.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| GradioError::Network {
                context: "Result stream interrupted".into(),
                source: e,
            })?;
            for event in parser.feed(&chunk) {
                if let Some(outcome) = handle_event(event) {
                    return outcome;
                }
            }
        }

        if let Some(outcome) = parser.finish().and_then(handle_event) {
            return outcome;
        }

        Err(GradioError::InvalidResponse(
            "Result stream closed before the prediction completed".into(),
        ))
    }

    async fn submit(&self, api: &str, data: Vec<Value>) -> Result<String> {
        let url = self.info.route(&format!("/call/{}", api));
        let resp = self
            .post(&url)
            .timeout(Duration::from_secs(30))
            .json(&json!({ "data": data }))
            .send()
            .await
            .map_err(|e| GradioError::Network {
                context: format!(
                    "Cannot connect to Gradio app at {}; is the Space running?",
                    self.info.host
                ),
                source: e,
            })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(GradioError::Http { status, body });
        }

        let json: Value = resp.json().await.map_err(|e| GradioError::Network {
            context: format!("Failed to parse /call/{} response", api),
            source: e,
        })?;

        json.get("event_id")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| GradioError::InvalidResponse("Response missing event_id".into()))
    }

    // ── Output download ─────────────────────────────────────────────

    /// Download an output file into `dest_dir`, keeping its file name.
    /// Returns the local path.
    pub async fn download(&self, file: &FileData, dest_dir: &Path) -> Result<PathBuf> {
        let url = match file.url.as_deref().filter(|u| is_url(u)) {
            Some(u) => u.to_string(),
            None => self.file_url(&file.path)?,
        };

        // The token only goes to the app itself, never to a third-party file host.
        let req = if same_origin(&url, &self.info.host) {
            self.get(&url)
        } else {
            self.http.get(&url)
        };

        let resp = req
            .send()
            .await
            .map_err(|e| GradioError::Network {
                context: format!("Failed to fetch output {}", file.path),
                source: e,
            })?;

        if !resp.status().is_success() {
            return Err(GradioError::Http {
                status: resp.status().as_u16(),
                body: format!("Failed to fetch output {}", file.path),
            });
        }

        let bytes = resp.bytes().await.map_err(|e| GradioError::Network {
            context: "Failed to read output bytes".into(),
            source: e,
        })?;

        tokio::fs::create_dir_all(dest_dir)
            .await
            .map_err(|e| GradioError::Io {
                context: format!("Cannot create {}", dest_dir.display()),
                source: e,
            })?;
        let dest = dest_dir.join(file.file_name());
        tokio::fs::write(&dest, &bytes)
            .await
            .map_err(|e| GradioError::Io {
                context: format!("Cannot write {}", dest.display()),
                source: e,
            })?;

        Ok(dest)
    }

    /// `{host}{prefix}/file={path}` with `path` percent-encoded.
    fn file_url(&self, path: &str) -> Result<String> {
        let mut url = reqwest::Url::parse(&self.info.host).map_err(|e| {
            GradioError::InvalidResponse(format!("Invalid app host {}: {}", self.info.host, e))
        })?;
        let route = format!(
            "{}{}/file={}",
            url.path().trim_end_matches('/'),
            self.info.api_prefix,
            path
        );
        url.set_path(&route);
        Ok(url.to_string())
    }
}

fn same_origin(url: &str, host: &str) -> bool {
    match (reqwest::Url::parse(url), reqwest::Url::parse(host)) {
        (Ok(a), Ok(b)) => a.origin() == b.origin(),
        _ => false,
    }
}

async fn resolve_space_host(
    http: &Client,
    space: &str,
    hub: &str,
    token: Option<&str>,
) -> Result<String> {
    let url = format!("{}/api/spaces/{}/host", hub, space);
    let resp = with_token(http.get(&url), token)
        .timeout(Duration::from_secs(30))
        .send()
        .await
        .map_err(|e| GradioError::Network {
            context: format!("Cannot reach the Hub at {}", hub),
            source: e,
        })?;

    if !resp.status().is_success() {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        return Err(GradioError::Http { status, body });
    }

    let json: Value = resp.json().await.map_err(|e| GradioError::Network {
        context: format!("Failed to parse host lookup for {}", space),
        source: e,
    })?;

    json.get("host")
        .and_then(|v| v.as_str())
        .map(normalize)
        .ok_or_else(|| {
            GradioError::InvalidResponse(format!("Space {} has no host; is it running?", space))
        })
}

async fn fetch_config(http: &Client, host: &str, token: Option<&str>) -> Result<SpaceInfo> {
    let url = format!("{}/config", host);
    let resp = with_token(http.get(&url), token)
        .timeout(Duration::from_secs(30))
        .send()
        .await
        .map_err(|e| GradioError::Network {
            context: format!(
                "Cannot connect to Gradio app at {}; is the Space running?",
                host
            ),
            source: e,
        })?;

    if !resp.status().is_success() {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        return Err(GradioError::Http { status, body });
    }

    let json: Value = resp.json().await.map_err(|e| GradioError::Network {
        context: "Failed to parse Gradio /config response".into(),
        source: e,
    })?;

    Ok(SpaceInfo {
        host: host.to_string(),
        api_prefix: normalize_prefix(json.get("api_prefix").and_then(|v| v.as_str()).unwrap_or("")),
        version: json
            .get("version")
            .and_then(|v| v.as_str())
            .map(String::from),
    })
}

/// Map a stream event to a final outcome, or `None` to keep reading.
fn handle_event(event: SseEvent) -> Option<Result<Vec<Value>>> {
    match event.event.as_str() {
        "complete" => Some(parse_complete(&event.data)),
        "error" => Some(Err(GradioError::App(error_message(&event.data)))),
        other => {
            debug!(event = other, "stream event");
            None
        }
    }
}

fn parse_complete(data: &str) -> Result<Vec<Value>> {
    match serde_json::from_str::<Value>(data)? {
        Value::Array(items) => Ok(items),
        other => Ok(vec![other]),
    }
}

const NO_DETAILS: &str = "The upstream Gradio app has raised an exception but has not enabled verbose error reporting";

/// Pull a readable message out of an `error` event payload.
fn error_message(data: &str) -> String {
    match serde_json::from_str::<Value>(data) {
        Ok(Value::String(s)) if !s.is_empty() => s,
        Ok(Value::Object(obj)) => ["error", "message", "title"]
            .iter()
            .find_map(|k| obj.get(*k).and_then(|v| v.as_str()))
            .map(String::from)
            .unwrap_or_else(|| data.trim().to_string()),
        Ok(Value::Null) | Ok(Value::String(_)) => NO_DETAILS.to_string(),
        Ok(other) => other.to_string(),
        Err(_) if data.trim().is_empty() => NO_DETAILS.to_string(),
        Err(_) => data.trim().to_string(),
    }
}

#[derive(Debug, Clone, PartialEq)]
struct SseEvent {
    event: String,
    data: String,
}

/// Incremental `text/event-stream` decoder. Lines may arrive split across
/// chunks, so undecoded bytes are kept until a newline shows up.
#[derive(Debug, Default)]
struct SseParser {
    buf: Vec<u8>,
    event: Option<String>,
    data: Vec<String>,
}

impl SseParser {
    fn feed(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buf.extend_from_slice(chunk);
        let mut events = Vec::new();
        while let Some(pos) = self.buf.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.buf.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw);
            if let Some(event) = self.line(line.trim_end_matches(['\n', '\r'])) {
                events.push(event);
            }
        }
        events
    }

    /// Flush whatever is left once the stream has ended.
    fn finish(&mut self) -> Option<SseEvent> {
        if !self.buf.is_empty() {
            let raw = std::mem::take(&mut self.buf);
            let line = String::from_utf8_lossy(&raw).into_owned();
            if let Some(event) = self.line(line.trim_end_matches('\r')) {
                return Some(event);
            }
        }
        self.dispatch()
    }

    fn line(&mut self, line: &str) -> Option<SseEvent> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }
        let (field, value) = match line.split_once(':') {
            Some((f, v)) => (f, v.strip_prefix(' ').unwrap_or(v)),
            None => (line, ""),
        };
        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        if self.event.is_none() && self.data.is_empty() {
            return None;
        }
        let event = self.event.take().unwrap_or_else(|| "message".to_string());
        let data = std::mem::take(&mut self.data).join("\n");
        Some(SseEvent { event, data })
    }
}
