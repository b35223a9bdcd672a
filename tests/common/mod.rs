//! Throwaway HTTP receivers standing in for Contrast and GitHub.

#![allow(dead_code)]

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, mpsc};

/// Serve `router` on an ephemeral port from a background thread and return
/// its base URL.
pub fn spawn_server(router: Router) -> String {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        runtime.block_on(async move {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            tx.send(listener.local_addr().unwrap()).unwrap();
            axum::serve(listener, router).await.unwrap();
        });
    });
    let addr = rx.recv().unwrap();
    format!("http://{addr}")
}

/// Answer one request with `head` and the first `sent` bytes of a body
/// declared as `declared` bytes long, then hang up.
pub fn spawn_truncating_server(head: &'static str, declared: usize, sent: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    std::thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream);
        let mut content_length = 0;
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            if line == "\r\n" || line.is_empty() {
                break;
            }
            if let Some((name, value)) = line.split_once(':')
                && name.eq_ignore_ascii_case("content-length")
            {
                content_length = value.trim().parse().unwrap();
            }
        }
        let mut body = vec![0; content_length];
        reader.read_exact(&mut body).unwrap();

        let mut stream = reader.into_inner();
        write!(stream, "{head}\r\nContent-Length: {declared}\r\n\r\n{sent}").unwrap();
        stream.flush().unwrap();
    });
    format!("http://{addr}")
}

#[derive(Debug, Clone)]
pub struct Recorded {
    pub path: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Recorded {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

/// GitHub code scanning receiver answering every upload with `status`.
pub struct GitHubMock {
    status: u16,
    body: String,
    requests: Mutex<Vec<Recorded>>,
}

impl GitHubMock {
    pub fn start(status: u16, body: &str) -> (String, Arc<Self>) {
        let mock = Arc::new(Self {
            status,
            body: body.to_string(),
            requests: Mutex::new(Vec::new()),
        });
        let router = Router::new()
            .route(
                "/repos/{owner}/{repo}/code-scanning/sarifs",
                post(receive_sarif),
            )
            .with_state(Arc::clone(&mock));
        (spawn_server(router), mock)
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }
}

async fn receive_sarif(
    State(mock): State<Arc<GitHubMock>>,
    uri: axum::http::Uri,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, String) {
    mock.requests.lock().unwrap().push(Recorded {
        path: uri.path().to_string(),
        headers,
        body,
    });
    (
        StatusCode::from_u16(mock.status).unwrap(),
        mock.body.clone(),
    )
}

/// Contrast Scan API with one organization, one project and one scan.
pub struct ContrastMock {
    statuses: Vec<&'static str>,
    sarif: String,
    status_calls: AtomicUsize,
    requests: Mutex<Vec<Recorded>>,
}

pub const ORG_ID: &str = "org-1";
pub const PROJECT_ID: &str = "project-1";
pub const SCAN_ID: &str = "scan-1";

impl ContrastMock {
    /// Start the mock. Scan status queries walk through `statuses`, then
    /// repeat the last one.
    pub fn start(statuses: &[&'static str], sarif: &str) -> (String, Arc<Self>) {
        let mock = Arc::new(Self {
            statuses: statuses.to_vec(),
            sarif: sarif.to_string(),
            status_calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        });
        let projects = "/Contrast/api/sast/organizations/{org}/projects";
        let router = Router::new()
            .route(projects, get(find_project).post(create_project))
            .route(
                &format!("{projects}/{{project}}/code-artifacts"),
                post(upload_artifact),
            )
            .route(&format!("{projects}/{{project}}/scans"), post(start_scan))
            .route(
                &format!("{projects}/{{project}}/scans/{{scan}}"),
                get(scan_state),
            )
            .route(
                &format!("{projects}/{{project}}/scans/{{scan}}/raw-output"),
                get(raw_output),
            )
            .route(
                &format!("{projects}/{{project}}/scans/{{scan}}/summary"),
                get(summary),
            )
            .with_state(Arc::clone(&mock));
        (format!("{}/Contrast", spawn_server(router)), mock)
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, suffix: &str) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| r.path.ends_with(suffix))
            .collect()
    }

    fn record(&self, uri: &axum::http::Uri, headers: HeaderMap, body: Bytes) {
        self.requests.lock().unwrap().push(Recorded {
            path: uri.path().to_string(),
            headers,
            body,
        });
    }
}

type Mock = State<Arc<ContrastMock>>;

async fn find_project(
    State(mock): Mock,
    uri: axum::http::Uri,
    headers: HeaderMap,
) -> Json<Value> {
    mock.record(&uri, headers, Bytes::new());
    Json(json!({ "content": [] }))
}

async fn create_project(
    State(mock): Mock,
    uri: axum::http::Uri,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    mock.record(&uri, headers, body);
    (
        StatusCode::CREATED,
        Json(json!({
            "id": PROJECT_ID,
            "name": "octo/webgoat",
            "archived": false,
            "language": "JAVA"
        })),
    )
}

async fn upload_artifact(
    State(mock): Mock,
    uri: axum::http::Uri,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    mock.record(&uri, headers, body);
    (
        StatusCode::CREATED,
        Json(json!({ "id": "artifact-1", "filename": "app.jar" })),
    )
}

async fn start_scan(
    State(mock): Mock,
    uri: axum::http::Uri,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    mock.record(&uri, headers, body);
    (
        StatusCode::CREATED,
        Json(json!({
            "id": SCAN_ID,
            "projectId": PROJECT_ID,
            "organizationId": ORG_ID,
            "status": "WAITING"
        })),
    )
}

async fn scan_state(State(mock): Mock) -> Json<Value> {
    let call = mock.status_calls.fetch_add(1, Ordering::SeqCst);
    let status = mock.statuses[call.min(mock.statuses.len() - 1)];
    Json(json!({ "id": SCAN_ID, "status": status, "errorMessage": null }))
}

async fn raw_output(State(mock): Mock) -> String {
    mock.sarif.clone()
}

async fn summary() -> Json<Value> {
    Json(json!({
        "id": "summary-1",
        "totalResults": 7,
        "totalNewResults": 3,
        "totalFixedResults": 2
    }))
}

/// SARIF log whose first run has `results` entries.
pub fn sarif_with_results(results: usize, tool_name: Option<&str>) -> String {
    let entries: Vec<Value> = (0..results)
        .map(|i| json!({ "ruleId": format!("rule-{}", i % 5), "message": { "text": format!("finding {i}") } }))
        .collect();
    let mut driver = json!({ "version": "2.0.0" });
    if let Some(name) = tool_name {
        driver["name"] = json!(name);
    }
    json!({
        "version": "2.1.0",
        "runs": [{ "tool": { "driver": driver }, "results": entries }]
    })
    .to_string()
}
