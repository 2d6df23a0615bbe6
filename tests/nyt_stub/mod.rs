#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use std::time::Duration;

use serde_json::Value;

pub const API_KEY: &str = "test-key";
pub const BASE_PATH: &str = "/svc/books/v3";

#[derive(Debug, Clone)]
pub struct StubResponse {
    pub status: u16,
    pub body: String,
}

impl StubResponse {
    pub fn ok(results: Value) -> Self {
        Self::json(
            200,
            serde_json::json!({ "status": "OK", "num_results": 0, "results": results }),
        )
    }

    pub fn json(status: u16, body: Value) -> Self {
        Self {
            status,
            body: body.to_string(),
        }
    }
}

/// Books API (under `/svc/books/v3`) plus an Ollama-style `/api/generate` on one port.
pub struct NytStub {
    pub base_url: String,
    pub ollama_url: String,
    requests: Arc<Mutex<Vec<String>>>,
    shutdown_tx: Option<mpsc::Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl NytStub {
    /// `routes` maps paths relative to the API base (e.g. `lists/overview.json`) to responses.
    pub fn spawn(routes: HashMap<String, StubResponse>) -> Self {
        let server = tiny_http::Server::http("127.0.0.1:0").expect("start nyt stub server");
        let addr = server.server_addr();
        let base_url = format!("http://{addr}{BASE_PATH}");
        let ollama_url = format!("http://{addr}");

        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&requests);
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let handle = thread::spawn(move || {
            loop {
                if shutdown_rx.try_recv().is_ok() {
                    break;
                }

                let mut request = match server.recv_timeout(Duration::from_millis(50)) {
                    Ok(Some(req)) => req,
                    Ok(None) => continue,
                    Err(_) => break,
                };

                let url = url::Url::parse(&format!("http://stub{}", request.url()))
                    .expect("parse request url");
                let path = url.path().to_owned();

                if request.method() == &tiny_http::Method::Post && path == "/api/generate" {
                    let mut body = String::new();
                    if request.as_reader().read_to_string(&mut body).is_err() {
                        let _ = request.respond(
                            tiny_http::Response::from_string("invalid request body")
                                .with_status_code(400),
                        );
                        continue;
                    }
                    let (status, body) = generate_response(&body);
                    let _ = request.respond(json_response(status, &body));
                    continue;
                }

                let Some(relative) = path.strip_prefix(&format!("{BASE_PATH}/")) else {
                    let _ = request.respond(
                        tiny_http::Response::from_string("not found").with_status_code(404),
                    );
                    continue;
                };
                seen.lock().expect("lock requests").push(relative.to_owned());

                let api_key = url
                    .query_pairs()
                    .find(|(name, _)| name == "api-key")
                    .map(|(_, value)| value.into_owned());
                if api_key.as_deref() != Some(API_KEY) {
                    let body = serde_json::json!({ "fault": { "faultstring": "Invalid ApiKey" } });
                    let _ = request.respond(json_response(401, &body.to_string()));
                    continue;
                }

                match routes.get(relative) {
                    Some(route) => {
                        let _ = request.respond(json_response(route.status, &route.body));
                    }
                    None => {
                        let _ = request.respond(
                            tiny_http::Response::from_string("not found").with_status_code(404),
                        );
                    }
                }
            }
        });

        Self {
            base_url,
            ollama_url,
            requests,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    /// API paths requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().expect("lock requests").clone()
    }
}

impl Drop for NytStub {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn json_response(status: u16, body: &str) -> tiny_http::Response<std::io::Cursor<Vec<u8>>> {
    let header = tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
        .expect("build header");
    tiny_http::Response::from_string(body)
        .with_status_code(status)
        .with_header(header)
}

/// Model name the generate endpoint answers with 404, like Ollama does for unpulled models.
pub const MISSING_MODEL: &str = "missing-model";

fn generate_response(raw: &str) -> (u16, String) {
    let parsed: Value = serde_json::from_str(raw).unwrap_or(Value::Null);
    let model = parsed.get("model").and_then(Value::as_str).unwrap_or("");
    if model == MISSING_MODEL {
        let body = serde_json::json!({ "error": format!("model '{model}' not found") });
        return (404, body.to_string());
    }
    let prompt = parsed.get("prompt").and_then(Value::as_str).unwrap_or("");
    let stream = parsed.get("stream").and_then(Value::as_bool);

    let text = if stream == Some(false) && prompt.contains("DATA:\n") {
        format!("- stub report from {model}")
    } else {
        "- malformed generate request".to_owned()
    };
    let body = serde_json::json!({ "model": model, "response": text, "done": true });
    (200, body.to_string())
}

pub fn book(rank: i64, title: &str, author: &str, weeks_on_list: i64) -> Value {
    serde_json::json!({
        "rank": rank,
        "rank_last_week": 0,
        "weeks_on_list": weeks_on_list,
        "publisher": "Stub House",
        "description": format!("About {title}."),
        "title": title,
        "author": author,
        "book_image": null,
        "buy_links": [{ "name": "Bookshop", "url": "https://example.com" }]
    })
}

/// Working directory two levels below `root`, so every `.env` location the loader walks stays inside it.
pub fn workdir(root: &Path) -> PathBuf {
    let dir = root.join("project").join("run");
    std::fs::create_dir_all(&dir).expect("create workdir");
    dir
}
