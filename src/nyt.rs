use std::time::Duration;

use anyhow::Context as _;
use serde_json::Value;
use url::Url;

use crate::cli::ApiArgs;
use crate::config::{self, ApiKey};

pub const STATUS_OK: &str = "OK";

/// Why a fetch produced no data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchFailure {
    #[error("{0}")]
    Transport(String),
    #[error("status {status} for {path}")]
    Status { status: u16, path: String },
    #[error("malformed body: {0}")]
    Malformed(String),
    #[error("response status is {0:?}, expected \"OK\"")]
    NotOk(String),
}

/// Result of one fetch. `Failed` is a soft failure: callers decide whether it is fatal.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome<T> {
    Fetched(T),
    Failed(FetchFailure),
}

impl<T> FetchOutcome<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> FetchOutcome<U> {
        match self {
            FetchOutcome::Fetched(value) => FetchOutcome::Fetched(f(value)),
            FetchOutcome::Failed(failure) => FetchOutcome::Failed(failure),
        }
    }

    pub fn into_result(self) -> Result<T, FetchFailure> {
        match self {
            FetchOutcome::Fetched(value) => Ok(value),
            FetchOutcome::Failed(failure) => Err(failure),
        }
    }

    fn inspect_failed(self, f: impl FnOnce(&FetchFailure)) -> Self {
        if let FetchOutcome::Failed(failure) = &self {
            f(failure);
        }
        self
    }
}

/// Books API client. Carries the credential explicitly; every request goes through [`NytClient::get`].
#[derive(Debug, Clone)]
pub struct NytClient {
    http: reqwest::Client,
    base_url: String,
    api_key: ApiKey,
}

impl NytClient {
    pub fn new(base_url: &str, api_key: ApiKey, timeout: Duration) -> anyhow::Result<Self> {
        let parsed = Url::parse(base_url).context("parse --base-url")?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            anyhow::bail!("--base-url must be http/https: {parsed}");
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("build http client")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_owned(),
            api_key,
        })
    }

    /// Resolves the credential and builds the client from shared CLI flags.
    pub fn from_args(args: &ApiArgs) -> anyhow::Result<Self> {
        let sources = config::default_sources(&args.env_file);
        let api_key = config::resolve_api_key(&sources, |name| std::env::var(name).ok())
            .context("load api key")?;
        Self::new(&args.base_url, api_key, Duration::from_secs(args.timeout_secs))
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub async fn get(&self, path: &str, params: &[(&str, &str)]) -> FetchOutcome<Value> {
        let endpoint = self.endpoint(path);
        let mut query: Vec<(&str, &str)> = params.to_vec();
        query.push(("api-key", self.api_key.as_str()));

        tracing::debug!(%endpoint, "GET");
        let response = match self.http.get(&endpoint).query(&query).send().await {
            Ok(response) => response,
            Err(err) => {
                // The request URL carries the api key.
                let err = err.without_url();
                tracing::warn!(path, error = %err, "request failed");
                return FetchOutcome::Failed(FetchFailure::Transport(format!("GET {path}: {err}")));
            }
        };

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(
                path,
                status = status.as_u16(),
                body = %truncate(&body, 500),
                "unexpected status"
            );
            return FetchOutcome::Failed(FetchFailure::Status {
                status: status.as_u16(),
                path: path.to_owned(),
            });
        }

        let raw = match response.text().await {
            Ok(raw) => raw,
            Err(err) => {
                let err = err.without_url();
                tracing::warn!(path, error = %err, "read response body failed");
                return FetchOutcome::Failed(FetchFailure::Transport(format!("read {path}: {err}")));
            }
        };

        parse_ok_body(&raw).inspect_failed(|failure| {
            tracing::warn!(path, %failure, "rejected response body");
        })
    }
}

/// Accepts a body only when it is JSON with a top-level `"status": "OK"`.
pub fn parse_ok_body(raw: &str) -> FetchOutcome<Value> {
    let value: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(err) => return FetchOutcome::Failed(FetchFailure::Malformed(err.to_string())),
    };

    match value.get("status").and_then(Value::as_str) {
        Some(STATUS_OK) => FetchOutcome::Fetched(value),
        Some(other) => FetchOutcome::Failed(FetchFailure::NotOk(other.to_owned())),
        None => FetchOutcome::Failed(FetchFailure::NotOk(String::new())),
    }
}

/// `results.<key>` as an array, or empty.
pub fn results_array<'a>(body: &'a Value, key: &str) -> &'a [Value] {
    body.get("results")
        .and_then(|results| results.get(key))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
