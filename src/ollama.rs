use anyhow::Context as _;

use crate::error::Fatal;

pub fn generate_endpoint(base_url: &str) -> String {
    let base_url = base_url.trim_end_matches('/');
    format!("{base_url}/api/generate")
}

pub async fn generate_text(
    client: &reqwest::Client,
    endpoint: &str,
    model: &str,
    prompt: &str,
) -> anyhow::Result<String> {
    let body = serde_json::json!({
        "model": model,
        "prompt": prompt,
        "stream": false,
    });

    let response = client
        .post(endpoint)
        .json(&body)
        .send()
        .await
        .map_err(|err| Fatal::Transport(format!("POST {endpoint}: {err}")))?;

    let status = response.status();
    let raw = response
        .text()
        .await
        .map_err(|err| Fatal::Transport(format!("read {endpoint}: {err}")))
        .context("read generation response body")?;
    if !status.is_success() {
        let message = parse_error_message(&raw).unwrap_or_else(|| raw.clone());
        return Err(Fatal::Response(format!(
            "generation endpoint error ({status}): {message}"
        ))
        .into());
    }

    let value: serde_json::Value = serde_json::from_str(&raw)
        .map_err(|err| Fatal::Response(format!("malformed generation body: {err}")))?;
    let text = value
        .get("response")
        .and_then(|v| v.as_str())
        .ok_or_else(|| {
            Fatal::Response("missing `response` field in generation output".to_owned())
        })?;
    Ok(text.to_owned())
}

fn parse_error_message(raw_json: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(raw_json).ok()?;
    Some(value.get("error")?.as_str()?.to_owned())
}
