use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::error::Fatal;

pub const API_KEY_VAR: &str = "NYT_API_KEY";

const PLACEHOLDER_MARKER: &str = "your_";

/// NYT Books API key. `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    File(PathBuf),
    Env,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::File(path) => write!(f, "{}", path.display()),
            CredentialSource::Env => write!(f, "${API_KEY_VAR}"),
        }
    }
}

/// Explicit `--env-file` values first, then `.env` in the working directory and two of its ancestors,
/// then the process environment.
pub fn default_sources(explicit: &[PathBuf]) -> Vec<CredentialSource> {
    let mut sources: Vec<CredentialSource> = explicit
        .iter()
        .cloned()
        .map(CredentialSource::File)
        .collect();

    if let Ok(cwd) = std::env::current_dir() {
        for dir in cwd.ancestors().take(3) {
            sources.push(CredentialSource::File(dir.join(".env")));
        }
    }
    sources.push(CredentialSource::Env);
    sources
}

pub fn is_placeholder(value: &str) -> bool {
    value.to_lowercase().contains(PLACEHOLDER_MARKER)
}

/// Returns the first non-empty, non-placeholder `NYT_API_KEY` among `sources`.
pub fn resolve_api_key(
    sources: &[CredentialSource],
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<ApiKey> {
    for source in sources {
        let value = match source {
            CredentialSource::File(path) => match read_env_file_value(path, API_KEY_VAR) {
                Ok(value) => value,
                Err(err) => {
                    tracing::warn!(source = %source, ?err, "skipping unreadable env file");
                    None
                }
            },
            CredentialSource::Env => env(API_KEY_VAR),
        };

        let Some(value) = value else {
            continue;
        };
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        if is_placeholder(value) {
            tracing::debug!(source = %source, "ignoring placeholder credential");
            continue;
        }

        tracing::debug!(source = %source, "resolved api key");
        return Ok(ApiKey(value.to_owned()));
    }

    let tried = sources
        .iter()
        .map(|source| format!("  {source}"))
        .collect::<Vec<_>>()
        .join("\n");
    Err(Fatal::Credential(format!(
        "{API_KEY_VAR} missing or still a placeholder; add `{API_KEY_VAR}=<your key>` to a .env file \
(get one at https://developer.nytimes.com/get-started). Looked in:\n{tried}"
    ))
    .into())
}

fn read_env_file_value(path: &Path, key: &str) -> anyhow::Result<Option<String>> {
    if !path.is_file() {
        return Ok(None);
    }

    let iter =
        dotenvy::from_path_iter(path).with_context(|| format!("open env file: {}", path.display()))?;
    let mut found = None;
    for item in iter {
        let (name, value) = item.with_context(|| format!("parse env file: {}", path.display()))?;
        if name == key {
            found = Some(value);
        }
    }
    Ok(found)
}
