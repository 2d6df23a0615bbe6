use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context as _;
use chrono::{SubsecRound as _, Utc};
use serde_json::Value;

use crate::cli::FetchArgs;
use crate::error::Fatal;
use crate::formats::{BestsellerSnapshot, BookListMeta, BookRecord, ListSnapshot};
use crate::nyt::{self, FetchOutcome, NytClient};

pub const OVERVIEW_PATH: &str = "lists/overview.json";

pub fn current_list_path(list_name_encoded: &str) -> String {
    format!("lists/current/{list_name_encoded}.json")
}

/// Upstream calls the aggregation pipeline depends on.
#[async_trait::async_trait]
pub trait BestsellerSource: Send + Sync {
    async fn overview(&self) -> FetchOutcome<Value>;

    async fn current_list(&self, list_name_encoded: &str) -> FetchOutcome<Vec<BookRecord>>;
}

#[async_trait::async_trait]
impl BestsellerSource for NytClient {
    async fn overview(&self) -> FetchOutcome<Value> {
        self.get(OVERVIEW_PATH, &[]).await
    }

    async fn current_list(&self, list_name_encoded: &str) -> FetchOutcome<Vec<BookRecord>> {
        self.get(&current_list_path(list_name_encoded), &[])
            .await
            .map(|body| books_from_body(&body))
    }
}

/// `results.books`, each object passed through as-is. Entries that are not JSON objects are dropped.
pub fn books_from_body(body: &Value) -> Vec<BookRecord> {
    nyt::results_array(body, "books")
        .iter()
        .enumerate()
        .filter_map(|(idx, book)| match book.as_object() {
            Some(fields) => Some(BookRecord(fields.clone())),
            None => {
                tracing::debug!(index = idx, entry = %book, "dropping non-object book entry");
                None
            }
        })
        .collect()
}

/// Lowercase, drop apostrophes, spaces to hyphens, keep only alphanumerics and `-`.
pub fn encode_list_name(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .replace('\'', "")
        .replace(' ', "-")
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '-')
        .collect()
}

/// Builds list metadata from an overview body; first occurrence of each encoded id wins.
pub fn lists_from_overview(body: &Value) -> Vec<BookListMeta> {
    let mut seen = HashSet::new();
    let mut lists = Vec::new();

    for entry in nyt::results_array(body, "lists") {
        let field = |key: &str| {
            entry
                .get(key)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
        };

        let name = field("list_name")
            .or_else(|| field("list_name_encoded"))
            .unwrap_or_default();
        let encoded = match field("list_name_encoded") {
            Some(encoded) => encoded.to_owned(),
            None => encode_list_name(name),
        };
        if name.is_empty() || encoded.is_empty() {
            continue;
        }
        if !seen.insert(encoded.clone()) {
            tracing::debug!(list_name_encoded = %encoded, "skipping duplicate list");
            continue;
        }

        lists.push(BookListMeta {
            list_name: name.to_owned(),
            list_name_encoded: encoded,
        });
    }

    lists
}

pub async fn resolve_lists(source: &dyn BestsellerSource) -> Vec<BookListMeta> {
    match source.overview().await {
        FetchOutcome::Fetched(body) => lists_from_overview(&body),
        FetchOutcome::Failed(_) => Vec::new(),
    }
}

/// Books for one list; a failed fetch contributes no books.
pub async fn fetch_list_books(
    source: &dyn BestsellerSource,
    list_name_encoded: &str,
) -> Vec<BookRecord> {
    match source.current_list(list_name_encoded).await {
        FetchOutcome::Fetched(books) => books,
        FetchOutcome::Failed(failure) => {
            tracing::warn!(list_name_encoded, %failure, "list fetch failed; recording zero books");
            Vec::new()
        }
    }
}

pub async fn aggregate(
    source: &dyn BestsellerSource,
    delay: Duration,
) -> anyhow::Result<BestsellerSnapshot> {
    tracing::info!("fetching list names");
    let metas = resolve_lists(source).await;
    if metas.is_empty() {
        return Err(Fatal::Empty(
            "no list names returned; check the api key and network".to_owned(),
        )
        .into());
    }

    let updated = Utc::now().trunc_subsecs(0);
    let total = metas.len();
    tracing::info!(lists = total, "fetching current books for each list");

    let mut lists = Vec::with_capacity(total);
    for (idx, meta) in metas.into_iter().enumerate() {
        if idx > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let books = fetch_list_books(source, &meta.list_name_encoded).await;
        tracing::info!(
            "[{}/{}] {}: {} books",
            idx + 1,
            total,
            meta.list_name,
            books.len()
        );
        lists.push(ListSnapshot {
            list_name: meta.list_name,
            list_name_encoded: meta.list_name_encoded,
            books,
        });
    }

    Ok(BestsellerSnapshot { updated, lists })
}

pub async fn run(args: FetchArgs) -> anyhow::Result<()> {
    let client = NytClient::from_args(&args.api)?;
    let out_path = PathBuf::from(&args.out);

    let snapshot = aggregate(&client, Duration::from_millis(args.delay_ms))
        .await
        .context("aggregate bestseller lists")?;

    crate::snapshot::write_snapshot(&out_path, &snapshot).context("write snapshot")?;
    tracing::info!(out = %out_path.display(), lists = snapshot.lists.len(), "saved snapshot");
    println!("Saved to {}", out_path.display());
    Ok(())
}
