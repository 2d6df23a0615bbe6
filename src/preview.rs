use anyhow::Context as _;
use serde_json::{Value, json};

use crate::bestsellers::{self, OVERVIEW_PATH};
use crate::cli::{ListArgs, OverviewArgs};
use crate::error::Fatal;
use crate::formats::BookRecord;
use crate::nyt::{self, NytClient};

/// `nytbooks list`: ranked preview of one list. Any fetch failure is fatal here.
pub async fn list(args: ListArgs) -> anyhow::Result<()> {
    let client = NytClient::from_args(&args.api)?;
    let path = bestsellers::current_list_path(&args.list);

    let body = client
        .get(&path, &[])
        .await
        .into_result()
        .map_err(Fatal::from)
        .with_context(|| format!("fetch list {}", args.list))?;

    let books = bestsellers::books_from_body(&body);
    tracing::info!(list = %args.list, books = books.len(), "fetched list");

    println!("Number of books returned: {}", books.len());
    println!();
    println!("Preview (top {}):", args.limit);
    for book in books.iter().take(args.limit) {
        println!("{}", preview_line(book));
    }
    Ok(())
}

pub fn preview_line(book: &BookRecord) -> String {
    format!(
        "- Rank {}: '{}' by {} (Weeks on list: {})",
        display(book.get("rank")),
        display(book.get("title")),
        display(book.get("author")),
        display(book.get("weeks_on_list")),
    )
}

fn display(value: Option<&Value>) -> String {
    match value {
        None => "None".to_owned(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// `nytbooks overview`: the first few lists with their first few books, as JSON on stdout.
pub async fn overview(args: OverviewArgs) -> anyhow::Result<()> {
    let client = NytClient::from_args(&args.api)?;

    let body = client
        .get(OVERVIEW_PATH, &[])
        .await
        .into_result()
        .map_err(Fatal::from)
        .context("fetch overview")?;

    let sliced = slice_overview(&body, args.lists, args.books);
    let json = serde_json::to_string_pretty(&sliced).context("serialize overview sample")?;
    println!("{json}");
    Ok(())
}

pub fn slice_overview(body: &Value, max_lists: usize, max_books: usize) -> Value {
    let lists: Vec<Value> = nyt::results_array(body, "lists")
        .iter()
        .take(max_lists)
        .map(|list| {
            let books: Vec<Value> = list
                .get("books")
                .and_then(Value::as_array)
                .map(|books| books.iter().take(max_books).cloned().collect())
                .unwrap_or_default();
            json!({
                "list_name": list.get("list_name").cloned().unwrap_or(Value::Null),
                "books": books,
            })
        })
        .collect();

    json!({ "results": { "lists": lists } })
}
