use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context as _;
use serde_json::Value;

use crate::bestsellers::OVERVIEW_PATH;
use crate::cli::{LlmEngine, ReportArgs};
use crate::error::Fatal;
use crate::formats::BookRecord;
use crate::nyt::{self, NytClient};
use crate::ollama;

const COLUMN_WIDTH: usize = 20;
const TOP_LONGEVITY: usize = 10;

/// One book flattened out of the overview, tagged with its list.
#[derive(Debug, Clone, PartialEq)]
pub struct BookRow {
    pub list: String,
    pub rank: Option<i64>,
    pub title: String,
    pub author: String,
    pub weeks_on_list: i64,
    pub publisher: String,
    pub description: String,
}

impl BookRow {
    fn from_record(list: &str, book: &BookRecord) -> Self {
        let text = |value: Option<&str>| value.unwrap_or("Unknown").to_owned();
        Self {
            list: list.to_owned(),
            rank: book.rank(),
            title: text(book.title()),
            author: text(book.author()),
            weeks_on_list: book.weeks_on_list().unwrap_or(0),
            publisher: text(book.publisher()),
            description: book.description().unwrap_or_default().to_owned(),
        }
    }

    fn cell(&self, column: &str) -> String {
        match column {
            "list" => self.list.clone(),
            "rank" => self
                .rank
                .map(|rank| rank.to_string())
                .unwrap_or_else(|| "None".to_owned()),
            "title" => self.title.clone(),
            "author" => self.author.clone(),
            "weeks_on_list" => self.weeks_on_list.to_string(),
            "publisher" => self.publisher.clone(),
            "description" => self.description.clone(),
            _ => String::new(),
        }
    }
}

pub fn rows_from_overview(body: &Value) -> Vec<BookRow> {
    let mut rows = Vec::new();
    for list in nyt::results_array(body, "lists") {
        let list_name = list
            .get("list_name")
            .and_then(Value::as_str)
            .unwrap_or("Unknown");
        let books = list.get("books").and_then(Value::as_array);
        for book in books.into_iter().flatten() {
            let Some(fields) = book.as_object() else {
                continue;
            };
            rows.push(BookRow::from_record(list_name, &BookRecord(fields.clone())));
        }
    }
    rows
}

#[derive(Debug, Clone)]
pub struct ReportSummary {
    pub total_lists: usize,
    pub total_books: usize,
    pub top_ranked: Vec<BookRow>,
    pub top_longevity: Vec<BookRow>,
}

impl ReportSummary {
    pub fn from_rows(rows: &[BookRow]) -> Self {
        let total_lists = rows
            .iter()
            .map(|row| row.list.as_str())
            .collect::<HashSet<_>>()
            .len();

        let top_ranked = rows
            .iter()
            .filter(|row| row.rank == Some(1))
            .cloned()
            .collect();

        let mut top_longevity = rows.to_vec();
        top_longevity.sort_by(|a, b| b.weeks_on_list.cmp(&a.weeks_on_list));
        top_longevity.truncate(TOP_LONGEVITY);

        Self {
            total_lists,
            total_books: rows.len(),
            top_ranked,
            top_longevity,
        }
    }

    pub fn to_text(&self) -> String {
        let ranked_table = format_table(
            &self.top_ranked,
            &["list", "title", "author", "weeks_on_list"],
        );
        let longevity_table = format_table(
            &self.top_longevity,
            &["list", "rank", "title", "author", "weeks_on_list"],
        );

        format!(
            "NYT Bestseller Data (current week):\n\
- Total lists: {total_lists}\n\
- Total books: {total_books}\n\
\n\
#1 Ranked Books by List:\n\
{ranked_table}\n\
\n\
Top 10 Books by Weeks on List (longest-running bestsellers):\n\
{longevity_table}\n",
            total_lists = self.total_lists,
            total_books = self.total_books,
        )
    }
}

/// Left-justified columns joined by ` | `, under a header and a dash rule.
pub fn format_table(rows: &[BookRow], columns: &[&str]) -> String {
    let header = columns
        .iter()
        .map(|column| ljust(column, COLUMN_WIDTH))
        .collect::<Vec<_>>()
        .join(" | ");
    let rule = "-".repeat(header.chars().count());

    let mut lines = vec![header, rule];
    for row in rows {
        let line = columns
            .iter()
            .map(|column| ljust(&row.cell(column), COLUMN_WIDTH))
            .collect::<Vec<_>>()
            .join(" | ");
        lines.push(line);
    }
    lines.join("\n")
}

fn ljust(text: &str, width: usize) -> String {
    format!("{text:<width$}")
}

pub fn build_prompt(data_summary: &str) -> String {
    format!(
        "You are a book industry analyst. Based on the following NYT Bestseller data,\n\
write a brief report (5-8 bullet points) covering:\n\
1. Key trends across the bestseller lists\n\
2. Which books have the longest staying power and why that matters\n\
3. Any notable patterns in genres or authors\n\
4. One actionable insight for a reader looking for their next book\n\
\n\
Use clear, concise language. Format as bullet points with a short title header.\n\
\n\
DATA:\n\
{data_summary}\n"
    )
}

pub fn report_file_contents(report: &str, data_summary: &str) -> String {
    format!(
        "AI-Generated NYT Bestseller Report\n{rule}\n\n{report}\n\n--- Data Summary Used ---\n\n{data_summary}",
        rule = "=".repeat(40),
    )
}

pub async fn run(args: ReportArgs) -> anyhow::Result<()> {
    let client = NytClient::from_args(&args.api)?;

    tracing::info!("fetching bestseller overview");
    let body = client
        .get(OVERVIEW_PATH, &[])
        .await
        .into_result()
        .map_err(Fatal::from)
        .context("fetch overview")?;

    let rows = rows_from_overview(&body);
    tracing::info!(
        lists = nyt::results_array(&body, "lists").len(),
        books = rows.len(),
        "processed overview"
    );

    let summary = ReportSummary::from_rows(&rows);
    let data_summary = summary.to_text();
    tracing::info!(chars = data_summary.chars().count(), "data summary ready");

    let report = match args.engine {
        LlmEngine::Noop => data_summary.clone(),
        LlmEngine::Ollama => {
            let endpoint = ollama::generate_endpoint(&args.ollama_url);
            tracing::info!(%endpoint, model = %args.model, "generating report");
            let http = reqwest::Client::builder()
                .timeout(Duration::from_secs(args.ollama_timeout_secs))
                .build()
                .context("build http client")?;
            ollama::generate_text(&http, &endpoint, &args.model, &build_prompt(&data_summary))
                .await
                .context("generate report")?
        }
    };

    let rule = "=".repeat(60);
    println!("{rule}");
    println!("AI-GENERATED BESTSELLER REPORT");
    println!("{rule}");
    println!("{report}");
    println!("{rule}");

    let out_path = PathBuf::from(&args.out);
    if let Some(parent) = out_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create report dir: {}", parent.display()))?;
    }
    std::fs::write(&out_path, report_file_contents(&report, &data_summary))
        .with_context(|| format!("write report: {}", out_path.display()))?;
    tracing::info!(out = %out_path.display(), "saved report");

    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn overview() -> Value {
        json!({
            "status": "OK",
            "results": { "lists": [
                { "list_name": "Fiction", "books": [
                    { "rank": 1, "title": "ALPHA", "author": "Ann", "weeks_on_list": 3 },
                    { "rank": 2, "title": "BETA", "author": "Bob", "weeks_on_list": 12 }
                ]},
                { "list_name": "Nonfiction", "books": [
                    { "rank": 1, "title": "GAMMA", "author": "Cy", "weeks_on_list": 12 },
                    { "rank": 2, "title": "DELTA" }
                ]},
                { "list_name": "Empty", "books": [] }
            ]}
        })
    }

    #[test]
    fn rows_flatten_lists_with_defaults() {
        let rows = rows_from_overview(&overview());
        assert_eq!(rows.len(), 4);
        let delta = &rows[3];
        assert_eq!(delta.list, "Nonfiction");
        assert_eq!(delta.author, "Unknown");
        assert_eq!(delta.publisher, "Unknown");
        assert_eq!(delta.weeks_on_list, 0);
        assert_eq!(delta.description, "");
    }

    #[test]
    fn summary_picks_number_ones_and_longest_running() {
        let summary = ReportSummary::from_rows(&rows_from_overview(&overview()));
        assert_eq!(summary.total_lists, 2);
        assert_eq!(summary.total_books, 4);

        let ranked: Vec<_> = summary.top_ranked.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(ranked, ["ALPHA", "GAMMA"]);

        let longevity: Vec<_> = summary
            .top_longevity
            .iter()
            .map(|r| r.title.as_str())
            .collect();
        assert_eq!(longevity, ["BETA", "GAMMA", "ALPHA", "DELTA"]);
    }

    #[test]
    fn longevity_is_capped_at_ten() {
        let rows: Vec<BookRow> = (0..15)
            .map(|weeks| BookRow {
                list: "L".to_owned(),
                rank: Some(weeks + 1),
                title: format!("T{weeks}"),
                author: "A".to_owned(),
                weeks_on_list: weeks,
                publisher: "P".to_owned(),
                description: String::new(),
            })
            .collect();
        let summary = ReportSummary::from_rows(&rows);
        assert_eq!(summary.top_longevity.len(), 10);
        assert_eq!(summary.top_longevity[0].weeks_on_list, 14);
        assert_eq!(summary.top_longevity[9].weeks_on_list, 5);
    }

    #[test]
    fn table_pads_cells_to_twenty_columns() {
        let rows = rows_from_overview(&overview());
        let table = format_table(&rows[..1], &["list", "rank"]);
        let lines: Vec<_> = table.lines().collect();
        assert_eq!(lines[0], format!("{:<20} | {:<20}", "list", "rank"));
        assert_eq!(lines[1], "-".repeat(43));
        assert_eq!(lines[2], format!("{:<20} | {:<20}", "Fiction", "1"));
    }

    #[test]
    fn prompt_embeds_data_summary() {
        let summary = ReportSummary::from_rows(&rows_from_overview(&overview())).to_text();
        assert!(summary.contains("- Total lists: 2\n- Total books: 4"));
        let prompt = build_prompt(&summary);
        assert!(prompt.starts_with("You are a book industry analyst."));
        assert!(prompt.ends_with(&format!("DATA:\n{summary}\n")));
    }
}
