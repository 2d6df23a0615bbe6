use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

pub const DEFAULT_BASE_URL: &str = "https://api.nytimes.com/svc/books/v3";

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch every current bestseller list into one JSON snapshot.
    Fetch(FetchArgs),
    /// Print a ranked preview of one bestseller list.
    List(ListArgs),
    /// Print a sliced sample of the overview endpoint as JSON.
    Overview(OverviewArgs),
    /// Summarize the overview and generate a report via a local LLM.
    Report(ReportArgs),
}

#[derive(Debug, Clone, Args)]
pub struct ApiArgs {
    /// Books API base URL (must be http/https).
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Per-request timeout.
    #[arg(long, default_value_t = 25)]
    pub timeout_secs: u64,

    /// `.env` file consulted for NYT_API_KEY before the default locations (repeatable).
    #[arg(long)]
    pub env_file: Vec<PathBuf>,
}

#[derive(Debug, Args)]
pub struct FetchArgs {
    #[command(flatten)]
    pub api: ApiArgs,

    /// Output file path for the snapshot (overwritten).
    #[arg(long, default_value = "data/bestsellers.json")]
    pub out: String,

    /// Delay before every list request after the first (rate limit).
    #[arg(long, default_value_t = 1500)]
    pub delay_ms: u64,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    #[command(flatten)]
    pub api: ApiArgs,

    /// Encoded list name (e.g. `hardcover-fiction`).
    #[arg(long, default_value = "hardcover-fiction")]
    pub list: String,

    /// Number of books to preview.
    #[arg(long, default_value_t = 15)]
    pub limit: usize,
}

#[derive(Debug, Args)]
pub struct OverviewArgs {
    #[command(flatten)]
    pub api: ApiArgs,

    /// Maximum lists to keep.
    #[arg(long, default_value_t = 2)]
    pub lists: usize,

    /// Maximum books to keep per list.
    #[arg(long, default_value_t = 2)]
    pub books: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LlmEngine {
    /// Use the data summary as the report (offline).
    Noop,
    /// POST the prompt to an Ollama-compatible `/api/generate` endpoint.
    Ollama,
}

#[derive(Debug, Args)]
pub struct ReportArgs {
    #[command(flatten)]
    pub api: ApiArgs,

    #[arg(long, value_enum, default_value_t = LlmEngine::Ollama)]
    pub engine: LlmEngine,

    /// Ollama host (without `/api/generate`).
    #[arg(long, default_value = "http://localhost:11434")]
    pub ollama_url: String,

    /// Model name sent to the generation endpoint.
    #[arg(long, default_value = "smollm2:1.7b")]
    pub model: String,

    /// Generation request timeout.
    #[arg(long, default_value_t = 120)]
    pub ollama_timeout_secs: u64,

    /// Output file path for the saved report.
    #[arg(long, default_value = "report.txt")]
    pub out: String,
}
