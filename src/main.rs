use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("ERROR: {err:#}");
        return nytbooks::error::exit_code(&err);
    }

    ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    nytbooks::logging::init().context("init logging")?;

    let cli = nytbooks::cli::Cli::parse();
    tracing::debug!(?cli, "parsed cli");

    match cli.command {
        nytbooks::cli::Command::Fetch(args) => {
            nytbooks::bestsellers::run(args).await.context("fetch")?;
        }
        nytbooks::cli::Command::List(args) => {
            nytbooks::preview::list(args).await.context("list")?;
        }
        nytbooks::cli::Command::Overview(args) => {
            nytbooks::preview::overview(args).await.context("overview")?;
        }
        nytbooks::cli::Command::Report(args) => {
            nytbooks::report::run(args).await.context("report")?;
        }
    }

    Ok(())
}
