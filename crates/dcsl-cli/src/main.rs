//! dcsl - Widevine device certificate status list inspector

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use dcsl_cli::cmd::{self, Mode, Outcome};
use dcsl_cli::source::{self, FetchSettings};
use dcsl_cli::{Cli, paths};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    // Logs go to stderr; stdout carries only query output.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let cache_file = paths::todays_cache_file(&cli.cache_dir);
    let client = cli.fetch.then(reqwest::Client::new);
    let fetch = client.as_ref().map(|client| FetchSettings {
        client,
        url: &cli.url,
        api_key: &cli.api_key,
    });

    let input = source::acquire(&cache_file, fetch, std::io::stdin().lock())
        .await
        .inspect_err(|e| error!("Error reading data: {e}"))
        .context("Error reading data")?;

    let envelope = dcsl_schema::decode(&input.bytes)
        .inspect_err(|e| error!("Failed to parse protocol buffer: {e}"))
        .context("Failed to parse protocol buffer")?;

    let mut stdout = std::io::stdout().lock();
    match cmd::run(&envelope, Mode::from_cli(&cli), &mut stdout)? {
        Outcome::Success => Ok(ExitCode::SUCCESS),
        Outcome::NotFound => Ok(ExitCode::FAILURE),
    }
}
