use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use transcripts_kernel::{Response, ServiceConfig, TranscriptService};

/// Transcript service client
#[derive(Parser, Debug)]
#[command(name = "transcripts")]
#[command(
    about = "Relay newline-delimited JSON requests to an in-memory transcript service",
    long_about = None
)]
struct Cli {
    /// Path to service config JSON
    #[arg(long)]
    config: Option<String>,

    /// Path to a file of JSON requests, one per line (stdin if omitted)
    #[arg(long)]
    requests: Option<String>,

    /// Pretty-print each response
    #[arg(long)]
    pretty: bool,
}

/// One line of output: the request's position in the input plus its response.
#[derive(Debug, Serialize)]
struct CliOutput<'a> {
    line: usize,
    status: u16,
    body: &'a serde_json::Value,
}

fn init_tracing(config: &ServiceConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    // stdout carries responses; logs go to stderr.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(env_filter)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // ----------------------------
    // Load config
    // ----------------------------
    let config = match &cli.config {
        Some(path) => ServiceConfig::load(path)?,
        None => ServiceConfig::default_config(),
    };
    init_tracing(&config);

    let service = TranscriptService::from_config(&config);
    tracing::info!(
        seeded = config.seed_on_start,
        students = service.with_store(|store| store.len()),
        "transcript service ready"
    );

    // ----------------------------
    // Open request stream
    // ----------------------------
    let input: Box<dyn BufRead> = match &cli.requests {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("failed to open requests file {path}"))?,
        )),
        None => Box::new(io::stdin().lock()),
    };

    // ----------------------------
    // Relay requests
    // ----------------------------
    let mut stdout = io::stdout().lock();
    for (index, line) in input.lines().enumerate() {
        let line = line.context("failed to read request")?;
        if line.trim().is_empty() {
            continue;
        }

        let Response { status, body } = service.handle_json(&line);
        let output = CliOutput {
            line: index + 1,
            status,
            body: &body,
        };

        let rendered = if cli.pretty {
            serde_json::to_string_pretty(&output)?
        } else {
            serde_json::to_string(&output)?
        };
        writeln!(stdout, "{rendered}")?;
    }

    Ok(())
}
