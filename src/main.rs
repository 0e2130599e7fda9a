//! CLI entry point for the racecal tool.

use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{Datelike, Utc};
use clap::Parser;
use racecal_core::generative::DEFAULT_PROMPT_CEILING;
use racecal_core::sources::DisabledCapture;
use racecal_core::{
    ExtractRequest, Extractor, GeminiGenerator, GenerativeExtractor, HttpEndpointCapture,
    HttpPageFetcher, NetworkCapture, series,
};
use serde::Serialize;
use tracing::{debug, info, warn};

mod cli;
mod config;

use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    let loaded = config::load_config(args.config.as_deref())?;
    if let Some(path) = loaded.path.as_deref().filter(|_| loaded.loaded_from_file) {
        debug!(path = %path.display(), "Loaded config file");
    }
    let file_config = loaded.effective();

    let fetcher = Arc::new(HttpPageFetcher::new(file_config.http_timeouts())?);
    let capture: Arc<dyn NetworkCapture> = if args.no_capture {
        debug!("network capture disabled");
        Arc::new(DisabledCapture)
    } else {
        Arc::new(HttpEndpointCapture::new(fetcher.clone()))
    };

    let mut builder = Extractor::builder(fetcher)
        .capture(capture)
        .settings(file_config.extractor_settings());
    match GeminiGenerator::from_env(file_config.model.as_deref()) {
        Ok(generator) => {
            debug!(model = generator.model(), "generative tiers enabled");
            let ceiling = file_config.prompt_ceiling.unwrap_or(DEFAULT_PROMPT_CEILING);
            builder = builder
                .generative(GenerativeExtractor::new(Arc::new(generator)).with_prompt_ceiling(ceiling));
        }
        Err(error) => warn!(error = %error, "generative tiers unavailable"),
    }
    let extractor = builder.build();

    let season = args.season.unwrap_or_else(|| Utc::now().year());
    let upcoming_only = args.upcoming || file_config.upcoming_only.unwrap_or(false);
    let request = ExtractRequest::new(args.url.as_str(), args.series.as_str(), season)
        .with_upcoming_only(upcoming_only);

    info!(
        series = %series::display_name(&request.series_id),
        season,
        "racecal starting"
    );

    let result = extractor
        .fetch_season(&request)
        .await
        .context("Calendar extraction could not start")?;
    let (document, metadata) = result.into_parts();

    match args.output.as_deref() {
        Some(path) => write_json(path, &document)?,
        None => {
            let mut stdout = io::stdout().lock();
            serde_json::to_writer_pretty(&mut stdout, &document)?;
            writeln!(stdout)?;
        }
    }
    if let Some(path) = args.metadata_output.as_deref() {
        write_json(path, &metadata)?;
    }

    info!(
        method = %metadata.extraction_method,
        events = metadata.events_found,
        "Extraction complete"
    );

    Ok(())
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json + "\n")
        .with_context(|| format!("Failed to write '{}'", path.display()))?;
    info!(path = %path.display(), "Wrote output");
    Ok(())
}
