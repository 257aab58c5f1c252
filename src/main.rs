mod artifacts;
mod chrome;
mod extract;
mod ocr;
mod output;
mod scraper;
mod session;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;

use crate::artifacts::ArtifactStore;
use crate::chrome::ChromeDriver;
use crate::ocr::TesseractRecognizer;
use crate::output::PageOutcome;
use crate::session::WaitPolicy;

#[derive(Parser)]
#[command(
    name = "ocr_scraper",
    about = "Scrape rendered tables, recovering graphical cells via OCR"
)]
struct Cli {
    /// Scrape a single URL
    #[arg(short, long, value_name = "URL")]
    url: Option<String>,

    /// Read URLs from a file (one per line)
    #[arg(short, long, value_name = "urls.txt")]
    input: Option<PathBuf>,

    /// Save results in JSON format
    #[arg(short, long, value_name = "out.json")]
    output: Option<PathBuf>,

    /// Print each page's rows to stdout (default when no --output)
    #[arg(short, long)]
    print: bool,

    /// Persist per-cell screenshots and verbose timing info
    #[arg(long)]
    debug: bool,

    /// Post-navigation settle delay in milliseconds
    #[arg(long, default_value = "1000", value_name = "MS")]
    settle_ms: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut cli = Cli::parse();

    let default_filter = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .init();

    let t0 = Instant::now();

    if cli.output.is_none() {
        cli.print = true;
    }

    let urls = load_urls(&cli)?;
    if urls.is_empty() {
        bail!("no usable URLs (input was empty)");
    }

    let recognizer = TesseractRecognizer::new()?;
    let store = cli.debug.then(|| ArtifactStore::new(artifacts::SHOT_DIR));

    info!("Scraping {} pages...", urls.len());
    let driver = ChromeDriver::launch().await?;
    let entries = {
        let session = driver
            .new_session(WaitPolicy::Fixed(Duration::from_millis(cli.settle_ms)))
            .await?;
        scraper::scrape_pages(&session, &recognizer, &urls, store.as_ref()).await
    };
    driver.close().await?;
    let entries = entries?;

    let stats = scraper::BatchStats::of(&entries);
    println!(
        "Done: {} scraped ({} ok, {} errors).",
        stats.total, stats.ok, stats.errors
    );

    if cli.print {
        for (url, outcome) in &entries {
            if let PageOutcome::Success(rows) = outcome {
                output::print_page(url, rows);
            }
        }
    }

    if let Some(path) = &cli.output {
        output::write_json(path, &entries)?;
        info!("Saved results to {}", path.display());
    }

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    Ok(())
}

/// Candidate URLs from --input (one per line) or --url; blank entries
/// skipped.
fn load_urls(cli: &Cli) -> Result<Vec<String>> {
    let raw: Vec<String> = if let Some(path) = &cli.input {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?
            .lines()
            .map(str::to_string)
            .collect()
    } else if let Some(url) = &cli.url {
        vec![url.clone()]
    } else {
        bail!("specify --url or --input file");
    };

    Ok(raw
        .into_iter()
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .collect())
}

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
