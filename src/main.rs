//! Catalog-Sweep main entry point
//!
//! This is the command-line interface for the Catalog-Sweep crawler.

use anyhow::Context;
use catalog_sweep::config::{load_config_with_hash, Config};
use catalog_sweep::crawler::run_crawl;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Catalog-Sweep: a concurrent catalog crawler
///
/// Crawls every configured catalog section, fetches all of its result
/// pages, retries failures in bounded passes and writes the collected
/// product records as JSON Lines.
#[derive(Parser, Debug)]
#[command(name = "catalog-sweep")]
#[command(version)]
#[command(about = "A concurrent catalog crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and list the sections without crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    let summary = run_crawl(config).await.context("crawl failed")?;
    if !summary.is_complete() {
        tracing::warn!(
            "Output is incomplete: {} pages and {} sections missing",
            summary.failed_pages.len(),
            summary.failed_sections.len()
        );
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("catalog_sweep=info,warn"),
            1 => EnvFilter::new("catalog_sweep=debug,info"),
            2 => EnvFilter::new("catalog_sweep=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows what would be crawled
fn handle_dry_run(config: &Config) {
    println!("=== Catalog-Sweep Dry Run ===\n");

    println!("Crawler Configuration:");
    println!(
        "  Max concurrent sections: {}",
        config.crawler.max_concurrent_sections
    );
    match config.crawler.max_concurrent_pages {
        0 => println!("  Max concurrent pages: unbounded"),
        limit => println!("  Max concurrent pages: {}", limit),
    }
    println!("  Max retry passes: {}", config.crawler.max_retry_passes);
    println!("  Retry backoff: {}ms", config.crawler.retry_backoff_ms);

    println!("\nHTTP:");
    println!("  User agent: {}", config.http.user_agent);
    println!("  Request timeout: {}s", config.http.request_timeout_secs);
    println!("  Trust proxy environment: {}", config.http.trust_env_proxy);

    println!("\nCatalog:");
    println!("  Page size: {}", config.catalog.page_size);
    println!("  Page parameter: {}", config.catalog.page_param);
    println!("  Count selector: {}", config.catalog.count_selector);

    println!("\nOutput:");
    println!("  Records: {}", config.output.records_path);
    if let Some(summary_path) = &config.output.summary_path {
        println!("  Summary: {}", summary_path);
    }

    println!("\nSections ({}):", config.sections.len());
    for section in &config.sections {
        println!("  - {}", section.url);
    }

    println!("\n✓ Configuration is valid");
}
