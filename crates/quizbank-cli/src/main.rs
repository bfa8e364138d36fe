//! Quizbank - daily quiz questions from a pre-generated bank
//!
//! Each run hands out questions per exam category from a local bank, refilling
//! it through the configured generation providers when a category runs dry.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use clap::{Parser, Subcommand};

use quizbank_core::bank::RefillOutcome;
use quizbank_core::{
    run_batch, BankDispenser, BankStore, Database, Delivery, GeminiClient, GeneratedItem,
    ProviderChain, QuizbankConfig, RequestExecutor,
};

/// Quizbank - daily quiz delivery
#[derive(Parser)]
#[command(name = "quizbank")]
#[command(about = "Daily quiz questions served from a pre-generated bank", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to ~/.quizbank/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Deliver a pack for each category
    Run {
        /// Exam category (repeatable)
        #[arg(short = 'C', long = "category")]
        categories: Vec<String>,

        /// File with one category per line
        #[arg(long)]
        categories_file: Option<PathBuf>,

        /// Questions per category (overrides config)
        #[arg(short, long)]
        pack_size: Option<usize>,
    },

    /// Generate one batch for a category now
    Refill { category: String },

    /// Show per-category bank counts
    Stock,

    /// List provider strategies in the order they are tried
    Strategies,
}

/// Writes each pack to stdout as one JSON line
struct StdoutDelivery;

#[async_trait]
impl Delivery for StdoutDelivery {
    async fn deliver(&self, category: &str, items: &[GeneratedItem]) -> Result<()> {
        let line = serde_json::json!({
            "category": category,
            "questions": items,
        });
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{}", line)?;
        stdout.flush()?;
        Ok(())
    }
}

/// Read categories from a file, skipping blank lines and `#` comments
fn read_categories_file(path: &Path) -> Result<Vec<String>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read categories file {}", path.display()))?;
    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect())
}

fn build_chain(config: &QuizbankConfig, api_key: Option<String>) -> ProviderChain {
    let client = GeminiClient::new(
        &config.provider.base_url,
        api_key,
        config.request_timeout(),
    );
    let executor = RequestExecutor::new(Arc::new(client), config.retry_config());
    ProviderChain::new(executor, config.strategies.clone())
}

fn open_database(config: &QuizbankConfig) -> Result<Database> {
    let path = config.database_path();
    tracing::info!("Opening bank at {}", path.display());
    Database::new(&path).with_context(|| format!("Failed to open bank {}", path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries delivered packs
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = QuizbankConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Run {
            mut categories,
            categories_file,
            pack_size,
        } => {
            if let Some(path) = categories_file {
                categories.extend(read_categories_file(&path)?);
            }
            if categories.is_empty() {
                bail!("no categories given (use --category or --categories-file)");
            }
            let pack_size = pack_size.unwrap_or(config.pack_size);
            if pack_size == 0 {
                bail!("--pack-size must be greater than zero");
            }

            // Stocked categories are served without a key; only refills need one
            let api_key = match config.api_key() {
                Ok(key) => Some(key),
                Err(e) => {
                    tracing::warn!("{:#}; categories that need a refill will be unavailable", e);
                    None
                }
            };
            let chain = build_chain(&config, api_key);
            let db = open_database(&config)?;
            let dispenser = BankDispenser::new(BankStore::new(&db), &chain, config.refill_size)
                .with_temperature(config.provider.temperature);

            let report = run_batch(&dispenser, categories, pack_size, &StdoutDelivery).await;

            eprintln!();
            eprintln!(
                "Run complete: {} delivered, {} unavailable, {} failed",
                report.delivered.len(),
                report.unavailable.len(),
                report.failed.len()
            );
            for (category, count) in &report.delivered {
                eprintln!("  ✓ {} ({} question(s))", category, count);
            }
            for (category, reason) in &report.unavailable {
                eprintln!("  - {}: {}", category, reason);
            }
            for (category, error) in &report.failed {
                eprintln!("  ✗ {}: {}", category, error);
            }
        }
        Commands::Refill { category } => {
            let chain = build_chain(&config, Some(config.api_key()?));
            let db = open_database(&config)?;
            let dispenser = BankDispenser::new(BankStore::new(&db), &chain, config.refill_size)
                .with_temperature(config.provider.temperature);

            match dispenser.refill(&category).await? {
                RefillOutcome::Refilled { batch_id, count } => {
                    println!("Added {} question(s) to {} (batch {})", count, category, batch_id);
                }
                RefillOutcome::Failed(reason) => {
                    bail!("refill for {} failed: {}", category, reason);
                }
            }
        }
        Commands::Stock => {
            let db = open_database(&config)?;
            let stock = BankStore::new(&db).stock()?;
            if stock.is_empty() {
                println!("Bank is empty.");
            } else {
                println!("{:<32} {:>10} {:>10}", "CATEGORY", "AVAILABLE", "USED");
                for row in stock {
                    println!(
                        "{:<32} {:>10} {:>10}",
                        row.category, row.unconsumed, row.consumed
                    );
                }
            }
        }
        Commands::Strategies => {
            println!("Provider strategies ({}):", config.strategies.len());
            for (i, strategy) in config.strategies.iter().enumerate() {
                println!("  {}. {}", i + 1, strategy);
            }
        }
    }

    Ok(())
}
