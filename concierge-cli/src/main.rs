use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use concierge_rag::{KnowledgeIngestor, KnowledgeRetriever, Settings};
use tracing_subscriber::EnvFilter;

mod chat;

/// Published knowledge sheet used when `--source` is omitted.
const DEFAULT_SHEET_URL: &str = "https://docs.google.com/spreadsheets/d/e/2PACX-1vTJNLn_fEvnJLmf-2B5h3ShpSNa_LbcD0GF3a2Y_BOk-XxWIK3lmWpVGmcXHgZoriSL9k0oCNfF8MGU/pub?output=csv";

#[derive(Parser)]
#[command(name = "concierge")]
#[command(about = "Operate the resort concierge knowledge base", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Embed a knowledge CSV (file path or URL) into the store")]
    Ingest {
        #[arg(short, long, default_value = DEFAULT_SHEET_URL)]
        source: String,
    },

    #[command(about = "Recompute normalized embeddings for every stored entry")]
    Backfill,

    #[command(about = "Show the nearest knowledge entries for a question, without gating")]
    Search {
        question: String,

        #[arg(short, long, default_value_t = 5)]
        limit: usize,
    },

    #[command(about = "Answer one question through the full pipeline")]
    Ask { question: String },

    #[command(about = "Chat with a running concierge server")]
    Chat {
        #[arg(short, long, default_value = "http://localhost:3000")]
        url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Chat { url } => chat::run(&url).await,
        Commands::Ingest { source } => ingest(&settings()?, &source).await,
        Commands::Backfill => backfill(&settings()?).await,
        Commands::Search { question, limit } => search(&settings()?, &question, limit).await,
        Commands::Ask { question } => ask(&settings()?, &question).await,
    }
}

fn settings() -> Result<Settings> {
    Settings::from_env().context("Failed to load settings")
}

fn ingestor(settings: &Settings) -> Result<KnowledgeIngestor> {
    let collaborators = settings.connect()?;
    Ok(KnowledgeIngestor::new(
        collaborators.embedder,
        collaborators.store,
        settings.concierge.call_timeout(),
    ))
}

async fn read_source(source: &str) -> Result<String> {
    if source.starts_with("http://") || source.starts_with("https://") {
        println!("📥 Fetching knowledge sheet from {source}");
        let response = reqwest::get(source).await.context("Failed to fetch CSV")?;
        if !response.status().is_success() {
            bail!("CSV download failed with status {}", response.status());
        }
        return response.text().await.context("Failed to read CSV body");
    }
    let path = PathBuf::from(source);
    std::fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))
}

async fn ingest(settings: &Settings, source: &str) -> Result<()> {
    let csv = read_source(source).await?;
    let report = ingestor(settings)?.ingest_csv(csv.as_bytes()).await?;

    println!("✅ Ingestion complete");
    println!("  Created:   {}", report.created);
    println!("  Updated:   {}", report.updated);
    println!("  Unchanged: {}", report.unchanged);
    println!("  Skipped:   {}", report.skipped);
    println!("  Failed:    {}", report.failed);
    Ok(())
}

async fn backfill(settings: &Settings) -> Result<()> {
    let report = ingestor(settings)?.backfill_normalized().await?;
    println!("✅ Backfill complete: {} normalized, {} degenerate", report.normalized, report.degenerate);
    Ok(())
}

async fn search(settings: &Settings, question: &str, limit: usize) -> Result<()> {
    let collaborators = settings.connect()?;
    let retriever = KnowledgeRetriever::new(
        collaborators.embedder,
        collaborators.store,
        settings.concierge.call_timeout(),
    )
    .with_match_threshold(settings.concierge.match_threshold);

    let candidates = retriever.retrieve(question, limit).await?;
    if candidates.is_empty() {
        println!("No matching entries.");
        return Ok(());
    }

    println!("\n🔎 Retrieved chunks:\n");
    for (rank, candidate) in candidates.iter().enumerate() {
        println!("Result {}", rank + 1);
        println!("chunk_id: {}", candidate.id);
        println!("category: {}", candidate.category.as_deref().unwrap_or("-"));
        println!("distance: {:.4}", candidate.distance);
        println!("content:  {}", candidate.content);
        println!("----------------------\n");
    }
    Ok(())
}

async fn ask(settings: &Settings, question: &str) -> Result<()> {
    let agent = settings.build_agent()?;
    let result = agent.ask(question).await?;
    chat::print_answer(&result);
    Ok(())
}
