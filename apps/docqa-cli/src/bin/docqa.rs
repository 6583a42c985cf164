use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

use docqa_core::config::Config;
use docqa_core::types::{IngestionSummary, QuestionOptions, QuestionResult, SearchResult};
use docqa_engine::Engine;
use docqa_text::is_supported;

#[derive(Parser)]
#[command(name = "docqa", version, about = "Ask questions about your documents")]
struct Cli {
    /// Print results as JSON on stdout
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ingest files or directories (.pdf, .docx, .txt, .md) into a collection
    Ingest {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        #[arg(short, long)]
        collection: Option<String>,
    },
    /// Answer a question from a collection
    Ask {
        question: String,
        #[arg(short, long)]
        collection: Option<String>,
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
        #[arg(long)]
        no_metadata: bool,
    },
    /// Semantic search without answer generation
    Search {
        query: String,
        #[arg(short, long)]
        collection: Option<String>,
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// List collections with their record counts
    Collections,
    /// Delete a collection and its stored data
    Delete { name: String },
}

#[derive(Serialize)]
struct IngestReport {
    path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<IngestionSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Explicit files are kept as given so unsupported ones are reported;
/// directories contribute their supported files in name order.
fn collect_documents(inputs: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            files.extend(
                WalkDir::new(input)
                    .sort_by_file_name()
                    .into_iter()
                    .filter_map(Result::ok)
                    .filter(|entry| entry.file_type().is_file() && is_supported(entry.path()))
                    .map(walkdir::DirEntry::into_path),
            );
        } else {
            files.push(input.clone());
        }
    }
    files
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = Config::load()
        .and_then(|c| c.engine())
        .context("loading configuration")?;
    let engine = Engine::from_config(config).await.context("starting engine")?;

    match cli.command {
        Command::Ingest { paths, collection } => {
            let collection = collection.unwrap_or_else(|| engine.default_collection().to_string());
            ingest(&engine, &paths, &collection, cli.json).await
        }
        Command::Ask { question, collection, top_k, no_metadata } => {
            let collection = collection.unwrap_or_else(|| engine.default_collection().to_string());
            let defaults = engine.default_question_options();
            let options = QuestionOptions { top_k: top_k.unwrap_or(defaults.top_k), include_metadata: !no_metadata };
            let result = engine.ask(&question, &collection, options).await?;
            if cli.json { print_json(&result) } else { print_answer(&result); Ok(()) }
        }
        Command::Search { query, collection, limit } => {
            let collection = collection.unwrap_or_else(|| engine.default_collection().to_string());
            let result = engine.search(&query, &collection, limit).await?;
            if cli.json { print_json(&result) } else { print_matches(&result); Ok(()) }
        }
        Command::Collections => {
            let collections = engine.list_collections().await;
            if cli.json {
                return print_json(&collections);
            }
            if collections.is_empty() {
                println!("No collections yet. Ingest documents with `docqa ingest <paths>`.");
            }
            for info in &collections {
                println!("{:<30} {:>8} chunks", info.name, info.record_count);
            }
            Ok(())
        }
        Command::Delete { name } => {
            engine.delete_collection(&name).await?;
            if cli.json {
                print_json(&serde_json::json!({ "deleted": name }))
            } else {
                println!("Deleted collection '{name}'");
                Ok(())
            }
        }
    }
}

async fn ingest(engine: &Engine, inputs: &[PathBuf], collection: &str, json: bool) -> anyhow::Result<()> {
    let files = collect_documents(inputs);
    if files.is_empty() {
        anyhow::bail!("no supported documents found");
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    pb.set_message(format!("ingesting {} document(s) into '{collection}'", files.len()));
    pb.enable_steady_tick(Duration::from_millis(120));
    let results = engine.ingest_many(&files, collection).await;
    pb.finish_and_clear();

    let reports: Vec<IngestReport> = files
        .iter()
        .zip(results)
        .map(|(path, result)| report(path, result))
        .collect();
    let failed = reports.iter().filter(|r| r.error.is_some()).count();

    if json {
        print_json(&reports)?;
    } else {
        for r in &reports {
            match (&r.summary, &r.error) {
                (Some(summary), _) => println!("✅ {} → {} chunks", r.path, summary.chunks_created),
                (_, Some(error)) => println!("❌ {}: {error}", r.path),
                _ => {}
            }
        }
        let chunks: usize = reports.iter().filter_map(|r| r.summary.as_ref()).map(|s| s.chunks_created).sum();
        println!("\n📊 {} of {} document(s) ingested into '{collection}' ({chunks} chunks)", reports.len() - failed, reports.len());
    }

    if failed > 0 {
        anyhow::bail!("{failed} document(s) failed to ingest");
    }
    Ok(())
}

fn report(path: &Path, result: docqa_core::Result<IngestionSummary>) -> IngestReport {
    let path = path.display().to_string();
    match result {
        Ok(summary) => IngestReport { path, summary: Some(summary), error: None },
        Err(e) => IngestReport { path, summary: None, error: Some(e.to_string()) },
    }
}

fn print_answer(result: &QuestionResult) {
    println!("{}\n", result.answer);
    println!("confidence: {:.2}", result.confidence);
    if let Some(sources) = &result.sources {
        println!("\nSources:");
        for source in sources {
            println!(
                "  {}. {} (chunk {}, score {:.3})\n     {}",
                source.rank,
                source.metadata.file_name,
                source.metadata.chunk_index,
                source.relevance_score,
                source.content.replace('\n', " ")
            );
        }
    }
}

fn print_matches(result: &SearchResult) {
    println!("{} result(s) for '{}' in '{}'", result.total_results, result.query, result.collection_name);
    for m in &result.matches {
        println!("\n{}. {} (chunk {}, score {:.3})", m.rank, m.metadata.file_name, m.metadata.chunk_index, m.relevance_score);
        println!("{}", m.content);
    }
}
