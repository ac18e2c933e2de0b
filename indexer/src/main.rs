use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use ludex_core::persist::{save, IndexPaths, MetaFile};
use ludex_core::{read_corpus_file, Document, FieldWeights, IndexBuilder};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, EnvFilter};
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "ludex-indexer")]
#[command(about = "Build the weighted TF-IDF index over a game corpus", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a sealed index from a corpus JSON/JSONL file or directory
    Build {
        /// Corpus path (file or directory)
        #[arg(long)]
        input: String,
        /// Output index directory
        #[arg(long)]
        output: String,
        /// JSON file overriding the default field weight table
        #[arg(long)]
        weights: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            input,
            output,
            weights,
        } => build_index(&input, &output, weights.as_deref()),
    }
}

fn build_index(input: &str, output: &str, weights_path: Option<&Path>) -> Result<()> {
    let weights = match weights_path {
        Some(p) => FieldWeights::from_file(p)?,
        None => FieldWeights::default(),
    };

    let records = collect_corpus(Path::new(input))?;
    if records.is_empty() {
        bail!("no corpus records found under {input}");
    }
    let corpus: Vec<Document> = records.iter().map(Document::from_value).collect();
    let num_docs = corpus.len() as u32;
    tracing::info!(num_docs, "loaded corpus snapshot");

    let builder = IndexBuilder::build(&corpus, &weights);
    tracing::info!(num_terms = builder.num_terms(), "accumulated postings");
    let index = builder.seal(num_docs);

    let meta = MetaFile {
        num_docs,
        created_at: time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_else(|_| "".into()),
        version: 1,
    };
    save(&IndexPaths::new(output), &index, &meta)?;
    tracing::info!(output, num_terms = index.num_terms(), "index build complete");
    Ok(())
}

/// Gather corpus records from a single file, or every .json/.jsonl file under
/// a directory in walk order.
fn collect_corpus(input: &Path) -> Result<Vec<serde_json::Value>> {
    let mut files: Vec<PathBuf> = Vec::new();
    if input.is_dir() {
        for entry in WalkDir::new(input).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() {
                if let Some(ext) = p.extension().and_then(|s| s.to_str()) {
                    if matches!(ext, "json" | "jsonl") {
                        files.push(p.to_path_buf());
                    }
                }
            }
        }
    } else if input.is_file() {
        files.push(input.to_path_buf());
    }

    let mut records = Vec::new();
    for file in files {
        records.extend(read_corpus_file(&file)?);
    }
    Ok(records)
}
