//! MZP CLI - Command-line interface
//!
//! Usage:
//!   mzp ingest <path>
//!   mzp ask <question>
//!   mzp stats

mod ingest;

use anyhow::Context;
use clap::{Parser, Subcommand};
use mzp_core::{AppConfig, Query};
use mzp_rag::RetrievalQa;
use mzp_vector::{create_embedding_client, TextSplitter, VectorIndex};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mzp")]
#[command(about = "Mizoram Police AI assistant CLI")]
#[command(version)]
struct Cli {
    /// Optional TOML config file; environment variables take precedence
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the vector index from .txt and .md files
    Ingest {
        /// File or directory to index
        path: PathBuf,

        /// Where to write the index (defaults to the configured index path)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Chunk size in characters
        #[arg(long)]
        chunk_size: Option<usize>,

        /// Chunk overlap in characters
        #[arg(long)]
        chunk_overlap: Option<usize>,
    },
    /// Ask a single question through the full pipeline
    Ask {
        /// Question to ask
        question: String,
    },
    /// Show information about an index file
    Stats {
        /// Index file (defaults to the configured index path)
        #[arg(long)]
        index: Option<PathBuf>,
    },
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<AppConfig> {
    let config = match path {
        Some(path) => AppConfig::from_file(path)?.with_env_override()?,
        None => AppConfig::from_env()?,
    };
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mzp=info,mzp_vector=info,mzp_rag=warn".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Ingest {
            path,
            output,
            chunk_size,
            chunk_overlap,
        } => {
            let embedder = create_embedding_client(&config.embedding, &config.llm)
                .context("Failed to create embedding client")?;
            let splitter = TextSplitter::new(
                chunk_size.unwrap_or(config.retrieval.chunk_size),
                chunk_overlap.unwrap_or(config.retrieval.chunk_overlap),
            );

            let files = ingest::collect_documents(&path)?;
            println!("Indexing {} files from {}", files.len(), path.display());

            let root = if path.is_dir() {
                path.clone()
            } else {
                path.parent().map(PathBuf::from).unwrap_or_default()
            };
            let index = ingest::build_index(&files, &root, splitter, embedder.as_ref()).await?;

            let output = output.unwrap_or_else(|| config.retrieval.index_path.clone());
            index.save(&output)?;
            println!(
                "Wrote {} chunks ({} dims) to {}",
                index.len(),
                index.dimension(),
                output.display()
            );
        }
        Commands::Ask { question } => {
            config.validate()?;
            let rag = RetrievalQa::from_config(&config)?;
            let answer = rag.answer(&Query::new(question)).await?;
            println!("{}", answer.answer);
        }
        Commands::Stats { index } => {
            let path = index.unwrap_or_else(|| config.retrieval.index_path.clone());
            let index = VectorIndex::load(&path)?;
            println!("Index:     {}", path.display());
            println!("Model:     {}", index.model());
            println!("Dimension: {}", index.dimension());
            println!("Entries:   {}", index.len());
            println!("Sources:   {}", index.source_count());
            println!("Created:   {}", index.created_at().to_rfc3339());
        }
    }

    Ok(())
}
