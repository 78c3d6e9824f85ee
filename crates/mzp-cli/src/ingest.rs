//! Index construction from plain-text sources

use anyhow::{bail, Context};
use mzp_vector::{EmbeddingClient, IndexEntry, TextSplitter, VectorIndex};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Chunks embedded per provider request
const EMBED_BATCH_SIZE: usize = 32;

const SUPPORTED_EXTENSIONS: &[&str] = &["txt", "md"];

/// Collect supported files under `path` (or `path` itself), sorted
pub fn collect_documents(path: &Path) -> anyhow::Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.is_dir() {
        bail!("{} does not exist", path.display());
    }

    let mut files: Vec<PathBuf> = WalkDir::new(path)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'))
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        })
        .collect();

    files.sort();
    Ok(files)
}

/// Split, embed and index every file
pub async fn build_index(
    files: &[PathBuf],
    root: &Path,
    splitter: TextSplitter,
    embedder: &dyn EmbeddingClient,
) -> anyhow::Result<VectorIndex> {
    let mut pending: Vec<(String, u32, String)> = Vec::new();

    for file in files {
        let text = std::fs::read_to_string(file)
            .with_context(|| format!("Failed to read {}", file.display()))?;
        let source = file
            .strip_prefix(root)
            .unwrap_or(file)
            .display()
            .to_string();

        let chunks = splitter.split(&text);
        tracing::info!(source = %source, chunks = chunks.len(), "Document split");

        for (i, chunk) in chunks.into_iter().enumerate() {
            pending.push((source.clone(), i as u32, chunk));
        }
    }

    if pending.is_empty() {
        bail!("No text found to index");
    }

    let mut index: Option<VectorIndex> = None;
    for batch in pending.chunks(EMBED_BATCH_SIZE) {
        let texts: Vec<String> = batch.iter().map(|(_, _, text)| text.clone()).collect();
        let embeddings = embedder
            .embed_batch(&texts)
            .await
            .context("Embedding request failed")?;

        for ((source, chunk_index, text), embedding) in batch.iter().zip(embeddings) {
            let target = index
                .get_or_insert_with(|| VectorIndex::new(embedder.model(), embedding.len()));
            target.insert(
                IndexEntry::new(text.clone(), embedding).with_source(source.clone(), *chunk_index),
            )?;
        }
        tracing::debug!("Embedded {} chunks", batch.len());
    }

    index.context("Embedding provider returned no vectors")
}
