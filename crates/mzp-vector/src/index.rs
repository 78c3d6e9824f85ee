//! Persisted flat vector index
//!
//! The index is a single JSON document holding every passage and its
//! embedding. It is loaded once at startup and searched by brute-force
//! cosine similarity.

use chrono::{DateTime, Utc};
use mzp_core::{ChatbotError, Result, RetrievedPassage};
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

/// Current on-disk format version
pub const INDEX_FORMAT_VERSION: u32 = 1;

/// A stored passage with its embedding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    pub id: Uuid,
    pub content: String,
    pub source: Option<String>,
    pub chunk_index: u32,
    pub embedding: Vec<f32>,
}

impl IndexEntry {
    pub fn new(content: impl Into<String>, embedding: Vec<f32>) -> Self {
        Self {
            id: Uuid::new_v4(),
            content: content.into(),
            source: None,
            chunk_index: 0,
            embedding,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>, chunk_index: u32) -> Self {
        self.source = Some(source.into());
        self.chunk_index = chunk_index;
        self
    }
}

/// Serialized layout of the index file
#[derive(Debug, Serialize, Deserialize)]
struct IndexFile {
    version: u32,
    model: String,
    dimension: usize,
    created_at: DateTime<Utc>,
    entries: Vec<IndexEntry>,
}

/// In-memory vector index
#[derive(Debug, Clone)]
pub struct VectorIndex {
    model: String,
    dimension: usize,
    created_at: DateTime<Utc>,
    entries: Vec<IndexEntry>,
    norms: Vec<f32>,
}

impl VectorIndex {
    /// Create an empty index for embeddings of the given model and dimension
    pub fn new(model: impl Into<String>, dimension: usize) -> Self {
        Self {
            model: model.into(),
            dimension,
            created_at: Utc::now(),
            entries: Vec::new(),
            norms: Vec::new(),
        }
    }

    /// Add an entry; its embedding must match the index dimension
    pub fn insert(&mut self, entry: IndexEntry) -> Result<()> {
        if entry.embedding.len() != self.dimension {
            return Err(ChatbotError::Embedding(format!(
                "Embedding dimension {} does not match index dimension {}",
                entry.embedding.len(),
                self.dimension
            )));
        }

        self.norms.push(norm(&entry.embedding));
        self.entries.push(entry);
        Ok(())
    }

    /// Load a persisted index
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ChatbotError::IndexUnavailable(format!("Failed to read {}: {e}", path.display()))
        })?;

        let file: IndexFile = serde_json::from_str(&content).map_err(|e| {
            ChatbotError::IndexUnavailable(format!("Failed to parse {}: {e}", path.display()))
        })?;

        if file.version != INDEX_FORMAT_VERSION {
            return Err(ChatbotError::IndexUnavailable(format!(
                "Unsupported index version {} (expected {INDEX_FORMAT_VERSION})",
                file.version
            )));
        }

        let mut index = Self::new(file.model, file.dimension);
        index.created_at = file.created_at;
        for entry in file.entries {
            index
                .insert(entry)
                .map_err(|e| ChatbotError::IndexUnavailable(e.to_string()))?;
        }

        tracing::info!(
            path = %path.display(),
            entries = index.len(),
            dimension = index.dimension,
            "Vector index loaded"
        );

        Ok(index)
    }

    /// Persist the index, replacing any existing file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                ChatbotError::Internal(format!("Failed to create {}: {e}", parent.display()))
            })?;
        }

        let file = IndexFile {
            version: INDEX_FORMAT_VERSION,
            model: self.model.clone(),
            dimension: self.dimension,
            created_at: self.created_at,
            entries: self.entries.clone(),
        };
        let json = serde_json::to_string(&file)
            .map_err(|e| ChatbotError::Internal(format!("Failed to serialize index: {e}")))?;

        // Write then rename so a crash never leaves a truncated index
        let tmp_path = path.with_extension("json.tmp");
        std::fs::write(&tmp_path, json).map_err(|e| {
            ChatbotError::Internal(format!("Failed to write {}: {e}", tmp_path.display()))
        })?;
        std::fs::rename(&tmp_path, path).map_err(|e| {
            ChatbotError::Internal(format!("Failed to replace {}: {e}", path.display()))
        })?;

        Ok(())
    }

    /// Return the `k` entries most similar to the query vector, best first
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<RetrievedPassage>> {
        if query.len() != self.dimension {
            return Err(ChatbotError::Embedding(format!(
                "Query dimension {} does not match index dimension {}",
                query.len(),
                self.dimension
            )));
        }

        let query_norm = norm(query);
        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .zip(&self.norms)
            .enumerate()
            .map(|(i, (entry, entry_norm))| {
                (i, cosine(query, query_norm, &entry.embedding, *entry_norm))
            })
            .collect();

        // Stable sort keeps insertion order among equal scores
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(i, score)| {
                let entry = &self.entries[i];
                RetrievedPassage {
                    content: entry.content.clone(),
                    score,
                    source: entry.source.clone(),
                    chunk_index: entry.chunk_index,
                }
            })
            .collect())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Number of distinct sources
    pub fn source_count(&self) -> usize {
        let mut sources: Vec<&str> = self
            .entries
            .iter()
            .filter_map(|e| e.source.as_deref())
            .collect();
        sources.sort_unstable();
        sources.dedup();
        sources.len()
    }
}

fn norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

fn cosine(a: &[f32], a_norm: f32, b: &[f32], b_norm: f32) -> f32 {
    if a_norm == 0.0 || b_norm == 0.0 {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    dot / (a_norm * b_norm)
}
