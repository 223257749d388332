//! Retrieval-augmented query subsystem
//!
//! Chunked documents are embedded into a flat vector index with parallel
//! document/metadata stores. The whole subsystem is a process-wide shared
//! handle: one writer at a time, readers in parallel, guarded by an RwLock
//! because the index and the parallel lists are updated non-atomically
//! relative to each other.

pub mod chunker;
pub mod embedding;
pub mod store;

use anyhow::{bail, Context, Result};
use embedding::Embedder;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use store::VectorIndex;
use walkdir::WalkDir;

const INDEX_FILE: &str = "index.json";

/// File extensions the directory indexer will ingest
const SUPPORTED_EXTENSIONS: &[&str] = &[
    "txt", "md", "rst", "py", "js", "ts", "java", "c", "h", "cpp", "cs", "rb", "go", "rs",
    "toml", "json", "yaml", "yml", "html",
];

/// Relevance band for presentation. The thresholds live here and nowhere
/// else; callers render the band, they do not re-derive it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Relevance {
    High,
    Medium,
    Low,
}

impl Relevance {
    pub fn from_score(score: f32) -> Self {
        if score < 0.3 {
            Self::High
        } else if score < 0.6 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

impl std::fmt::Display for Relevance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::High => write!(f, "High"),
            Self::Medium => write!(f, "Medium"),
            Self::Low => write!(f, "Low"),
        }
    }
}

/// Per-chunk provenance stored alongside each vector
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub source: String,
    pub file_name: String,
    pub chunk_index: usize,
    pub total_chunks: usize,
}

/// One search result
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub text: String,
    /// Squared L2 distance; lower is more similar
    pub score: f32,
    pub metadata: ChunkMetadata,
    pub rank: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct IndexStats {
    pub total_documents: usize,
    pub vector_count: usize,
    pub dimension: usize,
    pub store_path: Option<String>,
}

/// Result of indexing one file
#[derive(Debug, Clone, Serialize)]
pub struct IndexReport {
    pub file: String,
    pub chunks_indexed: usize,
    pub total_chars: usize,
}

/// Result of indexing a directory tree
#[derive(Debug, Clone, Serialize)]
pub struct DirectoryReport {
    pub indexed: usize,
    pub failed: usize,
    pub total_chunks: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            overlap: 50,
        }
    }
}

struct Inner {
    index: VectorIndex,
    documents: Vec<String>,
    metadata: Vec<ChunkMetadata>,
}

impl Inner {
    /// `documents`, `metadata` and the vector index stay in lockstep.
    fn check_invariant(&self) {
        debug_assert_eq!(self.documents.len(), self.metadata.len());
        debug_assert_eq!(self.documents.len(), self.index.len());
    }
}

/// Persisted form of the whole index
#[derive(Serialize, Deserialize)]
struct SavedIndex {
    dimension: usize,
    vectors: Vec<Vec<f32>>,
    documents: Vec<String>,
    metadata: Vec<ChunkMetadata>,
}

pub struct RagSystem {
    inner: RwLock<Inner>,
    embedder: Box<dyn Embedder>,
    store_path: Option<PathBuf>,
    chunking: ChunkingConfig,
}

impl RagSystem {
    /// In-memory index with no persistence. Used by tests and ephemeral
    /// sessions.
    pub fn in_memory(embedder: Box<dyn Embedder>, chunking: ChunkingConfig) -> Self {
        let dimension = embedder.dimension();
        Self {
            inner: RwLock::new(Inner {
                index: VectorIndex::new(dimension),
                documents: Vec::new(),
                metadata: Vec::new(),
            }),
            embedder,
            store_path: None,
            chunking,
        }
    }

    /// Open a persistent index rooted at `store_path`, loading any
    /// previously saved state.
    pub async fn open(
        embedder: Box<dyn Embedder>,
        store_path: PathBuf,
        chunking: ChunkingConfig,
    ) -> Result<Self> {
        let mut system = Self::in_memory(embedder, chunking);
        system.store_path = Some(store_path.clone());

        let file = store_path.join(INDEX_FILE);
        if file.exists() {
            let content = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("reading {}", file.display()))?;
            let saved: SavedIndex =
                serde_json::from_str(&content).context("parsing saved index")?;
            if saved.dimension != system.embedder.dimension() {
                bail!(
                    "saved index dimension {} does not match embedder dimension {}",
                    saved.dimension,
                    system.embedder.dimension()
                );
            }
            let index = VectorIndex::from_rows(saved.dimension, saved.vectors)?;
            let mut inner = system.inner.write();
            inner.index = index;
            inner.documents = saved.documents;
            inner.metadata = saved.metadata;
            inner.check_invariant();
            tracing::info!(
                documents = inner.documents.len(),
                "Loaded retrieval index from disk"
            );
        }

        Ok(system)
    }

    /// Embed and append chunks with their metadata, then persist. Returns
    /// the assigned row ids.
    pub async fn add_documents(
        &self,
        chunks: Vec<String>,
        metadata: Vec<ChunkMetadata>,
    ) -> Result<Vec<usize>> {
        if chunks.len() != metadata.len() {
            bail!(
                "{} chunks but {} metadata entries",
                chunks.len(),
                metadata.len()
            );
        }
        if chunks.is_empty() {
            return Ok(Vec::new());
        }

        let embeddings: Vec<Vec<f32>> =
            chunks.iter().map(|c| self.embedder.embed(c)).collect();

        let ids = {
            let mut inner = self.inner.write();
            let mut ids = Vec::with_capacity(chunks.len());
            for ((chunk, meta), vector) in chunks.into_iter().zip(metadata).zip(&embeddings) {
                let id = inner.index.add(vector)?;
                inner.documents.push(chunk);
                inner.metadata.push(meta);
                ids.push(id);
            }
            inner.check_invariant();
            ids
        };

        self.save().await?;
        Ok(ids)
    }

    /// The `k` most similar chunks, ascending distance. Empty index gives
    /// an empty result.
    pub fn search(&self, query: &str, k: usize) -> Vec<SearchHit> {
        let query_vector = self.embedder.embed(query);
        let inner = self.inner.read();
        inner
            .index
            .search(&query_vector, k)
            .into_iter()
            .enumerate()
            .map(|(rank, (row, score))| SearchHit {
                text: inner.documents[row].clone(),
                score,
                metadata: inner.metadata[row].clone(),
                rank: rank + 1,
            })
            .collect()
    }

    /// Chunk and index one text file.
    pub async fn index_document(&self, path: &Path) -> Result<IndexReport> {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;

        let chunks = chunker::chunk_text(&text, self.chunking.chunk_size, self.chunking.overlap);
        if chunks.is_empty() {
            bail!("no content extracted from {}", path.display());
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        let total_chunks = chunks.len();
        let metadata: Vec<ChunkMetadata> = (0..total_chunks)
            .map(|i| ChunkMetadata {
                source: path.display().to_string(),
                file_name: file_name.clone(),
                chunk_index: i,
                total_chunks,
            })
            .collect();

        self.add_documents(chunks, metadata).await?;

        tracing::info!(file = %path.display(), chunks = total_chunks, "Indexed document");
        Ok(IndexReport {
            file: path.display().to_string(),
            chunks_indexed: total_chunks,
            total_chars: text.chars().count(),
        })
    }

    /// Index every supported file under `dir`.
    pub async fn index_directory(&self, dir: &Path, recursive: bool) -> Result<DirectoryReport> {
        if !dir.is_dir() {
            bail!("not a directory: {}", dir.display());
        }

        let depth = if recursive { usize::MAX } else { 1 };
        let files: Vec<PathBuf> = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(depth)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| {
                e.path()
                    .extension()
                    .map(|ext| {
                        SUPPORTED_EXTENSIONS
                            .contains(&ext.to_string_lossy().to_lowercase().as_str())
                    })
                    .unwrap_or(false)
            })
            .map(|e| e.into_path())
            .collect();

        let mut report = DirectoryReport {
            indexed: 0,
            failed: 0,
            total_chunks: 0,
        };
        for file in files {
            match self.index_document(&file).await {
                Ok(r) => {
                    report.indexed += 1;
                    report.total_chunks += r.chunks_indexed;
                }
                Err(e) => {
                    tracing::warn!(file = %file.display(), error = %e, "Skipping file");
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }

    pub fn stats(&self) -> IndexStats {
        let inner = self.inner.read();
        IndexStats {
            total_documents: inner.documents.len(),
            vector_count: inner.index.len(),
            dimension: inner.index.dimension(),
            store_path: self.store_path.as_ref().map(|p| p.display().to_string()),
        }
    }

    /// Drop everything and re-allocate the index with the original
    /// dimensionality.
    pub async fn clear(&self) -> Result<()> {
        {
            let mut inner = self.inner.write();
            inner.index = VectorIndex::new(self.embedder.dimension());
            inner.documents.clear();
            inner.metadata.clear();
            inner.check_invariant();
        }
        self.save().await
    }

    /// Persist the current state. A no-op for in-memory indexes.
    async fn save(&self) -> Result<()> {
        let Some(store_path) = &self.store_path else {
            return Ok(());
        };

        let saved = {
            let inner = self.inner.read();
            SavedIndex {
                dimension: inner.index.dimension(),
                vectors: inner.index.rows(),
                documents: inner.documents.clone(),
                metadata: inner.metadata.clone(),
            }
        };

        tokio::fs::create_dir_all(store_path).await?;
        let file = store_path.join(INDEX_FILE);
        let content = serde_json::to_string(&saved)?;
        tokio::fs::write(&file, content)
            .await
            .with_context(|| format!("writing {}", file.display()))?;
        tracing::debug!(path = %file.display(), documents = saved.documents.len(), "Saved retrieval index");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedding::HashingEmbedder;

    fn meta(i: usize, total: usize) -> ChunkMetadata {
        ChunkMetadata {
            source: "test".to_string(),
            file_name: "test".to_string(),
            chunk_index: i,
            total_chunks: total,
        }
    }

    fn fresh() -> RagSystem {
        RagSystem::in_memory(Box::<HashingEmbedder>::default(), ChunkingConfig::default())
    }

    #[tokio::test]
    async fn search_ranking_is_stable_and_sensible() {
        let rag = fresh();
        rag.add_documents(
            vec!["Python is great".to_string(), "Java is great".to_string()],
            vec![meta(0, 2), meta(1, 2)],
        )
        .await
        .unwrap();

        let first = rag.search("Python", 2);
        assert_eq!(first[0].text, "Python is great");
        assert!(first[0].score < first[1].score);

        // repeated searches return the identical ordering
        let second = rag.search("Python", 2);
        let ranks: Vec<&str> = second.iter().map(|h| h.text.as_str()).collect();
        assert_eq!(ranks, vec!["Python is great", "Java is great"]);
    }

    #[tokio::test]
    async fn empty_index_search_returns_empty() {
        let rag = fresh();
        assert!(rag.search("anything", 5).is_empty());
    }

    #[tokio::test]
    async fn k_is_clamped_to_corpus_size() {
        let rag = fresh();
        rag.add_documents(vec!["only one".to_string()], vec![meta(0, 1)])
            .await
            .unwrap();
        assert_eq!(rag.search("one", 100).len(), 1);
    }

    #[tokio::test]
    async fn mismatched_metadata_is_rejected() {
        let rag = fresh();
        let result = rag
            .add_documents(vec!["a".to_string(), "b".to_string()], vec![meta(0, 2)])
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn clear_resets_and_keeps_dimension() {
        let rag = fresh();
        rag.add_documents(vec!["doc".to_string()], vec![meta(0, 1)])
            .await
            .unwrap();
        rag.clear().await.unwrap();

        let stats = rag.stats();
        assert_eq!(stats.total_documents, 0);
        assert_eq!(stats.vector_count, 0);
        assert_eq!(stats.dimension, embedding::DEFAULT_DIMENSION);
    }

    #[tokio::test]
    async fn persistence_round_trip_preserves_rankings() {
        let dir = tempfile::tempdir().unwrap();
        let store = dir.path().to_path_buf();

        let rag = RagSystem::open(
            Box::<HashingEmbedder>::default(),
            store.clone(),
            ChunkingConfig::default(),
        )
        .await
        .unwrap();
        rag.add_documents(
            vec![
                "rust ownership and borrowing".to_string(),
                "gardening for beginners".to_string(),
            ],
            vec![meta(0, 2), meta(1, 2)],
        )
        .await
        .unwrap();
        let before: Vec<(String, f32)> = rag
            .search("rust borrowing", 2)
            .into_iter()
            .map(|h| (h.text, h.score))
            .collect();
        drop(rag);

        let reloaded = RagSystem::open(
            Box::<HashingEmbedder>::default(),
            store,
            ChunkingConfig::default(),
        )
        .await
        .unwrap();
        let after: Vec<(String, f32)> = reloaded
            .search("rust borrowing", 2)
            .into_iter()
            .map(|h| (h.text, h.score))
            .collect();
        assert_eq!(before, after);
    }

    #[test]
    fn relevance_bands_match_thresholds() {
        assert_eq!(Relevance::from_score(0.0), Relevance::High);
        assert_eq!(Relevance::from_score(0.29), Relevance::High);
        assert_eq!(Relevance::from_score(0.3), Relevance::Medium);
        assert_eq!(Relevance::from_score(0.59), Relevance::Medium);
        assert_eq!(Relevance::from_score(0.6), Relevance::Low);
        assert_eq!(Relevance::from_score(2.0), Relevance::Low);
    }
}
