//! Application context
//!
//! The explicitly constructed bundle of shared services — model provider,
//! retrieval index, tool catalog — passed down to the CLI, the server and
//! the session manager. No module-level globals; tests build isolated
//! instances.

use crate::config::Config;
use crate::provider::{ollama::OllamaProvider, Provider};
use crate::rag::{embedding::HashingEmbedder, ChunkingConfig, RagSystem};
use crate::tool::{default_catalog, CatalogContext, ToolRegistry};
use anyhow::Result;
use std::sync::Arc;

pub struct AppContext {
    pub config: Config,
    pub provider: Arc<dyn Provider>,
    pub rag: Arc<RagSystem>,
    pub tools: Arc<ToolRegistry>,
}

impl AppContext {
    /// Wire up the shared services from configuration.
    pub async fn build(config: Config) -> Result<Self> {
        let provider: Arc<dyn Provider> = Arc::new(OllamaProvider::new(
            config.model.base_url.clone(),
            config.model.name.clone(),
            config.model.temperature,
        ));

        let chunking = ChunkingConfig {
            chunk_size: config.rag.chunk_size,
            overlap: config.rag.overlap,
        };
        let rag = Arc::new(
            RagSystem::open(
                Box::<HashingEmbedder>::default(),
                config.rag_store_path(),
                chunking,
            )
            .await?,
        );

        let tools = Arc::new(default_catalog(&CatalogContext {
            rag: Arc::clone(&rag),
            http: reqwest::Client::new(),
        }));

        tracing::info!(
            model = %config.model.name,
            backend = %config.model.base_url,
            tools = tools.len(),
            "Application context ready"
        );

        Ok(Self {
            config,
            provider,
            rag,
            tools,
        })
    }
}
