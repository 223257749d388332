//! Retrieval tools: query, index, stats
//!
//! Front the shared retrieval index. All four tools hold the same
//! process-wide `RagSystem` handle.

use super::{Tool, ToolResult};
use crate::rag::{RagSystem, Relevance};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;

pub struct RagQueryTool {
    rag: Arc<RagSystem>,
}

impl RagQueryTool {
    pub fn new(rag: Arc<RagSystem>) -> Self {
        Self { rag }
    }
}

#[async_trait]
impl Tool for RagQueryTool {
    fn name(&self) -> &str {
        "rag_query"
    }

    fn description(&self) -> &str {
        "Query indexed documents and return the most relevant passages"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {"type": "string", "description": "Search query"},
                "n_results": {"type": "number", "description": "Number of results (default 3)"}
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, args: Value) -> Result<ToolResult> {
        let Some(query) = args["query"].as_str() else {
            return Ok(ToolResult::error("query is required"));
        };
        let n_results = args["n_results"].as_u64().unwrap_or(3) as usize;

        let hits = self.rag.search(query, n_results);
        if hits.is_empty() {
            return Ok(ToolResult::success(format!(
                "No relevant documents found for '{query}'. The knowledge base may be empty — index documents first."
            )));
        }

        let mut output = format!("{} relevant passage(s) for '{query}'\n", hits.len());
        for hit in &hits {
            let preview: String = hit.text.chars().take(300).collect();
            let ellipsis = if hit.text.chars().count() > 300 { "..." } else { "" };
            output.push_str(&format!(
                "\n#{} (relevance: {}, source: {})\n{preview}{ellipsis}\n",
                hit.rank,
                Relevance::from_score(hit.score),
                hit.metadata.file_name,
            ));
        }
        Ok(ToolResult::success(output))
    }
}

pub struct RagIndexDocumentTool {
    rag: Arc<RagSystem>,
}

impl RagIndexDocumentTool {
    pub fn new(rag: Arc<RagSystem>) -> Self {
        Self { rag }
    }
}

#[async_trait]
impl Tool for RagIndexDocumentTool {
    fn name(&self) -> &str {
        "rag_index_document"
    }

    fn description(&self) -> &str {
        "Index a text document into the knowledge base"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {"type": "string", "description": "Path to the document"}
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, args: Value) -> Result<ToolResult> {
        let Some(path) = args["path"].as_str() else {
            return Ok(ToolResult::error("path is required"));
        };

        match self.rag.index_document(Path::new(path)).await {
            Ok(report) => Ok(ToolResult::success(format!(
                "Indexed {} — {} chunks from {} characters",
                report.file, report.chunks_indexed, report.total_chars
            ))),
            Err(e) => Ok(ToolResult::error(format!("indexing failed: {e}"))),
        }
    }
}

pub struct RagIndexDirectoryTool {
    rag: Arc<RagSystem>,
}

impl RagIndexDirectoryTool {
    pub fn new(rag: Arc<RagSystem>) -> Self {
        Self { rag }
    }
}

#[async_trait]
impl Tool for RagIndexDirectoryTool {
    fn name(&self) -> &str {
        "rag_index_directory"
    }

    fn description(&self) -> &str {
        "Index every supported document under a directory"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "directory": {"type": "string", "description": "Directory to index"},
                "recursive": {"type": "boolean", "description": "Recurse into subdirectories (default true)"}
            },
            "required": ["directory"]
        })
    }

    async fn execute(&self, args: Value) -> Result<ToolResult> {
        let Some(directory) = args["directory"].as_str() else {
            return Ok(ToolResult::error("directory is required"));
        };
        let recursive = args["recursive"].as_bool().unwrap_or(true);

        match self.rag.index_directory(Path::new(directory), recursive).await {
            Ok(report) => Ok(ToolResult::success(format!(
                "Indexed {} file(s) ({} chunks), {} failed",
                report.indexed, report.total_chunks, report.failed
            ))),
            Err(e) => Ok(ToolResult::error(format!("indexing failed: {e}"))),
        }
    }
}

pub struct RagStatsTool {
    rag: Arc<RagSystem>,
}

impl RagStatsTool {
    pub fn new(rag: Arc<RagSystem>) -> Self {
        Self { rag }
    }
}

#[async_trait]
impl Tool for RagStatsTool {
    fn name(&self) -> &str {
        "rag_stats"
    }

    fn description(&self) -> &str {
        "Show knowledge base statistics"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn execute(&self, _args: Value) -> Result<ToolResult> {
        let stats = self.rag.stats();
        Ok(ToolResult::success(format!(
            "Knowledge base: {} chunks indexed ({} vectors, dimension {}){}",
            stats.total_documents,
            stats.vector_count,
            stats.dimension,
            stats
                .store_path
                .map(|p| format!("\nStore: {p}"))
                .unwrap_or_default(),
        )))
    }
}
