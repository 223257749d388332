//! Tool system
//!
//! Tools are the executable capabilities the model may request. The
//! registry preserves declaration order so the rendered system prompt is
//! reproducible across runs.

pub mod calculator;
pub mod code;
pub mod data;
pub mod email;
pub mod file;
pub mod git;
pub mod gold;
pub mod image;
pub mod rag;
pub mod weather;
pub mod web;

use crate::rag::RagSystem;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// A tool that can be invoked by the orchestration loop
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool identifier (unique key in the registry)
    fn name(&self) -> &str;

    /// Description rendered into the system prompt
    fn description(&self) -> &str;

    /// JSON Schema for the tool's parameters
    fn parameters(&self) -> Value;

    /// Execute the tool with the given argument object.
    ///
    /// Handlers validate their own required arguments and should return an
    /// error `ToolResult` for bad input; a returned `Err` is converted to an
    /// error result by the dispatcher.
    async fn execute(&self, args: Value) -> Result<ToolResult>;
}

/// Result from one tool execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub output: String,
    pub is_error: bool,
}

impl ToolResult {
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            is_error: false,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            output: message.into(),
            is_error: true,
        }
    }
}

/// A structured tool invocation parsed from model output
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCall {
    pub tool: String,
    #[serde(default)]
    pub arguments: Value,
}

/// Registry of available tools.
///
/// Iteration order is registration order; `render_catalog` depends on it.
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    by_name: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: Vec::new(),
            by_name: HashMap::new(),
        }
    }

    /// Register a tool. Re-registering a name replaces the handler but
    /// keeps the original position.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        match self.by_name.get(tool.name()) {
            Some(&idx) => self.tools[idx] = tool,
            None => {
                self.by_name.insert(tool.name().to_string(), self.tools.len());
                self.tools.push(tool);
            }
        }
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.by_name.get(name).map(|&idx| Arc::clone(&self.tools[idx]))
    }

    /// All tools in registration order
    pub fn list(&self) -> &[Arc<dyn Tool>] {
        &self.tools
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// A new registry containing only the named tools, in this registry's
    /// order. Unknown names are skipped. Used for role-scoped agents.
    pub fn subset(&self, names: &[&str]) -> Self {
        let mut scoped = Self::new();
        for tool in &self.tools {
            if names.contains(&tool.name()) {
                scoped.register(Arc::clone(tool));
            }
        }
        scoped
    }

    /// Render the tool catalog for the system prompt: one entry per tool
    /// with its description and pretty-printed parameter properties.
    pub fn render_catalog(&self) -> String {
        let mut entries = Vec::with_capacity(self.tools.len());
        for tool in &self.tools {
            let mut entry = format!("- {}: {}", tool.name(), tool.description());
            if let Some(props) = tool.parameters().get("properties") {
                let rendered = serde_json::to_string_pretty(props)
                    .unwrap_or_else(|_| "{}".to_string());
                entry.push_str(&format!("\n  Parameters: {rendered}"));
            }
            entries.push(entry);
        }
        entries.join("\n\n")
    }

    /// Dispatch a parsed tool call to its handler.
    ///
    /// Total function: unknown tools and handler failures become error
    /// results. The orchestration loop's recovery path depends on this
    /// never panicking or returning `Err`.
    pub async fn dispatch(&self, call: &ToolCall) -> ToolResult {
        let Some(tool) = self.get(&call.tool) else {
            tracing::warn!(tool = %call.tool, "Tool not found");
            return ToolResult::error(format!("Unknown tool: {}", call.tool));
        };

        tracing::info!(tool = %call.tool, "Executing tool");
        match tool.execute(call.arguments.clone()).await {
            Ok(result) => {
                tracing::debug!(tool = %call.tool, is_error = result.is_error, "Tool execution completed");
                result
            }
            Err(e) => {
                tracing::warn!(tool = %call.tool, error = %e, "Tool execution failed");
                ToolResult::error(format!("{}: {}", classify_error(&e), e))
            }
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Map a handler failure to a short user-facing category. The model sees
/// this as plain text, so categories stay coarse.
fn classify_error(error: &anyhow::Error) -> &'static str {
    if let Some(io) = error.downcast_ref::<std::io::Error>() {
        return match io.kind() {
            std::io::ErrorKind::NotFound => "not-found",
            std::io::ErrorKind::PermissionDenied => "permission",
            std::io::ErrorKind::InvalidInput => "invalid-argument",
            _ => "unknown",
        };
    }
    if error.downcast_ref::<serde_json::Error>().is_some() {
        return "invalid-argument";
    }
    "unknown"
}

/// Shared handles the default catalog wires into its tools.
pub struct CatalogContext {
    pub rag: Arc<RagSystem>,
    pub http: reqwest::Client,
}

/// Build the full default tool catalog in its canonical order.
pub fn default_catalog(ctx: &CatalogContext) -> ToolRegistry {
    let mut registry = ToolRegistry::new();

    registry.register(Arc::new(calculator::CalculatorTool::new()));
    registry.register(Arc::new(weather::WeatherTool::new()));
    registry.register(Arc::new(gold::GoldPriceTool::new()));
    registry.register(Arc::new(email::SendEmailTool::new()));

    registry.register(Arc::new(rag::RagQueryTool::new(Arc::clone(&ctx.rag))));
    registry.register(Arc::new(rag::RagIndexDocumentTool::new(Arc::clone(&ctx.rag))));
    registry.register(Arc::new(rag::RagIndexDirectoryTool::new(Arc::clone(&ctx.rag))));
    registry.register(Arc::new(rag::RagStatsTool::new(Arc::clone(&ctx.rag))));

    registry.register(Arc::new(file::FileReadTool::new()));
    registry.register(Arc::new(file::FileWriteTool::new()));
    registry.register(Arc::new(file::FileListTool::new()));
    registry.register(Arc::new(file::FileSearchTool::new()));

    registry.register(Arc::new(git::GitStatusTool::new()));
    registry.register(Arc::new(git::GitLogTool::new()));
    registry.register(Arc::new(git::GitDiffTool::new()));

    registry.register(Arc::new(web::WebExtractTextTool::new(ctx.http.clone())));
    registry.register(Arc::new(web::WebExtractLinksTool::new(ctx.http.clone())));
    registry.register(Arc::new(web::WebSearchInPageTool::new(ctx.http.clone())));
    registry.register(Arc::new(web::WebDownloadFileTool::new(ctx.http.clone())));

    registry.register(Arc::new(code::ExecuteCodeTool::new()));
    registry.register(Arc::new(code::AnalyzeCodeTool::new()));

    let frames = data::FrameStore::shared();
    registry.register(Arc::new(data::DataLoadCsvTool::new(Arc::clone(&frames))));
    registry.register(Arc::new(data::DataSummaryTool::new(Arc::clone(&frames))));
    registry.register(Arc::new(data::DataQueryTool::new(frames)));

    registry.register(Arc::new(image::GenerateImageTool::new(ctx.http.clone())));

    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct FailingTool;

    #[async_trait]
    impl Tool for FailingTool {
        fn name(&self) -> &str {
            "failing"
        }

        fn description(&self) -> &str {
            "always fails"
        }

        fn parameters(&self) -> Value {
            json!({"type": "object", "properties": {}})
        }

        async fn execute(&self, _args: Value) -> Result<ToolResult> {
            Err(anyhow::Error::new(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "nope",
            )))
        }
    }

    #[tokio::test]
    async fn dispatch_unknown_tool_is_an_error_result() {
        let registry = ToolRegistry::new();
        let call = ToolCall {
            tool: "nonexistent".to_string(),
            arguments: json!({}),
        };
        let result = registry.dispatch(&call).await;
        assert!(result.is_error);
        assert!(result.output.contains("Unknown tool: nonexistent"));
    }

    #[tokio::test]
    async fn dispatch_handler_failure_is_classified() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(FailingTool));
        let call = ToolCall {
            tool: "failing".to_string(),
            arguments: json!({"whatever": 1}),
        };
        let result = registry.dispatch(&call).await;
        assert!(result.is_error);
        assert!(result.output.starts_with("permission"));
    }

    #[tokio::test]
    async fn dispatch_missing_required_argument_is_an_error_result() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(calculator::CalculatorTool::new()));
        let call = ToolCall {
            tool: "calculator".to_string(),
            arguments: json!({"a": 1}),
        };
        let result = registry.dispatch(&call).await;
        assert!(result.is_error);
    }

    #[test]
    fn registry_preserves_registration_order() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(calculator::CalculatorTool::new()));
        registry.register(Arc::new(weather::WeatherTool::new()));
        registry.register(Arc::new(email::SendEmailTool::new()));

        let names: Vec<&str> = registry.list().iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["calculator", "weather", "send_email"]);

        // Catalog rendering follows the same order
        let catalog = registry.render_catalog();
        let calc = catalog.find("- calculator:").unwrap();
        let weather = catalog.find("- weather:").unwrap();
        assert!(calc < weather);
    }

    #[test]
    fn subset_keeps_order_and_skips_unknown() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(calculator::CalculatorTool::new()));
        registry.register(Arc::new(weather::WeatherTool::new()));

        let scoped = registry.subset(&["weather", "no_such_tool"]);
        assert_eq!(scoped.len(), 1);
        assert!(scoped.get("weather").is_some());
        assert!(scoped.get("calculator").is_none());
    }
}
