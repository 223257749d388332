//! Tabular analysis tools over named in-memory frames
//!
//! `data_load_csv` parses a CSV file into a named frame; `data_summary`
//! and `data_query` operate on frames loaded earlier in the session.

use super::{Tool, ToolResult};
use anyhow::Result;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// A parsed CSV: header plus row-major string cells
#[derive(Debug, Clone)]
pub struct Frame {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Frame {
    /// Parsed numeric values of one column, skipping non-numeric cells
    fn numeric_column(&self, index: usize) -> Vec<f64> {
        self.rows
            .iter()
            .filter_map(|row| row.get(index))
            .filter_map(|cell| cell.trim().parse::<f64>().ok())
            .collect()
    }
}

/// Shared store of named frames, one per catalog
pub struct FrameStore {
    frames: RwLock<HashMap<String, Frame>>,
}

impl FrameStore {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self {
            frames: RwLock::new(HashMap::new()),
        })
    }
}

pub struct DataLoadCsvTool {
    store: Arc<FrameStore>,
}

impl DataLoadCsvTool {
    pub fn new(store: Arc<FrameStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for DataLoadCsvTool {
    fn name(&self) -> &str {
        "data_load_csv"
    }

    fn description(&self) -> &str {
        "Load a CSV file into a named in-memory frame for analysis"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {"type": "string", "description": "CSV file path"},
                "name": {"type": "string", "description": "Frame name (default: file stem)"}
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, args: Value) -> Result<ToolResult> {
        let Some(path) = args["path"].as_str() else {
            return Ok(ToolResult::error("path is required"));
        };
        let name = args["name"]
            .as_str()
            .map(str::to_string)
            .or_else(|| {
                Path::new(path)
                    .file_stem()
                    .map(|s| s.to_string_lossy().to_string())
            })
            .unwrap_or_else(|| "data".to_string());

        let mut reader = match csv::Reader::from_path(path) {
            Ok(r) => r,
            Err(e) => return Ok(ToolResult::error(format!("cannot open {path}: {e}"))),
        };

        let columns: Vec<String> = match reader.headers() {
            Ok(h) => h.iter().map(str::to_string).collect(),
            Err(e) => return Ok(ToolResult::error(format!("cannot read header: {e}"))),
        };

        let mut rows = Vec::new();
        for record in reader.records() {
            match record {
                Ok(r) => rows.push(r.iter().map(str::to_string).collect()),
                Err(e) => return Ok(ToolResult::error(format!("malformed CSV row: {e}"))),
            }
        }

        let summary = format!(
            "Loaded '{name}': {} rows × {} columns ({})",
            rows.len(),
            columns.len(),
            columns.join(", ")
        );
        self.store.frames.write().insert(name, Frame { columns, rows });
        Ok(ToolResult::success(summary))
    }
}

pub struct DataSummaryTool {
    store: Arc<FrameStore>,
}

impl DataSummaryTool {
    pub fn new(store: Arc<FrameStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for DataSummaryTool {
    fn name(&self) -> &str {
        "data_summary"
    }

    fn description(&self) -> &str {
        "Summarize a loaded frame: row counts and per-column numeric statistics"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "name": {"type": "string", "description": "Frame name"}
            },
            "required": ["name"]
        })
    }

    async fn execute(&self, args: Value) -> Result<ToolResult> {
        let Some(name) = args["name"].as_str() else {
            return Ok(ToolResult::error("name is required"));
        };

        let frames = self.store.frames.read();
        let Some(frame) = frames.get(name) else {
            return Ok(ToolResult::error(format!(
                "no frame named '{name}' — load it with data_load_csv first"
            )));
        };

        let mut lines = vec![format!(
            "Frame '{name}': {} rows × {} columns",
            frame.rows.len(),
            frame.columns.len()
        )];
        for (i, column) in frame.columns.iter().enumerate() {
            let values = frame.numeric_column(i);
            if values.is_empty() {
                lines.push(format!("  {column}: text"));
                continue;
            }
            let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
            let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            let mean = values.iter().sum::<f64>() / values.len() as f64;
            lines.push(format!(
                "  {column}: numeric ({} values, min {min:.2}, max {max:.2}, mean {mean:.2})",
                values.len()
            ));
        }

        Ok(ToolResult::success(lines.join("\n")))
    }
}

pub struct DataQueryTool {
    store: Arc<FrameStore>,
}

impl DataQueryTool {
    pub fn new(store: Arc<FrameStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for DataQueryTool {
    fn name(&self) -> &str {
        "data_query"
    }

    fn description(&self) -> &str {
        "Filter a loaded frame by a substring match on one column"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "name": {"type": "string", "description": "Frame name"},
                "column": {"type": "string", "description": "Column to match"},
                "contains": {"type": "string", "description": "Substring rows must contain"},
                "limit": {"type": "integer", "description": "Maximum rows to show (default 20)"}
            },
            "required": ["name", "column", "contains"]
        })
    }

    async fn execute(&self, args: Value) -> Result<ToolResult> {
        let Some(name) = args["name"].as_str() else {
            return Ok(ToolResult::error("name is required"));
        };
        let Some(column) = args["column"].as_str() else {
            return Ok(ToolResult::error("column is required"));
        };
        let Some(needle) = args["contains"].as_str() else {
            return Ok(ToolResult::error("contains is required"));
        };
        let limit = args["limit"].as_u64().unwrap_or(20) as usize;

        let frames = self.store.frames.read();
        let Some(frame) = frames.get(name) else {
            return Ok(ToolResult::error(format!("no frame named '{name}'")));
        };
        let Some(col_index) = frame.columns.iter().position(|c| c == column) else {
            return Ok(ToolResult::error(format!(
                "no column '{column}' in frame '{name}' (columns: {})",
                frame.columns.join(", ")
            )));
        };

        let matches: Vec<&Vec<String>> = frame
            .rows
            .iter()
            .filter(|row| {
                row.get(col_index)
                    .map(|cell| cell.contains(needle))
                    .unwrap_or(false)
            })
            .collect();

        let mut lines = vec![
            format!("{} matching rows", matches.len()),
            frame.columns.join(" | "),
        ];
        for row in matches.iter().take(limit) {
            lines.push(row.join(" | "));
        }
        if matches.len() > limit {
            lines.push(format!("... and {} more", matches.len() - limit));
        }

        Ok(ToolResult::success(lines.join("\n")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn load_fixture(store: &Arc<FrameStore>) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sales.csv");
        tokio::fs::write(&path, "product,revenue\nwidget,1200\ngadget,800\n")
            .await
            .unwrap();
        let result = DataLoadCsvTool::new(Arc::clone(store))
            .execute(json!({"path": path.to_string_lossy()}))
            .await
            .unwrap();
        assert!(!result.is_error, "{}", result.output);
    }

    #[tokio::test]
    async fn load_then_summarize() {
        let store = FrameStore::shared();
        load_fixture(&store).await;

        let summary = DataSummaryTool::new(Arc::clone(&store))
            .execute(json!({"name": "sales"}))
            .await
            .unwrap();
        assert!(summary.output.contains("2 rows"));
        assert!(summary.output.contains("revenue: numeric"));
    }

    #[tokio::test]
    async fn query_filters_rows() {
        let store = FrameStore::shared();
        load_fixture(&store).await;

        let result = DataQueryTool::new(store)
            .execute(json!({"name": "sales", "column": "product", "contains": "wid"}))
            .await
            .unwrap();
        assert!(result.output.contains("1 matching rows"));
        assert!(result.output.contains("widget"));
    }
}
