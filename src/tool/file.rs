//! File tools: read, write, list, search

use super::{Tool, ToolResult};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tokio::fs;
use walkdir::WalkDir;

/// Read file contents with optional line window
pub struct FileReadTool;

impl FileReadTool {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Tool for FileReadTool {
    fn name(&self) -> &str {
        "file_read"
    }

    fn description(&self) -> &str {
        "Read the contents of a text file"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {"type": "string", "description": "Path to the file to read"},
                "offset": {"type": "integer", "description": "Line number to start from (1-indexed)"},
                "limit": {"type": "integer", "description": "Maximum number of lines to read"}
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, args: Value) -> Result<ToolResult> {
        let Some(path) = args["path"].as_str() else {
            return Ok(ToolResult::error("path is required"));
        };
        let offset = args["offset"].as_u64().map(|n| n as usize);
        let limit = args["limit"].as_u64().map(|n| n as usize);

        let content = match fs::read_to_string(path).await {
            Ok(c) => c,
            Err(e) => return Ok(ToolResult::error(format!("cannot read {path}: {e}"))),
        };

        let lines: Vec<&str> = content.lines().collect();
        let start = offset.map(|o| o.saturating_sub(1)).unwrap_or(0).min(lines.len());
        let end = limit
            .map(|l| (start + l).min(lines.len()))
            .unwrap_or(lines.len());

        let selected: String = lines[start..end]
            .iter()
            .enumerate()
            .map(|(i, line)| format!("{:4} | {}", start + i + 1, line))
            .collect::<Vec<_>>()
            .join("\n");

        Ok(ToolResult::success(format!(
            "{path} ({} lines, showing {}..{})\n{selected}",
            lines.len(),
            start + 1,
            end
        )))
    }
}

/// Write content to a file, creating parent directories as needed
pub struct FileWriteTool;

impl FileWriteTool {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Tool for FileWriteTool {
    fn name(&self) -> &str {
        "file_write"
    }

    fn description(&self) -> &str {
        "Write content to a file, creating it if needed"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {"type": "string", "description": "Path to the file to write"},
                "content": {"type": "string", "description": "Content to write"}
            },
            "required": ["path", "content"]
        })
    }

    async fn execute(&self, args: Value) -> Result<ToolResult> {
        let Some(path) = args["path"].as_str() else {
            return Ok(ToolResult::error("path is required"));
        };
        let Some(content) = args["content"].as_str() else {
            return Ok(ToolResult::error("content is required"));
        };

        if let Some(parent) = PathBuf::from(path).parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        fs::write(path, content).await?;

        Ok(ToolResult::success(format!(
            "Wrote {} bytes to {path}",
            content.len()
        )))
    }
}

/// List directory contents
pub struct FileListTool;

impl FileListTool {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Tool for FileListTool {
    fn name(&self) -> &str {
        "file_list"
    }

    fn description(&self) -> &str {
        "List files in a directory, optionally recursive"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "directory": {"type": "string", "description": "Directory to list (default: current)"},
                "recursive": {"type": "boolean", "description": "Recurse into subdirectories"}
            }
        })
    }

    async fn execute(&self, args: Value) -> Result<ToolResult> {
        let directory = args["directory"].as_str().unwrap_or(".");
        let recursive = args["recursive"].as_bool().unwrap_or(false);

        if !Path::new(directory).is_dir() {
            return Ok(ToolResult::error(format!("not a directory: {directory}")));
        }

        let depth = if recursive { usize::MAX } else { 1 };
        let mut entries = Vec::new();
        for entry in WalkDir::new(directory)
            .min_depth(1)
            .max_depth(depth)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let marker = if entry.file_type().is_dir() { "/" } else { "" };
            entries.push(format!("{}{marker}", entry.path().display()));
        }

        if entries.is_empty() {
            return Ok(ToolResult::success(format!("{directory} is empty")));
        }
        Ok(ToolResult::success(format!(
            "{} entries in {directory}\n{}",
            entries.len(),
            entries.join("\n")
        )))
    }
}

/// Find files by name substring
pub struct FileSearchTool;

impl FileSearchTool {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Tool for FileSearchTool {
    fn name(&self) -> &str {
        "file_search"
    }

    fn description(&self) -> &str {
        "Search for files whose name contains a pattern"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "directory": {"type": "string", "description": "Directory to search"},
                "pattern": {"type": "string", "description": "Substring to match in file names"}
            },
            "required": ["pattern"]
        })
    }

    async fn execute(&self, args: Value) -> Result<ToolResult> {
        let Some(pattern) = args["pattern"].as_str() else {
            return Ok(ToolResult::error("pattern is required"));
        };
        let directory = args["directory"].as_str().unwrap_or(".");

        let matches: Vec<String> = WalkDir::new(directory)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| e.file_name().to_string_lossy().contains(pattern))
            .map(|e| e.path().display().to_string())
            .collect();

        if matches.is_empty() {
            return Ok(ToolResult::success(format!(
                "No files matching '{pattern}' under {directory}"
            )));
        }
        Ok(ToolResult::success(format!(
            "{} files matching '{pattern}'\n{}",
            matches.len(),
            matches.join("\n")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn write_then_read_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("note.txt");
        let path_str = path.to_string_lossy().to_string();

        let write = FileWriteTool::new()
            .execute(json!({"path": path_str, "content": "alpha\nbeta"}))
            .await
            .unwrap();
        assert!(!write.is_error);

        let read = FileReadTool::new()
            .execute(json!({"path": path_str}))
            .await
            .unwrap();
        assert!(!read.is_error);
        assert!(read.output.contains("alpha"));
        assert!(read.output.contains("beta"));
    }

    #[tokio::test]
    async fn read_missing_file_is_an_error_result() {
        let result = FileReadTool::new()
            .execute(json!({"path": "/no/such/file.txt"}))
            .await
            .unwrap();
        assert!(result.is_error);
    }

    #[tokio::test]
    async fn search_finds_by_name_substring() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join("report_final.md"), "x")
            .await
            .unwrap();
        tokio::fs::write(dir.path().join("other.txt"), "y").await.unwrap();

        let result = FileSearchTool::new()
            .execute(json!({
                "directory": dir.path().to_string_lossy(),
                "pattern": "report"
            }))
            .await
            .unwrap();
        assert!(result.output.contains("report_final.md"));
        assert!(!result.output.contains("other.txt"));
    }
}
