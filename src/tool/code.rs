//! Code tools: execute and analyze Python snippets
//!
//! Execution shells out to `python3` with a deny-list screen and a wall
//! clock limit. Illustrative only — this is not a sandbox.

use super::{Tool, ToolResult};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

const EXEC_TIMEOUT: Duration = Duration::from_secs(5);

/// Constructs that the screen rejects outright
const DENIED_PATTERNS: &[&str] = &[
    "import os",
    "import sys",
    "import subprocess",
    "import shutil",
    "__import__",
    "open(",
    "eval(",
    "exec(",
];

fn screen_code(code: &str) -> Option<&'static str> {
    DENIED_PATTERNS
        .iter()
        .find(|p| code.contains(*p))
        .copied()
}

pub struct ExecuteCodeTool;

impl ExecuteCodeTool {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Tool for ExecuteCodeTool {
    fn name(&self) -> &str {
        "execute_code"
    }

    fn description(&self) -> &str {
        "Execute a short Python snippet and return its output"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "code": {"type": "string", "description": "Python code to execute"}
            },
            "required": ["code"]
        })
    }

    async fn execute(&self, args: Value) -> Result<ToolResult> {
        let Some(code) = args["code"].as_str() else {
            return Ok(ToolResult::error("code is required"));
        };

        if let Some(pattern) = screen_code(code) {
            return Ok(ToolResult::error(format!(
                "code rejected: '{pattern}' is not allowed"
            )));
        }

        let mut child = match Command::new("python3")
            .arg("-")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
        {
            Ok(c) => c,
            Err(e) => return Ok(ToolResult::error(format!("cannot start python3: {e}"))),
        };

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(code.as_bytes()).await?;
        }

        let output = match tokio::time::timeout(EXEC_TIMEOUT, child.wait_with_output()).await {
            Ok(Ok(o)) => o,
            Ok(Err(e)) => return Ok(ToolResult::error(format!("execution failed: {e}"))),
            Err(_) => {
                return Ok(ToolResult::error(format!(
                    "execution timed out after {}s",
                    EXEC_TIMEOUT.as_secs()
                )));
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !output.status.success() {
            return Ok(ToolResult::error(format!(
                "python exited with {}\n{}",
                output.status,
                stderr.trim()
            )));
        }

        let text = if stdout.trim().is_empty() {
            "(no output)".to_string()
        } else {
            stdout.trim().to_string()
        };
        Ok(ToolResult::success(text))
    }
}

pub struct AnalyzeCodeTool;

impl AnalyzeCodeTool {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Tool for AnalyzeCodeTool {
    fn name(&self) -> &str {
        "analyze_code"
    }

    fn description(&self) -> &str {
        "Report structural statistics for a code snippet (lines, functions, classes, imports)"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "code": {"type": "string", "description": "Code to analyze"}
            },
            "required": ["code"]
        })
    }

    async fn execute(&self, args: Value) -> Result<ToolResult> {
        let Some(code) = args["code"].as_str() else {
            return Ok(ToolResult::error("code is required"));
        };

        let mut functions = 0usize;
        let mut classes = 0usize;
        let mut imports = 0usize;
        let mut comments = 0usize;
        let mut blank = 0usize;

        for line in code.lines() {
            let trimmed = line.trim_start();
            if trimmed.is_empty() {
                blank += 1;
            } else if trimmed.starts_with('#') || trimmed.starts_with("//") {
                comments += 1;
            }
            if trimmed.starts_with("def ") || trimmed.starts_with("async def ") || trimmed.starts_with("fn ") {
                functions += 1;
            }
            if trimmed.starts_with("class ") || trimmed.starts_with("struct ") {
                classes += 1;
            }
            if trimmed.starts_with("import ") || trimmed.starts_with("from ") || trimmed.starts_with("use ") {
                imports += 1;
            }
        }

        let total = code.lines().count();
        Ok(ToolResult::success(format!(
            "Code analysis\nTotal lines: {total}\nBlank lines: {blank}\nComment lines: {comments}\nFunctions: {functions}\nClasses: {classes}\nImports: {imports}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn screen_rejects_subprocess_import() {
        assert!(screen_code("import subprocess\nprint(1)").is_some());
        assert!(screen_code("print(1 + 1)").is_none());
    }

    #[tokio::test]
    async fn analyze_counts_definitions() {
        let result = AnalyzeCodeTool::new()
            .execute(json!({"code": "import math\n\ndef f():\n    pass\n\nclass C:\n    pass\n"}))
            .await
            .unwrap();
        assert!(result.output.contains("Functions: 1"));
        assert!(result.output.contains("Classes: 1"));
        assert!(result.output.contains("Imports: 1"));
    }
}
