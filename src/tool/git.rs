//! Git tools: status, log, diff
//!
//! Thin wrappers over the `git` CLI in a given repository directory.

use super::{Tool, ToolResult};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::process::Command;

async fn run_git(repo: &str, git_args: &[&str]) -> Result<ToolResult> {
    let output = match Command::new("git")
        .arg("-C")
        .arg(repo)
        .args(git_args)
        .output()
        .await
    {
        Ok(o) => o,
        Err(e) => return Ok(ToolResult::error(format!("failed to run git: {e}"))),
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Ok(ToolResult::error(format!(
            "git {} failed: {}",
            git_args.first().unwrap_or(&""),
            stderr.trim()
        )));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let text = stdout.trim();
    if text.is_empty() {
        Ok(ToolResult::success("(no output)"))
    } else {
        Ok(ToolResult::success(text.to_string()))
    }
}

pub struct GitStatusTool;

impl GitStatusTool {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Tool for GitStatusTool {
    fn name(&self) -> &str {
        "git_status"
    }

    fn description(&self) -> &str {
        "Show the working tree status of a git repository"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "repo": {"type": "string", "description": "Repository path (default: current directory)"}
            }
        })
    }

    async fn execute(&self, args: Value) -> Result<ToolResult> {
        let repo = args["repo"].as_str().unwrap_or(".");
        run_git(repo, &["status", "--short", "--branch"]).await
    }
}

pub struct GitLogTool;

impl GitLogTool {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Tool for GitLogTool {
    fn name(&self) -> &str {
        "git_log"
    }

    fn description(&self) -> &str {
        "Show recent commits in a git repository"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "repo": {"type": "string", "description": "Repository path (default: current directory)"},
                "max_count": {"type": "integer", "description": "Number of commits to show (default 10)"}
            }
        })
    }

    async fn execute(&self, args: Value) -> Result<ToolResult> {
        let repo = args["repo"].as_str().unwrap_or(".");
        let max_count = args["max_count"].as_u64().unwrap_or(10);
        let count_arg = format!("-{max_count}");
        run_git(repo, &["log", &count_arg, "--oneline", "--decorate"]).await
    }
}

pub struct GitDiffTool;

impl GitDiffTool {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Tool for GitDiffTool {
    fn name(&self) -> &str {
        "git_diff"
    }

    fn description(&self) -> &str {
        "Show uncommitted changes in a git repository"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "repo": {"type": "string", "description": "Repository path (default: current directory)"}
            }
        })
    }

    async fn execute(&self, args: Value) -> Result<ToolResult> {
        let repo = args["repo"].as_str().unwrap_or(".");
        run_git(repo, &["diff", "--stat"]).await
    }
}
