//! Simulated email delivery
//!
//! Echoes the envelope and a body preview; nothing leaves the machine.

use super::{Tool, ToolResult};
use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};

pub struct SendEmailTool;

impl SendEmailTool {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Tool for SendEmailTool {
    fn name(&self) -> &str {
        "send_email"
    }

    fn description(&self) -> &str {
        "Send an email (simulated)"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "to": {"type": "string", "description": "Recipient email"},
                "subject": {"type": "string", "description": "Email subject"},
                "body": {"type": "string", "description": "Email body"}
            },
            "required": ["to", "subject", "body"]
        })
    }

    async fn execute(&self, args: Value) -> Result<ToolResult> {
        let Some(to) = args["to"].as_str() else {
            return Ok(ToolResult::error("to is required"));
        };
        let Some(subject) = args["subject"].as_str() else {
            return Ok(ToolResult::error("subject is required"));
        };
        let Some(body) = args["body"].as_str() else {
            return Ok(ToolResult::error("body is required"));
        };

        let preview: String = body.chars().take(100).collect();
        let ellipsis = if body.chars().count() > 100 { "..." } else { "" };

        Ok(ToolResult::success(format!(
            "Email sent\nTo: {to}\nSubject: {subject}\nSent: {}\n\nMessage preview:\n{preview}{ellipsis}",
            Utc::now().format("%Y-%m-%d %H:%M:%S")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_subject_is_an_error_result() {
        let result = SendEmailTool::new()
            .execute(json!({"to": "a@b.c", "body": "hi"}))
            .await
            .unwrap();
        assert!(result.is_error);
    }
}
