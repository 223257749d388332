//! Tool-call extraction from free-form model output
//!
//! The brace-scanning heuristic is deliberately permissive: grab the span
//! from the first `{` to the last `}`, try to parse it, and accept any
//! object carrying a `"tool"` key. Anything else — no braces, malformed
//! JSON, a brace-delimited aside in prose — means "no tool call". The
//! parser sits behind a trait so a stricter structured-output contract can
//! replace it without touching the loop.

use crate::tool::ToolCall;
use serde_json::Value;

pub trait ToolCallParser: Send + Sync {
    /// Extract a tool call from the response text, or `None` when the
    /// text is a plain answer. Must never fail on malformed input.
    fn extract(&self, text: &str) -> Option<ToolCall>;
}

/// First-`{`-to-last-`}` JSON extraction.
///
/// Known failure mode: a prose answer that happens to contain a
/// well-formed `{"tool": ...}` object is read as a tool call.
pub struct BraceScanParser;

impl ToolCallParser for BraceScanParser {
    fn extract(&self, text: &str) -> Option<ToolCall> {
        let first = text.find('{')?;
        let last = text.rfind('}')?;
        if last <= first {
            return None;
        }

        let candidate = &text[first..=last];
        let value: Value = serde_json::from_str(candidate).ok()?;
        let object = value.as_object()?;
        let tool = object.get("tool")?.as_str()?.to_string();
        let arguments = object
            .get("arguments")
            .cloned()
            .unwrap_or_else(|| Value::Object(Default::default()));

        Some(ToolCall { tool, arguments })
    }
}
