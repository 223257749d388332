//! Basic arithmetic tool

use super::{Tool, ToolResult};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};

pub struct CalculatorTool;

impl CalculatorTool {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Tool for CalculatorTool {
    fn name(&self) -> &str {
        "calculator"
    }

    fn description(&self) -> &str {
        "Perform basic arithmetic operations (add, subtract, multiply, divide)"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "operation": {
                    "type": "string",
                    "description": "The operation to perform",
                    "enum": ["add", "subtract", "multiply", "divide"]
                },
                "a": {"type": "number", "description": "First number"},
                "b": {"type": "number", "description": "Second number"}
            },
            "required": ["operation", "a", "b"]
        })
    }

    async fn execute(&self, args: Value) -> Result<ToolResult> {
        let Some(operation) = args["operation"].as_str() else {
            return Ok(ToolResult::error("operation is required"));
        };
        let Some(a) = args["a"].as_f64() else {
            return Ok(ToolResult::error("a is required and must be a number"));
        };
        let Some(b) = args["b"].as_f64() else {
            return Ok(ToolResult::error("b is required and must be a number"));
        };

        let result = match operation {
            "add" => a + b,
            "subtract" => a - b,
            "multiply" => a * b,
            "divide" => {
                if b == 0.0 {
                    return Ok(ToolResult::error("division by zero"));
                }
                a / b
            }
            other => {
                return Ok(ToolResult::error(format!("unknown operation: {other}")));
            }
        };

        // Render integers without a trailing ".0" so answers read naturally
        let rendered = if result.fract() == 0.0 && result.abs() < 1e15 {
            format!("{}", result as i64)
        } else {
            format!("{result}")
        };

        Ok(ToolResult::success(format!(
            "{a} {operation} {b} = {rendered}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn multiplies() {
        let result = CalculatorTool::new()
            .execute(json!({"operation": "multiply", "a": 25, "b": 4}))
            .await
            .unwrap();
        assert!(!result.is_error);
        assert!(result.output.contains("100"));
    }

    #[tokio::test]
    async fn divide_by_zero_is_an_error_result() {
        let result = CalculatorTool::new()
            .execute(json!({"operation": "divide", "a": 1, "b": 0}))
            .await
            .unwrap();
        assert!(result.is_error);
        assert!(result.output.contains("division by zero"));
    }
}
