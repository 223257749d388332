//! Image generation tool
//!
//! Thin wrapper over a local Stable-Diffusion-compatible HTTP endpoint
//! (the `/sdapi/v1/txt2img` shape). An unreachable backend is reported as
//! an error result so the orchestration loop can recover.

use super::{Tool, ToolResult};
use anyhow::Result;
use async_trait::async_trait;
use base64::Engine;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

const DEFAULT_ENDPOINT: &str = "http://localhost:7860";
const GENERATE_TIMEOUT: Duration = Duration::from_secs(120);

pub struct GenerateImageTool {
    client: reqwest::Client,
    endpoint: String,
}

impl GenerateImageTool {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            endpoint: std::env::var("ADJUTANT_SD_URL")
                .unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string()),
        }
    }
}

#[derive(Deserialize)]
struct Txt2ImgResponse {
    images: Vec<String>,
}

#[async_trait]
impl Tool for GenerateImageTool {
    fn name(&self) -> &str {
        "generate_image"
    }

    fn description(&self) -> &str {
        "Generate an image from a text prompt using a local diffusion server"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "prompt": {"type": "string", "description": "Image description"},
                "output_path": {"type": "string", "description": "Where to save the PNG (default ./generated.png)"}
            },
            "required": ["prompt"]
        })
    }

    async fn execute(&self, args: Value) -> Result<ToolResult> {
        let Some(prompt) = args["prompt"].as_str() else {
            return Ok(ToolResult::error("prompt is required"));
        };
        let output_path = args["output_path"].as_str().unwrap_or("./generated.png");

        let body = json!({
            "prompt": prompt,
            "steps": 20,
            "width": 512,
            "height": 512,
        });

        let response = match self
            .client
            .post(format!("{}/sdapi/v1/txt2img", self.endpoint))
            .timeout(GENERATE_TIMEOUT)
            .json(&body)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                return Ok(ToolResult::error(format!(
                    "image backend unreachable at {}: {e}",
                    self.endpoint
                )));
            }
        };

        if !response.status().is_success() {
            return Ok(ToolResult::error(format!(
                "image backend returned HTTP {}",
                response.status()
            )));
        }

        let parsed: Txt2ImgResponse = match response.json().await {
            Ok(p) => p,
            Err(e) => return Ok(ToolResult::error(format!("malformed image response: {e}"))),
        };
        let Some(encoded) = parsed.images.first() else {
            return Ok(ToolResult::error("image backend returned no images"));
        };

        let bytes = match base64::engine::general_purpose::STANDARD.decode(encoded) {
            Ok(b) => b,
            Err(e) => return Ok(ToolResult::error(format!("image payload is not valid base64: {e}"))),
        };
        tokio::fs::write(output_path, &bytes).await?;

        Ok(ToolResult::success(format!(
            "Generated image for \"{prompt}\" saved to {output_path} ({} bytes)",
            bytes.len()
        )))
    }
}
