//! Simulated weather lookup
//!
//! Returns plausible conditions without any network call; the assistant is
//! fully local by design.

use super::{Tool, ToolResult};
use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use serde_json::{json, Value};

pub struct WeatherTool;

impl WeatherTool {
    pub fn new() -> Self {
        Self
    }
}

const CONDITIONS: &[&str] = &["Sunny", "Cloudy", "Partly Cloudy", "Rainy"];

#[async_trait]
impl Tool for WeatherTool {
    fn name(&self) -> &str {
        "weather"
    }

    fn description(&self) -> &str {
        "Get weather information for any city (simulated)"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "city": {"type": "string", "description": "City name"},
                "units": {
                    "type": "string",
                    "description": "Temperature units",
                    "enum": ["celsius", "fahrenheit"]
                }
            },
            "required": ["city"]
        })
    }

    async fn execute(&self, args: Value) -> Result<ToolResult> {
        let Some(city) = args["city"].as_str() else {
            return Ok(ToolResult::error("city is required"));
        };
        let units = args["units"].as_str().unwrap_or("celsius");

        let mut rng = rand::thread_rng();
        let temp_c: i32 = rng.gen_range(15..=30);
        let temp_f = temp_c * 9 / 5 + 32;
        let condition = CONDITIONS[rng.gen_range(0..CONDITIONS.len())];
        let humidity: i32 = rng.gen_range(40..=80);

        let (temp, symbol) = if units == "fahrenheit" {
            (temp_f, "°F")
        } else {
            (temp_c, "°C")
        };

        Ok(ToolResult::success(format!(
            "Weather in {city}\nTemperature: {temp}{symbol}\nCondition: {condition}\nHumidity: {humidity}%\nUpdated: {}",
            Utc::now().format("%Y-%m-%d %H:%M:%S")
        )))
    }
}
