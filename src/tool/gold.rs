//! Simulated gold spot price

use super::{Tool, ToolResult};
use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use serde_json::{json, Value};

pub struct GoldPriceTool;

impl GoldPriceTool {
    pub fn new() -> Self {
        Self
    }
}

/// Mock conversion rates from the USD base price
fn currency_rate(currency: &str) -> f64 {
    match currency {
        "EUR" => 0.92,
        "GBP" => 0.79,
        "INR" => 83.12,
        _ => 1.0,
    }
}

#[async_trait]
impl Tool for GoldPriceTool {
    fn name(&self) -> &str {
        "gold_price"
    }

    fn description(&self) -> &str {
        "Get the current gold price in different currencies (simulated)"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "currency": {
                    "type": "string",
                    "description": "Currency code",
                    "enum": ["USD", "EUR", "GBP", "INR"]
                }
            }
        })
    }

    async fn execute(&self, args: Value) -> Result<ToolResult> {
        let currency = args["currency"].as_str().unwrap_or("USD");

        let mut rng = rand::thread_rng();
        let base_price: f64 = 2050.0 + rng.gen_range(-50.0..50.0);
        let price = base_price * currency_rate(currency);
        let change: f64 = rng.gen_range(-2.0..2.0);
        let sign = if change > 0.0 { "+" } else { "" };

        Ok(ToolResult::success(format!(
            "Gold price: {currency} {price:.2} per troy ounce\n24h change: {sign}{change:.2}%\nUpdated: {}",
            Utc::now().format("%Y-%m-%d %H:%M:%S")
        )))
    }
}
