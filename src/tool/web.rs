//! Web tools: fetch pages, extract text and links, search, download
//!
//! HTML parsing goes through `scraper`; relative links are resolved with
//! `url` against the page address.

use super::{Tool, ToolResult};
use anyhow::Result;
use async_trait::async_trait;
use scraper::{Html, Selector};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_TEXT_CHARS: usize = 8_000;

async fn fetch(client: &reqwest::Client, raw_url: &str) -> Result<String, String> {
    let parsed = Url::parse(raw_url).map_err(|e| format!("invalid URL {raw_url}: {e}"))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(format!("unsupported URL scheme: {}", parsed.scheme()));
    }

    let response = client
        .get(parsed)
        .timeout(FETCH_TIMEOUT)
        .send()
        .await
        .map_err(|e| format!("failed to fetch {raw_url}: {e}"))?;

    if !response.status().is_success() {
        return Err(format!("{raw_url} returned HTTP {}", response.status()));
    }

    response
        .text()
        .await
        .map_err(|e| format!("failed to read body of {raw_url}: {e}"))
}

/// ~80 chars of context either side of a match, clamped to char boundaries
fn context_around(text: &str, hit: usize, match_len: usize) -> &str {
    let mut start = hit.saturating_sub(80);
    while start > 0 && !text.is_char_boundary(start) {
        start -= 1;
    }
    let mut end = (hit + match_len + 80).min(text.len());
    while end < text.len() && !text.is_char_boundary(end) {
        end += 1;
    }
    &text[start..end]
}

/// Strip markup and collapse whitespace into readable text. Script and
/// style subtrees are skipped entirely.
fn extract_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let selector = Selector::parse("body").unwrap();
    let root = document
        .select(&selector)
        .next()
        .unwrap_or_else(|| document.root_element());

    let mut collected = String::new();
    collect_text(root, &mut collected);
    collected.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn collect_text(element: scraper::ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(el) = scraper::ElementRef::wrap(child) {
            if !matches!(el.value().name(), "script" | "style" | "noscript") {
                collect_text(el, out);
            }
        } else if let Some(text) = child.value().as_text() {
            out.push_str(text);
            out.push(' ');
        }
    }
}

pub struct WebExtractTextTool {
    client: reqwest::Client,
}

impl WebExtractTextTool {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for WebExtractTextTool {
    fn name(&self) -> &str {
        "web_extract_text"
    }

    fn description(&self) -> &str {
        "Fetch a web page and extract its readable text"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "url": {"type": "string", "description": "Page URL"}
            },
            "required": ["url"]
        })
    }

    async fn execute(&self, args: Value) -> Result<ToolResult> {
        let Some(url) = args["url"].as_str() else {
            return Ok(ToolResult::error("url is required"));
        };

        let html = match fetch(&self.client, url).await {
            Ok(h) => h,
            Err(e) => return Ok(ToolResult::error(e)),
        };

        let text = extract_text(&html);
        if text.is_empty() {
            return Ok(ToolResult::success(format!("{url} contains no readable text")));
        }

        let truncated: String = text.chars().take(MAX_TEXT_CHARS).collect();
        let suffix = if text.chars().count() > MAX_TEXT_CHARS {
            "\n[... truncated ...]"
        } else {
            ""
        };
        Ok(ToolResult::success(format!("Text from {url}:\n{truncated}{suffix}")))
    }
}

pub struct WebExtractLinksTool {
    client: reqwest::Client,
}

impl WebExtractLinksTool {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for WebExtractLinksTool {
    fn name(&self) -> &str {
        "web_extract_links"
    }

    fn description(&self) -> &str {
        "Fetch a web page and list the links it contains"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "url": {"type": "string", "description": "Page URL"},
                "max_links": {"type": "integer", "description": "Maximum number of links (default 50)"}
            },
            "required": ["url"]
        })
    }

    async fn execute(&self, args: Value) -> Result<ToolResult> {
        let Some(url) = args["url"].as_str() else {
            return Ok(ToolResult::error("url is required"));
        };
        let max_links = args["max_links"].as_u64().unwrap_or(50) as usize;

        let base = match Url::parse(url) {
            Ok(u) => u,
            Err(e) => return Ok(ToolResult::error(format!("invalid URL {url}: {e}"))),
        };
        let html = match fetch(&self.client, url).await {
            Ok(h) => h,
            Err(e) => return Ok(ToolResult::error(e)),
        };
        let document = Html::parse_document(&html);
        let selector = Selector::parse("a[href]").unwrap();

        let mut links = Vec::new();
        for anchor in document.select(&selector) {
            let Some(href) = anchor.value().attr("href") else {
                continue;
            };
            let Ok(resolved) = base.join(href) else {
                continue;
            };
            let label: String = anchor.text().collect::<String>().trim().to_string();
            links.push(if label.is_empty() {
                resolved.to_string()
            } else {
                format!("{label} — {resolved}")
            });
            if links.len() >= max_links {
                break;
            }
        }

        if links.is_empty() {
            return Ok(ToolResult::success(format!("No links found on {url}")));
        }
        Ok(ToolResult::success(format!(
            "{} links on {url}\n{}",
            links.len(),
            links.join("\n")
        )))
    }
}

pub struct WebSearchInPageTool {
    client: reqwest::Client,
}

impl WebSearchInPageTool {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for WebSearchInPageTool {
    fn name(&self) -> &str {
        "web_search_in_page"
    }

    fn description(&self) -> &str {
        "Search a web page's text for a keyword and show surrounding context"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "url": {"type": "string", "description": "Page URL"},
                "keyword": {"type": "string", "description": "Keyword to search for"}
            },
            "required": ["url", "keyword"]
        })
    }

    async fn execute(&self, args: Value) -> Result<ToolResult> {
        let Some(url) = args["url"].as_str() else {
            return Ok(ToolResult::error("url is required"));
        };
        let Some(keyword) = args["keyword"].as_str() else {
            return Ok(ToolResult::error("keyword is required"));
        };

        let html = match fetch(&self.client, url).await {
            Ok(h) => h,
            Err(e) => return Ok(ToolResult::error(e)),
        };

        // Matching is case-insensitive; snippets come from the folded text
        let lower = extract_text(&html).to_lowercase();
        let needle = keyword.to_lowercase();
        if needle.is_empty() {
            return Ok(ToolResult::error("keyword must not be empty"));
        }

        let mut snippets = Vec::new();
        let mut from = 0;
        while let Some(pos) = lower[from..].find(&needle) {
            let hit = from + pos;
            snippets.push(format!("...{}...", context_around(&lower, hit, needle.len())));
            from = hit + needle.len();
            if snippets.len() >= 5 {
                break;
            }
        }

        if snippets.is_empty() {
            return Ok(ToolResult::success(format!(
                "'{keyword}' not found on {url}"
            )));
        }
        Ok(ToolResult::success(format!(
            "{} occurrence(s) of '{keyword}' on {url}\n{}",
            snippets.len(),
            snippets.join("\n")
        )))
    }
}

pub struct WebDownloadFileTool {
    client: reqwest::Client,
}

impl WebDownloadFileTool {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for WebDownloadFileTool {
    fn name(&self) -> &str {
        "web_download_file"
    }

    fn description(&self) -> &str {
        "Download a file from a URL into a local directory"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "url": {"type": "string", "description": "File URL"},
                "output_dir": {"type": "string", "description": "Target directory (default ./downloads)"}
            },
            "required": ["url"]
        })
    }

    async fn execute(&self, args: Value) -> Result<ToolResult> {
        let Some(raw_url) = args["url"].as_str() else {
            return Ok(ToolResult::error("url is required"));
        };
        let output_dir = args["output_dir"].as_str().unwrap_or("./downloads");

        let parsed = match Url::parse(raw_url) {
            Ok(u) => u,
            Err(e) => return Ok(ToolResult::error(format!("invalid URL: {e}"))),
        };
        let file_name = parsed
            .path_segments()
            .and_then(|mut s| s.next_back())
            .filter(|s| !s.is_empty())
            .unwrap_or("download.bin")
            .to_string();

        let response = match self
            .client
            .get(parsed)
            .timeout(FETCH_TIMEOUT)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => return Ok(ToolResult::error(format!("failed to fetch {raw_url}: {e}"))),
        };
        if !response.status().is_success() {
            return Ok(ToolResult::error(format!(
                "{raw_url} returned HTTP {}",
                response.status()
            )));
        }

        let bytes = match response.bytes().await {
            Ok(b) => b,
            Err(e) => return Ok(ToolResult::error(format!("download failed: {e}"))),
        };

        let target: PathBuf = PathBuf::from(output_dir).join(&file_name);
        tokio::fs::create_dir_all(output_dir).await?;
        tokio::fs::write(&target, &bytes).await?;

        Ok(ToolResult::success(format!(
            "Downloaded {} bytes to {}",
            bytes.len(),
            target.display()
        )))
    }
}
