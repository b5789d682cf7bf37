//! Web page fetching

use crate::{required_str, Result, Tool, ToolBundle, ToolContext, ToolError};
use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::Url;
use scraper::{Html, Selector};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

const USER_AGENT: &str = "Mozilla/5.0 (compatible; Cyro-Agent/1.0)";
const DEFAULT_CALLS_PER_MINUTE: usize = 30;
const DEFAULT_MAX_CONTENT_CHARS: usize = 10_000;
const MAX_LINKS: usize = 20;

/// Build the `web` category
pub fn toolset(ctx: &ToolContext) -> ToolBundle {
    ToolBundle::new().with(Arc::new(WebFetchTool::new(ctx.command_timeout)))
}

/// Sliding one-minute window limiter.
#[derive(Debug)]
pub struct RateLimiter {
    calls_per_window: usize,
    window: Duration,
    calls: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn per_minute(calls: usize) -> Self {
        Self {
            calls_per_window: calls.max(1),
            window: Duration::from_secs(60),
            calls: Mutex::new(VecDeque::new()),
        }
    }

    /// Time to wait before another call fits in the window, recording the call when it does.
    fn try_acquire(&self, now: Instant) -> Option<Duration> {
        let mut calls = self.calls.lock();
        while calls
            .front()
            .is_some_and(|&t| now.duration_since(t) >= self.window)
        {
            calls.pop_front();
        }

        if calls.len() < self.calls_per_window {
            calls.push_back(now);
            return None;
        }
        calls
            .front()
            .map(|&oldest| self.window.saturating_sub(now.duration_since(oldest)))
    }

    /// Wait until a call is allowed
    pub async fn acquire(&self) {
        while let Some(wait) = self.try_acquire(Instant::now()) {
            debug!(wait_ms = wait.as_millis() as u64, "Web rate limit reached, waiting");
            tokio::time::sleep(wait).await;
        }
    }
}

/// Readable content extracted from an HTML page
#[derive(Debug, Clone, PartialEq)]
pub struct PageText {
    pub title: String,
    pub text: String,
    pub links: Vec<(String, String)>,
}

/// Reduce an HTML document to its title, visible text and links.
pub fn extract_page(html: &str) -> PageText {
    let document = Html::parse_document(html);

    let title = Selector::parse("title")
        .ok()
        .and_then(|sel| {
            document
                .select(&sel)
                .next()
                .map(|t| t.text().collect::<String>().trim().to_string())
        })
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "No title".to_string());

    let mut words = Vec::new();
    for node in document.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|a| {
            a.value()
                .as_element()
                .is_some_and(|e| matches!(e.name(), "script" | "style" | "noscript" | "head"))
        });
        if !hidden {
            words.extend(text.split_whitespace());
        }
    }

    let links = Selector::parse("a[href]")
        .map(|sel| {
            document
                .select(&sel)
                .filter_map(|a| {
                    let href = a.value().attr("href")?;
                    let label = a.text().collect::<Vec<_>>().join(" ");
                    Some((label.split_whitespace().collect::<Vec<_>>().join(" "), href.to_string()))
                })
                .collect()
        })
        .unwrap_or_default();

    PageText {
        title,
        text: words.join(" "),
        links,
    }
}

fn validate_url(raw: &str, allow_local: bool) -> Result<Url> {
    let url = Url::parse(raw)
        .map_err(|e| ToolError::InvalidArguments(format!("Invalid URL {}: {}", raw, e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ToolError::PermissionDenied(format!(
            "Only http and https URLs can be fetched, got {}",
            url.scheme()
        )));
    }
    let host = url.host_str().unwrap_or("");
    if host.is_empty() {
        return Err(ToolError::InvalidArguments(format!("URL has no host: {}", raw)));
    }
    if !allow_local && matches!(host, "localhost" | "127.0.0.1" | "0.0.0.0" | "[::1]") {
        return Err(ToolError::PermissionDenied(format!(
            "Refusing to fetch local address {}",
            host
        )));
    }
    Ok(url)
}

/// Tool for fetching a page and returning its readable text
pub struct WebFetchTool {
    client: reqwest::Client,
    limiter: RateLimiter,
    allow_local: bool,
}

impl WebFetchTool {
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            limiter: RateLimiter::per_minute(DEFAULT_CALLS_PER_MINUTE),
            allow_local: false,
        }
    }

    /// Permit localhost targets (local dev servers, tests)
    pub fn allow_local(mut self, allow: bool) -> Self {
        self.allow_local = allow;
        self
    }
}

#[async_trait]
impl Tool for WebFetchTool {
    fn name(&self) -> &str {
        "web_fetch"
    }

    fn description(&self) -> &str {
        "Fetch a web page over http(s) and return its title and visible text, \
         optionally followed by the links it contains."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "http or https URL to fetch"
                },
                "include_links": {
                    "type": "boolean",
                    "description": "Append up to 20 links found on the page (default: false)"
                },
                "max_content_length": {
                    "type": "integer",
                    "description": "Maximum characters of text to return (default: 10000)"
                }
            },
            "required": ["url"]
        })
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let url = validate_url(required_str(&args, "url")?, self.allow_local)?;
        let include_links = args["include_links"].as_bool().unwrap_or(false);
        let max_chars = args["max_content_length"]
            .as_u64()
            .map(|n| n as usize)
            .unwrap_or(DEFAULT_MAX_CONTENT_CHARS);

        self.limiter.acquire().await;

        let response = self.client.get(url.clone()).send().await.map_err(|e| {
            if e.is_timeout() {
                ToolError::Timeout(format!("Fetching {} timed out", url))
            } else {
                ToolError::Http(format!("Fetching {} failed: {}", url, e))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ToolError::Http(format!("{} returned {}", url, status)));
        }

        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
            .to_string();
        let body = response
            .text()
            .await
            .map_err(|e| ToolError::Http(format!("Reading {} failed: {}", url, e)))?;

        let page = extract_page(&body);
        let mut content: String = page.text.chars().take(max_chars).collect();
        if page.text.chars().count() > max_chars {
            content.push_str("...");
        }
        if include_links && !page.links.is_empty() {
            content.push_str("\n\nLinks found:\n");
            for (label, href) in page.links.iter().take(MAX_LINKS) {
                content.push_str(&format!("- {}: {}\n", label, href));
            }
        }

        Ok(json!({
            "url": final_url,
            "status_code": status.as_u16(),
            "content_type": content_type,
            "title": page.title,
            "content": content
        }))
    }
}
