//! Firecrawl-style scraping backend client.
//!
//! The backend is a black box: one URL in, a normalized
//! `{title, markdown/html}` page out. Tag filters steer the extraction
//! toward article content and away from chrome.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};

use contentiq_shared::{ContentIqError, Result};

use crate::Scraper;

/// Request timeout for scrape calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Tags the extraction should focus on.
const INCLUDE_TAGS: &[&str] = &["title", "meta", "h1", "h2", "h3", "p", "article"];

/// Tags the extraction should drop.
const EXCLUDE_TAGS: &[&str] = &["script", "style", "nav", "footer", "aside"];

/// One scraped page, normalized from the backend response.
#[derive(Debug, Clone, Default)]
pub struct ScrapedPage {
    pub title: Option<String>,
    pub markdown: Option<String>,
    pub html: Option<String>,
}

/// HTTP client for the Firecrawl scrape API.
#[derive(Clone)]
pub struct FirecrawlClient {
    client: reqwest::Client,
    endpoint: String,
}

impl FirecrawlClient {
    /// Build a new scraping client against `base_url` (e.g. `https://api.firecrawl.dev`).
    pub fn new(api_key: &str, base_url: &str) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(ContentIqError::config("missing Firecrawl API key"));
        }

        let mut headers = HeaderMap::new();
        let auth = format!("Bearer {}", api_key.trim());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth)
                .map_err(|_| ContentIqError::config("invalid Firecrawl API key"))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .user_agent(concat!("ContentIQ/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .default_headers(headers)
            .build()
            .map_err(|e| ContentIqError::Network(format!("client build: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!("{}/v1/scrape", base_url.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl Scraper for FirecrawlClient {
    async fn scrape(&self, url: &str) -> Result<ScrapedPage> {
        let body = ScrapeRequest {
            url,
            formats: &["markdown", "html"],
            include_tags: INCLUDE_TAGS,
            exclude_tags: EXCLUDE_TAGS,
        };

        let resp = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| ContentIqError::Network(format!("{url}: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(ContentIqError::Scrape(format!(
                "{url}: HTTP {status}: {text}"
            )));
        }

        let parsed: ScrapeResponse = resp
            .json()
            .await
            .map_err(|e| ContentIqError::Scrape(format!("{url}: invalid response: {e}")))?;

        if !parsed.success {
            let reason = parsed.error.unwrap_or_else(|| "unknown error".into());
            return Err(ContentIqError::Scrape(format!("{url}: {reason}")));
        }

        let data = parsed
            .data
            .ok_or_else(|| ContentIqError::Scrape(format!("{url}: response missing data")))?;

        Ok(ScrapedPage {
            title: data.metadata.and_then(|m| m.title),
            markdown: data.markdown,
            html: data.html,
        })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ScrapeRequest<'a> {
    url: &'a str,
    formats: &'a [&'a str],
    include_tags: &'a [&'a str],
    exclude_tags: &'a [&'a str],
}

#[derive(Debug, Deserialize)]
struct ScrapeResponse {
    success: bool,
    #[serde(default)]
    data: Option<ScrapeData>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ScrapeData {
    #[serde(default)]
    markdown: Option<String>,
    #[serde(default)]
    html: Option<String>,
    #[serde(default)]
    metadata: Option<ScrapeMetadata>,
}

#[derive(Debug, Deserialize)]
struct ScrapeMetadata {
    #[serde(default)]
    title: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn scrape_normalizes_successful_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/scrape"))
            .and(body_partial_json(
                serde_json::json!({"url": "https://example.com/post"}),
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "data": {
                    "markdown": "# Hello\n\nWorld",
                    "html": "<h1>Hello</h1>",
                    "metadata": {"title": "Hello"}
                }
            })))
            .mount(&server)
            .await;

        let client = FirecrawlClient::new("key", &server.uri()).expect("client");
        let page = client.scrape("https://example.com/post").await.expect("scrape");
        assert_eq!(page.title.as_deref(), Some("Hello"));
        assert!(page.markdown.as_deref().unwrap().contains("World"));
    }

    #[tokio::test]
    async fn scrape_reports_backend_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/scrape"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": false,
                "error": "blocked by robots.txt"
            })))
            .mount(&server)
            .await;

        let client = FirecrawlClient::new("key", &server.uri()).expect("client");
        let err = client.scrape("https://example.com").await.unwrap_err();
        assert!(err.to_string().contains("robots.txt"));
    }

    #[tokio::test]
    async fn scrape_reports_http_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/scrape"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = FirecrawlClient::new("key", &server.uri()).expect("client");
        assert!(client.scrape("https://example.com").await.is_err());
    }
}
