use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use crate::core::config::SearchSettings;
use crate::core::errors::ApiError;

pub const MAX_SNIPPETS: usize = 5;
pub const SERP_KEY_MISSING: &str = "No SERP API key configured.";

#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

#[async_trait]
pub trait WebSearchProvider: Send + Sync {
    fn name(&self) -> &str;

    fn is_configured(&self) -> bool {
        true
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, ApiError>;
}

/// Boundary around the web-search backend.
///
/// Returns up to [`MAX_SNIPPETS`] snippets joined by newlines, or a sentinel
/// sentence when the provider is unconfigured or fails.
#[derive(Clone)]
pub struct WebSearchService {
    provider: Arc<dyn WebSearchProvider>,
}

impl WebSearchService {
    pub fn new(provider: Arc<dyn WebSearchProvider>) -> Self {
        Self { provider }
    }

    pub fn from_settings(settings: &SearchSettings) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(ApiError::internal)?;
        let provider: Arc<dyn WebSearchProvider> = match settings.provider.as_str() {
            "duckduckgo" => Arc::new(DuckDuckGoSearch::new(client)),
            _ => Arc::new(SerpApiSearch::new(client, settings.serp_api_key.clone())),
        };
        Ok(Self::new(provider))
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub async fn search(&self, query: &str) -> String {
        if !self.provider.is_configured() {
            tracing::warn!("Web search provider '{}' is not configured", self.provider.name());
            return SERP_KEY_MISSING.to_string();
        }

        match self.provider.search(query).await {
            Ok(results) => {
                tracing::debug!(
                    "Web search '{}' returned {} results",
                    self.provider.name(),
                    results.len()
                );
                join_snippets(&results)
            }
            Err(err) => {
                tracing::warn!("Web search '{}' failed: {}", self.provider.name(), err);
                format!("Web search failed: {}", err)
            }
        }
    }
}

fn join_snippets(results: &[SearchResult]) -> String {
    results
        .iter()
        .take(MAX_SNIPPETS)
        .map(|result| result.snippet.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Google results through SerpAPI.
pub struct SerpApiSearch {
    client: Client,
    api_key: Option<String>,
}

impl SerpApiSearch {
    pub fn new(client: Client, api_key: Option<String>) -> Self {
        Self { client, api_key }
    }
}

#[async_trait]
impl WebSearchProvider for SerpApiSearch {
    fn name(&self) -> &str {
        "serpapi"
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, ApiError> {
        let api_key = self.api_key.as_deref().ok_or(ApiError::ServiceUnavailable)?;
        let url = format!(
            "https://serpapi.com/search?engine=google&q={}&api_key={}&num={}",
            urlencoding::encode(query),
            urlencoding::encode(api_key),
            MAX_SNIPPETS
        );

        let response = self.client.get(url).send().await.map_err(ApiError::internal)?;

        if !response.status().is_success() {
            return Err(ApiError::Internal(format!(
                "SerpAPI search failed: {}",
                response.status()
            )));
        }

        let payload: Value = response.json().await.map_err(ApiError::internal)?;
        Ok(parse_serpapi(&payload))
    }
}

fn parse_serpapi(payload: &Value) -> Vec<SearchResult> {
    let items = payload
        .get("organic_results")
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default();

    items
        .iter()
        .map(|item| SearchResult {
            title: item
                .get("title")
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string(),
            url: item
                .get("link")
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string(),
            snippet: item
                .get("snippet")
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string(),
        })
        .collect()
}

/// Keyless DuckDuckGo instant-answer API.
pub struct DuckDuckGoSearch {
    client: Client,
}

impl DuckDuckGoSearch {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl WebSearchProvider for DuckDuckGoSearch {
    fn name(&self) -> &str {
        "duckduckgo"
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, ApiError> {
        let url = format!(
            "https://api.duckduckgo.com/?q={}&format=json&no_redirect=1&no_html=1",
            urlencoding::encode(query)
        );

        let response = self.client.get(url).send().await.map_err(ApiError::internal)?;

        if !response.status().is_success() {
            return Err(ApiError::Internal(format!(
                "DuckDuckGo search failed: {}",
                response.status()
            )));
        }

        let payload: Value = response.json().await.map_err(ApiError::internal)?;
        Ok(parse_duckduckgo(&payload))
    }
}

fn parse_duckduckgo(payload: &Value) -> Vec<SearchResult> {
    let mut results = Vec::new();

    if let Some(abstract_text) = payload.get("AbstractText").and_then(|v| v.as_str()) {
        if let Some(url) = payload.get("AbstractURL").and_then(|v| v.as_str()) {
            if !abstract_text.is_empty() && !url.is_empty() {
                results.push(SearchResult {
                    title: abstract_text
                        .split(" - ")
                        .next()
                        .unwrap_or(abstract_text)
                        .to_string(),
                    url: url.to_string(),
                    snippet: abstract_text.to_string(),
                });
            }
        }
    }

    if let Some(items) = payload.get("Results").and_then(|v| v.as_array()) {
        extract_ddg_topics(items, &mut results);
    }
    if let Some(items) = payload.get("RelatedTopics").and_then(|v| v.as_array()) {
        extract_ddg_topics(items, &mut results);
    }

    results
}

fn extract_ddg_topics(items: &[Value], results: &mut Vec<SearchResult>) {
    for item in items {
        if let Some(topics) = item.get("Topics").and_then(|v| v.as_array()) {
            extract_ddg_topics(topics, results);
            continue;
        }
        let text = item.get("Text").and_then(|v| v.as_str()).unwrap_or("");
        let url = item.get("FirstURL").and_then(|v| v.as_str()).unwrap_or("");
        if text.is_empty() || url.is_empty() {
            continue;
        }
        results.push(SearchResult {
            title: text.split(" - ").next().unwrap_or(text).to_string(),
            url: url.to_string(),
            snippet: text.to_string(),
        });
    }
}
