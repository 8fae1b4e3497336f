use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Config;
use crate::error::AgentError;

const TAVILY_SEARCH_URL: &str = "https://api.tavily.com/search";
const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Source discovery seam: given a query, return candidate source URLs.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<String>, AgentError>;
}

/// Language model seam: turn a prompt into generated text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, AgentError>;
}

/// Page retrieval seam, separated from the pipeline so tests can run it
/// without a network.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, AgentError>;
}

/// Web search backed by the Tavily API
pub struct TavilySearch {
    client: reqwest::Client,
    api_key: String,
}

impl TavilySearch {
    pub fn new(client: reqwest::Client, api_key: String) -> Self {
        Self { client, api_key }
    }
}

#[derive(Debug, Serialize)]
struct TavilyRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    max_results: usize,
}

#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Debug, Deserialize)]
struct TavilyResult {
    url: String,
}

#[async_trait]
impl SearchProvider for TavilySearch {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<String>, AgentError> {
        let request = TavilyRequest {
            api_key: &self.api_key,
            query,
            max_results,
        };

        let response = self
            .client
            .post(TAVILY_SEARCH_URL)
            .json(&request)
            .send()
            .await
            .map_err(|e| AgentError::Search(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AgentError::Search(format!(
                "search API returned status {}",
                response.status()
            )));
        }

        let parsed: TavilyResponse = response
            .json()
            .await
            .map_err(|e| AgentError::Search(e.to_string()))?;

        let urls: Vec<String> = parsed.results.into_iter().map(|result| result.url).collect();
        debug!(count = urls.len(), "search returned sources");
        Ok(urls)
    }
}

/// Text generation backed by the Gemini API
pub struct GeminiGenerator {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiGenerator {
    pub fn new(client: reqwest::Client, api_key: String, model: String) -> Self {
        Self {
            client,
            api_key,
            model,
        }
    }
}

#[derive(Debug, Serialize)]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
}

#[derive(Debug, Serialize)]
struct GeminiContent<'a> {
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Debug, Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiCandidateContent,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiCandidatePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidatePart {
    #[serde(default)]
    text: String,
}

#[async_trait]
impl TextGenerator for GeminiGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, AgentError> {
        let url = format!(
            "{}/{}:generateContent?key={}",
            GEMINI_BASE_URL, self.model, self.api_key
        );
        let request = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| AgentError::Generation(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AgentError::Generation(format!(
                "model API returned status {}",
                response.status()
            )));
        }

        let parsed: GeminiResponse = response
            .json()
            .await
            .map_err(|e| AgentError::Generation(e.to_string()))?;

        let text = parsed
            .candidates
            .first()
            .map(|candidate| {
                candidate
                    .content
                    .parts
                    .iter()
                    .map(|part| part.text.as_str())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(AgentError::Generation("model returned no text".to_string()));
        }

        Ok(text)
    }
}

/// Page fetching over HTTP
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, AgentError> {
        let response = self.client.get(url).send().await.map_err(|e| AgentError::Fetch {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        if !response.status().is_success() {
            return Err(AgentError::Fetch {
                url: url.to_string(),
                reason: format!("status {}", response.status()),
            });
        }

        response.text().await.map_err(|e| AgentError::Fetch {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Build the providers used in production from the validated config.
pub fn default_providers(
    config: &Config,
) -> Result<(TavilySearch, GeminiGenerator, HttpFetcher), reqwest::Error> {
    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(10))
        .build()?;

    Ok((
        TavilySearch::new(client.clone(), config.tavily_api_key.clone()),
        GeminiGenerator::new(
            client.clone(),
            config.gemini_api_key.clone(),
            config.gemini_model.clone(),
        ),
        HttpFetcher::new(client),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tavily_response_parsing() {
        let json = r#"{
            "query": "q",
            "results": [
                {"url": "http://a", "title": "A", "score": 0.9},
                {"url": "http://b", "title": "B", "score": 0.5}
            ]
        }"#;

        let parsed: TavilyResponse = serde_json::from_str(json).unwrap();
        let urls: Vec<_> = parsed.results.into_iter().map(|r| r.url).collect();
        assert_eq!(urls, vec!["http://a", "http://b"]);
    }

    #[test]
    fn test_gemini_response_parsing() {
        let json = r#"{
            "candidates": [
                {"content": {"parts": [{"text": "Hello "}, {"text": "world"}], "role": "model"}}
            ]
        }"#;

        let parsed: GeminiResponse = serde_json::from_str(json).unwrap();
        let text: String = parsed.candidates[0]
            .content
            .parts
            .iter()
            .map(|part| part.text.as_str())
            .collect();
        assert_eq!(text, "Hello world");
    }

    #[test]
    fn test_gemini_response_without_candidates() {
        let parsed: GeminiResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.candidates.is_empty());
    }
}
