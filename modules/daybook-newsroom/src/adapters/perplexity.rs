use anyhow::Result;
use async_trait::async_trait;
use daybook_common::{provenance, DocumentRecord};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{parse_timestamp, SourceAdapter};

const ENDPOINT: &str = "https://api.perplexity.ai/chat/completions";
const MODEL: &str = "sonar-reasoning";
const MAX_RESULTS: usize = 5;

/// Perplexity Sonar adapter backed by the public chat-completions endpoint.
/// Citations are harvested into records; when the answer carries no
/// citations the content itself becomes a single summary record.
pub struct PerplexityAdapter {
    api_key: Option<String>,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    return_citations: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
    #[serde(default)]
    citations: Vec<Value>,
}

impl PerplexityAdapter {
    pub fn new(api_key: Option<String>, client: reqwest::Client) -> Self {
        Self { api_key, client }
    }
}

#[async_trait]
impl SourceAdapter for PerplexityAdapter {
    fn name(&self) -> &'static str {
        "perplexity_sonar"
    }

    fn configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn search(&self, query: &str) -> Result<Vec<DocumentRecord>> {
        let Some(ref api_key) = self.api_key else {
            return Ok(Vec::new());
        };

        let request = ChatRequest {
            model: MODEL.to_string(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: "You are a research assistant returning JSON bulletins.".to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: format!(
                        "Return {MAX_RESULTS} concise findings with links about: {query}"
                    ),
                },
            ],
            temperature: 0.2,
            return_citations: true,
        };

        let response: ChatResponse = self
            .client
            .post(ENDPOINT)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let (content, citations) = match response.choices.into_iter().next() {
            Some(choice) => (choice.message.content, choice.message.citations),
            None => (None, Vec::new()),
        };

        let mut records: Vec<DocumentRecord> = citations
            .iter()
            .take(MAX_RESULTS)
            .enumerate()
            .map(|(idx, citation)| {
                let title = citation
                    .get("title")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("Perplexity finding {}", idx + 1));
                let snippet = citation
                    .get("snippet")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .or_else(|| content.clone())
                    .unwrap_or_else(|| "No summary provided".to_string());
                let mut record = DocumentRecord::new(format!("perplexity-{idx}"), title, snippet)
                    .with_source("Perplexity Sonar")
                    .with_metadata("raw", citation.clone());
                if let Some(url) = citation.get("url").and_then(Value::as_str) {
                    record = record.with_url(url);
                }
                if let Some(at) = citation
                    .get("published_date")
                    .and_then(Value::as_str)
                    .and_then(parse_timestamp)
                {
                    record = record.with_published_at(at);
                }
                record
            })
            .collect();

        if records.is_empty() {
            if let Some(content) = content {
                records.push(
                    DocumentRecord::new(
                        "perplexity-summary",
                        "Perplexity Sonar Summary",
                        content,
                    )
                    .with_source("Perplexity Sonar")
                    .with_metadata("citations", Value::Array(citations)),
                );
            }
        }

        Ok(provenance::normalize(records))
    }
}
