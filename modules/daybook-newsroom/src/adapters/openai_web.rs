use anyhow::Result;
use async_trait::async_trait;
use daybook_common::{provenance, DocumentRecord};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::SourceAdapter;

const ENDPOINT: &str = "https://api.openai.com/v1/responses";
const MODEL: &str = "o4-mini";
const MAX_RESULTS: usize = 5;

/// OpenAI Responses API adapter using the built-in `web_search` tool.
/// URL annotations on the answer are harvested into records.
pub struct OpenAiWebSearchAdapter {
    api_key: Option<String>,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct ResponsesRequest {
    model: String,
    input: String,
    tools: Vec<Tool>,
}

#[derive(Debug, Serialize)]
struct Tool {
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct ResponsesResponse {
    #[serde(default)]
    output: Vec<OutputItem>,
}

#[derive(Debug, Deserialize)]
struct OutputItem {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    annotations: Vec<Value>,
}

impl OpenAiWebSearchAdapter {
    pub fn new(api_key: Option<String>, client: reqwest::Client) -> Self {
        Self { api_key, client }
    }
}

#[async_trait]
impl SourceAdapter for OpenAiWebSearchAdapter {
    fn name(&self) -> &'static str {
        "openai_web_search"
    }

    fn configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn search(&self, query: &str) -> Result<Vec<DocumentRecord>> {
        let Some(ref api_key) = self.api_key else {
            return Ok(Vec::new());
        };

        let request = ResponsesRequest {
            model: MODEL.to_string(),
            input: format!(
                "Return up to {MAX_RESULTS} citations with short justifications for: {query}"
            ),
            tools: vec![Tool {
                kind: "web_search".to_string(),
            }],
        };

        let response: ResponsesResponse = self
            .client
            .post(ENDPOINT)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(provenance::normalize(harvest(response.output)))
    }
}

/// Turn the message items' URL annotations into records. Each block's answer
/// text doubles as the summary when the annotation carries no snippet;
/// record ids number the annotations across the whole answer.
fn harvest(output: Vec<OutputItem>) -> Vec<DocumentRecord> {
    let mut records = Vec::new();
    let mut idx = 0usize;

    for item in output {
        if item.kind != "message" {
            continue;
        }
        for block in item.content {
            for annotation in block.annotations.iter().take(MAX_RESULTS) {
                idx += 1;
                let title = annotation
                    .get("title")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("OpenAI web result {idx}"));
                let snippet = block
                    .text
                    .clone()
                    .or_else(|| {
                        annotation
                            .get("snippet")
                            .and_then(Value::as_str)
                            .map(str::to_string)
                    })
                    .unwrap_or_default();
                let mut record = DocumentRecord::new(format!("openai-web-{idx}"), title, snippet)
                    .with_source("OpenAI Web Search")
                    .with_metadata("score", annotation.get("score").cloned().into());
                if let Some(url) = annotation.get("url").and_then(Value::as_str) {
                    record = record.with_url(url);
                }
                records.push(record);
            }
        }
    }

    records
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn message(blocks: Vec<ContentBlock>) -> OutputItem {
        OutputItem {
            kind: "message".to_string(),
            content: blocks,
        }
    }

    #[test]
    fn harvests_url_annotations_into_numbered_records() {
        let output = vec![
            OutputItem {
                kind: "web_search_call".to_string(),
                content: Vec::new(),
            },
            message(vec![ContentBlock {
                text: Some("Two findings.".to_string()),
                annotations: vec![
                    json!({"url": "https://example.com/a", "title": "Finding A", "score": 0.9}),
                    json!({"url": "https://example.com/b"}),
                ],
            }]),
        ];

        let records = harvest(output);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "openai-web-1");
        assert_eq!(records[0].title, "Finding A");
        assert_eq!(records[0].url.as_deref(), Some("https://example.com/a"));
        assert_eq!(records[0].metadata.get("score"), Some(&json!(0.9)));
        // Untitled annotations get a numbered placeholder and the block text.
        assert_eq!(records[1].id, "openai-web-2");
        assert_eq!(records[1].title, "OpenAI web result 2");
        assert_eq!(records[1].summary, "Two findings.");
    }

    #[test]
    fn non_message_items_yield_nothing() {
        let output = vec![OutputItem {
            kind: "reasoning".to_string(),
            content: vec![ContentBlock {
                text: None,
                annotations: vec![json!({"url": "https://example.com/x"})],
            }],
        }];
        assert!(harvest(output).is_empty());
    }
}
