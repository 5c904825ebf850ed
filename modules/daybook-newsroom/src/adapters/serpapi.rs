use anyhow::Result;
use async_trait::async_trait;
use daybook_common::{provenance, DocumentRecord};
use serde::Deserialize;
use serde_json::Value;

use super::{parse_timestamp, SourceAdapter};

const ENDPOINT: &str = "https://serpapi.com/search.json";
const MAX_RESULTS: u32 = 10;

/// SerpAPI Google News adapter.
pub struct SerpApiNewsAdapter {
    api_key: Option<String>,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    news_results: Vec<Story>,
}

#[derive(Debug, Deserialize)]
struct Story {
    id: Option<String>,
    link: Option<String>,
    title: Option<String>,
    snippet: Option<String>,
    // SerpAPI returns either a bare name or an object with a `name` field.
    #[serde(default)]
    source: Value,
    thumbnail: Option<String>,
    topic: Option<String>,
    source_url: Option<String>,
    date: Option<String>,
}

impl SerpApiNewsAdapter {
    pub fn new(api_key: Option<String>, client: reqwest::Client) -> Self {
        Self { api_key, client }
    }
}

fn source_label(source: &Value) -> Option<String> {
    source
        .as_str()
        .map(str::to_string)
        .or_else(|| source.get("name").and_then(Value::as_str).map(str::to_string))
}

#[async_trait]
impl SourceAdapter for SerpApiNewsAdapter {
    fn name(&self) -> &'static str {
        "serpapi_news"
    }

    fn configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn search(&self, query: &str) -> Result<Vec<DocumentRecord>> {
        let Some(ref api_key) = self.api_key else {
            return Ok(Vec::new());
        };

        let response: SearchResponse = self
            .client
            .get(ENDPOINT)
            .query(&[
                ("engine", "google_news"),
                ("q", query),
                ("api_key", api_key),
                ("num", &MAX_RESULTS.to_string()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let records = response
            .news_results
            .into_iter()
            .take(MAX_RESULTS as usize)
            .enumerate()
            .map(|(idx, story)| {
                let id = story
                    .id
                    .clone()
                    .or_else(|| story.link.clone())
                    .unwrap_or_else(|| format!("serpapi-{idx}"));
                let mut record = DocumentRecord::new(
                    id,
                    story.title.unwrap_or_else(|| "Untitled story".to_string()),
                    story.snippet.unwrap_or_default(),
                )
                .with_metadata("thumbnail", story.thumbnail.into())
                .with_metadata("topic", story.topic.into())
                .with_metadata("source_url", story.source_url.into());
                if let Some(link) = story.link {
                    record = record.with_url(link);
                }
                if let Some(name) = source_label(&story.source) {
                    record = record.with_source(name);
                }
                if let Some(at) = story.date.as_deref().and_then(parse_timestamp) {
                    record = record.with_published_at(at);
                }
                record
            })
            .collect();

        Ok(provenance::normalize(records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_label_handles_both_shapes() {
        assert_eq!(
            source_label(&serde_json::json!("Reuters")).as_deref(),
            Some("Reuters")
        );
        assert_eq!(
            source_label(&serde_json::json!({"name": "AP", "icon": "x"})).as_deref(),
            Some("AP")
        );
        assert_eq!(source_label(&Value::Null), None);
    }
}
