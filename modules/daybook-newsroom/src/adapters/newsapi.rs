use anyhow::Result;
use async_trait::async_trait;
use daybook_common::{provenance, DocumentRecord};
use serde::Deserialize;

use super::{parse_timestamp, SourceAdapter};

const ENDPOINT: &str = "https://newsapi.org/v2/everything";
const MAX_RESULTS: u32 = 10;

/// NewsAPI `/v2/everything` adapter for structured global coverage.
pub struct NewsApiAdapter {
    api_key: Option<String>,
    client: reqwest::Client,
    language: String,
}

#[derive(Debug, Deserialize)]
struct EverythingResponse {
    #[serde(default)]
    articles: Vec<Article>,
}

#[derive(Debug, Deserialize)]
struct Article {
    source: Option<ArticleSource>,
    author: Option<String>,
    title: Option<String>,
    description: Option<String>,
    content: Option<String>,
    url: Option<String>,
    #[serde(rename = "urlToImage")]
    url_to_image: Option<String>,
    #[serde(rename = "publishedAt")]
    published_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ArticleSource {
    name: Option<String>,
}

impl NewsApiAdapter {
    pub fn new(api_key: Option<String>, client: reqwest::Client) -> Self {
        Self {
            api_key,
            client,
            language: "en".to_string(),
        }
    }
}

#[async_trait]
impl SourceAdapter for NewsApiAdapter {
    fn name(&self) -> &'static str {
        "newsapi"
    }

    fn configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn search(&self, query: &str) -> Result<Vec<DocumentRecord>> {
        let Some(ref api_key) = self.api_key else {
            return Ok(Vec::new());
        };

        let response: EverythingResponse = self
            .client
            .get(ENDPOINT)
            .query(&[
                ("q", query),
                ("language", &self.language),
                ("sortBy", "publishedAt"),
                ("pageSize", &MAX_RESULTS.to_string()),
            ])
            .header("X-Api-Key", api_key)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let records = response
            .articles
            .into_iter()
            .take(MAX_RESULTS as usize)
            .enumerate()
            .map(|(idx, article)| {
                let id = article
                    .url
                    .clone()
                    .unwrap_or_else(|| format!("newsapi-{idx}"));
                let summary = article
                    .description
                    .or(article.content)
                    .unwrap_or_default();
                let mut record = DocumentRecord::new(
                    id,
                    article.title.unwrap_or_else(|| "Untitled article".to_string()),
                    summary,
                )
                .with_metadata("author", article.author.into())
                .with_metadata("image", article.url_to_image.into());
                if let Some(url) = article.url {
                    record = record.with_url(url);
                }
                if let Some(name) = article.source.and_then(|s| s.name) {
                    record = record.with_source(name);
                }
                if let Some(at) = article.published_at.as_deref().and_then(parse_timestamp) {
                    record = record.with_published_at(at);
                }
                record
            })
            .collect();

        Ok(provenance::normalize(records))
    }
}
