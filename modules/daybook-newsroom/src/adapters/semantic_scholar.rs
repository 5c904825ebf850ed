use anyhow::Result;
use async_trait::async_trait;
use daybook_common::{provenance, DocumentRecord};
use serde::Deserialize;
use serde_json::Value;

use super::{parse_timestamp, SourceAdapter};

const SEARCH_URL: &str = "https://api.semanticscholar.org/graph/v1/paper/search";
const MAX_RESULTS: u32 = 10;
const FIELDS: &str = "title,url,abstract,publicationDate,tldr,externalIds,authors";

/// Semantic Scholar paper-search adapter.
///
/// The API works without a key (rate-limited); a configured key is sent as
/// `x-api-key`.
pub struct SemanticScholarAdapter {
    api_key: Option<String>,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<Paper>,
}

#[derive(Debug, Deserialize)]
struct Paper {
    #[serde(rename = "paperId")]
    paper_id: Option<String>,
    title: Option<String>,
    #[serde(rename = "abstract")]
    abstract_text: Option<String>,
    url: Option<String>,
    #[serde(rename = "publicationDate")]
    publication_date: Option<String>,
    score: Option<f64>,
    tldr: Option<Tldr>,
    #[serde(rename = "externalIds", default)]
    external_ids: Value,
    #[serde(default)]
    authors: Vec<Author>,
    #[serde(rename = "openAccessPdf")]
    open_access_pdf: Option<OpenAccessPdf>,
}

#[derive(Debug, Deserialize)]
struct Tldr {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Author {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAccessPdf {
    url: Option<String>,
}

impl SemanticScholarAdapter {
    pub fn new(api_key: Option<String>, client: reqwest::Client) -> Self {
        Self { api_key, client }
    }
}

#[async_trait]
impl SourceAdapter for SemanticScholarAdapter {
    fn name(&self) -> &'static str {
        "semantic_scholar"
    }

    async fn search(&self, query: &str) -> Result<Vec<DocumentRecord>> {
        let mut request = self
            .client
            .get(SEARCH_URL)
            .query(&[
                ("query", query),
                ("limit", &MAX_RESULTS.to_string()),
                ("fields", FIELDS),
            ])
            .header("accept", "application/json");
        if let Some(ref api_key) = self.api_key {
            request = request.header("x-api-key", api_key);
        }

        let response: SearchResponse = request
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let records = response
            .data
            .into_iter()
            .map(|paper| {
                let summary = paper
                    .tldr
                    .and_then(|t| t.text)
                    .or(paper.abstract_text)
                    .unwrap_or_else(|| "No summary".to_string());
                let authors: Vec<Value> = paper
                    .authors
                    .into_iter()
                    .map(|author| author.name.into())
                    .collect();
                let mut record = DocumentRecord::new(
                    paper.paper_id.unwrap_or_default(),
                    paper.title.unwrap_or_else(|| "Untitled".to_string()),
                    summary,
                )
                .with_source("Semantic Scholar")
                .with_metadata("authors", authors.into())
                .with_metadata("external_ids", paper.external_ids);
                if let Some(url) = paper
                    .url
                    .or_else(|| paper.open_access_pdf.and_then(|pdf| pdf.url))
                {
                    record = record.with_url(url);
                }
                if let Some(at) = paper
                    .publication_date
                    .as_deref()
                    .and_then(parse_timestamp)
                {
                    record = record.with_published_at(at);
                }
                if let Some(score) = paper.score {
                    record = record.with_score(score);
                }
                record
            })
            .collect();

        Ok(provenance::normalize(records))
    }
}
