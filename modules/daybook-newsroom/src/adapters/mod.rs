//! Evidence-source adapters.
//!
//! Each adapter wraps one search/retrieval provider behind the
//! [`SourceAdapter`] contract and runs its own output through
//! `provenance::normalize` before returning it.

pub mod newsapi;
pub mod openai_web;
pub mod perplexity;
pub mod semantic_scholar;
pub mod serpapi;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use daybook_common::{Config, DocumentRecord};

pub use newsapi::NewsApiAdapter;
pub use openai_web::OpenAiWebSearchAdapter;
pub use perplexity::PerplexityAdapter;
pub use semantic_scholar::SemanticScholarAdapter;
pub use serpapi::SerpApiNewsAdapter;

/// Contract for wrappers around search / retrieval providers.
///
/// An unconfigured adapter (missing credential) returns an empty list, not
/// an error, so the fan-out treats "unconfigured" identically to "no
/// results".
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether the adapter holds the credential it needs. Purely
    /// informational — `search` already degrades to an empty result.
    fn configured(&self) -> bool {
        true
    }

    async fn search(&self, query: &str) -> Result<Vec<DocumentRecord>>;
}

/// Instantiate every adapter the configuration enables credentials for.
/// Adapters without a credential are still constructed; they report
/// `configured() == false` and answer every query with an empty list.
pub fn adapter_suite(config: &Config, http: reqwest::Client) -> Vec<Arc<dyn SourceAdapter>> {
    vec![
        Arc::new(SemanticScholarAdapter::new(
            config.semantic_scholar_api_key.clone(),
            http.clone(),
        )),
        Arc::new(PerplexityAdapter::new(
            config.perplexity_api_key.clone(),
            http.clone(),
        )),
        Arc::new(SerpApiNewsAdapter::new(
            config.serpapi_api_key.clone(),
            http.clone(),
        )),
        Arc::new(NewsApiAdapter::new(config.newsapi_api_key.clone(), http.clone())),
        Arc::new(OpenAiWebSearchAdapter::new(
            config.openai_api_key.clone(),
            http,
        )),
    ]
}

/// Lenient ISO-8601 parse: full timestamps (with or without `Z`) and bare
/// dates both work; anything else is `None`.
pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Utc
            .from_local_datetime(&date.and_hms_opt(0, 0, 0)?)
            .single();
    }
    None
}
