use std::env;
use std::path::PathBuf;

use tracing::info;

/// Application configuration loaded from environment variables.
///
/// Constructed once at startup and passed by reference into every component
/// that needs it. Source credentials are all optional: a missing credential
/// disables exactly that evidence source.
#[derive(Debug, Clone)]
pub struct Config {
    // Generation providers
    pub anthropic_api_key: Option<String>,
    pub openai_api_key: Option<String>,

    // Evidence sources
    pub newsapi_api_key: Option<String>,
    pub serpapi_api_key: Option<String>,
    pub semantic_scholar_api_key: Option<String>,
    pub perplexity_api_key: Option<String>,

    // Planner
    pub default_plan: String,
    pub regions: Vec<String>,
    pub max_iterations: u32,

    // Cleaning
    pub max_per_domain: usize,

    // Artifact sinks
    pub artifact_dir: PathBuf,
    pub memory_path: PathBuf,
}

impl Config {
    /// Load configuration from environment variables.
    /// Panics with a clear message when a numeric var does not parse.
    pub fn from_env() -> Self {
        Self {
            anthropic_api_key: optional_env("ANTHROPIC_API_KEY"),
            openai_api_key: optional_env("OPENAI_API_KEY"),
            newsapi_api_key: optional_env("NEWSAPI_API_KEY"),
            serpapi_api_key: optional_env("SERPAPI_API_KEY"),
            semantic_scholar_api_key: optional_env("SEMANTIC_SCHOLAR_API_KEY"),
            perplexity_api_key: optional_env("PERPLEXITY_API_KEY"),
            default_plan: env::var("DAYBOOK_DEFAULT_PLAN").unwrap_or_else(|_| {
                "Coverage on climate, conflict, economy, and tech at global scale.".to_string()
            }),
            regions: env::var("DAYBOOK_REGIONS")
                .unwrap_or_else(|_| "americas,emea,apac".to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            max_iterations: env::var("DAYBOOK_MAX_ITERATIONS")
                .unwrap_or_else(|_| "12".to_string())
                .parse()
                .expect("DAYBOOK_MAX_ITERATIONS must be a number"),
            max_per_domain: env::var("DAYBOOK_MAX_PER_DOMAIN")
                .unwrap_or_else(|_| "12".to_string())
                .parse()
                .expect("DAYBOOK_MAX_PER_DOMAIN must be a number"),
            artifact_dir: env::var("DAYBOOK_ARTIFACT_DIR")
                .unwrap_or_else(|_| "artifacts".to_string())
                .into(),
            memory_path: env::var("DAYBOOK_MEMORY_PATH")
                .unwrap_or_else(|_| ".cache/newsroom_memory.jsonl".to_string())
                .into(),
        }
    }

    /// Log which providers are configured without leaking key material.
    pub fn log_redacted(&self) {
        info!(
            anthropic = self.anthropic_api_key.is_some(),
            openai = self.openai_api_key.is_some(),
            newsapi = self.newsapi_api_key.is_some(),
            serpapi = self.serpapi_api_key.is_some(),
            semantic_scholar = self.semantic_scholar_api_key.is_some(),
            perplexity = self.perplexity_api_key.is_some(),
            max_iterations = self.max_iterations,
            max_per_domain = self.max_per_domain,
            "Configuration loaded"
        );
    }
}

fn optional_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.is_empty())
}
