//! Shared data types threaded through the newsroom pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Well-known metadata key: canonicalized URL, set during enrichment.
pub const META_CANONICAL_URL: &str = "canonical_url";
/// Well-known metadata key: host of the canonical URL, set during enrichment.
pub const META_DOMAIN: &str = "domain";

/// One unit of retrieved evidence with provenance metadata.
///
/// `id` is source-local (or URL-derived) and not globally unique across
/// sources until normalization has run. The open `metadata` map carries
/// provider-specific annotations; the two keys every stage depends on
/// (`canonical_url`, `domain`) get typed accessors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: String,
    pub title: String,
    pub summary: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl DocumentRecord {
    pub fn new(id: impl Into<String>, title: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            summary: summary.into(),
            url: None,
            source: None,
            published_at: None,
            score: None,
            metadata: Map::new(),
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_published_at(mut self, at: DateTime<Utc>) -> Self {
        self.published_at = Some(at);
        self
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Canonical URL from enrichment, if present.
    pub fn canonical_url(&self) -> Option<&str> {
        self.metadata.get(META_CANONICAL_URL).and_then(Value::as_str)
    }

    /// Domain from enrichment, if present.
    pub fn domain(&self) -> Option<&str> {
        self.metadata.get(META_DOMAIN).and_then(Value::as_str)
    }

    /// Insert a metadata annotation only when the key is absent.
    /// Enrichment relies on this to stay idempotent.
    pub fn set_meta_if_absent(&mut self, key: &str, value: Value) {
        self.metadata.entry(key.to_string()).or_insert(value);
    }
}

/// One planning unit driving a retrieval query.
///
/// The planner usually emits structured tasks; when its output cannot be
/// parsed, the directive itself becomes a single free-form task.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Task {
    Structured {
        #[serde(default)]
        title: String,
        #[serde(default)]
        region: String,
        #[serde(default)]
        theme: String,
        #[serde(default)]
        angle: String,
    },
    Free(String),
}

impl Task {
    pub fn free(text: impl Into<String>) -> Self {
        Task::Free(text.into())
    }

    /// Reduce the task to its retrieval query string.
    ///
    /// Structured tasks join the non-empty region/theme/angle fields with a
    /// single space, in that fixed order; free tasks are used verbatim.
    pub fn query(&self) -> String {
        match self {
            Task::Structured {
                region,
                theme,
                angle,
                ..
            } => [region, theme, angle]
                .into_iter()
                .filter(|part| !part.is_empty())
                .cloned()
                .collect::<Vec<_>>()
                .join(" "),
            Task::Free(text) => text.clone(),
        }
    }
}

/// A named group of record ids with a rationale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cluster {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub rationale: String,
    #[serde(default)]
    pub ids: Vec<String>,
}

/// One sense-making bullet derived from a cluster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SenseBullet {
    #[serde(default)]
    pub theme: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub impact: String,
    #[serde(default)]
    pub uncertainty: String,
    #[serde(default)]
    pub why_it_matters: String,
    #[serde(default)]
    pub citations: Vec<String>,
}

/// One narrative variant. Drafts and revisions share this shape; the `id`
/// is the stable key that threads critique and revision back to the draft
/// they belong to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Draft {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub lede: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub provenance_notes: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CritiqueScores {
    #[serde(default = "default_score")]
    pub factuality: f64,
    #[serde(default = "default_score")]
    pub balance: f64,
    #[serde(default = "default_score")]
    pub story: f64,
}

fn default_score() -> f64 {
    0.6
}

impl Default for CritiqueScores {
    fn default() -> Self {
        Self {
            factuality: default_score(),
            balance: default_score(),
            story: default_score(),
        }
    }
}

/// Review of one draft variant, keyed by the draft id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Critique {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub scores: CritiqueScores,
    #[serde(default)]
    pub revision_notes: String,
}

/// The selector's verdict. `winner_id` always names an existing revision —
/// the selection stage repairs unknown ids before storing this.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Selection {
    #[serde(default)]
    pub winner_id: String,
    #[serde(default)]
    pub justification: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicationMeta {
    pub review: Option<String>,
    pub selection: Selection,
}

/// Result of the publish stage: the rendered entry and where it was written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Publication {
    pub published_entry: String,
    pub publish_path: String,
    pub publication_meta: PublicationMeta,
}

/// The accumulating state threaded through all eleven stages.
///
/// Typed fields stand in for the stage-output-key mapping: a stage can only
/// observe fields that exist, and only the owning stage writes each one.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NewsroomState {
    pub planner_directive: String,
    pub tasks: Vec<Task>,
    pub review: Option<String>,
    pub raw_documents: Vec<DocumentRecord>,
    pub clean_documents: Vec<DocumentRecord>,
    pub clusters: Vec<Cluster>,
    pub sensemaking: Vec<SenseBullet>,
    pub drafts: Vec<Draft>,
    pub critiques: Vec<Critique>,
    pub revisions: Vec<Draft>,
    pub selection: Option<Selection>,
    pub publication: Option<Publication>,
    pub memory_write: Option<String>,
}
