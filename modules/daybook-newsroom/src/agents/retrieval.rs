//! Retrieval fan-out, cleaning, and cluster agents.

use std::sync::Arc;

use anyhow::Result;
use futures::future::join_all;
use llm_client::{parse_json, util::truncate_to_char_boundary, GenPrompt, Parsed, TextGenerator};
use serde::Serialize;
use tracing::{info, warn};

use daybook_common::{provenance, Cluster, DocumentRecord, Task};

use crate::adapters::SourceAdapter;

/// Why a source contributed what it did to one task's fan-out.
///
/// The pipeline never branches on this — it exists so a run report can
/// distinguish "no credential" from "transport error" from "no results".
#[derive(Debug, Clone, Serialize)]
pub enum SourceOutcome {
    Fetched(usize),
    Unconfigured,
    Failed(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceReport {
    pub source: String,
    pub outcome: SourceOutcome,
}

/// Concurrent multi-source retrieval.
///
/// Tasks are processed one at a time; within a task every adapter is queried
/// concurrently and the step waits for all of them to settle. A failed call
/// is treated as "no records" and never affects sibling sources or later
/// tasks.
pub struct Retriever {
    adapters: Vec<Arc<dyn SourceAdapter>>,
}

impl Retriever {
    pub fn new(adapters: Vec<Arc<dyn SourceAdapter>>) -> Self {
        Self { adapters }
    }

    pub async fn run(&self, tasks: &[Task]) -> (Vec<DocumentRecord>, Vec<SourceReport>) {
        let mut records = Vec::new();
        let mut reports = Vec::new();

        for task in tasks {
            let query = task.query();

            let settled = join_all(self.adapters.iter().map(|adapter| {
                let query = query.clone();
                async move {
                    if !adapter.configured() {
                        return (adapter.name(), SourceOutcome::Unconfigured, Vec::new());
                    }
                    match adapter.search(&query).await {
                        Ok(batch) => (adapter.name(), SourceOutcome::Fetched(batch.len()), batch),
                        Err(e) => {
                            warn!(source = adapter.name(), query = query.as_str(), error = %e, "Source search failed");
                            (adapter.name(), SourceOutcome::Failed(e.to_string()), Vec::new())
                        }
                    }
                }
            }))
            .await;

            for (source, outcome, batch) in settled {
                reports.push(SourceReport {
                    source: source.to_string(),
                    outcome,
                });
                records.extend(batch);
            }
        }

        info!(tasks = tasks.len(), records = records.len(), "Retrieval fan-out complete");
        (records, reports)
    }
}

/// Normalize, sort by recency, and cap each domain bucket.
pub struct Cleaner {
    max_per_domain: usize,
}

impl Cleaner {
    pub fn new(max_per_domain: usize) -> Self {
        Self { max_per_domain }
    }

    pub fn run(&self, records: Vec<DocumentRecord>) -> Vec<DocumentRecord> {
        let mut normalized = provenance::normalize(records);
        provenance::sort_by_recency_desc(&mut normalized);

        let mut curated = Vec::new();
        for (_, bucket) in provenance::cluster_by_domain(normalized) {
            curated.extend(bucket.into_iter().take(self.max_per_domain));
        }
        curated
    }
}

/// Theme clustering over the cleaned records.
pub struct ClusterAgent {
    writer: Arc<dyn TextGenerator>,
}

impl ClusterAgent {
    pub fn new(writer: Arc<dyn TextGenerator>) -> Self {
        Self { writer }
    }

    pub async fn run(&self, records: &[DocumentRecord]) -> Result<Vec<Cluster>> {
        let doc_lines = records
            .iter()
            .map(|record| {
                format!(
                    "- ({}) [{}] {} :: {}",
                    record.id,
                    record.source.as_deref().unwrap_or("unknown"),
                    record.title,
                    truncate_to_char_boundary(&record.summary, 200),
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        let prompt = GenPrompt::new(format!(
            "You receive cleaned news records:\n{doc_lines}\n\
             Group them by theme. Respond with a JSON list where each entry has \
             `label`, `rationale`, and `ids`.",
        ))
        .temperature(0.5);

        let response = self.writer.generate(&prompt).await?;
        let clusters = match parse_json::<Vec<Cluster>>(&response) {
            Parsed::Structured(clusters) => clusters,
            Parsed::Fallback(raw) => {
                warn!("Cluster output unparseable, substituting a single misc cluster");
                vec![Cluster {
                    label: "misc".to_string(),
                    rationale: raw,
                    ids: records.iter().map(|r| r.id.clone()).collect(),
                }]
            }
        };
        Ok(clusters)
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::{Duration, Utc};

    use super::*;

    struct StaticSource {
        name: &'static str,
        records: Vec<DocumentRecord>,
    }

    #[async_trait]
    impl SourceAdapter for StaticSource {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn search(&self, _query: &str) -> Result<Vec<DocumentRecord>> {
            Ok(self.records.clone())
        }
    }

    struct FailingSource;

    #[async_trait]
    impl SourceAdapter for FailingSource {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn search(&self, _query: &str) -> Result<Vec<DocumentRecord>> {
            anyhow::bail!("connection refused")
        }
    }

    struct UnconfiguredSource;

    #[async_trait]
    impl SourceAdapter for UnconfiguredSource {
        fn name(&self) -> &'static str {
            "unconfigured"
        }

        fn configured(&self) -> bool {
            false
        }

        async fn search(&self, _query: &str) -> Result<Vec<DocumentRecord>> {
            Ok(Vec::new())
        }
    }

    fn doc(id: &str, url: &str) -> DocumentRecord {
        DocumentRecord::new(id, format!("title {id}"), "summary").with_url(url)
    }

    #[tokio::test]
    async fn failed_source_is_isolated_from_siblings() {
        let retriever = Retriever::new(vec![
            Arc::new(StaticSource {
                name: "a",
                records: vec![doc("a1", "https://a.example/1")],
            }),
            Arc::new(FailingSource),
            Arc::new(StaticSource {
                name: "c",
                records: vec![doc("c1", "https://c.example/1")],
            }),
        ]);

        let (records, reports) = retriever.run(&[Task::free("anything")]).await;

        let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a1", "c1"]);
        assert!(reports
            .iter()
            .any(|r| r.source == "failing" && matches!(r.outcome, SourceOutcome::Failed(_))));
    }

    #[tokio::test]
    async fn unconfigured_source_reports_skip_reason() {
        let retriever = Retriever::new(vec![
            Arc::new(UnconfiguredSource),
            Arc::new(StaticSource {
                name: "a",
                records: vec![doc("a1", "https://a.example/1")],
            }),
        ]);

        let (records, reports) = retriever.run(&[Task::free("q")]).await;
        assert_eq!(records.len(), 1);
        assert!(reports
            .iter()
            .any(|r| r.source == "unconfigured" && matches!(r.outcome, SourceOutcome::Unconfigured)));
    }

    #[tokio::test]
    async fn tasks_are_aggregated_across_the_run() {
        let retriever = Retriever::new(vec![Arc::new(StaticSource {
            name: "a",
            records: vec![doc("a1", "https://a.example/1")],
        })]);

        let (records, reports) = retriever
            .run(&[Task::free("first"), Task::free("second")])
            .await;
        assert_eq!(records.len(), 2);
        assert_eq!(reports.len(), 2);
    }

    #[test]
    fn cleaner_caps_buckets_and_keeps_most_recent() {
        let now = Utc::now();
        let mut records = Vec::new();
        for i in 0..5 {
            records.push(
                doc(&format!("d{i}"), &format!("https://bulk.example/{i}"))
                    .with_published_at(now - Duration::days(i)),
            );
        }
        records.push(doc("other", "https://other.example/x").with_published_at(now));

        let curated = Cleaner::new(3).run(records);

        let bulk: Vec<_> = curated
            .iter()
            .filter(|r| r.domain() == Some("bulk.example"))
            .map(|r| r.id.as_str())
            .collect();
        // The three most recent survive the cap, newest first.
        assert_eq!(bulk, vec!["d0", "d1", "d2"]);
        assert!(curated.iter().any(|r| r.id == "other"));
    }

    struct ScriptedGen(String);

    #[async_trait]
    impl TextGenerator for ScriptedGen {
        async fn generate(&self, _prompt: &GenPrompt) -> Result<String> {
            Ok(self.0.clone())
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    #[tokio::test]
    async fn cluster_parse_failure_yields_misc_cluster_over_all_ids() {
        let agent = ClusterAgent::new(Arc::new(ScriptedGen(
            "these records are mostly about storms".to_string(),
        )));
        let records = vec![doc("x1", "https://a.example/1"), doc("x2", "https://b.example/2")];

        let clusters = agent.run(&records).await.unwrap();
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].label, "misc");
        assert_eq!(clusters[0].ids, vec!["x1", "x2"]);
        assert!(clusters[0].rationale.contains("storms"));
    }
}
