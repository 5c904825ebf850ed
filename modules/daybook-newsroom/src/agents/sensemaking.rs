//! Sense-making: clusters plus provenance in, impact/uncertainty bullets out.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use llm_client::{parse_json, GenPrompt, Parsed, TextGenerator};
use tracing::warn;

use daybook_common::{Cluster, DocumentRecord, SenseBullet};

pub struct SenseMaker {
    writer: Arc<dyn TextGenerator>,
}

impl SenseMaker {
    pub fn new(writer: Arc<dyn TextGenerator>) -> Self {
        Self { writer }
    }

    pub async fn run(
        &self,
        clusters: &[Cluster],
        documents: &[DocumentRecord],
    ) -> Result<Vec<SenseBullet>> {
        let doc_map: HashMap<&str, &DocumentRecord> =
            documents.iter().map(|record| (record.id.as_str(), record)).collect();

        let cluster_lines = clusters
            .iter()
            .map(|cluster| {
                let refs = resolve_refs(cluster, &doc_map);
                format!(
                    "* {}: {} :: refs={:?}",
                    cluster.label, cluster.rationale, refs
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        let prompt = GenPrompt::new(format!(
            "Clusters with provenance:\n{cluster_lines}\n\n\
             For each cluster respond with JSON containing:\n\
             - `theme`\n- `summary`\n- `impact` (High/Med/Low)\n\
             - `uncertainty` (High/Med/Low)\n- `why_it_matters`\n\
             - `citations` (array of source URLs)",
        ))
        .preamble("You are a newsroom sense-maker.")
        .temperature(0.5);

        let response = self.writer.generate(&prompt).await?;
        let bullets = match parse_json::<Vec<SenseBullet>>(&response) {
            Parsed::Structured(bullets) => bullets,
            Parsed::Fallback(raw) => {
                warn!("Sense-making output unparseable, substituting a single general bullet");
                vec![SenseBullet {
                    theme: "general".to_string(),
                    summary: raw,
                    impact: "Med".to_string(),
                    uncertainty: "Med".to_string(),
                    why_it_matters: String::new(),
                    citations: Vec::new(),
                }]
            }
        };
        Ok(bullets)
    }
}

/// Resolve a cluster's record ids against the document map, silently
/// dropping ids that do not resolve. Dangling ids are a data-quality issue
/// upstream, never a crash here.
fn resolve_refs(cluster: &Cluster, doc_map: &HashMap<&str, &DocumentRecord>) -> Vec<String> {
    cluster
        .ids
        .iter()
        .filter_map(|id| doc_map.get(id.as_str()))
        .map(|record| {
            format!(
                "{}: {}",
                record.source.as_deref().unwrap_or("unknown"),
                record.title
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;

    fn doc(id: &str, title: &str) -> DocumentRecord {
        DocumentRecord::new(id, title, "summary").with_source("wire")
    }

    #[test]
    fn dangling_ids_are_dropped_silently() {
        let records = vec![doc("x1", "present story")];
        let doc_map: HashMap<&str, &DocumentRecord> =
            records.iter().map(|r| (r.id.as_str(), r)).collect();
        let cluster = Cluster {
            label: "storms".to_string(),
            rationale: "weather".to_string(),
            ids: vec!["x1".to_string(), "x9".to_string()],
        };

        let refs = resolve_refs(&cluster, &doc_map);
        assert_eq!(refs, vec!["wire: present story"]);
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
    async fn parse_failure_yields_general_fallback_bullet() {
        let maker = SenseMaker::new(Arc::new(ScriptedGen("prose, not JSON".to_string())));
        let clusters = vec![Cluster {
            label: "misc".to_string(),
            rationale: "".to_string(),
            ids: vec!["x1".to_string()],
        }];
        let bullets = maker.run(&clusters, &[doc("x1", "t")]).await.unwrap();
        assert_eq!(bullets.len(), 1);
        assert_eq!(bullets[0].theme, "general");
        assert_eq!(bullets[0].impact, "Med");
    }

    #[tokio::test]
    async fn structured_bullets_pass_through() {
        let maker = SenseMaker::new(Arc::new(ScriptedGen(
            r#"[{"theme":"storms","summary":"s","impact":"High","uncertainty":"Low",
                 "why_it_matters":"w","citations":["https://a.example/1"]}]"#
                .to_string(),
        )));
        let bullets = maker.run(&[], &[]).await.unwrap();
        assert_eq!(bullets[0].theme, "storms");
        assert_eq!(bullets[0].citations.len(), 1);
    }
}
