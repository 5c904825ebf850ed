//! Publish + memory agents.
//!
//! Publish writes the winning entry as a Markdown artifact. Memory appends
//! one self-contained JSON line per run to a durable log; the two writes are
//! deliberately not transactional — memory is best-effort feedback, not the
//! system of record.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::io::AsyncWriteExt;
use tracing::info;

use daybook_common::{Draft, Publication, PublicationMeta, Selection, SenseBullet};

pub struct Publisher {
    output_dir: PathBuf,
}

impl Publisher {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub async fn run(
        &self,
        selection: &Selection,
        revisions: &[Draft],
        sensemaking: &[SenseBullet],
        review: Option<&str>,
    ) -> Result<Publication> {
        let revision_map: HashMap<&str, &Draft> =
            revisions.iter().map(|r| (r.id.as_str(), r)).collect();
        let winner = revision_map
            .get(selection.winner_id.as_str())
            .copied()
            .or_else(|| revisions.first());

        let entry = render_entry(winner, sensemaking);

        let name = if selection.winner_id.is_empty() {
            "draft"
        } else {
            selection.winner_id.as_str()
        };
        let output_path = self.output_dir.join(format!("entry-{name}.md"));

        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .with_context(|| format!("Failed to create {}", self.output_dir.display()))?;
        tokio::fs::write(&output_path, &entry)
            .await
            .with_context(|| format!("Failed to write {}", output_path.display()))?;

        info!(path = %output_path.display(), "Published entry");

        Ok(Publication {
            published_entry: entry,
            publish_path: output_path.display().to_string(),
            publication_meta: PublicationMeta {
                review: review.map(str::to_string),
                selection: selection.clone(),
            },
        })
    }
}

fn render_entry(revision: Option<&Draft>, sensemaking: &[SenseBullet]) -> String {
    let Some(revision) = revision else {
        return "No entry produced.".to_string();
    };

    let bullets = sensemaking
        .iter()
        .map(|item| {
            format!(
                "- **{}** ({}/{}): {}",
                item.theme, item.impact, item.uncertainty, item.why_it_matters
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let lede = if revision.lede.is_empty() {
        "Daybook"
    } else {
        revision.lede.as_str()
    };
    format!(
        "# {lede}\n\n{}\n\n## Why it matters\n{bullets}\n",
        revision.body
    )
}

pub struct MemoryWriter {
    memory_path: PathBuf,
}

impl MemoryWriter {
    pub fn new(memory_path: impl Into<PathBuf>) -> Self {
        Self {
            memory_path: memory_path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.memory_path
    }

    /// Append one frame to the memory log. Append-only: the log is never
    /// read back or rewritten here.
    pub async fn run(
        &self,
        publication: &Publication,
        planner_feedback: Option<&str>,
    ) -> Result<String> {
        if let Some(parent) = self.memory_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let frame = serde_json::json!({
            "published_entry": publication.published_entry,
            "metadata": publication.publication_meta,
            "planner_feedback": planner_feedback,
        });

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.memory_path)
            .await
            .with_context(|| format!("Failed to open {}", self.memory_path.display()))?;
        file.write_all(format!("{frame}\n").as_bytes()).await?;
        file.flush().await?;

        Ok(self.memory_path.display().to_string())
    }
}
