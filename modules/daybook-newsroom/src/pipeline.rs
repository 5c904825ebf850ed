//! The newsroom orchestrator.
//!
//! Eleven stages in a fixed linear order, one shared [`NewsroomState`]
//! threaded through all of them. Each stage produces a partial update which
//! the orchestrator merges before invoking the next stage — there is no
//! branching and no retry at this level. A fatal stage error (generation
//! backend unreachable, sink IO failure) aborts the run before anything is
//! published; recoverable degradation is handled inside the agents.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use uuid::Uuid;

use daybook_common::{
    Cluster, Config, DaybookError, DocumentRecord, Draft, Critique, NewsroomState, Publication,
    Selection, SenseBullet, Task,
};

use crate::adapters::SourceAdapter;
use crate::agents::planner::Planner;
use crate::agents::publish::{MemoryWriter, Publisher};
use crate::agents::retrieval::{Cleaner, ClusterAgent, Retriever, SourceOutcome, SourceReport};
use crate::agents::sensemaking::SenseMaker;
use crate::agents::writing::{Critic, Drafter, Reviser, Selector};
use crate::agents::Generators;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Plan,
    Retrieve,
    Clean,
    Cluster,
    Sense,
    Draft,
    Critique,
    Revise,
    Select,
    Publish,
    Memory,
}

impl Stage {
    pub const ORDER: [Stage; 11] = [
        Stage::Plan,
        Stage::Retrieve,
        Stage::Clean,
        Stage::Cluster,
        Stage::Sense,
        Stage::Draft,
        Stage::Critique,
        Stage::Revise,
        Stage::Select,
        Stage::Publish,
        Stage::Memory,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Stage::Plan => "plan",
            Stage::Retrieve => "retrieve",
            Stage::Clean => "clean",
            Stage::Cluster => "cluster",
            Stage::Sense => "sense",
            Stage::Draft => "draft",
            Stage::Critique => "critique",
            Stage::Revise => "revise",
            Stage::Select => "select",
            Stage::Publish => "publish",
            Stage::Memory => "memory",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Partial state update produced by one stage. Merging is additive: each
/// variant writes only the fields its stage owns.
pub enum StageUpdate {
    Plan {
        tasks: Vec<Task>,
        review: Option<String>,
    },
    Retrieve {
        raw_documents: Vec<DocumentRecord>,
        reports: Vec<SourceReport>,
    },
    Clean {
        clean_documents: Vec<DocumentRecord>,
    },
    Cluster {
        clusters: Vec<Cluster>,
    },
    Sense {
        sensemaking: Vec<SenseBullet>,
    },
    Draft {
        drafts: Vec<Draft>,
    },
    Critique {
        critiques: Vec<Critique>,
    },
    Revise {
        revisions: Vec<Draft>,
    },
    Select {
        selection: Selection,
    },
    Publish {
        publication: Publication,
    },
    Memory {
        memory_write: String,
    },
}

fn apply(state: &mut NewsroomState, update: StageUpdate) {
    match update {
        StageUpdate::Plan { tasks, review } => {
            state.tasks = tasks;
            state.review = review;
        }
        StageUpdate::Retrieve { raw_documents, .. } => state.raw_documents = raw_documents,
        StageUpdate::Clean { clean_documents } => state.clean_documents = clean_documents,
        StageUpdate::Cluster { clusters } => state.clusters = clusters,
        StageUpdate::Sense { sensemaking } => state.sensemaking = sensemaking,
        StageUpdate::Draft { drafts } => state.drafts = drafts,
        StageUpdate::Critique { critiques } => state.critiques = critiques,
        StageUpdate::Revise { revisions } => state.revisions = revisions,
        StageUpdate::Select { selection } => state.selection = Some(selection),
        StageUpdate::Publish { publication } => state.publication = Some(publication),
        StageUpdate::Memory { memory_write } => state.memory_write = Some(memory_write),
    }
}

/// Aggregated metrics for one run.
#[derive(Debug, Default)]
pub struct RunStats {
    pub source_reports: Vec<SourceReport>,
    pub raw_documents: usize,
    pub clean_documents: usize,
    pub clusters: usize,
    pub bullets: usize,
    pub drafts: usize,
    pub revisions: usize,
}

impl RunStats {
    fn observe(&mut self, update: &StageUpdate) {
        match update {
            StageUpdate::Retrieve {
                raw_documents,
                reports,
            } => {
                self.raw_documents = raw_documents.len();
                self.source_reports = reports.clone();
            }
            StageUpdate::Clean { clean_documents } => self.clean_documents = clean_documents.len(),
            StageUpdate::Cluster { clusters } => self.clusters = clusters.len(),
            StageUpdate::Sense { sensemaking } => self.bullets = sensemaking.len(),
            StageUpdate::Draft { drafts } => self.drafts = drafts.len(),
            StageUpdate::Revise { revisions } => self.revisions = revisions.len(),
            _ => {}
        }
    }
}

impl fmt::Display for RunStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\n=== Newsroom Run Complete ===")?;
        writeln!(f, "Raw documents:   {}", self.raw_documents)?;
        writeln!(f, "Clean documents: {}", self.clean_documents)?;
        writeln!(f, "Clusters:        {}", self.clusters)?;
        writeln!(f, "Bullets:         {}", self.bullets)?;
        writeln!(f, "Drafts:          {}", self.drafts)?;
        writeln!(f, "Revisions:       {}", self.revisions)?;
        writeln!(f, "\nSource calls:")?;
        for report in &self.source_reports {
            match &report.outcome {
                SourceOutcome::Fetched(n) => writeln!(f, "  {}: {} records", report.source, n)?,
                SourceOutcome::Unconfigured => {
                    writeln!(f, "  {}: skipped (no credential)", report.source)?
                }
                SourceOutcome::Failed(e) => writeln!(f, "  {}: failed ({})", report.source, e)?,
            }
        }
        Ok(())
    }
}

/// The assembled pipeline.
pub struct Newsroom {
    planner: Planner,
    retriever: Retriever,
    cleaner: Cleaner,
    cluster: ClusterAgent,
    sense: SenseMaker,
    drafter: Drafter,
    critic: Critic,
    reviser: Reviser,
    selector: Selector,
    publisher: Publisher,
    memory: MemoryWriter,
}

impl Newsroom {
    pub fn new(
        config: &Config,
        adapters: Vec<Arc<dyn SourceAdapter>>,
        generators: Generators,
    ) -> Self {
        Self {
            planner: Planner::new(
                generators.planner.clone(),
                generators.critic.clone(),
                config.max_iterations,
                config.regions.clone(),
            ),
            retriever: Retriever::new(adapters),
            cleaner: Cleaner::new(config.max_per_domain),
            cluster: ClusterAgent::new(generators.writer.clone()),
            sense: SenseMaker::new(generators.writer.clone()),
            drafter: Drafter::new(generators.writer.clone()),
            critic: Critic::new(generators.critic.clone()),
            reviser: Reviser::new(generators.writer),
            selector: Selector::new(generators.critic),
            publisher: Publisher::new(config.artifact_dir.clone()),
            memory: MemoryWriter::new(config.memory_path.clone()),
        }
    }

    pub async fn run(&self, directive: &str) -> Result<NewsroomState> {
        self.run_with_progress(directive, |_| {}).await
    }

    /// Run all stages, invoking `on_stage` after each one completes.
    pub async fn run_with_progress(
        &self,
        directive: &str,
        mut on_stage: impl FnMut(Stage),
    ) -> Result<NewsroomState> {
        let run_id = Uuid::new_v4();
        let mut state = NewsroomState {
            planner_directive: directive.to_string(),
            ..Default::default()
        };
        let mut stats = RunStats::default();

        for stage in Stage::ORDER {
            let update = self.execute(stage, &state).await?;
            stats.observe(&update);
            apply(&mut state, update);
            info!(run_id = %run_id, stage = stage.name(), "Stage complete");
            on_stage(stage);
        }

        info!("{stats}");
        Ok(state)
    }

    async fn execute(&self, stage: Stage, state: &NewsroomState) -> Result<StageUpdate> {
        Ok(match stage {
            Stage::Plan => {
                let plan = self.planner.run(&state.planner_directive).await?;
                StageUpdate::Plan {
                    tasks: plan.tasks,
                    review: plan.review,
                }
            }
            Stage::Retrieve => {
                let (raw_documents, reports) = self.retriever.run(&state.tasks).await;
                StageUpdate::Retrieve {
                    raw_documents,
                    reports,
                }
            }
            Stage::Clean => StageUpdate::Clean {
                clean_documents: self.cleaner.run(state.raw_documents.clone()),
            },
            Stage::Cluster => StageUpdate::Cluster {
                clusters: self.cluster.run(&state.clean_documents).await?,
            },
            Stage::Sense => StageUpdate::Sense {
                sensemaking: self.sense.run(&state.clusters, &state.clean_documents).await?,
            },
            Stage::Draft => StageUpdate::Draft {
                drafts: self
                    .drafter
                    .run(&state.planner_directive, &state.sensemaking)
                    .await?,
            },
            Stage::Critique => StageUpdate::Critique {
                critiques: self.critic.run(&state.drafts).await?,
            },
            Stage::Revise => StageUpdate::Revise {
                revisions: self.reviser.run(&state.drafts, &state.critiques).await?,
            },
            Stage::Select => StageUpdate::Select {
                selection: self
                    .selector
                    .run(&state.planner_directive, &state.revisions, &state.critiques)
                    .await?,
            },
            Stage::Publish => {
                let selection = state.selection.as_ref().ok_or_else(|| {
                    DaybookError::Invariant("publish reached without a selection".to_string())
                })?;
                StageUpdate::Publish {
                    publication: self
                        .publisher
                        .run(
                            selection,
                            &state.revisions,
                            &state.sensemaking,
                            state.review.as_deref(),
                        )
                        .await?,
                }
            }
            Stage::Memory => {
                let publication = state.publication.as_ref().ok_or_else(|| {
                    DaybookError::Invariant("memory reached without a publication".to_string())
                })?;
                StageUpdate::Memory {
                    memory_write: self
                        .memory
                        .run(publication, state.review.as_deref())
                        .await?,
                }
            }
        })
    }
}

/// Dump the final run state as pretty JSON to `path`, creating parent
/// directories as needed.
pub async fn write_state_snapshot(path: &Path, state: &NewsroomState) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(state)?;
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_order_is_the_eleven_stage_straight_line() {
        let names: Vec<_> = Stage::ORDER.iter().map(|s| s.name()).collect();
        assert_eq!(
            names,
            vec![
                "plan", "retrieve", "clean", "cluster", "sense", "draft", "critique", "revise",
                "select", "publish", "memory"
            ]
        );
    }

    #[test]
    fn apply_merges_only_owned_fields() {
        let mut state = NewsroomState {
            planner_directive: "d".to_string(),
            ..Default::default()
        };
        apply(
            &mut state,
            StageUpdate::Clean {
                clean_documents: Vec::new(),
            },
        );
        // Untouched fields survive the merge.
        assert_eq!(state.planner_directive, "d");
        assert!(state.clusters.is_empty());
    }
}
