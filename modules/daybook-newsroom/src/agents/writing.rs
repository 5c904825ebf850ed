//! Draft → critique → revision → selection agents.
//!
//! From the draft stage onward every work item carries a stable `id`.
//! Critique and revision look items up by id through a map built once at
//! stage start, never by position, so reordering cannot misattribute
//! feedback.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use llm_client::{parse_json, GenPrompt, Parsed, TextGenerator};
use tracing::warn;

use daybook_common::{Critique, Draft, Selection, SenseBullet};

pub struct Drafter {
    writer: Arc<dyn TextGenerator>,
    variants: usize,
}

impl Drafter {
    pub fn new(writer: Arc<dyn TextGenerator>) -> Self {
        Self { writer, variants: 2 }
    }

    pub async fn run(&self, directive: &str, bullets: &[SenseBullet]) -> Result<Vec<Draft>> {
        let prompt = GenPrompt::new(format!(
            "Planner directive:\n{directive}\nSense-making bullets:\n{}\n\n\
             Produce {} narrative variants as a JSON list where each entry has \
             `id`, `lede`, `body`, and `provenance_notes`.",
            serde_json::to_string_pretty(bullets)?,
            self.variants,
        ))
        .preamble("You are the lead writer for the daybook.")
        .temperature(0.5);

        let response = self.writer.generate(&prompt).await?;
        let drafts = match parse_json::<Vec<Draft>>(&response) {
            Parsed::Structured(drafts) if !drafts.is_empty() => drafts,
            Parsed::Structured(_) | Parsed::Fallback(_) => {
                warn!("Draft output unparseable, substituting a single raw-body draft");
                vec![Draft {
                    id: "draft-1".to_string(),
                    lede: String::new(),
                    body: response,
                    provenance_notes: String::new(),
                }]
            }
        };
        Ok(drafts)
    }
}

pub struct Critic {
    critic: Arc<dyn TextGenerator>,
}

impl Critic {
    pub fn new(critic: Arc<dyn TextGenerator>) -> Self {
        Self { critic }
    }

    pub async fn run(&self, drafts: &[Draft]) -> Result<Vec<Critique>> {
        let mut critiques = Vec::with_capacity(drafts.len());
        for draft in drafts {
            let prompt = GenPrompt::new(format!(
                "Review the following draft variant for factuality, balance, and narrative clarity.\n\
                 Draft JSON:\n{}\n\n\
                 Respond with JSON containing `scores` (0-1 for factuality/balance/story) \
                 and `revision_notes`.",
                serde_json::to_string_pretty(draft)?,
            ))
            .temperature(0.1);

            let response = self.critic.generate(&prompt).await?;
            let mut critique = match parse_json::<Critique>(&response) {
                Parsed::Structured(critique) => critique,
                Parsed::Fallback(raw) => Critique {
                    id: String::new(),
                    scores: Default::default(),
                    revision_notes: raw,
                },
            };
            critique.id = draft.id.clone();
            critiques.push(critique);
        }
        Ok(critiques)
    }
}

pub struct Reviser {
    writer: Arc<dyn TextGenerator>,
}

impl Reviser {
    pub fn new(writer: Arc<dyn TextGenerator>) -> Self {
        Self { writer }
    }

    pub async fn run(&self, drafts: &[Draft], critiques: &[Critique]) -> Result<Vec<Draft>> {
        let critique_map: HashMap<&str, &Critique> =
            critiques.iter().map(|c| (c.id.as_str(), c)).collect();

        let mut revised = Vec::with_capacity(drafts.len());
        for draft in drafts {
            let critique = critique_map.get(draft.id.as_str()).copied();
            let prompt = GenPrompt::new(format!(
                "You are revising a newsroom draft.\nDraft:\n{}\nCritique:\n{}\n\
                 Return improved draft JSON with the same keys.",
                serde_json::to_string_pretty(draft)?,
                match critique {
                    Some(c) => serde_json::to_string_pretty(c)?,
                    None => "{}".to_string(),
                },
            ))
            .temperature(0.5);

            let response = self.writer.generate(&prompt).await?;
            let mut revision = match parse_json::<Draft>(&response) {
                Parsed::Structured(revision) => revision,
                Parsed::Fallback(raw) => Draft {
                    body: raw,
                    ..draft.clone()
                },
            };
            // The revision always keeps the originating draft's id.
            revision.id = draft.id.clone();
            revised.push(revision);
        }
        Ok(revised)
    }
}

pub struct Selector {
    critic: Arc<dyn TextGenerator>,
}

impl Selector {
    pub fn new(critic: Arc<dyn TextGenerator>) -> Self {
        Self { critic }
    }

    /// Pick the winning revision. The result always names an existing
    /// revision when any exist: an unknown `winner_id` (hallucinated or
    /// from a parse fallback) is repaired to the first revision in input
    /// order.
    pub async fn run(
        &self,
        directive: &str,
        revisions: &[Draft],
        critiques: &[Critique],
    ) -> Result<Selection> {
        let prompt = GenPrompt::new(format!(
            "Select the best version for publication.\n\
             Directive: {directive}\n\
             Revisions: {}\n\
             Critiques: {}\n\
             Respond with JSON `winner_id` and `justification`.",
            serde_json::to_string_pretty(revisions)?,
            serde_json::to_string_pretty(critiques)?,
        ))
        .temperature(0.1);

        let response = self.critic.generate(&prompt).await?;
        let mut selection = match parse_json::<Selection>(&response) {
            Parsed::Structured(selection) => selection,
            Parsed::Fallback(raw) => Selection {
                winner_id: String::new(),
                justification: raw,
            },
        };

        let known = revisions.iter().any(|r| r.id == selection.winner_id);
        if !known {
            if let Some(first) = revisions.first() {
                warn!(
                    declared = selection.winner_id.as_str(),
                    fallback = first.id.as_str(),
                    "Winner id matches no revision, falling back to first"
                );
                selection.winner_id = first.id.clone();
            }
        }
        Ok(selection)
    }
}
