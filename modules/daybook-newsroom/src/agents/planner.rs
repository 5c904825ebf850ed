use std::sync::Arc;

use anyhow::Result;
use llm_client::{parse_json, GenPrompt, Parsed, TextGenerator};
use tracing::warn;

use daybook_common::Task;

/// Output of the planning stage.
#[derive(Debug, Clone)]
pub struct Plan {
    pub tasks: Vec<Task>,
    pub review: Option<String>,
}

/// Planner ↔ reviewer pair.
///
/// The planner turns a directive into a bounded list of structured search
/// tasks; the reviewer critiques the plan. The review text is carried
/// through the run verbatim and lands in the publication metadata.
pub struct Planner {
    planner: Arc<dyn TextGenerator>,
    critic: Arc<dyn TextGenerator>,
    max_iterations: u32,
    regions: Vec<String>,
}

impl Planner {
    pub fn new(
        planner: Arc<dyn TextGenerator>,
        critic: Arc<dyn TextGenerator>,
        max_iterations: u32,
        regions: Vec<String>,
    ) -> Self {
        Self {
            planner,
            critic,
            max_iterations,
            regions,
        }
    }

    pub async fn run(&self, directive: &str) -> Result<Plan> {
        let prompt = GenPrompt::new(format!(
            "Objective: {directive}\n\
             Target regions: {}\n\
             Produce up to {} retrieval tasks as a JSON list where each entry has \
             `title`, `region`, `theme`, and `angle`.",
            self.regions.join(", "),
            self.max_iterations,
        ))
        .preamble("You are the daybook planner.")
        .temperature(0.2);

        let response = self.planner.generate(&prompt).await?;
        let mut tasks = match parse_json::<Vec<Task>>(&response) {
            Parsed::Structured(tasks) if !tasks.is_empty() => tasks,
            Parsed::Structured(_) | Parsed::Fallback(_) => {
                warn!("Planner output unparseable, falling back to the directive as one task");
                vec![Task::free(directive)]
            }
        };
        tasks.truncate(self.max_iterations as usize);

        let plan_lines = tasks
            .iter()
            .map(|task| task.query())
            .collect::<Vec<_>>()
            .join("\n");
        let review_prompt = GenPrompt::new(format!(
            "Objective: {directive}\nPlan candidates:\n{plan_lines}\n\n\
             Return critique JSON with keys `balance` (0-1), `coverage_notes`, `risks`."
        ))
        .preamble("You are the daybook reviewer.")
        .temperature(0.1);
        let review = self.critic.generate(&review_prompt).await?;

        Ok(Plan {
            tasks,
            review: Some(review),
        })
    }
}
