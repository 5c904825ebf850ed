//! Pipeline stage agents.
//!
//! Each agent is a thin adapter over the retrieval fan-out, the provenance
//! engine, or a text-generation backend. Generation-backed agents parse
//! model output through `llm_client::parse_json` and substitute well-typed
//! fallback values when parsing fails — a degraded stage never aborts a run.

pub mod planner;
pub mod publish;
pub mod retrieval;
pub mod sensemaking;
pub mod writing;

use std::sync::Arc;

use daybook_common::{Config, DaybookError};
use llm_client::{Claude, OpenAi, TextGenerator};

const CLAUDE_PLANNER_MODEL: &str = "claude-3-5-sonnet-20240620";
const CLAUDE_CRITIC_MODEL: &str = "claude-3-haiku-20240307";
const OPENAI_MODEL: &str = "gpt-4o-mini";

/// The three generation roles the newsroom uses. Anthropic handles planning
/// and critique when its key is present; OpenAI handles writing when its key
/// is present; either provider covers the rest.
#[derive(Clone)]
pub struct Generators {
    pub planner: Arc<dyn TextGenerator>,
    pub writer: Arc<dyn TextGenerator>,
    pub critic: Arc<dyn TextGenerator>,
}

impl Generators {
    pub fn from_config(config: &Config) -> Result<Self, DaybookError> {
        match (&config.anthropic_api_key, &config.openai_api_key) {
            (Some(anthropic), openai) => {
                let writer: Arc<dyn TextGenerator> = match openai {
                    Some(key) => Arc::new(OpenAi::new(key, OPENAI_MODEL)),
                    None => Arc::new(Claude::new(anthropic, CLAUDE_PLANNER_MODEL)),
                };
                Ok(Self {
                    planner: Arc::new(Claude::new(anthropic, CLAUDE_PLANNER_MODEL)),
                    writer,
                    critic: Arc::new(Claude::new(anthropic, CLAUDE_CRITIC_MODEL)),
                })
            }
            (None, Some(openai)) => {
                let model: Arc<dyn TextGenerator> = Arc::new(OpenAi::new(openai, OPENAI_MODEL));
                Ok(Self {
                    planner: model.clone(),
                    writer: model.clone(),
                    critic: model,
                })
            }
            (None, None) => Err(DaybookError::Config(
                "no generation provider configured: set ANTHROPIC_API_KEY or OPENAI_API_KEY"
                    .to_string(),
            )),
        }
    }
}
