use anyhow::Result;
use async_trait::async_trait;

/// A single generation request: optional system preamble, user content,
/// and sampling temperature.
#[derive(Debug, Clone)]
pub struct GenPrompt {
    pub system: Option<String>,
    pub user: String,
    pub temperature: f32,
}

impl GenPrompt {
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            system: None,
            user: user.into(),
            temperature: 0.2,
        }
    }

    pub fn preamble(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

/// Contract for text-generation backends.
///
/// `generate` may fail (network, auth, rate limit) — callers treat that as
/// fatal. Output that does not parse as the expected structure is a separate,
/// recoverable condition handled by [`crate::parse::parse_json`].
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &GenPrompt) -> Result<String>;

    fn name(&self) -> &str;
}
