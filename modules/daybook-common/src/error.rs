use thiserror::Error;

#[derive(Error, Debug)]
pub enum DaybookError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Retrieval error: {0}")]
    Retrieval(String),

    #[error("Publish error: {0}")]
    Publish(String),

    #[error("State invariant violated: {0}")]
    Invariant(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
