use thiserror::Error;

#[derive(Error, Debug)]
pub enum TraceLensError {
    #[error("Evidence store error: {0}")]
    Store(String),

    #[error("Reasoning service error: {0}")]
    Reasoning(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Malformed service response: {0}")]
    MalformedResponse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
