use thiserror::Error;

#[derive(Error, Debug)]
pub enum NagarnetraError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Detection error: {0}")]
    Detection(String),

    #[error("Insight error: {0}")]
    Insight(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
