use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("invalid model: {0}")]
    InvalidModel(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[cfg(feature = "fe-local")]
    #[error("fastembed error: {0}")]
    Fastembed(String),

    #[cfg(feature = "openai")]
    #[error("openai error: {0}")]
    OpenAI(#[from] crate::openai::OpenAIError),

    #[cfg(feature = "openai")]
    #[error("http client error: {0}")]
    Reqwest(#[from] reqwest::Error),
}
