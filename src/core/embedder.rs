use crate::error::SeferError;
use serde::{Deserialize, Serialize};

/// Identifies the exact embedding configuration vectors were produced with.
/// Vectors are only comparable when every field matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelIdentity {
    /// Embedder ID, e.g. `openai`.
    pub provider: String,

    /// Model name as understood by the provider.
    pub model: String,

    /// Length of every vector the model outputs.
    pub dimensions: usize,
}

impl std::fmt::Display for ModelIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{} ({})", self.provider, self.model, self.dimensions)
    }
}

/// # CORE
/// Turns text into vectors. Every instance is pinned to a single model.
#[async_trait::async_trait]
pub trait Embedder {
    fn id(&self) -> &'static str;

    /// The model this instance embeds with.
    fn model(&self) -> String;

    /// The length of every output vector.
    fn size(&self) -> usize;

    fn identity(&self) -> ModelIdentity {
        ModelIdentity {
            provider: self.id().to_string(),
            model: self.model(),
            dimensions: self.size(),
        }
    }

    /// Get the vectors for the elements in `content`, in the same order.
    /// The content passed in can be a user's query or a batch of chunks.
    ///
    /// * `content`: The text to embed.
    async fn embed(&self, content: &[&str]) -> Result<Vec<Vec<f64>>, SeferError>;
}
