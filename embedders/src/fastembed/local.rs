use crate::error::EmbeddingError;
use fastembed::{EmbeddingModel, ModelInfo};

pub const DEFAULT_FASTEMBED_MODEL: &str = "intfloat/multilingual-e5-small";

/// Fastembed running in process, pinned to a single model for its whole lifetime.
pub struct LocalFastEmbedder {
    model: ModelInfo<EmbeddingModel>,
    embedding: fastembed::TextEmbedding,
}

impl LocalFastEmbedder {
    /// Load `model` (its model code, e.g. `intfloat/multilingual-e5-small`).
    /// Downloads the model files on first use.
    pub fn new(model: &str) -> Result<Self, EmbeddingError> {
        let Some(info) = list_models().into_iter().find(|m| m.model_code == model) else {
            return Err(EmbeddingError::InvalidModel(format!(
                "model '{model}' not supported by fastembed"
            )));
        };

        tracing::info!("Setting up text embedding model: {}", info.model_code);

        let embedding = fastembed::TextEmbedding::try_new(
            fastembed::InitOptions::new(info.model.clone()).with_show_download_progress(true),
        )
        .map_err(|e| EmbeddingError::Fastembed(e.to_string()))?;

        Ok(Self {
            model: info,
            embedding,
        })
    }

    pub fn model(&self) -> &str {
        &self.model.model_code
    }

    pub fn size(&self) -> usize {
        self.model.dim
    }

    pub fn list_models(&self) -> Vec<ModelInfo<EmbeddingModel>> {
        list_models()
    }

    pub fn embed(&self, content: &[&str]) -> Result<Vec<Vec<f64>>, EmbeddingError> {
        if content.is_empty() {
            return Err(EmbeddingError::InvalidInput(
                "cannot be empty (len = 0)".to_string(),
            ));
        }

        let embeddings = self
            .embedding
            .embed(content.to_vec(), None)
            .map_err(|e| EmbeddingError::Fastembed(e.to_string()))?;

        if embeddings.len() != content.len() {
            return Err(EmbeddingError::InvalidResponse(format!(
                "expected {} embeddings, got {}",
                content.len(),
                embeddings.len()
            )));
        }

        Ok(embeddings
            .into_iter()
            .map(|e| e.into_iter().map(|e| e as f64).collect())
            .collect())
    }
}

fn list_models() -> Vec<ModelInfo<EmbeddingModel>> {
    const MODEL_LIST: &[EmbeddingModel] = &[
        EmbeddingModel::MultilingualE5Small,
        EmbeddingModel::MultilingualE5Base,
        EmbeddingModel::MultilingualE5Large,
        EmbeddingModel::BGESmallENV15,
        EmbeddingModel::AllMiniLML6V2,
    ];

    fastembed::TextEmbedding::list_supported_models()
        .into_iter()
        .filter(|model| MODEL_LIST.contains(&model.model))
        .collect()
}

impl std::fmt::Debug for LocalFastEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalFastEmbedder")
            .field("model", &self.model.model_code)
            .field("size", &self.model.dim)
            .finish()
    }
}
