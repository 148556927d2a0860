use crate::config::OpenAiConfig;
use crate::core::embedder::Embedder;
use crate::error::SeferError;
use crate::{err, map_err};

pub use sefer_embedders::openai::OpenAiEmbeddings;

/// Create an embedder pinned to the configured embedding model.
///
/// Models missing from the known list need their vector size configured.
pub fn init(config: &OpenAiConfig) -> Result<OpenAiEmbeddings, SeferError> {
    let embedder = map_err!(OpenAiEmbeddings::new(&config.key, &config.embedding_model));
    let mut embedder = map_err!(embedder.with_timeout(config.timeout));
    embedder = embedder.with_endpoint(&config.endpoint);

    if let Some(size) = config.embedding_size {
        embedder = embedder.with_size(size);
    }

    if embedder.size().is_none() {
        return err!(
            ParseConfig,
            "unknown size for embedding model '{}'; set EMBEDDING_SIZE",
            config.embedding_model
        );
    }

    Ok(embedder)
}

#[async_trait::async_trait]
impl Embedder for OpenAiEmbeddings {
    fn id(&self) -> &'static str {
        "openai"
    }

    fn model(&self) -> String {
        OpenAiEmbeddings::model(self).to_string()
    }

    fn size(&self) -> usize {
        OpenAiEmbeddings::size(self).unwrap_or_default()
    }

    async fn embed(&self, content: &[&str]) -> Result<Vec<Vec<f64>>, SeferError> {
        Ok(map_err!(OpenAiEmbeddings::embed(self, content).await))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SeferErr;

    #[test]
    fn init_pins_model() {
        let config = OpenAiConfig {
            embedding_model: "text-embedding-3-large".to_string(),
            ..Default::default()
        };

        let embedder = init(&config).unwrap();
        let identity = Embedder::identity(&embedder);

        assert_eq!("openai", identity.provider);
        assert_eq!("text-embedding-3-large", identity.model);
        assert_eq!(3072, identity.dimensions);
    }

    #[test]
    fn init_requires_size_for_unknown_models() {
        let mut config = OpenAiConfig {
            embedding_model: "nomic-embed-text".to_string(),
            ..Default::default()
        };

        let err = init(&config).unwrap_err();
        assert!(matches!(err.error, SeferErr::ParseConfig(_)));

        config.embedding_size = Some(768);
        assert_eq!(768, Embedder::size(&init(&config).unwrap()));
    }
}
