use crate::{core::embedder::Embedder, error::SeferError, map_err};

pub use sefer_embedders::fastembed::local::{LocalFastEmbedder, DEFAULT_FASTEMBED_MODEL};

/// Load the local model. Downloads it on first use.
pub fn init(model: &str) -> Result<LocalFastEmbedder, SeferError> {
    Ok(map_err!(LocalFastEmbedder::new(model)))
}

#[async_trait::async_trait]
impl Embedder for LocalFastEmbedder {
    fn id(&self) -> &'static str {
        "fastembed"
    }

    fn model(&self) -> String {
        LocalFastEmbedder::model(self).to_string()
    }

    fn size(&self) -> usize {
        LocalFastEmbedder::size(self)
    }

    async fn embed(&self, content: &[&str]) -> Result<Vec<Vec<f64>>, SeferError> {
        Ok(map_err!(LocalFastEmbedder::embed(self, content)))
    }
}
