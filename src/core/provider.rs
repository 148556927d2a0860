use super::{embedder::Embedder, generator::AnswerGenerator, source::TextSource};
use crate::error::SeferError;
use std::sync::Arc;

pub type DynEmbedder = Arc<dyn Embedder + Send + Sync>;
pub type DynGenerator = Arc<dyn AnswerGenerator + Send + Sync>;
pub type DynTextSource = Arc<dyn TextSource + Send + Sync>;

/// Provider factories are used to decouple concrete implementations from the business logic.
///
/// The concrete instances are obtained by their IDs, e.g. the embedder ID recorded
/// in an index manifest.
pub trait ProviderFactory<T> {
    fn get_provider(&self, input: &str) -> Result<T, SeferError>;

    fn list_provider_ids(&self) -> Vec<&'static str>;

    fn register(&mut self, id: &'static str, provider: T);
}
