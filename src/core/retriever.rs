use crate::core::chunk::Chunk;
use crate::core::provider::DynEmbedder;
use crate::core::vector::VectorIndex;
use crate::err;
use crate::error::SeferError;
use serde::Serialize;
use tracing::debug;

/// Separates chunks in the assembled context.
const CONTEXT_SEPARATOR: &str = "\n\n";

pub const DEFAULT_K: usize = 5;

#[derive(Debug, Clone, Serialize)]
pub struct RetrievedChunk {
    pub chunk: Chunk,
    pub distance: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Retrieval {
    /// Chunk texts, nearest first, separated by a blank line.
    pub context: String,

    pub hits: Vec<RetrievedChunk>,
}

/// Finds the chunks relevant to a question and assembles them into context.
pub struct Retriever {
    index: VectorIndex,
    embedder: DynEmbedder,
}

impl Retriever {
    /// Errors if `embedder` is not the one `index` was built with.
    pub fn new(index: VectorIndex, embedder: DynEmbedder) -> Result<Self, SeferError> {
        index.ensure_compatible(&embedder.identity())?;
        Ok(Self { index, embedder })
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    /// The text of the `k` chunks nearest to `question`.
    pub async fn retrieve(&self, question: &str, k: usize) -> Result<String, SeferError> {
        Ok(self.retrieve_hits(question, k).await?.context)
    }

    /// Same as [Self::retrieve], also returning the chunks the context consists of.
    pub async fn retrieve_hits(&self, question: &str, k: usize) -> Result<Retrieval, SeferError> {
        if k == 0 {
            return Ok(Retrieval {
                context: String::new(),
                hits: vec![],
            });
        }

        let mut vectors = self.embedder.embed(&[question]).await?;

        let Some(query) = vectors.pop() else {
            return err!(Embedding, "no vector returned for question");
        };

        let hits = self
            .index
            .search(&query, k)?
            .into_iter()
            .map(|hit| RetrievedChunk {
                chunk: hit.entry.chunk.clone(),
                distance: hit.distance,
            })
            .collect::<Vec<_>>();

        debug!("Retrieved {} chunks", hits.len());

        let context = hits
            .iter()
            .map(|hit| hit.chunk.text.as_str())
            .collect::<Vec<_>>()
            .join(CONTEXT_SEPARATOR);

        Ok(Retrieval { context, hits })
    }
}
