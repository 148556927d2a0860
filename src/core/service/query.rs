use crate::core::generator::PromptTemplate;
use crate::core::provider::{DynEmbedder, DynGenerator};
use crate::core::retriever::{RetrievedChunk, Retriever};
use crate::core::vector::VectorIndex;
use crate::error::SeferError;
use serde::Serialize;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub question: String,

    /// The context the answer was generated from.
    pub context: String,

    pub answer: String,

    /// The chunks the context consists of, nearest first.
    pub sources: Vec<RetrievedChunk>,
}

/// Answers questions grounded in the chunks of a single index.
pub struct QueryService {
    retriever: Retriever,
    generator: DynGenerator,
    prompt: PromptTemplate,
}

impl QueryService {
    pub fn new(retriever: Retriever, generator: DynGenerator) -> Self {
        Self {
            retriever,
            generator,
            prompt: PromptTemplate::default(),
        }
    }

    /// Load the index at `path` for use with `embedder`.
    pub async fn open(
        path: impl AsRef<Path>,
        embedder: DynEmbedder,
        generator: DynGenerator,
    ) -> Result<Self, SeferError> {
        let index = VectorIndex::load_for(path, &embedder.identity()).await?;
        let retriever = Retriever::new(index, embedder)?;
        Ok(Self::new(retriever, generator))
    }

    pub fn with_prompt(mut self, prompt: PromptTemplate) -> Self {
        self.prompt = prompt;
        self
    }

    /// Retrieve the `k` most relevant chunks and generate an answer from them.
    pub async fn answer(&self, question: &str, k: usize) -> Result<Answer, SeferError> {
        info!(
            "Answering question: {question}, searching {} chunks",
            self.retriever.index().len()
        );

        let retrieval = self.retriever.retrieve_hits(question, k).await?;

        info!("Retrieved context:\n{}", retrieval.context);

        let prompt = self.prompt.render(&retrieval.context, question);

        info!("Generating answer with '{}'", self.generator.id());

        let answer = self.generator.generate(&prompt).await?;

        Ok(Answer {
            question: question.to_string(),
            context: retrieval.context,
            answer,
            sources: retrieval.hits,
        })
    }
}
