use crate::error::SeferError;
use serde::{Deserialize, Serialize};

const DEFAULT_ANSWER_LANGUAGE: &str = "Hebrew";

/// # CORE
/// Black box text completion.
#[async_trait::async_trait]
pub trait AnswerGenerator {
    fn id(&self) -> &'static str;

    /// Complete `prompt`. Failures are reported as generation errors.
    async fn generate(&self, prompt: &str) -> Result<String, SeferError>;
}

/// Prompt asking the model to answer strictly from the retrieved context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptTemplate {
    /// The language the answer should be written in.
    pub language: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self {
            language: DEFAULT_ANSWER_LANGUAGE.to_string(),
        }
    }
}

impl PromptTemplate {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
        }
    }

    pub fn render(&self, context: &str, question: &str) -> String {
        format!(
            "Use the following context to answer the question at the end.\n\
             If you don't know the answer from the context provided, just say that you don't know.\n\
             Answer in {}.\n\
             \n\
             Context:\n\
             {context}\n\
             \n\
             Question:\n\
             {question}\n\
             \n\
             Answer:\n",
            self.language
        )
    }
}
