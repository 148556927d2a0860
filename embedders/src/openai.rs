use crate::error::EmbeddingError;
use serde::{Deserialize, Serialize};
use std::error::Error as _;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_OPENAI_ENDPOINT: &str = "https://api.openai.com";
pub const DEFAULT_OPENAI_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for OpenAI compatible `/v1/embeddings` endpoints, pinned to one model.
pub struct OpenAiEmbeddings {
    endpoint: String,
    key: String,
    model: String,
    size: Option<usize>,
    client: reqwest::Client,
}

impl OpenAiEmbeddings {
    /// Create a client for `model` using the default endpoint and timeout.
    pub fn new(api_key: &str, model: &str) -> Result<Self, EmbeddingError> {
        Ok(Self {
            endpoint: DEFAULT_OPENAI_ENDPOINT.to_string(),
            key: api_key.to_string(),
            model: model.to_string(),
            size: known_size(model),
            client: client(DEFAULT_OPENAI_TIMEOUT)?,
        })
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.trim_end_matches('/').to_string();
        self
    }

    /// Every request will fail once `timeout` elapses.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, EmbeddingError> {
        self.client = client(timeout)?;
        Ok(self)
    }

    /// Declare the vector size for models not in [Self::list_embedding_models].
    pub fn with_size(mut self, size: usize) -> Self {
        self.size = Some(size);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Vector size of the pinned model, if known.
    pub fn size(&self) -> Option<usize> {
        self.size
    }

    pub fn list_embedding_models(&self) -> Vec<(String, usize)> {
        MODELS
            .iter()
            .map(|(model, size)| (model.to_string(), *size))
            .collect()
    }

    /// Embed `input`. The output vectors are in the same order as the input.
    pub async fn embed(&self, input: &[&str]) -> Result<Vec<Vec<f64>>, EmbeddingError> {
        if input.is_empty() {
            return Err(EmbeddingError::InvalidInput(format!(
                "cannot be empty (len = {})",
                input.len()
            )));
        }

        let request = EmbeddingRequest {
            model: self.model.clone(),
            input: input.iter().map(|s| s.to_string()).collect(),
        };

        let response = match self
            .client
            .post(format!("{}/v1/embeddings", self.endpoint))
            .bearer_auth(&self.key)
            .json(&request)
            .send()
            .await
        {
            Ok(res) => res,
            Err(e) => {
                tracing::error!("Error in OpenAI request: {e}");
                return Err(EmbeddingError::Reqwest(e));
            }
        };

        if !response.status().is_success() {
            tracing::error!(
                "Request to {} failed with status {}",
                response.url(),
                response.status()
            );
            let response = match response.json::<OpenAIError>().await {
                Ok(res) => res,
                Err(e) => {
                    tracing::error!("Error reading OpenAI response: {}", e);
                    tracing::error!("Source: {:?}", e.source());
                    return Err(EmbeddingError::Reqwest(e));
                }
            };
            return Err(EmbeddingError::OpenAI(response));
        }

        let response = match response.json::<EmbeddingResponse>().await {
            Ok(res) => res,
            Err(e) => {
                tracing::error!("Error decoding OpenAI response: {}", e);
                tracing::error!("Source: {:?}", e.source());
                return Err(EmbeddingError::Reqwest(e));
            }
        };

        debug!(
            "Embedded {} chunk(s) with '{}', used tokens {}-{} (prompt-total)",
            input.len(),
            response.model,
            response.usage.prompt_tokens,
            response.usage.total_tokens
        );

        into_ordered(response.data, input.len())
    }
}

/// Order the returned embeddings by their index and make sure there is one per input.
fn into_ordered(
    mut data: Vec<EmbeddingObject>,
    expected: usize,
) -> Result<Vec<Vec<f64>>, EmbeddingError> {
    if data.len() != expected {
        return Err(EmbeddingError::InvalidResponse(format!(
            "expected {expected} embeddings, got {}",
            data.len()
        )));
    }

    data.sort_by_key(|obj| obj.index);

    Ok(data.into_iter().map(|obj| obj.embedding).collect())
}

fn client(timeout: Duration) -> Result<reqwest::Client, EmbeddingError> {
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}

fn known_size(model: &str) -> Option<usize> {
    MODELS
        .iter()
        .find_map(|(name, size)| (*name == model).then_some(*size))
}

impl std::fmt::Debug for OpenAiEmbeddings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiEmbeddings")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("size", &self.size)
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest {
    model: String,
    input: Vec<String>,
}

#[allow(dead_code)]
#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    object: String,
    data: Vec<EmbeddingObject>,
    model: String,
    usage: Usage,
}

#[allow(dead_code)]
#[derive(Debug, Deserialize)]
struct EmbeddingObject {
    object: String,
    embedding: Vec<f64>,
    index: usize,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: usize,
    total_tokens: usize,
}

#[derive(Debug, Deserialize, Error)]
#[error("{message}, type: {r#type}, param: {param:?}, code: {code:?}")]
pub struct OpenAIErrorParams {
    pub message: String,
    pub r#type: String,
    pub param: Option<String>,
    pub code: Option<String>,
}

#[derive(Debug, Deserialize, Error)]
#[error("Open AI error response {{ {error} }}")]
pub struct OpenAIError {
    pub error: OpenAIErrorParams,
}

const TEXT_EMBEDDING_3_LARGE: &str = "text-embedding-3-large";
const TEXT_EMBEDDING_3_SMALL: &str = "text-embedding-3-small";
const TEXT_EMBEDDING_ADA_002: &str = "text-embedding-ada-002";

const MODELS: &[(&str, usize)] = &[
    (TEXT_EMBEDDING_3_LARGE, 3072),
    (TEXT_EMBEDDING_3_SMALL, 1536),
    (TEXT_EMBEDDING_ADA_002, 1536),
];
