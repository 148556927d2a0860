use crate::config::OpenAiConfig;
use crate::core::generator::AnswerGenerator;
use crate::error::SeferError;
use crate::{err, map_err};
use serde::{Deserialize, Serialize};
use tracing::debug;

const DEFAULT_TEMPERATURE: f32 = 0.1;
const DEFAULT_MAX_TOKENS: usize = 1024;

/// Generates answers with `/v1/chat/completions`.
#[derive(Clone)]
pub struct OpenAiGenerator {
    endpoint: String,
    key: String,
    model: String,
    temperature: f32,
    max_tokens: usize,
    client: reqwest::Client,
}

impl OpenAiGenerator {
    pub fn new(config: &OpenAiConfig) -> Result<Self, SeferError> {
        let client = map_err!(reqwest::Client::builder().timeout(config.timeout).build());

        Ok(Self {
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            key: config.key.clone(),
            model: config.generation_model.clone(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            client,
        })
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn request<'a>(&'a self, prompt: &str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }
}

#[async_trait::async_trait]
impl AnswerGenerator for OpenAiGenerator {
    fn id(&self) -> &'static str {
        "openai"
    }

    async fn generate(&self, prompt: &str) -> Result<String, SeferError> {
        let request = self.request(prompt);

        let response = match self
            .client
            .post(format!("{}/v1/chat/completions", self.endpoint))
            .bearer_auth(&self.key)
            .json(&request)
            .send()
            .await
        {
            Ok(res) => res,
            Err(e) => return err!(Generation, "request failed: {e}"),
        };

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return err!(Generation, "{} responded with {status}: {body}", self.model);
        }

        let response = match response.json::<ChatResponse>().await {
            Ok(res) => res,
            Err(e) => return err!(Generation, "invalid response: {e}"),
        };

        answer_from(response)
    }
}

impl std::fmt::Debug for OpenAiGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiGenerator")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

fn answer_from(response: ChatResponse) -> Result<String, SeferError> {
    if let Some(usage) = response.usage {
        debug!(
            "Generated answer, used tokens {}-{} (prompt-total)",
            usage.prompt_tokens, usage.total_tokens
        );
    }

    match response.choices.into_iter().next() {
        Some(choice) => Ok(choice.message.content),
        None => err!(Generation, "response contains no choices"),
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: usize,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: usize,
    total_tokens: usize,
}
