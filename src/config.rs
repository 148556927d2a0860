use crate::app::source::sefaria::{SefariaConfig, DEFAULT_SEFARIA_URL};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// The default endpoint for OpenAI compatible providers.
pub const DEFAULT_OPENAI_ENDPOINT: &str = "https://api.openai.com";
/// The default model for building and querying indexes.
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
/// The default model for answering questions.
pub const DEFAULT_GENERATION_MODEL: &str = "gpt-4o-mini";
/// The default embedding provider.
pub const DEFAULT_EMBEDDER: &str = "openai";
/// Seconds after which any outgoing request is aborted.
const DEFAULT_TIMEOUT: u64 = 30;

#[derive(Debug, Parser)]
#[command(name = "sefer", version = "0.1", about = "Ask questions about scripture", long_about = None)]
pub struct StartArgs {
    #[clap(subcommand)]
    pub command: crate::cli::Execute,

    /// RUST_LOG string to use as the env filter.
    #[arg(short, long, global = true)]
    log: Option<String>,

    /// Endpoint of the OpenAI compatible API used for embeddings and generation.
    #[arg(long, global = true)]
    openai_endpoint: Option<String>,

    /// Embedding model, must be the same when building and querying an index.
    #[arg(long, global = true)]
    embedding_model: Option<String>,

    /// Vector size of the embedding model, required for models sefer does not know.
    #[arg(long, global = true)]
    embedding_size: Option<usize>,

    /// Model used to generate answers.
    #[arg(long, global = true)]
    generation_model: Option<String>,

    /// Sefaria instance to fetch texts from.
    #[arg(long, global = true)]
    sefaria_url: Option<String>,

    /// Request timeout in seconds.
    #[arg(long, global = true)]
    timeout: Option<String>,

    /// Embedding provider, `openai` or `fastembed`.
    #[arg(long, global = true)]
    embedder: Option<String>,

    /// Model used when the embedding provider is `fastembed`.
    #[cfg(feature = "fe-local")]
    #[arg(long, global = true)]
    fastembed_model: Option<String>,
}

/// Implement a getter method on [StartArgs], using the `$var` environment variable as a fallback
/// and the default if neither the argument nor the environment variable is set.
macro_rules! arg {
    ($id:ident, $var:literal, default $value:expr) => {
        impl StartArgs {
            pub fn $id(&self) -> String {
                match &self.$id {
                    Some(val) => val.to_string(),
                    None => match std::env::var($var) {
                        Ok(val) => val,
                        Err(_) => $value,
                    },
                }
            }
        }
    };
}

impl StartArgs {
    pub fn open_ai_key(&self) -> Option<String> {
        std::env::var("OPENAI_KEY").ok()
    }

    pub fn embedding_size(&self) -> Option<usize> {
        match self.embedding_size {
            Some(size) => Some(size),
            None => std::env::var("EMBEDDING_SIZE")
                .ok()
                .map(|size| size.parse().expect("EMBEDDING_SIZE must be a number")),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        let secs = self
            .timeout()
            .parse()
            .expect("Request timeout must be a number of seconds");
        Duration::from_secs(secs)
    }

    /// `None` when `OPENAI_KEY` is not set.
    pub fn openai_config(&self) -> Option<OpenAiConfig> {
        Some(OpenAiConfig {
            endpoint: self.openai_endpoint(),
            key: self.open_ai_key()?,
            embedding_model: self.embedding_model(),
            embedding_size: self.embedding_size(),
            generation_model: self.generation_model(),
            timeout: self.request_timeout(),
        })
    }

    pub fn sefaria_config(&self) -> SefariaConfig {
        SefariaConfig {
            base_url: self.sefaria_url(),
            timeout: self.request_timeout(),
            ..Default::default()
        }
    }
}

arg!(log,              "RUST_LOG",         default "info".to_string());
arg!(openai_endpoint,  "OPENAI_ENDPOINT",  default DEFAULT_OPENAI_ENDPOINT.to_string());
arg!(embedding_model,  "EMBEDDING_MODEL",  default DEFAULT_EMBEDDING_MODEL.to_string());
arg!(generation_model, "GENERATION_MODEL", default DEFAULT_GENERATION_MODEL.to_string());
arg!(sefaria_url,      "SEFARIA_URL",      default DEFAULT_SEFARIA_URL.to_string());
arg!(timeout,          "REQUEST_TIMEOUT",  default DEFAULT_TIMEOUT.to_string());
arg!(embedder,         "EMBEDDER",         default DEFAULT_EMBEDDER.to_string());

#[cfg(feature = "fe-local")]
arg!(fastembed_model,  "FASTEMBED_MODEL",  default crate::app::embedder::fastembed::DEFAULT_FASTEMBED_MODEL.to_string());

/// Everything needed to talk to an OpenAI compatible API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenAiConfig {
    pub endpoint: String,

    #[serde(skip)]
    pub key: String,

    pub embedding_model: String,

    /// Required when the embedding model is not a known OpenAI model.
    pub embedding_size: Option<usize>,

    pub generation_model: String,

    pub timeout: Duration,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_OPENAI_ENDPOINT.to_string(),
            key: String::new(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            embedding_size: None,
            generation_model: DEFAULT_GENERATION_MODEL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT),
        }
    }
}
