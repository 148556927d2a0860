/// Chat completion generator for OpenAI compatible APIs.
pub mod openai;
