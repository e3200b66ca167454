mod openai;
mod provider;

pub use openai::{DEFAULT_BASE_URL, MAX_BATCH_SIZE, OpenAIConfig, OpenAIEmbedder};
pub use provider::Embedder;

#[cfg(test)]
pub use provider::MockEmbedder;
