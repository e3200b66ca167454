use std::time::Duration;

use async_trait::async_trait;
use core_config::{ConfigError, FromEnv, env_or_default, env_parse_or, env_required};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::Embedder;
use crate::error::{CollectionError, CollectionResult, Upstream, decode, read_body};
use crate::models::EmbeddingModel;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Maximum number of inputs OpenAI accepts in one embeddings request
pub const MAX_BATCH_SIZE: usize = 2048;

/// OpenAI embedding provider configuration
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: EmbeddingModel,
    pub timeout_secs: u64,
}

impl OpenAIConfig {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: EmbeddingModel::default(),
            timeout_secs: 30,
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn with_model(mut self, model: EmbeddingModel) -> Self {
        self.model = model;
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    fn embeddings_url(&self) -> String {
        format!("{}/embeddings", self.base_url.trim_end_matches('/'))
    }
}

impl FromEnv for OpenAIConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let Ok(model) = env_or_default("OPENAI_EMBEDDING_MODEL", "text-embedding-ada-002")
            .parse::<EmbeddingModel>();

        Ok(Self {
            api_key: env_required("OPENAI_API_KEY")?,
            base_url: env_or_default("OPENAI_BASE_URL", DEFAULT_BASE_URL),
            model,
            timeout_secs: env_parse_or("OPENAI_TIMEOUT_SECS", 30)?,
        })
    }
}

/// Embedder backed by an OpenAI-compatible `/embeddings` endpoint.
///
/// All requests go through the instance's own [`Client`], so base URL, timeout
/// and connection pool come from the caller's configuration.
pub struct OpenAIEmbedder {
    client: Client,
    config: OpenAIConfig,
}

impl OpenAIEmbedder {
    pub fn new(config: OpenAIConfig) -> CollectionResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self::with_client(config, client))
    }

    /// Use a preconfigured HTTP client (shared pool, custom TLS, test server)
    pub fn with_client(config: OpenAIConfig, client: Client) -> Self {
        Self { client, config }
    }

    pub fn from_env() -> CollectionResult<Self> {
        Self::new(OpenAIConfig::from_env()?)
    }

    pub fn model(&self) -> &EmbeddingModel {
        &self.config.model
    }

    async fn request(&self, input: EmbeddingInput<'_>) -> CollectionResult<EmbeddingResponse> {
        let request = EmbeddingRequest {
            model: self.config.model.model_name(),
            input,
        };

        let response = self
            .client
            .post(self.config.embeddings_url())
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let body = read_body(Upstream::EmbeddingProvider, response).await?;
        let response: EmbeddingResponse = decode(body)?;

        if response.data.is_empty() {
            return Err(CollectionError::EmptyEmbeddings);
        }

        Ok(response)
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum EmbeddingInput<'a> {
    Single(&'a str),
    Batch(&'a [String]),
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: EmbeddingInput<'a>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
    #[serde(default)]
    model: String,
    #[serde(default)]
    usage: EmbeddingUsage,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    #[serde(default)]
    index: usize,
}

#[derive(Debug, Default, Deserialize)]
struct EmbeddingUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    total_tokens: u32,
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    async fn get_embeddings(&self, content: &str) -> CollectionResult<Vec<f32>> {
        let response = self.request(EmbeddingInput::Single(content)).await?;

        tracing::debug!(
            embedding_model_used = %response.model,
            prompt_tokens_used = response.usage.prompt_tokens,
            total_tokens_used = response.usage.total_tokens,
            "openai embedding token usage"
        );

        // One input, so the first entry is the answer regardless of its index
        response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or(CollectionError::EmptyEmbeddings)
    }

    async fn get_embeddings_batch(&self, contents: &[String]) -> CollectionResult<Vec<Vec<f32>>> {
        if contents.is_empty() {
            return Ok(vec![]);
        }

        if contents.len() > MAX_BATCH_SIZE {
            return Err(CollectionError::Validation(format!(
                "batch of {} inputs exceeds the provider limit of {}",
                contents.len(),
                MAX_BATCH_SIZE
            )));
        }

        let response = self.request(EmbeddingInput::Batch(contents)).await?;

        tracing::trace!(
            inputs = contents.len(),
            embedding_model_used = %response.model,
            total_tokens_used = response.usage.total_tokens,
            "openai batch embedding token usage"
        );

        if response.data.len() != contents.len() {
            return Err(CollectionError::EmbeddingCountMismatch {
                expected: contents.len(),
                actual: response.data.len(),
            });
        }

        // Entries may arrive in any order; index ties them back to the request
        let mut data = response.data;
        data.sort_by_key(|d| d.index);

        Ok(data.into_iter().map(|d| d.embedding).collect())
    }
}
