use core_config::ConfigError;
use reqwest::StatusCode;
use thiserror::Error;

/// Remote service a protocol error came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum Upstream {
    #[strum(serialize = "embedding provider")]
    EmbeddingProvider,
    #[strum(serialize = "vector store")]
    VectorStore,
}

#[derive(Debug, Error)]
pub enum CollectionError {
    /// Connection, TLS or timeout failure before a response arrived
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{upstream} request failed. Status: {status} Response: {body}")]
    Protocol {
        upstream: Upstream,
        status: StatusCode,
        body: String,
    },

    #[error("Failed to decode response: {source}\nresponse body: {body}")]
    Decode {
        #[source]
        source: serde_json::Error,
        body: String,
    },

    #[error("No embeddings returned")]
    EmptyEmbeddings,

    #[error("Embedder returned {actual} embeddings for {expected} inputs")]
    EmbeddingCountMismatch { expected: usize, actual: usize },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Collection not found: {0}")]
    CollectionNotFound(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type CollectionResult<T> = Result<T, CollectionError>;

impl From<ConfigError> for CollectionError {
    fn from(err: ConfigError) -> Self {
        CollectionError::Config(err.to_string())
    }
}

impl CollectionError {
    /// HTTP status of a protocol error, if this is one
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            CollectionError::Protocol { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Read a response body, turning non-success statuses into [`CollectionError::Protocol`].
pub(crate) async fn read_body(
    upstream: Upstream,
    response: reqwest::Response,
) -> CollectionResult<String> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(CollectionError::Protocol {
            upstream,
            status,
            body,
        });
    }

    Ok(body)
}

/// Decode a JSON body, keeping the raw text for diagnostics on failure.
pub(crate) fn decode<T: serde::de::DeserializeOwned>(body: String) -> CollectionResult<T> {
    serde_json::from_str(&body).map_err(|source| CollectionError::Decode { source, body })
}
