use core_config::{ConfigError, FromEnv, env_or_default, env_parse_or};

pub const DEFAULT_URL: &str = "http://localhost:8000";

/// Chroma connection configuration
#[derive(Debug, Clone)]
pub struct ChromaConfig {
    pub url: String,
    pub timeout_secs: u64,
}

impl ChromaConfig {
    pub fn new(url: String) -> Self {
        Self {
            url,
            timeout_secs: 30,
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Base of the v1 REST API, without a trailing slash
    pub fn api_base(&self) -> String {
        format!("{}/api/v1", self.url.trim_end_matches('/'))
    }
}

impl FromEnv for ChromaConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            url: env_or_default("CHROMA_URL", DEFAULT_URL),
            timeout_secs: env_parse_or("CHROMA_TIMEOUT_SECS", 30)?,
        })
    }
}

impl Default for ChromaConfig {
    fn default() -> Self {
        Self::new(DEFAULT_URL.to_string())
    }
}
