//! Chroma test infrastructure
//!
//! Provides a `TestChroma` helper that runs a Chroma server in a container.

use testcontainers::core::{IntoContainerPort, WaitFor};
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, GenericImage, ImageExt};

const CHROMA_IMAGE: &str = "chromadb/chroma";
/// Last release line serving the v1 REST API
const CHROMA_TAG: &str = "0.4.24";
const CHROMA_PORT: u16 = 8000;

/// Test Chroma wrapper that ensures proper cleanup
///
/// The container is stopped and removed when this struct is dropped.
///
/// # Example
///
/// ```no_run
/// use test_utils::TestChroma;
///
/// # async fn example() {
/// let chroma = TestChroma::new().await;
/// let url = chroma.url();
/// // Point a ChromaConfig at `url`
/// # }
/// ```
pub struct TestChroma {
    #[allow(dead_code)]
    container: ContainerAsync<GenericImage>,
    url: String,
}

impl TestChroma {
    /// Start a Chroma server with `ALLOW_RESET` enabled
    pub async fn new() -> Self {
        let container = GenericImage::new(CHROMA_IMAGE, CHROMA_TAG)
            .with_exposed_port(CHROMA_PORT.tcp())
            .with_wait_for(WaitFor::message_on_either_std("Application startup complete"))
            .with_env_var("ALLOW_RESET", "TRUE")
            .with_env_var("ANONYMIZED_TELEMETRY", "FALSE")
            .start()
            .await
            .expect("Failed to start Chroma container");

        let host_port = container
            .get_host_port_ipv4(CHROMA_PORT.tcp())
            .await
            .expect("Failed to get Chroma port");

        let url = format!("http://127.0.0.1:{}", host_port);

        tracing::info!(port = host_port, tag = CHROMA_TAG, "Test Chroma ready");

        Self { container, url }
    }

    /// Base URL of the server (no trailing slash)
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Drop for TestChroma {
    fn drop(&mut self) {
        tracing::debug!("Cleaning up test Chroma container");
    }
}
