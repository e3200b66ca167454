use async_trait::async_trait;

use crate::error::CollectionResult;

/// Turns text into embedding vectors.
///
/// Implementations must keep order: the vector at index `i` of
/// [`get_embeddings_batch`](Embedder::get_embeddings_batch) belongs to input `i`.
/// A failed batch returns an error and no partial vectors.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a single document
    async fn get_embeddings(&self, content: &str) -> CollectionResult<Vec<f32>>;

    /// Embed several documents in one round trip
    async fn get_embeddings_batch(&self, contents: &[String]) -> CollectionResult<Vec<Vec<f32>>>;
}
