use async_trait::async_trait;

use crate::error::CollectionResult;
use crate::models::{
    AddRecords, CollectionInfo, CreateCollection, DeleteQuery, GetQuery, GetResult, NearestQuery,
    QueryResult,
};

/// Remote vector store operations.
///
/// A thin transport contract: implementations send each call as one request
/// and surface the store's own validation errors unchanged. Collection-scoped
/// calls address the collection by its store id.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CollectionRepository: Send + Sync {
    // ===== Server =====

    /// Liveness probe, returns the server clock in nanoseconds
    async fn heartbeat(&self) -> CollectionResult<u64>;

    /// Drop every collection (only if the server allows it)
    async fn reset(&self) -> CollectionResult<bool>;

    // ===== Collection Management =====

    async fn create_collection(&self, input: CreateCollection) -> CollectionResult<CollectionInfo>;

    /// `Ok(None)` when no collection has this name
    async fn get_collection(&self, name: &str) -> CollectionResult<Option<CollectionInfo>>;

    async fn list_collections(&self) -> CollectionResult<Vec<CollectionInfo>>;

    async fn delete_collection(&self, name: &str) -> CollectionResult<()>;

    // ===== Document Operations =====

    async fn add(&self, collection_id: &str, records: AddRecords) -> CollectionResult<()>;

    async fn get(&self, collection_id: &str, query: GetQuery) -> CollectionResult<GetResult>;

    async fn count(&self, collection_id: &str) -> CollectionResult<usize>;

    async fn query(&self, collection_id: &str, query: NearestQuery)
    -> CollectionResult<QueryResult>;

    /// Returns the ids that were removed
    async fn delete(&self, collection_id: &str, query: DeleteQuery)
    -> CollectionResult<Vec<String>>;
}
