use std::sync::Arc;

use core_config::FromEnv;
use tracing::info;

use crate::chroma::{ChromaConfig, ChromaRepository};
use crate::collection::Collection;
use crate::error::{CollectionError, CollectionResult};
use crate::models::{CollectionInfo, CreateCollection, DistanceMetric, Metadata};
use crate::repository::CollectionRepository;

/// Entry point for collection lifecycle operations
///
/// Collections are never created implicitly: callers either create one
/// explicitly or look up an existing one.
pub struct CollectionService<R: CollectionRepository> {
    repository: Arc<R>,
}

impl<R: CollectionRepository> Clone for CollectionService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}

impl CollectionService<ChromaRepository> {
    /// Service talking to a Chroma server
    pub fn chroma(config: ChromaConfig) -> CollectionResult<Self> {
        Ok(Self::new(ChromaRepository::new(config)?))
    }

    /// Chroma service configured from `CHROMA_*` environment variables
    pub fn from_env() -> CollectionResult<Self> {
        Self::chroma(ChromaConfig::from_env()?)
    }
}

impl<R: CollectionRepository> CollectionService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    // ===== Server =====

    pub async fn heartbeat(&self) -> CollectionResult<u64> {
        self.repository.heartbeat().await
    }

    pub async fn reset(&self) -> CollectionResult<bool> {
        self.repository.reset().await
    }

    // ===== Collection Management =====

    /// Create a collection. Whether an existing name is an error is up to the store.
    pub async fn create_collection(
        &self,
        name: &str,
        metric: DistanceMetric,
        metadata: Option<Metadata>,
    ) -> CollectionResult<Collection<R>> {
        self.create(CreateCollection {
            name: name.to_string(),
            metric,
            metadata,
            get_or_create: false,
        })
        .await
    }

    /// Create a collection, or return the existing one with this name
    pub async fn get_or_create_collection(
        &self,
        name: &str,
        metric: DistanceMetric,
        metadata: Option<Metadata>,
    ) -> CollectionResult<Collection<R>> {
        self.create(CreateCollection {
            name: name.to_string(),
            metric,
            metadata,
            get_or_create: true,
        })
        .await
    }

    async fn create(&self, input: CreateCollection) -> CollectionResult<Collection<R>> {
        if input.name.trim().is_empty() {
            return Err(CollectionError::Validation(
                "collection name must not be empty".to_string(),
            ));
        }

        let info = self.repository.create_collection(input).await?;
        info!(collection = %info.name, id = %info.id, metric = %info.metric(), "collection ready");

        Ok(self.handle(info))
    }

    pub async fn get_collection(&self, name: &str) -> CollectionResult<Collection<R>> {
        self.repository
            .get_collection(name)
            .await?
            .map(|info| self.handle(info))
            .ok_or_else(|| CollectionError::CollectionNotFound(name.to_string()))
    }

    pub async fn list_collections(&self) -> CollectionResult<Vec<CollectionInfo>> {
        self.repository.list_collections().await
    }

    pub async fn delete_collection(&self, name: &str) -> CollectionResult<()> {
        self.repository.delete_collection(name).await?;
        info!(collection = %name, "collection deleted");
        Ok(())
    }

    fn handle(&self, info: CollectionInfo) -> Collection<R> {
        Collection::new(Arc::clone(&self.repository), info)
    }
}
