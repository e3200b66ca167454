use std::sync::Arc;

use tracing::{debug, instrument};
use uuid::Uuid;

use crate::embedding::Embedder;
use crate::error::{CollectionError, CollectionResult};
use crate::filter::Filter;
use crate::models::{
    AddRecords, CollectionInfo, DeleteQuery, DistanceMetric, Document, GetQuery, NearestQuery,
    QueryEnum, QueryMatch,
};
use crate::repository::CollectionRepository;

/// Handle to one named collection in the store.
///
/// Holds no documents: every call sends its own copies to the store and
/// returns fresh values. Cloning is cheap, the repository is shared.
pub struct Collection<R: CollectionRepository> {
    repository: Arc<R>,
    info: CollectionInfo,
}

impl<R: CollectionRepository> Clone for Collection<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            info: self.info.clone(),
        }
    }
}

impl<R: CollectionRepository> Collection<R> {
    pub fn new(repository: Arc<R>, info: CollectionInfo) -> Self {
        Self { repository, info }
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn id(&self) -> Uuid {
        self.info.id
    }

    pub fn metric(&self) -> DistanceMetric {
        self.info.metric()
    }

    pub fn info(&self) -> &CollectionInfo {
        &self.info
    }

    fn store_id(&self) -> String {
        self.info.id.to_string()
    }

    /// Add documents, embedding those that arrive without a vector.
    ///
    /// Caller-supplied embeddings are sent unchanged. If any embedding fails the
    /// store is never contacted; otherwise the whole batch goes out in one call.
    #[instrument(skip_all, fields(collection = %self.info.name, documents = documents.len()))]
    pub async fn add(
        &self,
        documents: &[Document],
        embedder: &dyn Embedder,
    ) -> CollectionResult<()> {
        if documents.is_empty() {
            debug!("nothing to add");
            return Ok(());
        }

        let documents = embed_missing(documents.to_vec(), embedder).await?;
        let records = AddRecords::from_documents(documents)?;

        self.repository.add(&self.store_id(), records).await
    }

    /// Fetch documents by id and/or filter. All parts are optional and ANDed;
    /// with none set the whole collection comes back, in store order.
    #[instrument(skip_all, fields(collection = %self.info.name))]
    pub async fn get(
        &self,
        ids: Option<Vec<String>>,
        where_: Option<Filter>,
        where_document: Option<Filter>,
    ) -> CollectionResult<Vec<Document>> {
        let query = GetQuery {
            ids,
            where_,
            where_document,
            include: QueryEnum::DEFAULT_GET.to_vec(),
            ..Default::default()
        };

        self.repository
            .get(&self.store_id(), query)
            .await?
            .into_documents()
    }

    /// Similarity search returning documents in ranked order.
    ///
    /// A non-empty `query_text` is embedded and matched by distance; an empty
    /// one turns the call into a filtered scan capped at `n_results`. Fields not
    /// selected by `include` stay at their zero value.
    pub async fn query(
        &self,
        query_text: &str,
        n_results: usize,
        where_: Option<Filter>,
        where_document: Option<Filter>,
        include: &[QueryEnum],
        embedder: &dyn Embedder,
    ) -> CollectionResult<Vec<Document>> {
        let matches = self
            .query_matches(query_text, n_results, where_, where_document, include, embedder)
            .await?;
        Ok(matches.into_iter().map(|m| m.document).collect())
    }

    /// Same as [`query`](Self::query) but keeps each row's distance.
    #[instrument(skip_all, fields(collection = %self.info.name, n_results = n_results))]
    pub async fn query_matches(
        &self,
        query_text: &str,
        n_results: usize,
        where_: Option<Filter>,
        where_document: Option<Filter>,
        include: &[QueryEnum],
        embedder: &dyn Embedder,
    ) -> CollectionResult<Vec<QueryMatch>> {
        validate_n_results(n_results)?;

        if query_text.is_empty() {
            return self
                .filter_scan(n_results, where_, where_document, include)
                .await;
        }

        let embedding = embedder.get_embeddings(query_text).await?;
        self.query_by_embedding(embedding, n_results, where_, where_document, include)
            .await
    }

    /// Nearest-neighbour search with a caller-supplied query vector
    pub async fn query_by_embedding(
        &self,
        embedding: Vec<f32>,
        n_results: usize,
        where_: Option<Filter>,
        where_document: Option<Filter>,
        include: &[QueryEnum],
    ) -> CollectionResult<Vec<QueryMatch>> {
        validate_n_results(n_results)?;

        let query = NearestQuery {
            query_embeddings: vec![embedding],
            n_results,
            where_,
            where_document,
            include: normalize_include(include, true),
        };

        let mut matches = self
            .repository
            .query(&self.store_id(), query)
            .await?
            .into_matches()?;
        matches.truncate(n_results);
        Ok(matches)
    }

    /// Pure metadata/content filtering, no similarity component
    async fn filter_scan(
        &self,
        n_results: usize,
        where_: Option<Filter>,
        where_document: Option<Filter>,
        include: &[QueryEnum],
    ) -> CollectionResult<Vec<QueryMatch>> {
        debug!("empty query text, running filtered scan");

        let query = GetQuery {
            ids: None,
            where_,
            where_document,
            limit: Some(n_results),
            offset: None,
            include: normalize_include(include, false),
        };

        let documents = self
            .repository
            .get(&self.store_id(), query)
            .await?
            .into_documents()?;

        Ok(documents
            .into_iter()
            .take(n_results)
            .map(|document| QueryMatch {
                document,
                distance: None,
            })
            .collect())
    }

    pub async fn count(&self) -> CollectionResult<usize> {
        self.repository.count(&self.store_id()).await
    }

    /// Remove documents by id and/or filter; at least one selector is required.
    #[instrument(skip_all, fields(collection = %self.info.name))]
    pub async fn delete(
        &self,
        ids: Option<Vec<String>>,
        where_: Option<Filter>,
        where_document: Option<Filter>,
    ) -> CollectionResult<Vec<String>> {
        if ids.is_none() && where_.is_none() && where_document.is_none() {
            return Err(CollectionError::Validation(
                "delete needs ids, where or where_document".to_string(),
            ));
        }

        let query = DeleteQuery {
            ids,
            where_,
            where_document,
        };
        self.repository.delete(&self.store_id(), query).await
    }
}

fn validate_n_results(n_results: usize) -> CollectionResult<()> {
    if n_results == 0 {
        return Err(CollectionError::Validation(
            "n_results must be at least 1".to_string(),
        ));
    }
    Ok(())
}

/// Deduplicate include flags, keeping the caller's order. Fetches cannot
/// return distances, so they are dropped there.
fn normalize_include(include: &[QueryEnum], with_distances: bool) -> Vec<QueryEnum> {
    let mut normalized = Vec::with_capacity(include.len());
    for flag in include {
        if *flag == QueryEnum::WithDistances && !with_distances {
            continue;
        }
        if !normalized.contains(flag) {
            normalized.push(*flag);
        }
    }
    normalized
}

/// Attach embeddings to every document that lacks one.
///
/// One pending document uses the single-text call, several share one batch
/// call. Output order is checked against the pending list.
async fn embed_missing(
    mut documents: Vec<Document>,
    embedder: &dyn Embedder,
) -> CollectionResult<Vec<Document>> {
    let pending: Vec<usize> = documents
        .iter()
        .enumerate()
        .filter(|(_, doc)| !doc.has_embeddings())
        .map(|(index, _)| index)
        .collect();

    match pending.as_slice() {
        [] => {}
        [index] => {
            let embedding = embedder.get_embeddings(&documents[*index].content).await?;
            documents[*index].embeddings = Some(embedding);
        }
        _ => {
            let contents: Vec<String> = pending
                .iter()
                .map(|&index| documents[index].content.clone())
                .collect();
            let embeddings = embedder.get_embeddings_batch(&contents).await?;

            if embeddings.len() != pending.len() {
                return Err(CollectionError::EmbeddingCountMismatch {
                    expected: pending.len(),
                    actual: embeddings.len(),
                });
            }

            for (index, embedding) in pending.into_iter().zip(embeddings) {
                documents[index].embeddings = Some(embedding);
            }
        }
    }

    Ok(documents)
}
