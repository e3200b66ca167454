use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::ChromaConfig;
use crate::error::{CollectionError, CollectionResult, Upstream, decode, read_body};
use crate::models::{
    AddRecords, CollectionInfo, CreateCollection, DeleteQuery, GetQuery, GetResult, Metadata,
    NearestQuery, QueryResult,
};
use crate::repository::CollectionRepository;

/// Chroma-backed implementation of [`CollectionRepository`] over the v1 REST API
pub struct ChromaRepository {
    client: Client,
    api_base: String,
}

#[derive(Debug, Serialize)]
struct CreateCollectionRequest<'a> {
    name: &'a str,
    metadata: Metadata,
    get_or_create: bool,
}

#[derive(Debug, Deserialize)]
struct HeartbeatResponse {
    #[serde(rename = "nanosecond heartbeat")]
    nanosecond_heartbeat: u64,
}

impl ChromaRepository {
    pub fn new(config: ChromaConfig) -> CollectionResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self::with_client(config, client))
    }

    pub fn with_client(config: ChromaConfig, client: Client) -> Self {
        Self {
            client,
            api_base: config.api_base(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path)
    }

    /// Collection addressed by name, percent-encoded as a single path segment
    fn named_collection_url(&self, name: &str) -> String {
        self.url(&format!("collections/{}", urlencoding::encode(name)))
    }

    fn collection_url(&self, collection_id: &str, action: &str) -> String {
        self.url(&format!("collections/{}/{}", collection_id, action))
    }

    async fn send(&self, request: RequestBuilder) -> CollectionResult<String> {
        let response = request.send().await?;
        read_body(Upstream::VectorStore, response).await
    }

    async fn send_json<T: serde::de::DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> CollectionResult<T> {
        decode(self.send(request).await?)
    }
}

/// Chroma reports unknown collections as 404 on newer servers and as a
/// `ValueError("... does not exist.")` 500 on older ones.
fn is_missing_collection(err: &CollectionError) -> bool {
    match err {
        CollectionError::Protocol { status, body, .. } => {
            *status == StatusCode::NOT_FOUND || body.contains("does not exist")
        }
        _ => false,
    }
}

#[async_trait]
impl CollectionRepository for ChromaRepository {
    async fn heartbeat(&self) -> CollectionResult<u64> {
        let response: HeartbeatResponse = self
            .send_json(self.client.get(self.url("heartbeat")))
            .await?;
        Ok(response.nanosecond_heartbeat)
    }

    async fn reset(&self) -> CollectionResult<bool> {
        self.send_json(self.client.post(self.url("reset"))).await
    }

    async fn create_collection(&self, input: CreateCollection) -> CollectionResult<CollectionInfo> {
        debug!(name = %input.name, metric = %input.metric, "creating collection");

        let request = CreateCollectionRequest {
            name: &input.name,
            metadata: input.store_metadata(),
            get_or_create: input.get_or_create,
        };

        self.send_json(self.client.post(self.url("collections")).json(&request))
            .await
    }

    async fn get_collection(&self, name: &str) -> CollectionResult<Option<CollectionInfo>> {
        let request = self.client.get(self.named_collection_url(name));

        match self.send_json(request).await {
            Ok(info) => Ok(Some(info)),
            Err(err) if is_missing_collection(&err) => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn list_collections(&self) -> CollectionResult<Vec<CollectionInfo>> {
        self.send_json(self.client.get(self.url("collections")))
            .await
    }

    async fn delete_collection(&self, name: &str) -> CollectionResult<()> {
        let request = self.client.delete(self.named_collection_url(name));

        match self.send(request).await {
            Ok(_) => Ok(()),
            Err(err) if is_missing_collection(&err) => {
                Err(CollectionError::CollectionNotFound(name.to_string()))
            }
            Err(err) => Err(err),
        }
    }

    async fn add(&self, collection_id: &str, records: AddRecords) -> CollectionResult<()> {
        debug!(collection_id, records = records.len(), "adding records");

        self.send(
            self.client
                .post(self.collection_url(collection_id, "add"))
                .json(&records),
        )
        .await?;
        Ok(())
    }

    async fn get(&self, collection_id: &str, query: GetQuery) -> CollectionResult<GetResult> {
        self.send_json(
            self.client
                .post(self.collection_url(collection_id, "get"))
                .json(&query),
        )
        .await
    }

    async fn count(&self, collection_id: &str) -> CollectionResult<usize> {
        self.send_json(self.client.get(self.collection_url(collection_id, "count")))
            .await
    }

    async fn query(
        &self,
        collection_id: &str,
        query: NearestQuery,
    ) -> CollectionResult<QueryResult> {
        debug!(collection_id, n_results = query.n_results, "querying collection");

        self.send_json(
            self.client
                .post(self.collection_url(collection_id, "query"))
                .json(&query),
        )
        .await
    }

    async fn delete(
        &self,
        collection_id: &str,
        query: DeleteQuery,
    ) -> CollectionResult<Vec<String>> {
        // Older servers answer with the removed ids, newer ones with null
        let deleted: Option<Vec<String>> = self
            .send_json(
                self.client
                    .post(self.collection_url(collection_id, "delete"))
                    .json(&query),
            )
            .await?;
        Ok(deleted.unwrap_or_default())
    }
}
