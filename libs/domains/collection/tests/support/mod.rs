//! In-memory stand-in for the vector store plus deterministic embedders.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use domain_collection::{
    AddRecords, CollectionError, CollectionInfo, CollectionRepository, CollectionResult,
    CreateCollection, DeleteQuery, DistanceMetric, Embedder, GetQuery, GetResult, Metadata,
    NearestQuery, QueryEnum, QueryResult,
};
use serde_json::Value;
use uuid::Uuid;

/// Embeds text as `[len, 1.1, 2.2]`, so ranking follows content length.
pub struct LengthEmbedder;

pub fn length_embedding(content: &str) -> Vec<f32> {
    vec![content.len() as f32, 1.1, 2.2]
}

#[async_trait]
impl Embedder for LengthEmbedder {
    async fn get_embeddings(&self, content: &str) -> CollectionResult<Vec<f32>> {
        Ok(length_embedding(content))
    }

    async fn get_embeddings_batch(&self, contents: &[String]) -> CollectionResult<Vec<Vec<f32>>> {
        Ok(contents.iter().map(|c| length_embedding(c)).collect())
    }
}

#[derive(Debug, Clone)]
struct Record {
    id: String,
    embedding: Vec<f32>,
    metadata: Metadata,
    content: String,
}

#[derive(Debug)]
struct StoredCollection {
    info: CollectionInfo,
    records: Vec<Record>,
}

/// Single-process store honouring the same contract as the Chroma client
#[derive(Default)]
pub struct InMemoryRepository {
    collections: Mutex<Vec<StoredCollection>>,
    calls: Mutex<HashMap<&'static str, usize>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// How many times a repository method was invoked
    pub fn calls(&self, method: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .get(method)
            .copied()
            .unwrap_or_default()
    }

    fn record_call(&self, method: &'static str) {
        *self.calls.lock().unwrap().entry(method).or_default() += 1;
    }

    fn with_collection<T>(
        &self,
        collection_id: &str,
        f: impl FnOnce(&mut StoredCollection) -> CollectionResult<T>,
    ) -> CollectionResult<T> {
        let mut collections = self.collections.lock().unwrap();
        let stored = collections
            .iter_mut()
            .find(|c| c.info.id.to_string() == collection_id)
            .ok_or_else(|| CollectionError::CollectionNotFound(collection_id.to_string()))?;
        f(stored)
    }
}

#[async_trait]
impl CollectionRepository for InMemoryRepository {
    async fn heartbeat(&self) -> CollectionResult<u64> {
        self.record_call("heartbeat");
        Ok(1)
    }

    async fn reset(&self) -> CollectionResult<bool> {
        self.record_call("reset");
        self.collections.lock().unwrap().clear();
        Ok(true)
    }

    async fn create_collection(&self, input: CreateCollection) -> CollectionResult<CollectionInfo> {
        self.record_call("create_collection");
        let mut collections = self.collections.lock().unwrap();

        if let Some(existing) = collections.iter().find(|c| c.info.name == input.name) {
            if input.get_or_create {
                return Ok(existing.info.clone());
            }
            return Err(CollectionError::Validation(format!(
                "collection {} already exists",
                input.name
            )));
        }

        let info = CollectionInfo {
            id: Uuid::new_v4(),
            name: input.name.clone(),
            metadata: Some(input.store_metadata()),
        };
        collections.push(StoredCollection {
            info: info.clone(),
            records: Vec::new(),
        });
        Ok(info)
    }

    async fn get_collection(&self, name: &str) -> CollectionResult<Option<CollectionInfo>> {
        self.record_call("get_collection");
        Ok(self
            .collections
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.info.name == name)
            .map(|c| c.info.clone()))
    }

    async fn list_collections(&self) -> CollectionResult<Vec<CollectionInfo>> {
        self.record_call("list_collections");
        Ok(self
            .collections
            .lock()
            .unwrap()
            .iter()
            .map(|c| c.info.clone())
            .collect())
    }

    async fn delete_collection(&self, name: &str) -> CollectionResult<()> {
        self.record_call("delete_collection");
        let mut collections = self.collections.lock().unwrap();
        let before = collections.len();
        collections.retain(|c| c.info.name != name);
        if collections.len() == before {
            return Err(CollectionError::CollectionNotFound(name.to_string()));
        }
        Ok(())
    }

    async fn add(&self, collection_id: &str, records: AddRecords) -> CollectionResult<()> {
        self.record_call("add");
        self.with_collection(collection_id, |stored| {
            let metadatas = records
                .metadatas
                .unwrap_or_else(|| vec![None; records.ids.len()]);

            // Same rule as Chroma: a row either has metadata or sends null
            if metadatas.iter().flatten().any(Metadata::is_empty) {
                return Err(CollectionError::Validation(
                    "Expected metadata to be a non-empty dict".to_string(),
                ));
            }

            for id in &records.ids {
                if stored.records.iter().any(|r| &r.id == id) {
                    return Err(CollectionError::Validation(format!("duplicate id {}", id)));
                }
            }

            for (((id, embedding), metadata), content) in records
                .ids
                .into_iter()
                .zip(records.embeddings)
                .zip(metadatas)
                .zip(records.documents)
            {
                stored.records.push(Record {
                    id,
                    embedding,
                    metadata: metadata.unwrap_or_default(),
                    content,
                });
            }
            Ok(())
        })
    }

    async fn get(&self, collection_id: &str, query: GetQuery) -> CollectionResult<GetResult> {
        self.record_call("get");
        self.with_collection(collection_id, |stored| {
            let rows: Vec<&Record> = stored
                .records
                .iter()
                .filter(|r| selected(r, query.ids.as_deref(), &query.where_, &query.where_document))
                .skip(query.offset.unwrap_or(0))
                .take(query.limit.unwrap_or(usize::MAX))
                .collect();

            let include = |flag| query.include.contains(&flag);
            Ok(GetResult {
                ids: rows.iter().map(|r| r.id.clone()).collect(),
                embeddings: include(QueryEnum::WithEmbeddings)
                    .then(|| rows.iter().map(|r| r.embedding.clone()).collect()),
                documents: include(QueryEnum::WithDocuments)
                    .then(|| rows.iter().map(|r| Some(r.content.clone())).collect()),
                metadatas: include(QueryEnum::WithMetadatas)
                    .then(|| rows.iter().map(|r| Some(r.metadata.clone())).collect()),
            })
        })
    }

    async fn count(&self, collection_id: &str) -> CollectionResult<usize> {
        self.record_call("count");
        self.with_collection(collection_id, |stored| Ok(stored.records.len()))
    }

    async fn query(
        &self,
        collection_id: &str,
        query: NearestQuery,
    ) -> CollectionResult<QueryResult> {
        self.record_call("query");
        self.with_collection(collection_id, |stored| {
            let metric = stored.info.metric();
            let include = |flag| query.include.contains(&flag);
            let mut result = QueryResult::default();

            for target in &query.query_embeddings {
                let mut ranked: Vec<(f32, &Record)> = stored
                    .records
                    .iter()
                    .filter(|r| selected(r, None, &query.where_, &query.where_document))
                    .map(|r| (distance(metric, target, &r.embedding), r))
                    .collect();
                ranked.sort_by(|a, b| a.0.total_cmp(&b.0));
                ranked.truncate(query.n_results);

                result.ids.push(ranked.iter().map(|(_, r)| r.id.clone()).collect());
                if include(QueryEnum::WithDistances) {
                    result
                        .distances
                        .get_or_insert_with(Vec::new)
                        .push(ranked.iter().map(|(d, _)| *d).collect());
                }
                if include(QueryEnum::WithEmbeddings) {
                    result
                        .embeddings
                        .get_or_insert_with(Vec::new)
                        .push(ranked.iter().map(|(_, r)| r.embedding.clone()).collect());
                }
                if include(QueryEnum::WithDocuments) {
                    result
                        .documents
                        .get_or_insert_with(Vec::new)
                        .push(ranked.iter().map(|(_, r)| Some(r.content.clone())).collect());
                }
                if include(QueryEnum::WithMetadatas) {
                    result
                        .metadatas
                        .get_or_insert_with(Vec::new)
                        .push(ranked.iter().map(|(_, r)| Some(r.metadata.clone())).collect());
                }
            }
            Ok(result)
        })
    }

    async fn delete(
        &self,
        collection_id: &str,
        query: DeleteQuery,
    ) -> CollectionResult<Vec<String>> {
        self.record_call("delete");
        self.with_collection(collection_id, |stored| {
            let mut removed = Vec::new();
            stored.records.retain(|r| {
                let hit = selected(r, query.ids.as_deref(), &query.where_, &query.where_document);
                if hit {
                    removed.push(r.id.clone());
                }
                !hit
            });
            Ok(removed)
        })
    }
}

fn selected(
    record: &Record,
    ids: Option<&[String]>,
    where_: &Option<domain_collection::Filter>,
    where_document: &Option<domain_collection::Filter>,
) -> bool {
    ids.is_none_or(|ids| ids.contains(&record.id))
        && where_
            .as_ref()
            .is_none_or(|f| metadata_matches(&record.metadata, f))
        && where_document
            .as_ref()
            .is_none_or(|f| content_matches(&record.content, f))
}

fn metadata_matches(metadata: &Metadata, filter: &serde_json::Map<String, Value>) -> bool {
    filter.iter().all(|(key, condition)| match key.as_str() {
        "$and" => nested(condition).iter().all(|f| metadata_matches(metadata, f)),
        "$or" => nested(condition).iter().any(|f| metadata_matches(metadata, f)),
        field => {
            let actual = metadata.get(field).cloned().map(Value::from);
            match condition {
                Value::Object(ops) => ops
                    .iter()
                    .all(|(op, expected)| compare(op, actual.as_ref(), expected)),
                expected => compare("$eq", actual.as_ref(), expected),
            }
        }
    })
}

fn content_matches(content: &str, filter: &serde_json::Map<String, Value>) -> bool {
    filter.iter().all(|(key, condition)| match key.as_str() {
        "$and" => nested(condition).iter().all(|f| content_matches(content, f)),
        "$or" => nested(condition).iter().any(|f| content_matches(content, f)),
        "$contains" => condition.as_str().is_some_and(|text| content.contains(text)),
        "$not_contains" => condition.as_str().is_some_and(|text| !content.contains(text)),
        _ => false,
    })
}

fn nested(condition: &Value) -> Vec<&serde_json::Map<String, Value>> {
    condition
        .as_array()
        .map(|items| items.iter().filter_map(Value::as_object).collect())
        .unwrap_or_default()
}

fn compare(op: &str, actual: Option<&Value>, expected: &Value) -> bool {
    let Some(actual) = actual else {
        return op == "$ne" || op == "$nin";
    };
    let ordered = |f: fn(f64, f64) -> bool| match (actual.as_f64(), expected.as_f64()) {
        (Some(a), Some(b)) => f(a, b),
        _ => false,
    };

    match op {
        "$eq" => actual == expected,
        "$ne" => actual != expected,
        "$gt" => ordered(|a, b| a > b),
        "$gte" => ordered(|a, b| a >= b),
        "$lt" => ordered(|a, b| a < b),
        "$lte" => ordered(|a, b| a <= b),
        "$in" => expected.as_array().is_some_and(|vs| vs.contains(actual)),
        "$nin" => expected.as_array().is_some_and(|vs| !vs.contains(actual)),
        _ => false,
    }
}

fn distance(metric: DistanceMetric, a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    match metric {
        DistanceMetric::L2 => a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum(),
        DistanceMetric::Ip => 1.0 - dot,
        DistanceMetric::Cosine => {
            let norm = |v: &[f32]| v.iter().map(|x| x * x).sum::<f32>().sqrt();
            1.0 - dot / (norm(a) * norm(b))
        }
    }
}
