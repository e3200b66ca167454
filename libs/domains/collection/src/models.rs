use std::collections::HashMap;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::error::{CollectionError, CollectionResult};
use crate::filter::Filter;

/// Collection metadata key Chroma reads the distance function from
pub const DISTANCE_METADATA_KEY: &str = "hnsw:space";

/// Scalar metadata value attached to a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        MetadataValue::Str(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        MetadataValue::Str(value)
    }
}

impl From<bool> for MetadataValue {
    fn from(value: bool) -> Self {
        MetadataValue::Bool(value)
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        MetadataValue::Int(value)
    }
}

impl From<f64> for MetadataValue {
    fn from(value: f64) -> Self {
        MetadataValue::Float(value)
    }
}

impl From<MetadataValue> for serde_json::Value {
    fn from(value: MetadataValue) -> Self {
        match value {
            MetadataValue::Bool(b) => serde_json::Value::Bool(b),
            MetadataValue::Int(i) => serde_json::Value::from(i),
            MetadataValue::Float(f) => serde_json::Value::from(f),
            MetadataValue::Str(s) => serde_json::Value::String(s),
        }
    }
}

/// Free-form document metadata, used for filtered retrieval
pub type Metadata = HashMap<String, MetadataValue>;

/// A text document and its (optional) embedding
///
/// `embeddings: None` means "not computed yet"; [`crate::Collection::add`]
/// derives it from `content` through an [`crate::Embedder`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub embeddings: Option<Vec<f32>>,
    pub metadata: Metadata,
    pub content: String,
}

impl Document {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn with_embeddings(mut self, embeddings: Vec<f32>) -> Self {
        self.embeddings = Some(embeddings);
        self
    }

    pub fn with_metadata(
        mut self,
        key: impl Into<String>,
        value: impl Into<MetadataValue>,
    ) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn has_embeddings(&self) -> bool {
        self.embeddings.is_some()
    }
}

/// A ranked query row
#[derive(Debug, Clone, PartialEq)]
pub struct QueryMatch {
    pub document: Document,
    /// Distance to the query vector; `None` in pure-filter mode or when not requested
    pub distance: Option<f32>,
}

/// Distance function a collection ranks neighbours by
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum DistanceMetric {
    /// Squared Euclidean distance
    #[default]
    L2,
    Cosine,
    /// Inner product
    Ip,
}

/// Selects which fields the store populates in returned rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
pub enum QueryEnum {
    #[serde(rename = "documents")]
    #[strum(serialize = "documents")]
    WithDocuments,
    #[serde(rename = "metadatas")]
    #[strum(serialize = "metadatas")]
    WithMetadatas,
    #[serde(rename = "distances")]
    #[strum(serialize = "distances")]
    WithDistances,
    #[serde(rename = "embeddings")]
    #[strum(serialize = "embeddings")]
    WithEmbeddings,
}

impl QueryEnum {
    /// Fields returned when the caller does not choose
    pub const DEFAULT_GET: [QueryEnum; 2] = [QueryEnum::WithDocuments, QueryEnum::WithMetadatas];
}

/// Input for creating a collection
#[derive(Debug, Clone, Default)]
pub struct CreateCollection {
    pub name: String,
    pub metric: DistanceMetric,
    pub metadata: Option<Metadata>,
    pub get_or_create: bool,
}

impl CreateCollection {
    pub fn new(name: impl Into<String>, metric: DistanceMetric) -> Self {
        Self {
            name: name.into(),
            metric,
            ..Default::default()
        }
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn get_or_create(mut self) -> Self {
        self.get_or_create = true;
        self
    }

    /// Collection metadata as sent to the store, with the distance function folded in
    pub fn store_metadata(&self) -> Metadata {
        let mut metadata = self.metadata.clone().unwrap_or_default();
        metadata.insert(
            DISTANCE_METADATA_KEY.to_string(),
            MetadataValue::Str(self.metric.to_string()),
        );
        metadata
    }
}

/// Collection as described by the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionInfo {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub metadata: Option<Metadata>,
}

impl CollectionInfo {
    /// Distance function recorded in the collection metadata, L2 when absent
    pub fn metric(&self) -> DistanceMetric {
        self.metadata
            .as_ref()
            .and_then(|m| m.get(DISTANCE_METADATA_KEY))
            .and_then(|v| match v {
                MetadataValue::Str(s) => s.parse().ok(),
                _ => None,
            })
            .unwrap_or_default()
    }
}

/// Embedding model selection
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EmbeddingModel {
    /// OpenAI text-embedding-ada-002 (1536 dimensions)
    #[default]
    TextEmbeddingAda002,
    /// OpenAI text-embedding-3-small (1536 dimensions)
    TextEmbedding3Small,
    /// OpenAI text-embedding-3-large (3072 dimensions)
    TextEmbedding3Large,
    /// Any other model served by an OpenAI-compatible endpoint
    Custom(String),
}

impl EmbeddingModel {
    pub fn model_name(&self) -> &str {
        match self {
            EmbeddingModel::TextEmbeddingAda002 => "text-embedding-ada-002",
            EmbeddingModel::TextEmbedding3Small => "text-embedding-3-small",
            EmbeddingModel::TextEmbedding3Large => "text-embedding-3-large",
            EmbeddingModel::Custom(name) => name,
        }
    }

    /// Output dimension, when known
    pub fn dimension(&self) -> Option<u32> {
        match self {
            EmbeddingModel::TextEmbeddingAda002 => Some(1536),
            EmbeddingModel::TextEmbedding3Small => Some(1536),
            EmbeddingModel::TextEmbedding3Large => Some(3072),
            EmbeddingModel::Custom(_) => None,
        }
    }
}

impl FromStr for EmbeddingModel {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "text-embedding-ada-002" => EmbeddingModel::TextEmbeddingAda002,
            "text-embedding-3-small" => EmbeddingModel::TextEmbedding3Small,
            "text-embedding-3-large" => EmbeddingModel::TextEmbedding3Large,
            other => EmbeddingModel::Custom(other.to_string()),
        })
    }
}

impl fmt::Display for EmbeddingModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.model_name())
    }
}

// ===== Store request/response payloads =====

/// Fully embedded batch submitted by one `add` call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AddRecords {
    pub ids: Vec<String>,
    pub embeddings: Vec<Vec<f32>>,
    /// Per-row metadata; rows without any are sent as `null`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadatas: Option<Vec<Option<Metadata>>>,
    pub documents: Vec<String>,
}

impl AddRecords {
    /// Split documents into columns. Every document must already carry an embedding.
    pub fn from_documents(documents: Vec<Document>) -> CollectionResult<Self> {
        let mut records = AddRecords {
            ids: Vec::with_capacity(documents.len()),
            embeddings: Vec::with_capacity(documents.len()),
            metadatas: None,
            documents: Vec::with_capacity(documents.len()),
        };
        let mut metadatas = Vec::with_capacity(documents.len());

        for doc in documents {
            let embeddings = doc.embeddings.ok_or_else(|| {
                CollectionError::Validation(format!("document {} has no embeddings", doc.id))
            })?;
            records.ids.push(doc.id);
            records.embeddings.push(embeddings);
            records.documents.push(doc.content);
            metadatas.push((!doc.metadata.is_empty()).then_some(doc.metadata));
        }

        // Chroma rejects empty metadata maps, so they go out as null and the
        // column is dropped when no row has any
        if metadatas.iter().any(Option::is_some) {
            records.metadatas = Some(metadatas);
        }

        Ok(records)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Filtered fetch
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GetQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ids: Option<Vec<String>>,
    #[serde(rename = "where", skip_serializing_if = "Option::is_none")]
    pub where_: Option<Filter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub where_document: Option<Filter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,
    pub include: Vec<QueryEnum>,
}

/// Nearest-neighbour search
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearestQuery {
    pub query_embeddings: Vec<Vec<f32>>,
    pub n_results: usize,
    #[serde(rename = "where", skip_serializing_if = "Option::is_none")]
    pub where_: Option<Filter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub where_document: Option<Filter>,
    pub include: Vec<QueryEnum>,
}

/// Deletion selector; all present parts are ANDed by the store
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeleteQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ids: Option<Vec<String>>,
    #[serde(rename = "where", skip_serializing_if = "Option::is_none")]
    pub where_: Option<Filter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub where_document: Option<Filter>,
}

/// Columnar rows returned by a fetch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GetResult {
    pub ids: Vec<String>,
    #[serde(default)]
    pub embeddings: Option<Vec<Vec<f32>>>,
    #[serde(default)]
    pub documents: Option<Vec<Option<String>>>,
    #[serde(default)]
    pub metadatas: Option<Vec<Option<Metadata>>>,
}

impl GetResult {
    /// Zip the columns back into documents, keeping store order.
    pub fn into_documents(self) -> CollectionResult<Vec<Document>> {
        let rows = self.ids.len();
        let embeddings = column("embeddings", self.embeddings, rows)?;
        let documents = column("documents", self.documents, rows)?;
        let metadatas = column("metadatas", self.metadatas, rows)?;

        Ok(self
            .ids
            .into_iter()
            .zip(embeddings)
            .zip(documents)
            .zip(metadatas)
            .map(|(((id, embeddings), content), metadata)| Document {
                id,
                embeddings,
                metadata: metadata.flatten().unwrap_or_default(),
                content: content.flatten().unwrap_or_default(),
            })
            .collect())
    }
}

/// Columnar rows returned by a search, one outer entry per query vector
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub ids: Vec<Vec<String>>,
    #[serde(default)]
    pub distances: Option<Vec<Vec<f32>>>,
    #[serde(default)]
    pub embeddings: Option<Vec<Vec<Vec<f32>>>>,
    #[serde(default)]
    pub documents: Option<Vec<Vec<Option<String>>>>,
    #[serde(default)]
    pub metadatas: Option<Vec<Vec<Option<Metadata>>>>,
}

impl QueryResult {
    /// Rows for the first query vector, in the store's ranking order.
    pub fn into_matches(self) -> CollectionResult<Vec<QueryMatch>> {
        let ids = first_row(Some(self.ids)).unwrap_or_default();
        let rows = ids.len();
        let distances = column("distances", first_row(self.distances), rows)?;
        let embeddings = column("embeddings", first_row(self.embeddings), rows)?;
        let documents = column("documents", first_row(self.documents), rows)?;
        let metadatas = column("metadatas", first_row(self.metadatas), rows)?;

        Ok(ids
            .into_iter()
            .zip(distances)
            .zip(embeddings)
            .zip(documents)
            .zip(metadatas)
            .map(|((((id, distance), embeddings), content), metadata)| QueryMatch {
                document: Document {
                    id,
                    embeddings,
                    metadata: metadata.flatten().unwrap_or_default(),
                    content: content.flatten().unwrap_or_default(),
                },
                distance,
            })
            .collect())
    }
}

fn first_row<T>(batches: Option<Vec<Vec<T>>>) -> Option<Vec<T>> {
    batches.map(|b| b.into_iter().next().unwrap_or_default())
}

/// Expand an optional column to exactly `rows` entries.
fn column<T>(name: &str, values: Option<Vec<T>>, rows: usize) -> CollectionResult<Vec<Option<T>>> {
    match values {
        None => Ok((0..rows).map(|_| None).collect()),
        Some(values) if values.len() == rows => Ok(values.into_iter().map(Some).collect()),
        Some(values) => Err(CollectionError::MalformedResponse(format!(
            "{} column has {} entries for {} ids",
            name,
            values.len(),
            rows
        ))),
    }
}
