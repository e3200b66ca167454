//! Collection Domain Library
//!
//! Client-side management of a named collection of text documents in a remote
//! vector store, with pluggable embedding generation.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────┐
//! │ CollectionService │  ← create / look up / delete collections
//! └─────────┬─────────┘
//!           │ hands out
//! ┌─────────▼─────────┐      ┌──────────────────┐
//! │    Collection     │─────▶│     Embedder     │
//! │ add / get / query │      │     (trait)      │
//! └─────────┬─────────┘      └────────┬─────────┘
//!           │                         │
//! ┌─────────▼──────────┐     ┌────────▼─────────┐
//! │CollectionRepository│     │  OpenAIEmbedder  │
//! │      (trait)       │     │  (+ test doubles)│
//! └─────────┬──────────┘     └──────────────────┘
//!           │
//! ┌─────────▼─────────┐
//! │ ChromaRepository  │
//! └───────────────────┘
//! ```
//!
//! Every operation is a single awaited round trip; nothing runs in the
//! background and nothing is retried.
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_collection::{
//!     CollectionService, DistanceMetric, Document, OpenAIEmbedder, QueryEnum, filter,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let service = CollectionService::from_env()?;
//! let embedder = OpenAIEmbedder::from_env()?;
//!
//! let collection = service
//!     .create_collection("articles", DistanceMetric::Cosine, None)
//!     .await?;
//!
//! let docs = vec![
//!     Document::new("a1", "Rust ownership explained").with_metadata("source", "blog"),
//!     Document::new("a2", "Borrow checker tips").with_metadata("source", "wiki"),
//! ];
//! collection.add(&docs, &embedder).await?;
//!
//! let hits = collection
//!     .query(
//!         "how does ownership work",
//!         5,
//!         Some(filter::eq("source", "blog")),
//!         None,
//!         &[QueryEnum::WithDocuments, QueryEnum::WithMetadatas],
//!         &embedder,
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod chroma;
pub mod collection;
pub mod embedding;
pub mod error;
pub mod filter;
pub mod models;
pub mod repository;
pub mod service;

// Re-export commonly used types
pub use chroma::{ChromaConfig, ChromaRepository};
pub use collection::Collection;
pub use embedding::{Embedder, OpenAIConfig, OpenAIEmbedder};
pub use error::{CollectionError, CollectionResult, Upstream};
pub use filter::Filter;
pub use models::{
    AddRecords, CollectionInfo, CreateCollection, DeleteQuery, DistanceMetric, Document,
    EmbeddingModel, GetQuery, GetResult, Metadata, MetadataValue, NearestQuery, QueryEnum,
    QueryMatch, QueryResult,
};
pub use repository::CollectionRepository;
pub use service::CollectionService;
