//! Chroma CLI
//!
//! Manage Chroma collections from the shell. Server and embedding settings
//! come from `CHROMA_*` and `OPENAI_*` environment variables.

use clap::{Parser, Subcommand};
use core_config::Environment;
use core_config::tracing::{init_tracing, install_color_eyre};
use domain_collection::{
    CollectionService, DistanceMetric, Document, Filter, Metadata, MetadataValue,
    OpenAIEmbedder, QueryEnum,
};
use eyre::Result;
use serde_json::json;
use tracing::info;

mod parse;

#[derive(Parser)]
#[command(name = "chroma-cli")]
#[command(about = "Create, fill and search Chroma collections")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the server is up
    Heartbeat,

    /// Drop every collection (server must run with ALLOW_RESET)
    Reset,

    /// Create a collection
    Create {
        name: String,

        /// Distance function (l2, cosine, ip)
        #[arg(short, long, default_value = "l2")]
        metric: DistanceMetric,

        /// Return the existing collection instead of failing
        #[arg(long)]
        get_or_create: bool,

        /// Collection metadata as key=value (repeatable)
        #[arg(short = 'M', long = "meta", value_parser = parse::metadata_pair)]
        metadata: Vec<(String, MetadataValue)>,
    },

    /// Delete a collection and everything in it
    Delete { name: String },

    /// List collections
    List,

    /// Add one document, embedding it with OpenAI
    Add {
        collection: String,
        id: String,
        text: String,

        /// Document metadata as key=value (repeatable)
        #[arg(short = 'M', long = "meta", value_parser = parse::metadata_pair)]
        metadata: Vec<(String, MetadataValue)>,
    },

    /// Fetch documents by id and/or filter
    Get {
        collection: String,

        #[arg(long, value_delimiter = ',')]
        ids: Option<Vec<String>>,

        /// Metadata filter as JSON
        #[arg(short = 'w', long = "where", value_parser = parse::filter)]
        where_: Option<Filter>,

        /// Content filter as JSON, e.g. '{"$contains": "rust"}'
        #[arg(short = 'd', long, value_parser = parse::filter)]
        where_document: Option<Filter>,
    },

    /// Count documents in a collection
    Count { collection: String },

    /// Similarity search; an empty TEXT only applies the filters
    Query {
        collection: String,
        text: String,

        #[arg(short, long, default_value_t = 10)]
        n_results: usize,

        /// Metadata filter as JSON
        #[arg(short = 'w', long = "where", value_parser = parse::filter)]
        where_: Option<Filter>,

        /// Content filter as JSON
        #[arg(short = 'd', long, value_parser = parse::filter)]
        where_document: Option<Filter>,

        /// Fields to return (documents, metadatas, distances, embeddings)
        #[arg(
            short,
            long,
            value_delimiter = ',',
            default_value = "documents,metadatas,distances"
        )]
        include: Vec<QueryEnum>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    install_color_eyre();

    let environment = Environment::from_env();
    init_tracing(&environment);

    let cli = Cli::parse();
    let service = CollectionService::from_env()?;

    match cli.command {
        Commands::Heartbeat => {
            let beat = service.heartbeat().await?;
            println!("{}", json!({ "nanosecond heartbeat": beat }));
        }

        Commands::Reset => {
            let reset = service.reset().await?;
            println!("{}", json!({ "reset": reset }));
        }

        Commands::Create {
            name,
            metric,
            get_or_create,
            metadata,
        } => {
            let metadata =
                (!metadata.is_empty()).then(|| metadata.into_iter().collect::<Metadata>());
            let collection = if get_or_create {
                service
                    .get_or_create_collection(&name, metric, metadata)
                    .await?
            } else {
                service.create_collection(&name, metric, metadata).await?
            };
            println!("{}", serde_json::to_string_pretty(collection.info())?);
        }

        Commands::Delete { name } => {
            service.delete_collection(&name).await?;
            info!(collection = %name, "deleted");
        }

        Commands::List => {
            let collections = service.list_collections().await?;
            println!("{}", serde_json::to_string_pretty(&collections)?);
        }

        Commands::Add {
            collection,
            id,
            text,
            metadata,
        } => {
            let embedder = OpenAIEmbedder::from_env()?;
            let collection = service.get_collection(&collection).await?;

            let document = metadata
                .into_iter()
                .fold(Document::new(id, text), |doc, (key, value)| {
                    doc.with_metadata(key, value)
                });
            collection.add(&[document], &embedder).await?;
            info!(
                collection = %collection.name(),
                model = %embedder.model(),
                dimension = ?embedder.model().dimension(),
                "document added"
            );
        }

        Commands::Get {
            collection,
            ids,
            where_,
            where_document,
        } => {
            let collection = service.get_collection(&collection).await?;
            let documents = collection.get(ids, where_, where_document).await?;
            println!("{}", serde_json::to_string_pretty(&documents)?);
        }

        Commands::Count { collection } => {
            let collection = service.get_collection(&collection).await?;
            println!("{}", collection.count().await?);
        }

        Commands::Query {
            collection,
            text,
            n_results,
            where_,
            where_document,
            include,
        } => {
            let embedder = OpenAIEmbedder::from_env()?;
            let collection = service.get_collection(&collection).await?;

            let matches = collection
                .query_matches(&text, n_results, where_, where_document, &include, &embedder)
                .await?;
            info!(
                collection = %collection.name(),
                model = %embedder.model(),
                matches = matches.len(),
                "query complete"
            );

            let rows: Vec<_> = matches
                .into_iter()
                .map(|m| {
                    json!({
                        "id": m.document.id,
                        "distance": m.distance,
                        "content": m.document.content,
                        "metadata": m.document.metadata,
                        "embeddings": m.document.embeddings,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
    }

    Ok(())
}
