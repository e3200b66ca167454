//! Chroma integration tests
//!
//! These need Docker and run against a real Chroma container:
//! `cargo test -p domain_collection --test chroma_integration -- --ignored`

mod support;

use domain_collection::{
    ChromaConfig, CollectionError, CollectionService, DistanceMetric, Document, QueryEnum, filter,
};
use support::LengthEmbedder;
use test_utils::assertions::assert_ids;
use test_utils::{TestChroma, TestDataBuilder};

fn service(chroma: &TestChroma) -> CollectionService<domain_collection::ChromaRepository> {
    CollectionService::chroma(ChromaConfig::new(chroma.url().to_string())).unwrap()
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_heartbeat() {
    let chroma = TestChroma::new().await;

    let beat = service(&chroma).heartbeat().await.unwrap();
    assert!(beat > 0);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_reset_drops_collections() {
    let chroma = TestChroma::new().await;
    let service = service(&chroma);
    let name = TestDataBuilder::from_test_name("test_reset_drops_collections").collection_name("r");

    service
        .create_collection(&name, DistanceMetric::L2, None)
        .await
        .unwrap();

    assert!(service.reset().await.unwrap());
    assert!(service.list_collections().await.unwrap().is_empty());
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_collection_lifecycle() {
    let chroma = TestChroma::new().await;
    let service = service(&chroma);
    let name = TestDataBuilder::from_test_name("test_collection_lifecycle").collection_name("life");

    let created = service
        .create_collection(&name, DistanceMetric::Cosine, None)
        .await
        .unwrap();
    assert_eq!(created.metric(), DistanceMetric::Cosine);

    let fetched = service.get_collection(&name).await.unwrap();
    assert_eq!(fetched.id(), created.id());

    let reused = service
        .get_or_create_collection(&name, DistanceMetric::Cosine, None)
        .await
        .unwrap();
    assert_eq!(reused.id(), created.id());

    service.delete_collection(&name).await.unwrap();
    assert!(matches!(
        service.get_collection(&name).await,
        Err(CollectionError::CollectionNotFound(_))
    ));
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_add_query_and_filter() {
    let chroma = TestChroma::new().await;
    let service = service(&chroma);
    let builder = TestDataBuilder::from_test_name("test_add_query_and_filter");

    let collection = service
        .create_collection(&builder.collection_name("docs"), DistanceMetric::L2, None)
        .await
        .unwrap();

    let docs = vec![
        Document::new("d1", "Hello, how are you?").with_metadata("source", "unittest_doc_1"),
        Document::new("d2", "I am well").with_metadata("source", "unittest_doc_2"),
    ];
    collection.add(&docs, &LengthEmbedder).await.unwrap();
    assert_eq!(collection.count().await.unwrap(), 2);

    let ranked = collection
        .query(
            "Hello, how are yu",
            2,
            None,
            None,
            &[QueryEnum::WithDocuments, QueryEnum::WithDistances],
            &LengthEmbedder,
        )
        .await
        .unwrap();
    assert_ids(ranked.iter().map(|d| d.id.as_str()), &["d1", "d2"]);

    let filtered = collection
        .query(
            "",
            2,
            Some(filter::eq("source", "unittest_doc_2")),
            None,
            &[QueryEnum::WithDocuments, QueryEnum::WithMetadatas],
            &LengthEmbedder,
        )
        .await
        .unwrap();
    assert_ids(filtered.iter().map(|d| d.id.as_str()), &["d2"]);

    let contains = collection
        .query(
            "y?",
            2,
            None,
            Some(filter::contains("you")),
            &[QueryEnum::WithDocuments],
            &LengthEmbedder,
        )
        .await
        .unwrap();
    assert_ids(contains.iter().map(|d| d.id.as_str()), &["d1"]);

    let first = collection.get(None, None, None).await.unwrap();
    let second = collection.get(None, None, None).await.unwrap();
    assert_eq!(first, second);

    let removed = collection
        .delete(Some(vec!["d1".to_string()]), None, None)
        .await
        .unwrap();
    assert_eq!(collection.count().await.unwrap(), 1);
    assert!(removed.is_empty() || removed == vec!["d1"]);
}
