use std::sync::Arc;

use uuid::Uuid;

use weft_domain::{Metadata, MetadataValue, TextNode};
use weft_service::{
	AddNodesRequest, AddTextsRequest, DeleteNodesRequest, Error, SimilarityRequest, WeftService,
};
use weft_storage::memory::MemoryStore;

fn memory_service() -> WeftService {
	super::service_over(Arc::new(MemoryStore::new(2)), super::AngularEmbedding::new(), 2)
}

fn similar(query: &str, k: u32) -> SimilarityRequest {
	SimilarityRequest { query: query.to_string(), k: Some(k), strict: None }
}

#[tokio::test]
async fn missing_ids_are_generated() {
	let service = memory_service();
	let response = service
		.add_nodes(AddNodesRequest {
			nodes: vec![TextNode::new("0.1"), TextNode::new("0.2").with_id("fixed")],
		})
		.await
		.expect("Add failed.");

	assert_eq!(response.added.len(), 2);
	assert!(Uuid::parse_str(&response.added[0]).is_ok());
	assert_eq!(response.added[1], "fixed");
}

#[tokio::test]
async fn one_failed_write_does_not_abort_the_batch() {
	let store = super::FaultyStore::new(2);
	let service = super::service_over(store.clone(), super::AngularEmbedding::new(), 2);

	store.failing_puts.lock().unwrap_or_else(|err| err.into_inner()).insert("b".to_string());

	let response = service
		.add_nodes(AddNodesRequest {
			nodes: vec![
				TextNode::new("0.1").with_id("a"),
				TextNode::new("0.2").with_id("b"),
				TextNode::new("0.3").with_id("c"),
			],
		})
		.await
		.expect("Add failed.");

	assert_eq!(response.added, vec!["a", "c"]);
	assert_eq!(response.failed.len(), 1);
	assert_eq!(response.failed[0].content_id, "b");
	assert_eq!(store.inner.len(), 2);
}

#[tokio::test]
async fn invalid_nodes_are_rejected_before_embedding() {
	let embedding = super::AngularEmbedding::new();
	let service = super::service_over(Arc::new(MemoryStore::new(2)), embedding.clone(), 2);
	let blank = service
		.add_nodes(AddNodesRequest { nodes: vec![TextNode::new("0.1"), TextNode::new("  ")] })
		.await
		.expect_err("Expected rejection.");
	let duplicate = service
		.add_nodes(AddNodesRequest {
			nodes: vec![TextNode::new("0.1").with_id("a"), TextNode::new("0.2").with_id("a")],
		})
		.await
		.expect_err("Expected rejection.");

	assert!(matches!(blank, Error::InvalidArgument { .. }), "Unexpected error: {blank}");
	assert!(matches!(duplicate, Error::InvalidArgument { .. }), "Unexpected error: {duplicate}");
	assert_eq!(embedding.calls(), 0);
}

#[tokio::test]
async fn provider_output_is_checked() {
	let wrong_dim = super::service_over(
		Arc::new(MemoryStore::new(2)),
		Arc::new(super::FixedEmbedding { vectors: vec![vec![1.0, 0.0, 0.0]] }),
		2,
	);
	let wrong_count = super::service_over(
		Arc::new(MemoryStore::new(2)),
		Arc::new(super::FixedEmbedding { vectors: Vec::new() }),
		2,
	);
	let nodes = || AddNodesRequest { nodes: vec![TextNode::new("0.1").with_id("a")] };
	let dim_err = wrong_dim.add_nodes(nodes()).await.expect_err("Expected rejection.");
	let count_err = wrong_count.add_nodes(nodes()).await.expect_err("Expected rejection.");

	assert!(matches!(dim_err, Error::InvalidArgument { .. }), "Unexpected error: {dim_err}");
	assert!(matches!(count_err, Error::Provider { .. }), "Unexpected error: {count_err}");
}

#[tokio::test]
async fn texts_are_zipped_with_metadata_and_ids() {
	let service = memory_service();
	let mut metadata = Metadata::new();

	metadata.insert("source".to_string(), MetadataValue::from("notes"));

	let response = service
		.add_texts(AddTextsRequest {
			texts: vec!["0.0".to_string(), "0.5".to_string()],
			metadatas: Some(vec![metadata.clone(), Metadata::new()]),
			ids: Some(vec!["near".to_string(), "far".to_string()]),
		})
		.await
		.expect("Add failed.");

	assert_eq!(response.added, vec!["near", "far"]);

	let hits = service.similarity_search(similar("0.0", 1)).await.expect("Search failed.");

	assert_eq!(super::ids(&hits), vec!["near"]);
	assert_eq!(hits.items[0].metadata, metadata);
}

#[tokio::test]
async fn mismatched_text_columns_are_rejected() {
	let service = memory_service();
	let err = service
		.add_texts(AddTextsRequest {
			texts: vec!["0.0".to_string(), "0.5".to_string()],
			metadatas: None,
			ids: Some(vec!["only-one".to_string()]),
		})
		.await
		.expect_err("Expected rejection.");

	assert!(matches!(err, Error::InvalidArgument { .. }), "Unexpected error: {err}");
}

#[tokio::test]
async fn rewriting_an_id_replaces_the_node() {
	let (service, _) = super::angular_service().await;

	super::seed(&service, vec![TextNode::new("0.0").with_id("v3")]).await;

	let hits = service.similarity_search(similar("0.0", 1)).await.expect("Search failed.");

	assert_eq!(super::ids(&hits), vec!["v3"]);
	assert_eq!(hits.items[0].text, "0.0");
	assert!(hits.items[0].link_tags.is_empty());
}

#[tokio::test]
async fn delete_reports_deleted_and_missing() {
	let (service, _) = super::angular_service().await;
	let response = service
		.delete_nodes(DeleteNodesRequest { content_ids: vec!["v0".to_string(), "nope".to_string()] })
		.await
		.expect("Delete failed.");

	assert_eq!(response.deleted, vec!["v0"]);
	assert_eq!(response.missing, vec!["nope"]);
	assert!(response.failed.is_empty());

	let hits = service.similarity_search(similar("0.0", 4)).await.expect("Search failed.");

	assert!(!hits.content_ids().contains(&"v0"));
	assert_eq!(hits.items.len(), 3);
}
