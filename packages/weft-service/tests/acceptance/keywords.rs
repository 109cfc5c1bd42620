use std::{collections::BTreeSet, sync::Arc};

use weft_service::{SimilarityRequest, TraversalRequest, WeftService};
use weft_storage::memory::MemoryStore;

async fn keyword_service() -> WeftService {
	let service =
		super::service_over(Arc::new(MemoryStore::new(3)), Arc::new(super::KeywordEmbedding), 3);

	super::seed(&service, super::keyword_nodes()).await;

	service
}

fn traversal(k: u32, depth: u32) -> TraversalRequest {
	TraversalRequest { query: "Earth".to_string(), k: Some(k), depth: Some(depth), strict: None }
}

#[tokio::test]
async fn similarity_ranks_by_query_closeness() {
	let service = keyword_service().await;
	let two = service
		.similarity_search(SimilarityRequest {
			query: "Earth".to_string(),
			k: Some(2),
			strict: None,
		})
		.await
		.expect("Search failed.");
	let one = service
		.similarity_search(SimilarityRequest {
			query: "Earth".to_string(),
			k: Some(1),
			strict: None,
		})
		.await
		.expect("Search failed.");

	assert_eq!(super::ids(&two), vec!["doc2", "doc1"]);
	assert_eq!(super::ids(&one), vec!["doc2"]);
	assert!(two.items.iter().all(|item| item.explain.depth == 0));
}

#[tokio::test]
async fn traversal_without_depth_returns_seeds() {
	let service = keyword_service().await;
	let two = service.traversal_search(traversal(2, 0)).await.expect("Search failed.");
	let one = service.traversal_search(traversal(1, 0)).await.expect("Search failed.");

	assert_eq!(super::ids(&two), vec!["doc2", "doc1"]);
	assert_eq!(super::ids(&one), vec!["doc2"]);
}

#[tokio::test]
async fn traversal_follows_parent_and_keyword_links() {
	let service = keyword_service().await;
	let two = service.traversal_search(traversal(2, 1)).await.expect("Search failed.");

	assert_eq!(super::ids(&two), vec!["doc2", "doc1", "greetings"]);

	let greetings = two
		.items
		.iter()
		.find(|item| item.content_id == "greetings")
		.expect("Missing greetings node.");

	assert_eq!(greetings.explain.depth, 1);
	assert_eq!(greetings.explain.mmr_score, None);
}

#[tokio::test]
async fn single_seed_traversal_reaches_siblings_and_parent() {
	let service = keyword_service().await;
	let one = service.traversal_search(traversal(1, 1)).await.expect("Search failed.");
	let got = one.content_ids().into_iter().collect::<BTreeSet<_>>();

	assert_eq!(got, BTreeSet::from(["doc1", "doc2", "greetings"]));
	assert_eq!(one.items[0].content_id, "doc2");
}

#[tokio::test]
async fn parent_links_are_directed() {
	let service = keyword_service().await;
	let response = service
		.traversal_search(TraversalRequest {
			query: "Typical Greetings".to_string(),
			k: Some(1),
			depth: Some(1),
			strict: None,
		})
		.await
		.expect("Search failed.");

	assert_eq!(super::ids(&response), vec!["greetings"]);
}
