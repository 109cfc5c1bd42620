use std::collections::{BTreeSet, HashSet};

use weft_service::{Error, MmrTraversalRequest, SimilarityRequest, StopReason, TraversalRequest};

fn request(k: u32) -> MmrTraversalRequest {
	MmrTraversalRequest { query: "0.0".to_string(), k: Some(k), ..Default::default() }
}

#[tokio::test]
async fn zero_depth_selects_only_seeds() {
	let (service, _) = super::angular_service().await;
	let seeds = service
		.similarity_search(SimilarityRequest { query: "0.0".to_string(), k: Some(3), strict: None })
		.await
		.expect("Search failed.");
	let picked = service
		.mmr_traversal_search(MmrTraversalRequest {
			fetch_k: Some(3),
			depth: Some(0),
			..request(3)
		})
		.await
		.expect("Search failed.");
	let seeds = seeds.content_ids().into_iter().collect::<BTreeSet<_>>();

	assert!(picked.content_ids().iter().all(|id| seeds.contains(id)));
	assert!(picked.items.iter().all(|item| item.explain.depth == 0));
}

#[tokio::test]
async fn zero_k_returns_nothing_without_embedding() {
	let (service, embedding) = super::angular_service().await;
	let calls = embedding.calls();
	let mmr = service.mmr_traversal_search(request(0)).await.expect("Search failed.");
	let traversal = service
		.traversal_search(TraversalRequest {
			query: "0.0".to_string(),
			k: Some(0),
			depth: Some(2),
			strict: None,
		})
		.await
		.expect("Search failed.");

	assert!(mmr.items.is_empty());
	assert!(traversal.items.is_empty());
	assert_eq!(embedding.calls(), calls);
}

#[tokio::test]
async fn repeated_searches_agree() {
	let (service, _) = super::angular_service().await;
	let first = service.mmr_traversal_search(request(3)).await.expect("Search failed.");
	let second = service.mmr_traversal_search(request(3)).await.expect("Search failed.");

	assert_eq!(first.items, second.items);
	assert_eq!(first.stop_reason, second.stop_reason);
}

#[tokio::test]
async fn smaller_k_is_a_prefix_of_larger_k() {
	let (service, _) = super::angular_service().await;
	let full = service.mmr_traversal_search(request(4)).await.expect("Search failed.");
	let full_ids = full.content_ids();

	for k in 1..4 {
		let partial = service.mmr_traversal_search(request(k)).await.expect("Search failed.");

		assert_eq!(partial.content_ids(), full_ids[..k as usize]);
	}
}

#[tokio::test]
async fn selections_are_unique_and_bounded_by_k() {
	let (service, _) = super::angular_service().await;

	for k in 1..=6 {
		let response = service.mmr_traversal_search(request(k)).await.expect("Search failed.");
		let unique = response.content_ids().into_iter().collect::<HashSet<_>>();

		assert!(response.items.len() <= k as usize);
		assert_eq!(unique.len(), response.items.len());
	}
}

#[tokio::test]
async fn full_lambda_reads_no_stored_embeddings() {
	let (service, store) = super::faulty_angular_service().await;
	let response = service
		.similarity_search(SimilarityRequest { query: "0.0".to_string(), k: Some(3), strict: None })
		.await
		.expect("Search failed.");

	assert_eq!(super::ids(&response), vec!["v0", "v1", "v2"]);
	assert_eq!(store.embedding_reads(), 0);
}

#[tokio::test]
async fn zero_fetch_k_yields_an_empty_result() {
	let (service, store) = super::faulty_angular_service().await;
	let response = service
		.mmr_traversal_search(MmrTraversalRequest { fetch_k: Some(0), ..request(2) })
		.await
		.expect("Search failed.");

	assert!(response.items.is_empty());
	assert!(response.failures.is_empty());
	assert_eq!(response.stop_reason, StopReason::Exhausted);
	assert_eq!(store.embedding_reads(), 0);
}

#[tokio::test]
async fn invalid_parameters_are_rejected() {
	let (service, embedding) = super::angular_service().await;
	let calls = embedding.calls();
	let cases = [
		MmrTraversalRequest { lambda_mult: Some(1.5), ..request(2) },
		MmrTraversalRequest { lambda_mult: Some(f32::NAN), ..request(2) },
		MmrTraversalRequest { score_threshold: Some(f32::INFINITY), ..request(2) },
		MmrTraversalRequest { query: "   ".to_string(), ..request(2) },
	];

	for case in cases {
		let err = service.mmr_traversal_search(case.clone()).await.expect_err("Expected rejection.");

		assert!(matches!(err, Error::InvalidArgument { .. }), "Unexpected error for {case:?}: {err}");
	}

	assert_eq!(embedding.calls(), calls);
}
