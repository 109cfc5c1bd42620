use weft_service::{MmrTraversalRequest, StopReason};

fn request(k: u32) -> MmrTraversalRequest {
	MmrTraversalRequest { query: "0.0".to_string(), k: Some(k), ..Default::default() }
}

#[tokio::test]
async fn expansion_reaches_a_diverse_linked_node() {
	let (service, _) = super::angular_service().await;
	let response = service
		.mmr_traversal_search(MmrTraversalRequest { fetch_k: Some(2), ..request(2) })
		.await
		.expect("Search failed.");

	assert_eq!(super::ids(&response), vec!["v0", "v2"]);
	assert_eq!(response.items[0].explain.depth, 0);
	assert_eq!(response.items[1].explain.depth, 1);
	assert_eq!(response.stop_reason, StopReason::Completed);
}

#[tokio::test]
async fn zero_depth_picks_from_seeds_only() {
	let (service, _) = super::angular_service().await;
	let response = service
		.mmr_traversal_search(MmrTraversalRequest {
			fetch_k: Some(2),
			depth: Some(0),
			..request(2)
		})
		.await
		.expect("Search failed.");

	assert_eq!(super::ids(&response), vec!["v0", "v1"]);
}

#[tokio::test]
async fn wider_seed_set_prefers_the_diverse_seed() {
	let (service, _) = super::angular_service().await;
	let response = service
		.mmr_traversal_search(MmrTraversalRequest {
			fetch_k: Some(3),
			depth: Some(0),
			..request(2)
		})
		.await
		.expect("Search failed.");

	assert_eq!(super::ids(&response), vec!["v0", "v2"]);
}

#[tokio::test]
async fn full_selection_orders_by_marginal_relevance() {
	let (service, _) = super::angular_service().await;
	let response = service.mmr_traversal_search(request(4)).await.expect("Search failed.");

	assert_eq!(super::ids(&response), vec!["v0", "v2", "v1", "v3"]);

	let scores = response
		.items
		.iter()
		.map(|item| item.explain.mmr_score.expect("Missing MMR score."))
		.collect::<Vec<_>>();

	assert!((scores[0] - 0.4625).abs() < 1e-3, "Unexpected first score {}.", scores[0]);
	assert!((scores[1] - 0.16).abs() < 1e-2, "Unexpected second score {}.", scores[1]);
	assert!(scores[1] > scores[2] && scores[2] > scores[3]);
}

#[tokio::test]
async fn score_threshold_stops_selection() {
	let (service, _) = super::angular_service().await;
	let response = service
		.mmr_traversal_search(MmrTraversalRequest { score_threshold: Some(0.2), ..request(2) })
		.await
		.expect("Search failed.");

	assert_eq!(super::ids(&response), vec!["v0"]);
	assert_eq!(response.stop_reason, StopReason::ScoreThreshold);
}

#[tokio::test]
async fn exhausted_candidates_end_the_search_early() {
	let (service, _) = super::angular_service().await;
	let response = service
		.mmr_traversal_search(MmrTraversalRequest {
			fetch_k: Some(2),
			depth: Some(0),
			..request(4)
		})
		.await
		.expect("Search failed.");

	assert_eq!(super::ids(&response), vec!["v0", "v1"]);
	assert_eq!(response.stop_reason, StopReason::Exhausted);
}
