use weft_domain::{LinkTag, TextNode};
use weft_service::{MmrTraversalRequest, StopReason, WeftService};

use super::{AngularEmbedding, FaultyStore};

/// `a -> b -> x` by a chain, `c -> x` directly. Only `a` and `c` are reachable from the index.
async fn two_path_service() -> WeftService {
	let store = FaultyStore::new(2);
	let service = super::service_over(store.clone(), AngularEmbedding::new(), 2);

	super::seed(
		&service,
		vec![
			TextNode::new("0.0").with_id("a").with_link(LinkTag::outgoing("chain", "ab")),
			TextNode::new("0.1")
				.with_id("b")
				.with_link(LinkTag::incoming("chain", "ab"))
				.with_link(LinkTag::outgoing("chain", "bx")),
			TextNode::new("0.3").with_id("c").with_link(LinkTag::outgoing("late", "x")),
			TextNode::new("0.4")
				.with_id("x")
				.with_link(LinkTag::incoming("chain", "bx"))
				.with_link(LinkTag::incoming("late", "x")),
		],
	)
	.await;

	store
		.unindexed
		.lock()
		.unwrap_or_else(|err| err.into_inner())
		.extend(["b".to_string(), "x".to_string()]);

	service
}

fn request() -> MmrTraversalRequest {
	MmrTraversalRequest {
		query: "0.0".to_string(),
		k: Some(4),
		fetch_k: Some(10),
		depth: Some(2),
		lambda_mult: Some(1.0),
		..Default::default()
	}
}

#[tokio::test]
async fn depth_is_fixed_at_first_discovery() {
	let service = two_path_service().await;
	let response = service.mmr_traversal_search(request()).await.expect("Search failed.");

	assert_eq!(super::ids(&response), vec!["a", "b", "c", "x"]);
	assert_eq!(response.stop_reason, StopReason::Completed);
	assert_eq!(response.candidates_seen, 4);

	let depth_of = |content_id: &str| {
		response
			.items
			.iter()
			.find(|item| item.content_id == content_id)
			.map(|item| item.explain.depth)
			.expect("Expected the node to be selected.")
	};

	assert_eq!(depth_of("a"), 0);
	assert_eq!(depth_of("b"), 1);
	assert_eq!(depth_of("c"), 0);
	assert_eq!(depth_of("x"), 2);
	assert_eq!(response.items.iter().filter(|item| item.content_id == "x").count(), 1);
}

#[tokio::test]
async fn shallow_depth_reaches_the_node_through_the_direct_link() {
	let service = two_path_service().await;
	let response = service
		.mmr_traversal_search(MmrTraversalRequest { depth: Some(1), ..request() })
		.await
		.expect("Search failed.");

	assert_eq!(super::ids(&response), vec!["a", "b", "c", "x"]);
	assert_eq!(response.items[3].explain.depth, 1);
}
