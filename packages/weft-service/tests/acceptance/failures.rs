use tokio_util::sync::CancellationToken;

use weft_service::{Error, MmrTraversalRequest, StopReason, TraversalRequest};

fn request(k: u32, fetch_k: u32) -> MmrTraversalRequest {
	MmrTraversalRequest {
		query: "0.0".to_string(),
		k: Some(k),
		fetch_k: Some(fetch_k),
		..Default::default()
	}
}

fn lock<T>(mutex: &std::sync::Mutex<T>) -> std::sync::MutexGuard<'_, T> {
	mutex.lock().unwrap_or_else(|err| err.into_inner())
}

#[tokio::test]
async fn missing_linked_node_is_skipped() {
	let (service, store) = super::faulty_angular_service().await;

	lock(&store.missing_embeddings).insert("v2".to_string());

	let response = service.mmr_traversal_search(request(2, 2)).await.expect("Search failed.");

	assert_eq!(super::ids(&response), vec!["v0", "v1"]);
	assert_eq!(response.stop_reason, StopReason::Completed);
}

#[tokio::test]
async fn unavailable_link_store_fails_the_search() {
	let (service, store) = super::faulty_angular_service().await;

	*lock(&store.links_unavailable) = true;

	let mmr = service.mmr_traversal_search(request(2, 2)).await.expect_err("Expected failure.");
	let traversal = service
		.traversal_search(TraversalRequest {
			query: "0.0".to_string(),
			k: Some(1),
			depth: Some(1),
			strict: None,
		})
		.await
		.expect_err("Expected failure.");

	assert!(matches!(mmr, Error::StorageUnavailable { .. }), "Unexpected error: {mmr}");
	assert!(matches!(traversal, Error::StorageUnavailable { .. }), "Unexpected error: {traversal}");
}

#[tokio::test]
async fn unavailable_link_store_is_not_touched_without_depth() {
	let (service, store) = super::faulty_angular_service().await;

	*lock(&store.links_unavailable) = true;

	let response = service
		.mmr_traversal_search(MmrTraversalRequest { depth: Some(0), ..request(2, 2) })
		.await
		.expect("Search failed.");

	assert_eq!(super::ids(&response), vec!["v0", "v1"]);
}

#[tokio::test]
async fn cancellation_keeps_partial_selection() {
	let (service, store) = super::faulty_angular_service().await;
	let cancel = CancellationToken::new();

	*lock(&store.cancel_on_links) = Some(cancel.clone());

	let response = service
		.mmr_traversal_search_with_cancel(request(4, 2), &cancel)
		.await
		.expect("Search failed.");

	assert_eq!(super::ids(&response), vec!["v0"]);
	assert_eq!(response.stop_reason, StopReason::Cancelled);
}

#[tokio::test]
async fn cancelled_before_start_selects_nothing() {
	let (service, _) = super::faulty_angular_service().await;
	let cancel = CancellationToken::new();

	cancel.cancel();

	let response = service
		.mmr_traversal_search_with_cancel(request(2, 2), &cancel)
		.await
		.expect("Search failed.");

	assert!(response.items.is_empty());
	assert_eq!(response.stop_reason, StopReason::Cancelled);
}

#[tokio::test]
async fn hydration_failures_are_reported() {
	let (service, store) = super::faulty_angular_service().await;

	lock(&store.missing_records).insert("v2".to_string());

	let response = service.mmr_traversal_search(request(2, 2)).await.expect("Search failed.");

	assert_eq!(super::ids(&response), vec!["v0"]);
	assert_eq!(response.failures.len(), 1);
	assert_eq!(response.failures[0].content_id, "v2");
}

#[tokio::test]
async fn strict_hydration_fails_the_call() {
	let (service, store) = super::faulty_angular_service().await;

	lock(&store.missing_records).insert("v2".to_string());

	let err = service
		.mmr_traversal_search(MmrTraversalRequest { strict: Some(true), ..request(2, 2) })
		.await
		.expect_err("Expected failure.");

	assert!(matches!(err, Error::NotFound { ref content_id } if content_id == "v2"));
}

#[tokio::test]
async fn corrupt_record_fails_only_its_own_item() {
	let (service, store) = super::faulty_angular_service().await;

	lock(&store.corrupt_records).insert("v2".to_string());

	let response = service.mmr_traversal_search(request(4, 4)).await.expect("Search failed.");

	assert_eq!(super::ids(&response), vec!["v0", "v1", "v3"]);
	assert_eq!(response.failures.len(), 1);
	assert_eq!(response.failures[0].content_id, "v2");
	assert!(response.failures[0].reason.contains("corrupt row"));

	let err = service
		.mmr_traversal_search(MmrTraversalRequest { strict: Some(true), ..request(4, 4) })
		.await
		.expect_err("Expected failure.");

	assert!(matches!(err, Error::StorageUnavailable { .. }), "Unexpected error: {err}");
}
