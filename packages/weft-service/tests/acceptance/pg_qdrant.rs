use weft_config::{BACKEND_POSTGRES, Postgres, Qdrant};
use weft_service::{Backend, MmrTraversalRequest, Providers, WeftService};

#[tokio::test]
#[ignore = "Requires external Postgres and Qdrant. Set WEFT_PG_DSN and WEFT_QDRANT_URL to run."]
async fn angular_scenario_over_postgres_and_qdrant() {
	let Some(dsn) = weft_testkit::env_dsn() else {
		eprintln!(
			"Skipping angular_scenario_over_postgres_and_qdrant; set WEFT_PG_DSN to run this test."
		);

		return;
	};
	let Some(qdrant_url) = weft_testkit::env_qdrant_url() else {
		eprintln!(
			"Skipping angular_scenario_over_postgres_and_qdrant; set WEFT_QDRANT_URL to run this test."
		);

		return;
	};
	let test_db =
		weft_testkit::TestDatabase::new(&dsn).await.expect("Failed to create test database.");
	let mut cfg = super::test_config(2);

	cfg.storage.backend = BACKEND_POSTGRES.to_string();
	cfg.storage.postgres = Some(Postgres { dsn: test_db.dsn().to_string(), pool_max_conns: 4 });
	cfg.storage.qdrant =
		Some(Qdrant { url: qdrant_url, collection: test_db.collection_name("weft_acceptance") });

	let backend = Backend::connect(&cfg).await.expect("Failed to connect backend.");
	let service = WeftService::with_providers(
		cfg,
		backend,
		Providers::new(super::AngularEmbedding::new()),
	);

	super::seed(&service, super::angular_nodes()).await;

	let response = service
		.mmr_traversal_search(MmrTraversalRequest {
			query: "0.0".to_string(),
			k: Some(4),
			..Default::default()
		})
		.await
		.expect("Search failed.");

	assert_eq!(super::ids(&response), vec!["v0", "v2", "v1", "v3"]);

	let traversed = service
		.mmr_traversal_search(MmrTraversalRequest {
			query: "0.0".to_string(),
			k: Some(2),
			fetch_k: Some(2),
			..Default::default()
		})
		.await
		.expect("Search failed.");

	assert_eq!(super::ids(&traversed), vec!["v0", "v2"]);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
