use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	#[serde(default)]
	pub search: Search,
	#[serde(default)]
	pub ingest: Ingest,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	/// One of "postgres" or "memory".
	pub backend: String,
	pub vector_dim: u32,
	/// Required when backend is "postgres".
	pub postgres: Option<Postgres>,
	/// Required when backend is "postgres".
	pub qdrant: Option<Qdrant>,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Deserialize)]
pub struct Qdrant {
	pub url: String,
	pub collection: String,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

/// Defaults applied to search requests that leave a parameter unset.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Search {
	pub k: u32,
	pub fetch_k: u32,
	/// Hop budget for MMR traversal search.
	pub depth: u32,
	/// Hop budget for plain traversal search.
	pub traversal_depth: u32,
	pub lambda_mult: f32,
	pub score_threshold: Option<f32>,
	/// Upper bound on concurrent storage calls issued within one search step.
	pub max_concurrency: u32,
	pub strict_hydration: bool,
}
impl Default for Search {
	fn default() -> Self {
		Self {
			k: 4,
			fetch_k: 100,
			depth: 2,
			traversal_depth: 1,
			lambda_mult: 0.5,
			score_threshold: None,
			max_concurrency: 16,
			strict_hydration: false,
		}
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Ingest {
	pub concurrent_writes: u32,
}
impl Default for Ingest {
	fn default() -> Self {
		Self { concurrent_writes: 100 }
	}
}
