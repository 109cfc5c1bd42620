pub mod backends;
pub mod ingest;
pub mod search;

mod error;
mod fanout;

pub use backends::PgQdrantStore;
pub use error::{Error, Result};
pub use ingest::{
	AddNodesRequest, AddNodesResponse, AddTextsRequest, DeleteNodesRequest, DeleteNodesResponse,
	WriteFailure,
};
pub use search::{
	HydrationFailure, MmrTraversalRequest, SearchItem, SearchItemExplain, SearchResponse,
	SimilarityRequest, StopReason, TraversalRequest,
};

use std::{
	collections::{BTreeSet, HashMap},
	future::Future,
	pin::Pin,
	sync::Arc,
};

use weft_config::{Config, EmbeddingProviderConfig};
use weft_domain::ContentNode;
use weft_providers::embedding;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A nearest-neighbor hit. `score` is the cosine similarity to the query vector.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredId {
	pub content_id: String,
	pub score: f32,
}

pub trait VectorIndex
where
	Self: Send + Sync,
{
	/// At most `n` hits, best first.
	fn fetch<'a>(&'a self, vector: &'a [f32], n: u32) -> BoxFuture<'a, Result<Vec<ScoredId>>>;
}

pub trait LinkStore
where
	Self: Send + Sync,
{
	/// Ids reachable over one outbound link from `content_id`, never including itself.
	fn linked_ids<'a>(&'a self, content_id: &'a str) -> BoxFuture<'a, Result<BTreeSet<String>>>;
}

pub trait ContentStore
where
	Self: Send + Sync,
{
	fn get<'a>(&'a self, content_id: &'a str) -> BoxFuture<'a, Result<ContentNode>>;

	fn get_embedding<'a>(&'a self, content_id: &'a str) -> BoxFuture<'a, Result<Vec<f32>>> {
		Box::pin(async move { self.get(content_id).await.map(|node| node.embedding) })
	}

	/// One entry per requested id. Fails as a whole only when the store cannot be reached.
	fn batch_get<'a>(
		&'a self,
		content_ids: &'a [String],
	) -> BoxFuture<'a, Result<HashMap<String, Result<ContentNode>>>>;
}

pub trait NodeWriter
where
	Self: Send + Sync,
{
	fn put<'a>(&'a self, node: ContentNode) -> BoxFuture<'a, Result<()>>;

	/// Returns whether the node existed.
	fn delete<'a>(&'a self, content_id: &'a str) -> BoxFuture<'a, Result<bool>>;
}

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, Result<Vec<Vec<f32>>>>;
}

#[derive(Clone)]
pub struct Backend {
	pub index: Arc<dyn VectorIndex>,
	pub links: Arc<dyn LinkStore>,
	pub content: Arc<dyn ContentStore>,
	pub writer: Arc<dyn NodeWriter>,
}
impl Backend {
	pub fn new(
		index: Arc<dyn VectorIndex>,
		links: Arc<dyn LinkStore>,
		content: Arc<dyn ContentStore>,
		writer: Arc<dyn NodeWriter>,
	) -> Self {
		Self { index, links, content, writer }
	}

	/// Uses one store for every collaborator role.
	pub fn from_store<S>(store: Arc<S>) -> Self
	where
		S: VectorIndex + LinkStore + ContentStore + NodeWriter + 'static,
	{
		Self { index: store.clone(), links: store.clone(), content: store.clone(), writer: store }
	}
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
}
impl Providers {
	pub fn new(embedding: Arc<dyn EmbeddingProvider>) -> Self {
		Self { embedding }
	}
}
impl Default for Providers {
	fn default() -> Self {
		Self { embedding: Arc::new(DefaultProviders) }
	}
}

pub struct WeftService {
	pub cfg: Config,
	pub backend: Backend,
	pub providers: Providers,
}
impl WeftService {
	pub fn new(cfg: Config, backend: Backend) -> Self {
		Self { cfg, backend, providers: Providers::default() }
	}

	pub fn with_providers(cfg: Config, backend: Backend, providers: Providers) -> Self {
		Self { cfg, backend, providers }
	}

	pub(crate) fn vector_dim(&self) -> usize {
		self.cfg.storage.vector_dim as usize
	}

	pub(crate) async fn embed_query(&self, query: &str) -> Result<Vec<f32>> {
		let texts = [query.to_string()];
		let vectors = self.providers.embedding.embed(&self.cfg.providers.embedding, &texts).await?;
		let [vector] = <[Vec<f32>; 1]>::try_from(vectors).map_err(|vectors| Error::Provider {
			message: format!("Expected one query vector, got {}.", vectors.len()),
		})?;

		weft_domain::validate_vector(&vector, self.vector_dim())?;

		Ok(vector)
	}
}

struct DefaultProviders;
impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, Result<Vec<Vec<f32>>>> {
		Box::pin(async move { Ok(embedding::embed(cfg, texts).await?) })
	}
}
