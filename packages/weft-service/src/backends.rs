//! Collaborator implementations over the storage crate.

use std::{
	collections::{BTreeSet, HashMap},
	sync::Arc,
};

use weft_config::{BACKEND_MEMORY, BACKEND_POSTGRES, Config};
use weft_domain::ContentNode;
use weft_storage::{db::Db, memory::MemoryStore, qdrant::QdrantStore, queries};

use crate::{
	Backend, BoxFuture, ContentStore, Error, LinkStore, NodeWriter, Result, ScoredId, VectorIndex,
};

impl Backend {
	/// Builds the configured backend, bootstrapping schema and collection for Postgres.
	pub async fn connect(cfg: &Config) -> Result<Self> {
		match cfg.storage.backend.as_str() {
			BACKEND_MEMORY =>
				Ok(Self::from_store(Arc::new(MemoryStore::new(cfg.storage.vector_dim)))),
			BACKEND_POSTGRES => {
				let (Some(postgres), Some(qdrant)) =
					(cfg.storage.postgres.as_ref(), cfg.storage.qdrant.as_ref())
				else {
					return Err(Error::invalid(
						"storage.postgres and storage.qdrant are required for the postgres backend.",
					));
				};
				let store = PgQdrantStore::connect(postgres, qdrant, cfg.storage.vector_dim).await?;

				Ok(Self::from_store(Arc::new(store)))
			},
			other => Err(Error::invalid(format!("Unknown storage backend {other:?}."))),
		}
	}
}

impl VectorIndex for MemoryStore {
	fn fetch<'a>(&'a self, vector: &'a [f32], n: u32) -> BoxFuture<'a, Result<Vec<ScoredId>>> {
		Box::pin(async move {
			Ok(self
				.search(vector, n as usize)
				.into_iter()
				.map(|(content_id, score)| ScoredId { content_id, score })
				.collect())
		})
	}
}
impl LinkStore for MemoryStore {
	fn linked_ids<'a>(&'a self, content_id: &'a str) -> BoxFuture<'a, Result<BTreeSet<String>>> {
		Box::pin(async move { Ok(MemoryStore::linked_ids(self, content_id)) })
	}
}
impl ContentStore for MemoryStore {
	fn get<'a>(&'a self, content_id: &'a str) -> BoxFuture<'a, Result<ContentNode>> {
		Box::pin(async move {
			MemoryStore::get(self, content_id)
				.ok_or_else(|| Error::NotFound { content_id: content_id.to_string() })
		})
	}

	fn get_embedding<'a>(&'a self, content_id: &'a str) -> BoxFuture<'a, Result<Vec<f32>>> {
		Box::pin(async move {
			self.embedding(content_id)
				.ok_or_else(|| Error::NotFound { content_id: content_id.to_string() })
		})
	}

	fn batch_get<'a>(
		&'a self,
		content_ids: &'a [String],
	) -> BoxFuture<'a, Result<HashMap<String, Result<ContentNode>>>> {
		Box::pin(async move {
			Ok(content_ids
				.iter()
				.map(|content_id| {
					let node = MemoryStore::get(self, content_id)
						.ok_or_else(|| Error::NotFound { content_id: content_id.clone() });

					(content_id.clone(), node)
				})
				.collect())
		})
	}
}
impl NodeWriter for MemoryStore {
	fn put<'a>(&'a self, node: ContentNode) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move { Ok(MemoryStore::put(self, node)?) })
	}

	fn delete<'a>(&'a self, content_id: &'a str) -> BoxFuture<'a, Result<bool>> {
		Box::pin(async move { Ok(MemoryStore::delete(self, content_id)) })
	}
}

/// Postgres holds content, link tags and embeddings; Qdrant serves nearest-neighbor queries.
pub struct PgQdrantStore {
	pub db: Db,
	pub qdrant: QdrantStore,
}
impl PgQdrantStore {
	pub async fn connect(
		postgres: &weft_config::Postgres,
		qdrant: &weft_config::Qdrant,
		vector_dim: u32,
	) -> Result<Self> {
		let db = Db::connect(postgres).await?;

		db.ensure_schema(vector_dim).await?;

		let qdrant = QdrantStore::new(qdrant, vector_dim)?;

		qdrant.ensure_collection().await?;

		Ok(Self { db, qdrant })
	}
}
impl VectorIndex for PgQdrantStore {
	fn fetch<'a>(&'a self, vector: &'a [f32], n: u32) -> BoxFuture<'a, Result<Vec<ScoredId>>> {
		Box::pin(async move {
			let hits = self.qdrant.search(vector, n).await?;

			Ok(hits.into_iter().map(|(content_id, score)| ScoredId { content_id, score }).collect())
		})
	}
}
impl LinkStore for PgQdrantStore {
	fn linked_ids<'a>(&'a self, content_id: &'a str) -> BoxFuture<'a, Result<BTreeSet<String>>> {
		Box::pin(async move { Ok(queries::linked_ids(&self.db, content_id).await?) })
	}
}
impl ContentStore for PgQdrantStore {
	fn get<'a>(&'a self, content_id: &'a str) -> BoxFuture<'a, Result<ContentNode>> {
		Box::pin(async move {
			queries::get_node(&self.db, content_id)
				.await?
				.ok_or_else(|| Error::NotFound { content_id: content_id.to_string() })
		})
	}

	fn get_embedding<'a>(&'a self, content_id: &'a str) -> BoxFuture<'a, Result<Vec<f32>>> {
		Box::pin(async move {
			queries::get_embedding(&self.db, content_id)
				.await?
				.ok_or_else(|| Error::NotFound { content_id: content_id.to_string() })
		})
	}

	fn batch_get<'a>(
		&'a self,
		content_ids: &'a [String],
	) -> BoxFuture<'a, Result<HashMap<String, Result<ContentNode>>>> {
		Box::pin(async move {
			let mut found = queries::get_nodes(&self.db, content_ids).await?;

			Ok(content_ids
				.iter()
				.map(|content_id| {
					let node = match found.remove(content_id) {
						Some(node) => node.map_err(Error::from),
						None => Err(Error::NotFound { content_id: content_id.clone() }),
					};

					(content_id.clone(), node)
				})
				.collect())
		})
	}
}
impl NodeWriter for PgQdrantStore {
	fn put<'a>(&'a self, node: ContentNode) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			queries::upsert_node(&self.db, &node).await?;
			self.qdrant.upsert(&node.content_id, &node.embedding).await?;

			Ok(())
		})
	}

	fn delete<'a>(&'a self, content_id: &'a str) -> BoxFuture<'a, Result<bool>> {
		Box::pin(async move {
			self.qdrant.delete(content_id).await?;

			Ok(queries::delete_node(&self.db, content_id).await?)
		})
	}
}
