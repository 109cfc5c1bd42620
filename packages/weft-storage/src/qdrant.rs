use std::collections::HashMap;

use qdrant_client::{
	Payload, Qdrant,
	qdrant::{
		Condition, CreateCollectionBuilder, DeletePointsBuilder, Distance, Filter, PointStruct,
		Query, QueryPointsBuilder, UpsertPointsBuilder, Value, VectorParamsBuilder,
	},
};
use uuid::Uuid;

use crate::Result;

pub const CONTENT_ID_KEY: &str = "content_id";

pub struct QdrantStore {
	pub client: Qdrant,
	pub collection: String,
	pub vector_dim: u32,
}
impl QdrantStore {
	pub fn new(cfg: &weft_config::Qdrant, vector_dim: u32) -> Result<Self> {
		let client = Qdrant::from_url(&cfg.url).build()?;

		Ok(Self { client, collection: cfg.collection.clone(), vector_dim })
	}

	pub async fn ensure_collection(&self) -> Result<()> {
		if self.client.collection_exists(self.collection.as_str()).await? {
			return Ok(());
		}

		let builder = CreateCollectionBuilder::new(self.collection.clone())
			.vectors_config(VectorParamsBuilder::new(self.vector_dim as u64, Distance::Cosine));

		self.client.create_collection(builder).await?;

		Ok(())
	}

	pub async fn upsert(&self, content_id: &str, vector: &[f32]) -> Result<()> {
		let mut payload_map = HashMap::new();

		payload_map.insert(CONTENT_ID_KEY.to_string(), Value::from(content_id.to_string()));

		let point = PointStruct::new(
			point_id(content_id).to_string(),
			vector.to_vec(),
			Payload::from(payload_map),
		);
		let upsert = UpsertPointsBuilder::new(self.collection.clone(), vec![point]).wait(true);

		self.client.upsert_points(upsert).await?;

		Ok(())
	}

	/// Nearest points by cosine score, best first. Points without a content id payload are dropped.
	pub async fn search(&self, vector: &[f32], limit: u32) -> Result<Vec<(String, f32)>> {
		let search = QueryPointsBuilder::new(self.collection.clone())
			.query(Query::new_nearest(vector.to_vec()))
			.limit(limit as u64)
			.with_payload(true);
		let response = self.client.query(search).await?;

		Ok(response
			.result
			.into_iter()
			.filter_map(|point| {
				let content_id = point.payload.get(CONTENT_ID_KEY)?.as_str()?.to_string();

				Some((content_id, point.score))
			})
			.collect())
	}

	pub async fn delete(&self, content_id: &str) -> Result<()> {
		let filter = Filter::must([Condition::matches(CONTENT_ID_KEY, content_id.to_string())]);
		let delete = DeletePointsBuilder::new(self.collection.clone()).points(filter).wait(true);

		self.client.delete_points(delete).await?;

		Ok(())
	}
}

/// Stable point id for a content id, so re-inserts overwrite the same point.
pub fn point_id(content_id: &str) -> Uuid {
	Uuid::new_v5(&Uuid::NAMESPACE_OID, content_id.as_bytes())
}
