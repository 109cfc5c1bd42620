use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use weft_domain::{ContentNode, Metadata, TextNode};

use crate::{Error, Result, WeftService, fanout};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AddNodesRequest {
	pub nodes: Vec<TextNode>,
}

/// Parallel columns, zipped into nodes. `metadatas` and `ids` must match `texts` in length.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AddTextsRequest {
	pub texts: Vec<String>,
	#[serde(default)]
	pub metadatas: Option<Vec<Metadata>>,
	#[serde(default)]
	pub ids: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteFailure {
	pub content_id: String,
	pub message: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AddNodesResponse {
	/// Written ids, in input order.
	pub added: Vec<String>,
	pub failed: Vec<WriteFailure>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeleteNodesRequest {
	pub content_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeleteNodesResponse {
	pub deleted: Vec<String>,
	/// Ids that did not exist.
	pub missing: Vec<String>,
	pub failed: Vec<WriteFailure>,
}

impl WeftService {
	/// Embeds and stores nodes. One failed write never aborts the others.
	pub async fn add_nodes(&self, req: AddNodesRequest) -> Result<AddNodesResponse> {
		if req.nodes.is_empty() {
			return Ok(AddNodesResponse::default());
		}

		for node in &req.nodes {
			node.validate()?;
		}

		let nodes = req
			.nodes
			.into_iter()
			.map(|node| {
				let content_id =
					node.content_id.clone().unwrap_or_else(|| Uuid::new_v4().to_string());

				(content_id, node)
			})
			.collect::<Vec<_>>();

		weft_domain::ensure_unique_ids(nodes.iter().map(|(content_id, _)| content_id.as_str()))?;

		let texts = nodes.iter().map(|(_, node)| node.text.clone()).collect::<Vec<_>>();
		let vectors = self.providers.embedding.embed(&self.cfg.providers.embedding, &texts).await?;

		if vectors.len() != texts.len() {
			return Err(Error::Provider {
				message: format!(
					"Embedding count mismatch; expected={} actual={}.",
					texts.len(),
					vectors.len()
				),
			});
		}

		for vector in &vectors {
			weft_domain::validate_vector(vector, self.vector_dim())?;
		}

		let content_nodes = nodes
			.into_iter()
			.zip(vectors)
			.map(|((content_id, node), embedding)| ContentNode {
				content_id,
				text: node.text,
				metadata: node.metadata,
				link_tags: node.link_tags,
				embedding,
			})
			.collect::<Vec<_>>();
		let ids = content_nodes.iter().map(|node| node.content_id.clone()).collect::<Vec<_>>();
		let writer = self.backend.writer.as_ref();
		let results = fanout::bounded(
			content_nodes,
			self.cfg.ingest.concurrent_writes as usize,
			&CancellationToken::new(),
			|node| writer.put(node),
		)
		.await;
		let mut out = AddNodesResponse::default();

		for (content_id, result) in ids.into_iter().zip(results) {
			match result {
				Ok(()) => out.added.push(content_id),
				Err(err) => {
					tracing::error!(content_id = %content_id, error = %err, "Node write failed.");

					out.failed.push(WriteFailure { content_id, message: err.to_string() });
				},
			}
		}

		Ok(out)
	}

	pub async fn add_texts(&self, req: AddTextsRequest) -> Result<AddNodesResponse> {
		let nodes = weft_domain::texts_to_nodes(req.texts, req.metadatas, req.ids)?;

		self.add_nodes(AddNodesRequest { nodes }).await
	}

	pub async fn delete_nodes(&self, req: DeleteNodesRequest) -> Result<DeleteNodesResponse> {
		weft_domain::ensure_unique_ids(req.content_ids.iter().map(String::as_str))?;

		let writer = self.backend.writer.as_ref();
		let results = fanout::bounded(
			req.content_ids.iter(),
			self.cfg.ingest.concurrent_writes as usize,
			&CancellationToken::new(),
			|content_id| writer.delete(content_id.as_str()),
		)
		.await;
		let mut out = DeleteNodesResponse::default();

		for (content_id, result) in req.content_ids.iter().zip(results) {
			match result {
				Ok(true) => out.deleted.push(content_id.clone()),
				Ok(false) => out.missing.push(content_id.clone()),
				Err(err) => {
					tracing::error!(content_id = %content_id, error = %err, "Node delete failed.");

					out.failed
						.push(WriteFailure { content_id: content_id.clone(), message: err.to_string() });
				},
			}
		}

		Ok(out)
	}
}
