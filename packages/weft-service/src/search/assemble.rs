use serde::Serialize;

use weft_domain::ContentNode;

use crate::{ContentStore, Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HydrationFailure {
	pub content_id: String,
	pub reason: String,
}

/// Hydrates selected ids with a single batch read, keeping selection order.
pub struct ResultAssembler<'a> {
	content: &'a dyn ContentStore,
	strict: bool,
}
impl<'a> ResultAssembler<'a> {
	pub fn new(content: &'a dyn ContentStore, strict: bool) -> Self {
		Self { content, strict }
	}

	/// One slot per id. In strict mode the first failing id fails the call.
	pub async fn assemble(
		&self,
		content_ids: &[String],
	) -> Result<Vec<Result<ContentNode, HydrationFailure>>> {
		if content_ids.is_empty() {
			return Ok(Vec::new());
		}

		let mut records = self.content.batch_get(content_ids).await?;
		let mut out = Vec::with_capacity(content_ids.len());

		for content_id in content_ids {
			let record = records
				.remove(content_id)
				.unwrap_or_else(|| Err(Error::NotFound { content_id: content_id.clone() }));

			match record {
				Ok(node) => out.push(Ok(node)),
				Err(err) if self.strict => return Err(err),
				Err(err) => {
					tracing::warn!(content_id = %content_id, error = %err, "Result hydration failed.");

					out.push(Err(HydrationFailure {
						content_id: content_id.clone(),
						reason: err.to_string(),
					}));
				},
			}
		}

		Ok(out)
	}
}
