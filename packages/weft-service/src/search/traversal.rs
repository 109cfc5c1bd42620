use std::collections::HashSet;

use tokio_util::sync::CancellationToken;

use crate::{Backend, Error, Result, fanout};

#[derive(Debug, Clone, PartialEq)]
pub struct Visit {
	pub content_id: String,
	/// Index score for seeds; linked nodes are not scored.
	pub similarity: Option<f32>,
	pub depth: u32,
}

#[derive(Debug, Clone)]
pub struct TraversalOutcome {
	pub visits: Vec<Visit>,
	pub cancelled: bool,
}

/// Top `k` seeds followed by every node reachable within `depth` hops, breadth first. Each
/// level lists newly reached ids in frontier order, and each node's links in id order.
pub async fn traverse(
	backend: &Backend,
	query: &[f32],
	k: u32,
	depth: u32,
	max_concurrency: usize,
	cancel: &CancellationToken,
) -> Result<TraversalOutcome> {
	let mut visits = Vec::new();

	if k == 0 {
		return Ok(TraversalOutcome { visits, cancelled: false });
	}

	let seeds = backend.index.fetch(query, k).await?;
	let mut visited = HashSet::new();
	let mut frontier = Vec::new();

	for seed in seeds {
		if visited.insert(seed.content_id.clone()) {
			frontier.push(seed.content_id.clone());
			visits.push(Visit { content_id: seed.content_id, similarity: Some(seed.score), depth: 0 });
		}
	}

	for level in 1..=depth {
		if frontier.is_empty() {
			break;
		}
		if cancel.is_cancelled() {
			return Ok(TraversalOutcome { visits, cancelled: true });
		}

		let links = backend.links.as_ref();
		let results = fanout::bounded(frontier.iter(), max_concurrency, cancel, |id| {
			links.linked_ids(id.as_str())
		})
		.await;
		let mut next = Vec::new();
		let mut cancelled = false;

		for (source, result) in frontier.iter().zip(results) {
			match result {
				Ok(linked) =>
					for id in linked {
						if visited.insert(id.clone()) {
							next.push(id.clone());
							visits.push(Visit { content_id: id, similarity: None, depth: level });
						}
					},
				Err(Error::NotFound { .. }) => {
					tracing::warn!(content_id = %source, "Traversal node has no link record.");
				},
				Err(Error::Cancelled) => cancelled = true,
				Err(err) => return Err(err),
			}
		}

		if cancelled {
			return Ok(TraversalOutcome { visits, cancelled: true });
		}

		frontier = next;
	}

	Ok(TraversalOutcome { visits, cancelled: false })
}
