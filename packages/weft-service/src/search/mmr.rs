//! Graph-aware maximal marginal relevance.
//!
//! Seeds come from the vector index. Each round scores every unselected candidate, selects the
//! best one and, while the winner is within the hop budget, pulls its linked nodes into the
//! candidate pool. A node's depth is fixed the first time any path reaches it.

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use weft_domain::similarity_or_zero;

use crate::{
	Backend, Error, Result, fanout,
	search::{
		cache::CandidateCache,
		scoring::{self, Pick},
	},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
	/// `k` selections were made.
	Completed,
	/// The candidate pool ran dry first.
	Exhausted,
	/// The best remaining candidate scored below the threshold.
	ScoreThreshold,
	Cancelled,
}

#[derive(Debug, Clone, Copy)]
pub struct EngineParams {
	pub k: u32,
	pub fetch_k: u32,
	pub depth: u32,
	pub lambda_mult: f32,
	pub score_threshold: Option<f32>,
	pub max_concurrency: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
	pub content_id: String,
	pub similarity: f32,
	pub mmr_score: f32,
	pub depth: u32,
}

#[derive(Debug, Clone)]
pub struct EngineOutcome {
	pub selections: Vec<Selection>,
	pub stop_reason: StopReason,
	pub candidates_seen: usize,
}

pub struct MmrTraversalEngine<'a> {
	backend: &'a Backend,
	params: EngineParams,
	cancel: &'a CancellationToken,
}
impl<'a> MmrTraversalEngine<'a> {
	pub fn new(backend: &'a Backend, params: EngineParams, cancel: &'a CancellationToken) -> Self {
		Self { backend, params, cancel }
	}

	pub async fn search(&self, query: &[f32]) -> Result<EngineOutcome> {
		let mut state = SearchState::default();

		if self.params.k == 0 {
			return Ok(state.finish(StopReason::Completed));
		}

		let seeds = match self.params.fetch_k {
			0 => Vec::new(),
			fetch_k => self.backend.index.fetch(query, fetch_k).await?,
		};

		for seed in seeds {
			state.cache.insert(seed.content_id, seed.score, 0, None);
		}

		let stop_reason = match self.run(query, &mut state).await {
			Ok(reason) => reason,
			Err(Error::Cancelled) => StopReason::Cancelled,
			Err(err) => return Err(err),
		};

		Ok(state.finish(stop_reason))
	}

	async fn run(&self, query: &[f32], state: &mut SearchState) -> Result<StopReason> {
		while state.selections.len() < self.params.k as usize {
			if self.cancel.is_cancelled() {
				return Ok(StopReason::Cancelled);
			}

			let Some(winner) = self.pick(state).await? else {
				return Ok(StopReason::Exhausted);
			};

			if let Some(threshold) = self.params.score_threshold
				&& winner.mmr_score < threshold
			{
				return Ok(StopReason::ScoreThreshold);
			}

			if self.uses_redundancy() {
				let embedding = match state
					.cache
					.get_embedding(&winner.content_id, self.backend.content.as_ref())
					.await
				{
					Ok(embedding) => embedding,
					Err(Error::NotFound { .. }) => {
						tracing::warn!(
							content_id = %winner.content_id,
							"Selected candidate vanished; skipping."
						);

						state.cache.discard(&winner.content_id);

						continue;
					},
					Err(err) => return Err(err),
				};

				state.selected_embeddings.push(embedding);
			}

			state.cache.mark_selected(&winner.content_id);

			let expand = winner.depth < self.params.depth;
			let content_id = winner.content_id.clone();
			let next_depth = winner.depth + 1;

			state.selections.push(winner);

			if expand {
				self.expand(query, &content_id, next_depth, state).await?;
			}
		}

		Ok(StopReason::Completed)
	}

	/// Scores every unselected candidate and returns the best, or `None` when none remain.
	async fn pick(&self, state: &mut SearchState) -> Result<Option<Selection>> {
		let lambda_mult = self.params.lambda_mult;
		let score_redundancy = self.uses_redundancy() && !state.selected_embeddings.is_empty();

		if score_redundancy {
			let ids =
				state.cache.unselected_iter().map(|c| c.content_id.clone()).collect::<Vec<_>>();

			state
				.cache
				.prefetch_embeddings(
					&ids,
					self.backend.content.as_ref(),
					self.params.max_concurrency,
					self.cancel,
				)
				.await?;
		}

		let selected = &state.selected_embeddings;
		let mut best: Option<(Pick, Selection)> = None;

		for candidate in state.cache.unselected_mut() {
			let redundancy = match (score_redundancy, candidate.embedding.as_deref()) {
				(true, Some(embedding)) => scoring::max_redundancy(embedding, selected),
				_ => 0.0,
			};

			candidate.mmr_score = scoring::mmr_score(lambda_mult, candidate.similarity, redundancy);

			let pick = Pick { mmr_score: candidate.mmr_score, seq: candidate.seq };

			if best.as_ref().is_none_or(|(current, _)| pick.better_than(current)) {
				best = Some((
					pick,
					Selection {
						content_id: candidate.content_id.clone(),
						similarity: candidate.similarity,
						mmr_score: candidate.mmr_score,
						depth: candidate.depth,
					},
				));
			}
		}

		Ok(best.map(|(_, selection)| selection))
	}

	/// Adds the winner's linked nodes as candidates at `depth`.
	async fn expand(
		&self,
		query: &[f32],
		content_id: &str,
		depth: u32,
		state: &mut SearchState,
	) -> Result<()> {
		let linked = match self.backend.links.linked_ids(content_id).await {
			Ok(linked) => linked,
			Err(Error::NotFound { .. }) => {
				tracing::warn!(content_id = %content_id, "Selected node has no link record.");

				return Ok(());
			},
			Err(err) => return Err(err),
		};
		let new_ids =
			linked.into_iter().filter(|id| state.cache.mark_fetched(id)).collect::<Vec<_>>();

		if new_ids.is_empty() {
			return Ok(());
		}

		let content = self.backend.content.as_ref();
		let results = fanout::bounded(
			new_ids.iter(),
			self.params.max_concurrency,
			self.cancel,
			|id| content.get_embedding(id.as_str()),
		)
		.await;
		let mut cancelled = false;

		for (id, result) in new_ids.into_iter().zip(results) {
			match result {
				Ok(embedding) => {
					let similarity = similarity_or_zero(query, &embedding);

					state.cache.insert(id, similarity, depth, Some(embedding));
				},
				Err(Error::NotFound { .. }) => {
					tracing::warn!(
						content_id = %id,
						linked_from = %content_id,
						"Linked node not found; skipping."
					);
				},
				Err(Error::Cancelled) => cancelled = true,
				Err(err) => return Err(err),
			}
		}

		if cancelled {
			return Err(Error::Cancelled);
		}

		Ok(())
	}

	/// With `λ = 1` the redundancy term has no weight, so embeddings are never loaded for it.
	fn uses_redundancy(&self) -> bool {
		self.params.lambda_mult < 1.0
	}
}

#[derive(Default)]
struct SearchState {
	cache: CandidateCache,
	selections: Vec<Selection>,
	selected_embeddings: Vec<Vec<f32>>,
}
impl SearchState {
	fn finish(self, stop_reason: StopReason) -> EngineOutcome {
		EngineOutcome {
			candidates_seen: self.cache.len(),
			selections: self.selections,
			stop_reason,
		}
	}
}
