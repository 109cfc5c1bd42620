pub mod assemble;
pub mod cache;
pub mod mmr;
pub mod scoring;
pub mod traversal;

pub use assemble::{HydrationFailure, ResultAssembler};
pub use mmr::{EngineOutcome, EngineParams, MmrTraversalEngine, Selection, StopReason};

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use weft_domain::{LinkTag, Metadata};

use crate::{Error, Result, WeftService};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MmrTraversalRequest {
	pub query: String,
	#[serde(default)]
	pub k: Option<u32>,
	#[serde(default)]
	pub fetch_k: Option<u32>,
	#[serde(default)]
	pub depth: Option<u32>,
	#[serde(default)]
	pub lambda_mult: Option<f32>,
	#[serde(default)]
	pub score_threshold: Option<f32>,
	/// Fail the whole call when any selected record cannot be loaded.
	#[serde(default)]
	pub strict: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimilarityRequest {
	pub query: String,
	#[serde(default)]
	pub k: Option<u32>,
	#[serde(default)]
	pub strict: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TraversalRequest {
	pub query: String,
	#[serde(default)]
	pub k: Option<u32>,
	#[serde(default)]
	pub depth: Option<u32>,
	#[serde(default)]
	pub strict: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchItemExplain {
	/// Similarity to the query. Unset for nodes reached by plain traversal.
	pub similarity: Option<f32>,
	pub mmr_score: Option<f32>,
	pub depth: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchItem {
	pub content_id: String,
	pub text: String,
	pub metadata: Metadata,
	pub link_tags: BTreeSet<LinkTag>,
	pub explain: SearchItemExplain,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
	pub items: Vec<SearchItem>,
	pub failures: Vec<HydrationFailure>,
	pub stop_reason: StopReason,
	pub candidates_seen: usize,
}
impl SearchResponse {
	pub fn content_ids(&self) -> Vec<&str> {
		self.items.iter().map(|item| item.content_id.as_str()).collect()
	}

	fn empty() -> Self {
		Self {
			items: Vec::new(),
			failures: Vec::new(),
			stop_reason: StopReason::Completed,
			candidates_seen: 0,
		}
	}
}

impl WeftService {
	pub async fn mmr_traversal_search(&self, req: MmrTraversalRequest) -> Result<SearchResponse> {
		self.mmr_traversal_search_with_cancel(req, &CancellationToken::new()).await
	}

	pub async fn mmr_traversal_search_with_cancel(
		&self,
		req: MmrTraversalRequest,
		cancel: &CancellationToken,
	) -> Result<SearchResponse> {
		let defaults = &self.cfg.search;
		let params = EngineParams {
			k: req.k.unwrap_or(defaults.k),
			fetch_k: req.fetch_k.unwrap_or(defaults.fetch_k),
			depth: req.depth.unwrap_or(defaults.depth),
			lambda_mult: req.lambda_mult.unwrap_or(defaults.lambda_mult),
			score_threshold: req.score_threshold.or(defaults.score_threshold),
			max_concurrency: defaults.max_concurrency as usize,
		};

		validate_query(&req.query)?;
		validate_params(&params)?;

		self.run_engine(&req.query, params, req.strict, cancel).await
	}

	/// Plain top-`k` similarity: the engine with no expansion and no diversity term.
	pub async fn similarity_search(&self, req: SimilarityRequest) -> Result<SearchResponse> {
		self.similarity_search_with_cancel(req, &CancellationToken::new()).await
	}

	pub async fn similarity_search_with_cancel(
		&self,
		req: SimilarityRequest,
		cancel: &CancellationToken,
	) -> Result<SearchResponse> {
		let k = req.k.unwrap_or(self.cfg.search.k);
		let params = EngineParams {
			k,
			fetch_k: k,
			depth: 0,
			lambda_mult: 1.0,
			score_threshold: None,
			max_concurrency: self.cfg.search.max_concurrency as usize,
		};

		validate_query(&req.query)?;

		self.run_engine(&req.query, params, req.strict, cancel).await
	}

	/// Seeds plus everything reachable within `depth` hops, uncapped and unranked.
	pub async fn traversal_search(&self, req: TraversalRequest) -> Result<SearchResponse> {
		self.traversal_search_with_cancel(req, &CancellationToken::new()).await
	}

	pub async fn traversal_search_with_cancel(
		&self,
		req: TraversalRequest,
		cancel: &CancellationToken,
	) -> Result<SearchResponse> {
		let k = req.k.unwrap_or(self.cfg.search.k);
		let depth = req.depth.unwrap_or(self.cfg.search.traversal_depth);

		validate_query(&req.query)?;

		if k == 0 {
			return Ok(SearchResponse::empty());
		}

		let query = self.embed_query(&req.query).await?;
		let outcome = traversal::traverse(
			&self.backend,
			&query,
			k,
			depth,
			self.cfg.search.max_concurrency as usize,
			cancel,
		)
		.await?;
		let stop_reason =
			if outcome.cancelled { StopReason::Cancelled } else { StopReason::Completed };

		tracing::debug!(
			k,
			depth,
			visited = outcome.visits.len(),
			stop_reason = ?stop_reason,
			"Traversal search finished."
		);

		let hits = outcome
			.visits
			.into_iter()
			.map(|visit| {
				let explain = SearchItemExplain {
					similarity: visit.similarity,
					mmr_score: None,
					depth: visit.depth,
				};

				(visit.content_id, explain)
			})
			.collect::<Vec<_>>();
		let candidates_seen = hits.len();

		self.hydrate(hits, req.strict, stop_reason, candidates_seen).await
	}

	async fn run_engine(
		&self,
		query: &str,
		params: EngineParams,
		strict: Option<bool>,
		cancel: &CancellationToken,
	) -> Result<SearchResponse> {
		if params.k == 0 {
			return Ok(SearchResponse::empty());
		}

		let query = self.embed_query(query).await?;
		let outcome = MmrTraversalEngine::new(&self.backend, params, cancel).search(&query).await?;

		tracing::debug!(
			k = params.k,
			fetch_k = params.fetch_k,
			depth = params.depth,
			selected = outcome.selections.len(),
			candidates = outcome.candidates_seen,
			stop_reason = ?outcome.stop_reason,
			"MMR traversal search finished."
		);

		let hits = outcome
			.selections
			.into_iter()
			.map(|selection| {
				let explain = SearchItemExplain {
					similarity: Some(selection.similarity),
					mmr_score: Some(selection.mmr_score),
					depth: selection.depth,
				};

				(selection.content_id, explain)
			})
			.collect::<Vec<_>>();

		self.hydrate(hits, strict, outcome.stop_reason, outcome.candidates_seen).await
	}

	async fn hydrate(
		&self,
		hits: Vec<(String, SearchItemExplain)>,
		strict: Option<bool>,
		stop_reason: StopReason,
		candidates_seen: usize,
	) -> Result<SearchResponse> {
		let strict = strict.unwrap_or(self.cfg.search.strict_hydration);
		let ids = hits.iter().map(|(content_id, _)| content_id.clone()).collect::<Vec<_>>();
		let records =
			ResultAssembler::new(self.backend.content.as_ref(), strict).assemble(&ids).await?;
		let mut items = Vec::with_capacity(records.len());
		let mut failures = Vec::new();

		for ((_, explain), record) in hits.into_iter().zip(records) {
			match record {
				Ok(node) => items.push(SearchItem {
					content_id: node.content_id,
					text: node.text,
					metadata: node.metadata,
					link_tags: node.link_tags,
					explain,
				}),
				Err(failure) => failures.push(failure),
			}
		}

		Ok(SearchResponse { items, failures, stop_reason, candidates_seen })
	}
}

fn validate_query(query: &str) -> Result<()> {
	if query.trim().is_empty() {
		return Err(Error::invalid("query must be non-empty."));
	}

	Ok(())
}

fn validate_params(params: &EngineParams) -> Result<()> {
	if !params.lambda_mult.is_finite() || !(0.0..=1.0).contains(&params.lambda_mult) {
		return Err(Error::invalid("lambda_mult must be a finite number in the range 0.0-1.0."));
	}
	if let Some(threshold) = params.score_threshold
		&& !threshold.is_finite()
	{
		return Err(Error::invalid("score_threshold must be a finite number."));
	}

	Ok(())
}
