//! Per-search working set of discovered candidates.

use std::collections::{HashMap, HashSet};

use tokio_util::sync::CancellationToken;

use crate::{ContentStore, Error, Result, fanout};

#[derive(Debug, Clone)]
pub struct Candidate {
	pub content_id: String,
	/// Similarity to the query, fixed at discovery.
	pub similarity: f32,
	/// Latest MMR score; refreshed every selection round.
	pub mmr_score: f32,
	/// Hop count at first discovery.
	pub depth: u32,
	/// Insertion sequence, used to break score ties.
	pub seq: usize,
	pub embedding: Option<Vec<f32>>,
	pub selected: bool,
}

/// Candidates in insertion order plus the set of ids already fetched. Owned by one search.
#[derive(Debug, Default)]
pub struct CandidateCache {
	candidates: Vec<Candidate>,
	positions: HashMap<String, usize>,
	fetched: HashSet<String>,
	discarded: HashSet<usize>,
}
impl CandidateCache {
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds a candidate and marks it fetched. Returns false when the id is already a candidate.
	pub fn insert(
		&mut self,
		content_id: String,
		similarity: f32,
		depth: u32,
		embedding: Option<Vec<f32>>,
	) -> bool {
		if self.positions.contains_key(&content_id) {
			return false;
		}

		let seq = self.candidates.len();

		self.fetched.insert(content_id.clone());
		self.positions.insert(content_id.clone(), seq);
		self.candidates.push(Candidate {
			content_id,
			similarity,
			mmr_score: similarity,
			depth,
			seq,
			embedding,
			selected: false,
		});

		true
	}

	/// Returns true when the id had not been fetched before.
	pub fn mark_fetched(&mut self, content_id: &str) -> bool {
		self.fetched.insert(content_id.to_string())
	}

	pub fn is_fetched(&self, content_id: &str) -> bool {
		self.fetched.contains(content_id)
	}

	pub fn get(&self, content_id: &str) -> Option<&Candidate> {
		self.position(content_id).map(|pos| &self.candidates[pos])
	}

	pub fn get_mut(&mut self, content_id: &str) -> Option<&mut Candidate> {
		self.position(content_id).map(|pos| &mut self.candidates[pos])
	}

	pub fn unselected_iter(&self) -> impl Iterator<Item = &Candidate> {
		self.candidates
			.iter()
			.filter(|candidate| !candidate.selected && !self.discarded.contains(&candidate.seq))
	}

	pub fn unselected_mut(&mut self) -> impl Iterator<Item = &mut Candidate> {
		let discarded = &self.discarded;

		self.candidates
			.iter_mut()
			.filter(move |candidate| !candidate.selected && !discarded.contains(&candidate.seq))
	}

	pub fn mark_selected(&mut self, content_id: &str) {
		if let Some(candidate) = self.get_mut(content_id) {
			candidate.selected = true;
		}
	}

	/// Drops a candidate whose backing node vanished. It stays fetched so it is never re-added.
	pub fn discard(&mut self, content_id: &str) {
		if let Some(pos) = self.position(content_id) {
			self.discarded.insert(pos);
		}
	}

	pub fn len(&self) -> usize {
		self.candidates.len() - self.discarded.len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// The candidate's embedding, loaded from `content` on first use.
	pub async fn get_embedding(
		&mut self,
		content_id: &str,
		content: &dyn ContentStore,
	) -> Result<Vec<f32>> {
		if let Some(embedding) = self.get(content_id).and_then(|c| c.embedding.clone()) {
			return Ok(embedding);
		}

		let embedding = content.get_embedding(content_id).await?;

		if let Some(candidate) = self.get_mut(content_id) {
			candidate.embedding = Some(embedding.clone());
		}

		Ok(embedding)
	}

	/// Loads every missing embedding among `ids` concurrently. Vanished nodes are discarded;
	/// other failures abort.
	pub async fn prefetch_embeddings(
		&mut self,
		ids: &[String],
		content: &dyn ContentStore,
		limit: usize,
		cancel: &CancellationToken,
	) -> Result<()> {
		let missing = ids
			.iter()
			.filter(|id| self.get(id).is_some_and(|candidate| candidate.embedding.is_none()))
			.cloned()
			.collect::<Vec<_>>();

		if missing.is_empty() {
			return Ok(());
		}

		let results = fanout::bounded(missing.iter(), limit, cancel, |id| {
			content.get_embedding(id.as_str())
		})
		.await;

		for (content_id, result) in missing.iter().zip(results) {
			match result {
				Ok(embedding) =>
					if let Some(candidate) = self.get_mut(content_id) {
						candidate.embedding = Some(embedding);
					},
				Err(Error::NotFound { .. }) => {
					tracing::warn!(content_id = %content_id, "Candidate vanished before scoring.");

					self.discard(content_id);
				},
				Err(err) => return Err(err),
			}
		}

		Ok(())
	}

	fn position(&self, content_id: &str) -> Option<usize> {
		self.positions.get(content_id).copied().filter(|pos| !self.discarded.contains(pos))
	}
}
