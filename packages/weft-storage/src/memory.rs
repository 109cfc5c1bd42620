//! Process-local node store with exact cosine search.

use std::{
	collections::{BTreeSet, HashMap},
	sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use weft_domain::{ContentNode, links_to, similarity_or_zero, validate_vector};

use crate::Result;

struct Entry {
	seq: u64,
	node: ContentNode,
}

#[derive(Default)]
struct Inner {
	nodes: HashMap<String, Entry>,
	next_seq: u64,
}

pub struct MemoryStore {
	vector_dim: usize,
	inner: RwLock<Inner>,
}
impl MemoryStore {
	pub fn new(vector_dim: u32) -> Self {
		Self { vector_dim: vector_dim as usize, inner: RwLock::new(Inner::default()) }
	}

	pub fn vector_dim(&self) -> usize {
		self.vector_dim
	}

	/// Inserts or replaces a node. A replaced node keeps its original position for search ties.
	pub fn put(&self, node: ContentNode) -> Result<()> {
		validate_vector(&node.embedding, self.vector_dim)?;

		let mut inner = self.write();
		let seq = match inner.nodes.get(&node.content_id) {
			Some(existing) => existing.seq,
			None => {
				inner.next_seq += 1;

				inner.next_seq
			},
		};

		inner.nodes.insert(node.content_id.clone(), Entry { seq, node });

		Ok(())
	}

	pub fn delete(&self, content_id: &str) -> bool {
		self.write().nodes.remove(content_id).is_some()
	}

	pub fn get(&self, content_id: &str) -> Option<ContentNode> {
		self.read().nodes.get(content_id).map(|entry| entry.node.clone())
	}

	pub fn embedding(&self, content_id: &str) -> Option<Vec<f32>> {
		self.read().nodes.get(content_id).map(|entry| entry.node.embedding.clone())
	}

	pub fn len(&self) -> usize {
		self.read().nodes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Top `limit` nodes by cosine similarity; ties resolve to the earlier inserted node.
	pub fn search(&self, vector: &[f32], limit: usize) -> Vec<(String, f32)> {
		let inner = self.read();
		let mut scored = inner
			.nodes
			.values()
			.map(|entry| {
				let score = similarity_or_zero(vector, &entry.node.embedding);

				(entry.seq, &entry.node.content_id, score)
			})
			.collect::<Vec<_>>();

		scored.sort_by(|a, b| b.2.total_cmp(&a.2).then_with(|| a.0.cmp(&b.0)));
		scored.truncate(limit);

		scored.into_iter().map(|(_, content_id, score)| (content_id.clone(), score)).collect()
	}

	/// Ids linked from `content_id`. Unknown ids have no links.
	pub fn linked_ids(&self, content_id: &str) -> BTreeSet<String> {
		let inner = self.read();
		let Some(source) = inner.nodes.get(content_id) else {
			return BTreeSet::new();
		};

		inner
			.nodes
			.values()
			.filter(|entry| entry.node.content_id != content_id)
			.filter(|entry| links_to(&source.node.link_tags, &entry.node.link_tags))
			.map(|entry| entry.node.content_id.clone())
			.collect()
	}

	fn read(&self) -> RwLockReadGuard<'_, Inner> {
		self.inner.read().unwrap_or_else(|err| err.into_inner())
	}

	fn write(&self) -> RwLockWriteGuard<'_, Inner> {
		self.inner.write().unwrap_or_else(|err| err.into_inner())
	}
}
