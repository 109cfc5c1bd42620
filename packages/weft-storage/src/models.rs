use std::collections::{BTreeSet, HashMap};

use serde_json::Value;
use time::OffsetDateTime;

use weft_domain::{ContentNode, LinkDirection, LinkTag, Metadata};

use crate::{Error, Result};

#[derive(Debug, sqlx::FromRow)]
pub struct ContentNodeRow {
	pub content_id: String,
	pub text: String,
	pub metadata: Value,
	/// pgvector rendered through `embedding::text`.
	pub embedding: String,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
}
impl ContentNodeRow {
	pub fn into_node(self, link_tags: BTreeSet<LinkTag>) -> Result<ContentNode> {
		let metadata: Metadata = serde_json::from_value(self.metadata).map_err(|err| {
			Error::Corrupt(format!("metadata for {:?} is not scalar: {err}", self.content_id))
		})?;
		let embedding = parse_pg_vector(&self.embedding)?;

		Ok(ContentNode {
			content_id: self.content_id,
			text: self.text,
			metadata,
			link_tags,
			embedding,
		})
	}
}

#[derive(Debug, sqlx::FromRow)]
pub struct LinkTagRow {
	pub content_id: String,
	pub kind: String,
	pub tag: String,
	pub direction: String,
}
impl LinkTagRow {
	pub fn into_tag(self) -> Result<LinkTag> {
		let direction: LinkDirection = self.direction.parse().map_err(|err| {
			Error::Corrupt(format!("link tag for {:?}: {err}", self.content_id))
		})?;

		Ok(LinkTag { kind: self.kind, tag: self.tag, direction })
	}
}

/// Pairs node rows with their tag rows. A corrupt row or tag fails only its own id.
pub fn assemble_nodes(
	rows: Vec<ContentNodeRow>,
	tag_rows: Vec<LinkTagRow>,
) -> HashMap<String, Result<ContentNode>> {
	let mut tags_by_id: HashMap<String, Result<BTreeSet<LinkTag>>> = HashMap::new();

	for row in tag_rows {
		let content_id = row.content_id.clone();
		let entry = tags_by_id.entry(content_id).or_insert_with(|| Ok(BTreeSet::new()));

		match row.into_tag() {
			Ok(tag) =>
				if let Ok(tags) = entry {
					tags.insert(tag);
				},
			Err(err) =>
				if entry.is_ok() {
					*entry = Err(err);
				},
		}
	}

	rows.into_iter()
		.map(|row| {
			let content_id = row.content_id.clone();
			let node = tags_by_id
				.remove(&content_id)
				.unwrap_or_else(|| Ok(BTreeSet::new()))
				.and_then(|tags| row.into_node(tags));

			(content_id, node)
		})
		.collect()
}

pub fn vector_to_pg(vec: &[f32]) -> String {
	let mut out = String::with_capacity(vec.len() * 8);

	out.push('[');

	for (i, value) in vec.iter().enumerate() {
		if i > 0 {
			out.push(',');
		}

		out.push_str(&value.to_string());
	}

	out.push(']');

	out
}

pub fn parse_pg_vector(text: &str) -> Result<Vec<f32>> {
	let trimmed = text.trim();
	let without_brackets = trimmed
		.strip_prefix('[')
		.and_then(|s| s.strip_suffix(']'))
		.ok_or_else(|| Error::Corrupt("Vector text is not bracketed.".to_string()))?;

	if without_brackets.trim().is_empty() {
		return Ok(Vec::new());
	}

	without_brackets
		.split(',')
		.map(|part| {
			part.trim()
				.parse::<f32>()
				.map_err(|_| Error::Corrupt("Vector text contains a non-numeric value.".to_string()))
		})
		.collect()
}
