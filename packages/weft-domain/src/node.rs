use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::{Error, LinkTag, Result};

pub type Metadata = BTreeMap<String, MetadataValue>;

/// Scalar metadata value. Arrays, objects, and null are rejected at deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
	Bool(bool),
	Int(i64),
	Float(f64),
	Text(String),
}
impl From<bool> for MetadataValue {
	fn from(value: bool) -> Self {
		Self::Bool(value)
	}
}
impl From<i64> for MetadataValue {
	fn from(value: i64) -> Self {
		Self::Int(value)
	}
}
impl From<f64> for MetadataValue {
	fn from(value: f64) -> Self {
		Self::Float(value)
	}
}
impl From<&str> for MetadataValue {
	fn from(value: &str) -> Self {
		Self::Text(value.to_string())
	}
}
impl From<String> for MetadataValue {
	fn from(value: String) -> Self {
		Self::Text(value)
	}
}

/// A persisted, embedded chunk of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentNode {
	pub content_id: String,
	pub text: String,
	#[serde(default)]
	pub metadata: Metadata,
	#[serde(default)]
	pub link_tags: BTreeSet<LinkTag>,
	pub embedding: Vec<f32>,
}

/// A node before embedding. `content_id` is assigned at write time when absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextNode {
	#[serde(default)]
	pub content_id: Option<String>,
	pub text: String,
	#[serde(default)]
	pub metadata: Metadata,
	#[serde(default)]
	pub link_tags: BTreeSet<LinkTag>,
}
impl TextNode {
	pub fn new(text: impl Into<String>) -> Self {
		Self { text: text.into(), ..Default::default() }
	}

	pub fn with_id(mut self, content_id: impl Into<String>) -> Self {
		self.content_id = Some(content_id.into());

		self
	}

	pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
		self.metadata.insert(key.into(), value.into());

		self
	}

	pub fn with_link(mut self, tag: LinkTag) -> Self {
		self.link_tags.insert(tag);

		self
	}

	pub fn validate(&self) -> Result<()> {
		if let Some(content_id) = self.content_id.as_deref()
			&& content_id.trim().is_empty()
		{
			return Err(Error::InvalidArgument {
				message: "content_id must be non-empty when provided".to_string(),
			});
		}
		if self.text.trim().is_empty() {
			return Err(Error::InvalidArgument { message: "node text must be non-empty".to_string() });
		}

		for tag in &self.link_tags {
			tag.validate()?;
		}

		Ok(())
	}
}

/// Zips parallel texts, metadata and ids into nodes. Optional columns must match `texts` in length.
pub fn texts_to_nodes(
	texts: Vec<String>,
	metadatas: Option<Vec<Metadata>>,
	ids: Option<Vec<String>>,
) -> Result<Vec<TextNode>> {
	if let Some(metadatas) = metadatas.as_ref()
		&& metadatas.len() != texts.len()
	{
		return Err(Error::InvalidArgument {
			message: format!(
				"metadatas length must match texts; texts={} metadatas={}",
				texts.len(),
				metadatas.len()
			),
		});
	}
	if let Some(ids) = ids.as_ref()
		&& ids.len() != texts.len()
	{
		return Err(Error::InvalidArgument {
			message: format!("ids length must match texts; texts={} ids={}", texts.len(), ids.len()),
		});
	}

	let mut metadatas = metadatas.map(Vec::into_iter);
	let mut ids = ids.map(Vec::into_iter);
	let mut out = Vec::with_capacity(texts.len());

	for text in texts {
		out.push(TextNode {
			content_id: ids.as_mut().and_then(|ids| ids.next()),
			text,
			metadata: metadatas.as_mut().and_then(|metadatas| metadatas.next()).unwrap_or_default(),
			link_tags: BTreeSet::new(),
		});
	}

	Ok(out)
}

/// Rejects requests that name the same content id twice.
pub fn ensure_unique_ids<'a>(ids: impl IntoIterator<Item = &'a str>) -> Result<()> {
	let mut seen = HashSet::new();

	for id in ids {
		if !seen.insert(id) {
			return Err(Error::InvalidArgument { message: format!("duplicate content_id {id:?}") });
		}
	}

	Ok(())
}
