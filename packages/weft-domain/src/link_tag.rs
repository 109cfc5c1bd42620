//! Typed edge descriptors attached to content nodes.
//!
//! A node links to another when one of its outbound tags (outgoing or bidirectional) and one of
//! the other node's inbound tags (incoming or bidirectional) share the same kind and tag.

use std::{collections::BTreeSet, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkDirection {
	Incoming,
	Outgoing,
	#[serde(rename = "bidir")]
	Bidirectional,
}
impl LinkDirection {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Incoming => "incoming",
			Self::Outgoing => "outgoing",
			Self::Bidirectional => "bidir",
		}
	}

	pub fn is_outbound(self) -> bool {
		matches!(self, Self::Outgoing | Self::Bidirectional)
	}

	pub fn is_inbound(self) -> bool {
		matches!(self, Self::Incoming | Self::Bidirectional)
	}

	/// Compatibility table: Outgoing pairs with Incoming, Bidirectional pairs with anything.
	pub fn is_compatible_with(self, other: Self) -> bool {
		(self.is_outbound() && other.is_inbound()) || (self.is_inbound() && other.is_outbound())
	}
}
impl fmt::Display for LinkDirection {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}
impl FromStr for LinkDirection {
	type Err = Error;

	fn from_str(value: &str) -> Result<Self> {
		match value {
			"incoming" => Ok(Self::Incoming),
			"outgoing" => Ok(Self::Outgoing),
			"bidir" => Ok(Self::Bidirectional),
			other => Err(Error::InvalidLinkDirection { value: other.to_string() }),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LinkTag {
	pub kind: String,
	pub tag: String,
	pub direction: LinkDirection,
}
impl LinkTag {
	pub fn new(kind: impl Into<String>, tag: impl Into<String>, direction: LinkDirection) -> Self {
		Self { kind: kind.into(), tag: tag.into(), direction }
	}

	pub fn incoming(kind: impl Into<String>, tag: impl Into<String>) -> Self {
		Self::new(kind, tag, LinkDirection::Incoming)
	}

	pub fn outgoing(kind: impl Into<String>, tag: impl Into<String>) -> Self {
		Self::new(kind, tag, LinkDirection::Outgoing)
	}

	pub fn bidir(kind: impl Into<String>, tag: impl Into<String>) -> Self {
		Self::new(kind, tag, LinkDirection::Bidirectional)
	}

	pub fn validate(&self) -> Result<()> {
		if self.kind.trim().is_empty() {
			return Err(Error::InvalidArgument {
				message: "link tag kind must be non-empty".to_string(),
			});
		}
		if self.tag.trim().is_empty() {
			return Err(Error::InvalidArgument {
				message: format!("link tag value must be non-empty; kind={}", self.kind),
			});
		}

		Ok(())
	}

	pub fn same_key(&self, other: &Self) -> bool {
		self.kind == other.kind && self.tag == other.tag
	}
}

pub fn links_match(a: &LinkTag, b: &LinkTag) -> bool {
	a.same_key(b) && a.direction.is_compatible_with(b.direction)
}

/// Whether a node tagged with `source` links to a node tagged with `target`.
pub fn links_to(source: &BTreeSet<LinkTag>, target: &BTreeSet<LinkTag>) -> bool {
	source.iter().filter(|tag| tag.direction.is_outbound()).any(|outbound| {
		target
			.iter()
			.filter(|tag| tag.direction.is_inbound())
			.any(|inbound| links_match(outbound, inbound))
	})
}
