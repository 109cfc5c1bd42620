pub mod link_tag;
pub mod node;
pub mod vector;

mod error;

pub use error::{Error, Result};
pub use link_tag::{LinkDirection, LinkTag, links_match, links_to};
pub use node::{
	ContentNode, Metadata, MetadataValue, TextNode, ensure_unique_ids, texts_to_nodes,
};
pub use vector::{cosine_similarity, similarity_or_zero, validate_vector};
