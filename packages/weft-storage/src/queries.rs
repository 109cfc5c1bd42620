use std::collections::{BTreeSet, HashMap};

use sqlx::{Executor, Postgres};

use weft_domain::{ContentNode, LinkTag};

use crate::{
	Error, Result,
	db::Db,
	models::{ContentNodeRow, LinkTagRow, assemble_nodes, parse_pg_vector, vector_to_pg},
};

/// Inserts a node or replaces it as a whole, link tags included.
pub async fn upsert_node(db: &Db, node: &ContentNode) -> Result<()> {
	let metadata = serde_json::to_value(&node.metadata)
		.map_err(|err| Error::InvalidArgument(format!("metadata is not serializable: {err}")))?;
	let embedding = vector_to_pg(&node.embedding);
	let mut tx = db.pool.begin().await?;

	sqlx::query(
		"\
INSERT INTO content_nodes (content_id, text, metadata, embedding)
VALUES ($1, $2, $3, $4::text::vector)
ON CONFLICT (content_id) DO UPDATE
SET
	text = EXCLUDED.text,
	metadata = EXCLUDED.metadata,
	embedding = EXCLUDED.embedding,
	updated_at = now()",
	)
	.bind(node.content_id.as_str())
	.bind(node.text.as_str())
	.bind(metadata)
	.bind(embedding.as_str())
	.execute(&mut *tx)
	.await?;
	sqlx::query("DELETE FROM content_link_tags WHERE content_id = $1")
		.bind(node.content_id.as_str())
		.execute(&mut *tx)
		.await?;

	for tag in &node.link_tags {
		insert_link_tag_exec(&mut *tx, node.content_id.as_str(), tag).await?;
	}

	tx.commit().await?;

	Ok(())
}

pub async fn get_node(db: &Db, content_id: &str) -> Result<Option<ContentNode>> {
	let row: Option<ContentNodeRow> = sqlx::query_as(
		"\
SELECT content_id, text, metadata, embedding::text AS embedding, created_at, updated_at
FROM content_nodes
WHERE content_id = $1",
	)
	.bind(content_id)
	.fetch_optional(&db.pool)
	.await?;
	let Some(row) = row else {
		return Ok(None);
	};
	let tags: Vec<LinkTagRow> = sqlx::query_as(
		"\
SELECT content_id, kind, tag, direction
FROM content_link_tags
WHERE content_id = $1",
	)
	.bind(content_id)
	.fetch_all(&db.pool)
	.await?;
	let tags = tags.into_iter().map(LinkTagRow::into_tag).collect::<Result<BTreeSet<_>>>()?;

	row.into_node(tags).map(Some)
}

/// Loads every requested node that exists. Missing ids are absent from the result and a
/// corrupt row fails only its own entry.
pub async fn get_nodes(
	db: &Db,
	content_ids: &[String],
) -> Result<HashMap<String, Result<ContentNode>>> {
	if content_ids.is_empty() {
		return Ok(HashMap::new());
	}

	let rows: Vec<ContentNodeRow> = sqlx::query_as(
		"\
SELECT content_id, text, metadata, embedding::text AS embedding, created_at, updated_at
FROM content_nodes
WHERE content_id = ANY($1)",
	)
	.bind(content_ids)
	.fetch_all(&db.pool)
	.await?;
	let tag_rows: Vec<LinkTagRow> = sqlx::query_as(
		"\
SELECT content_id, kind, tag, direction
FROM content_link_tags
WHERE content_id = ANY($1)",
	)
	.bind(content_ids)
	.fetch_all(&db.pool)
	.await?;

	Ok(assemble_nodes(rows, tag_rows))
}

pub async fn get_embedding(db: &Db, content_id: &str) -> Result<Option<Vec<f32>>> {
	let text: Option<String> =
		sqlx::query_scalar("SELECT embedding::text FROM content_nodes WHERE content_id = $1")
			.bind(content_id)
			.fetch_optional(&db.pool)
			.await?;

	text.as_deref().map(parse_pg_vector).transpose()
}

/// Ids of nodes with an inbound tag matching one of `content_id`'s outbound tags.
pub async fn linked_ids(db: &Db, content_id: &str) -> Result<BTreeSet<String>> {
	let ids: Vec<String> = sqlx::query_scalar(
		"\
SELECT DISTINCT dst.content_id
FROM content_link_tags src
JOIN content_link_tags dst
	ON dst.kind = src.kind
	AND dst.tag = src.tag
WHERE src.content_id = $1
	AND src.direction IN ('outgoing', 'bidir')
	AND dst.direction IN ('incoming', 'bidir')
	AND dst.content_id <> $1",
	)
	.bind(content_id)
	.fetch_all(&db.pool)
	.await?;

	Ok(ids.into_iter().collect())
}

/// Returns whether a row was removed. Link tags cascade.
pub async fn delete_node(db: &Db, content_id: &str) -> Result<bool> {
	let result = sqlx::query("DELETE FROM content_nodes WHERE content_id = $1")
		.bind(content_id)
		.execute(&db.pool)
		.await?;

	Ok(result.rows_affected() > 0)
}

async fn insert_link_tag_exec<'e, E>(executor: E, content_id: &str, tag: &LinkTag) -> Result<()>
where
	E: Executor<'e, Database = Postgres>,
{
	sqlx::query(
		"\
INSERT INTO content_link_tags (content_id, kind, tag, direction)
VALUES ($1, $2, $3, $4)
ON CONFLICT DO NOTHING",
	)
	.bind(content_id)
	.bind(tag.kind.as_str())
	.bind(tag.tag.as_str())
	.bind(tag.direction.as_str())
	.execute(executor)
	.await?;

	Ok(())
}
