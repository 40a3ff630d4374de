use sqlx::PgConnection;
use uuid::Uuid;

use crate::{Result, models::ReproductionSubgraph};

pub const TICKET_LABEL: &str = "Ticket";
pub const SUMMARY_LABEL: &str = "Summary";
pub const ISSUE_DESCRIPTION_LABEL: &str = "IssueDescription";
pub const STEP_REPRODUCE_LABEL: &str = "StepReproduce";

pub const HAS_SUMMARY: &str = "HAS_SUMMARY";
pub const HAS_ISSUE_DESCRIPTION: &str = "HAS_ISSUE_DESCRIPTION";
pub const HAS_STEPS_TO_REPRODUCE: &str = "HAS_STEPS_TO_REPRODUCE";

/// Relationships that connect a ticket to one of its indexed sections.
pub const SECTION_RELATIONSHIPS: [&str; 3] =
	[HAS_SUMMARY, HAS_ISSUE_DESCRIPTION, HAS_STEPS_TO_REPRODUCE];

/// Walks from a section node back up to its owning ticket and returns the ticket code.
///
/// A section shared by several tickets resolves to the lowest code so repeated queries agree.
/// Tickets with a blank code are never returned.
pub async fn ticket_for_section_node(
	executor: &mut PgConnection,
	node_id: Uuid,
) -> Result<Option<String>> {
	let relationships = SECTION_RELATIONSHIPS.iter().map(|rel| rel.to_string()).collect::<Vec<_>>();
	let code = sqlx::query_scalar::<_, String>(
		"\
SELECT t.key
FROM kg_edges e
JOIN kg_nodes t ON t.node_id = e.src_id
WHERE e.dst_id = $1
	AND e.rel_type = ANY($2::text[])
	AND t.label = $3
	AND t.key IS NOT NULL
	AND t.key <> ''
ORDER BY t.key
LIMIT 1",
	)
	.bind(node_id)
	.bind(&relationships)
	.bind(TICKET_LABEL)
	.fetch_optional(&mut *executor)
	.await?;

	Ok(code)
}

/// Ticket ids are matched verbatim; an id with stray whitespace or an empty id simply misses.
pub async fn ticket_identity(executor: &mut PgConnection, ticket_id: &str) -> Result<Option<String>> {
	let code = sqlx::query_scalar::<_, String>(
		"\
SELECT key
FROM kg_nodes
WHERE label = $1 AND key = $2",
	)
	.bind(TICKET_LABEL)
	.bind(ticket_id)
	.fetch_optional(&mut *executor)
	.await?;

	Ok(code)
}

/// Fetches a ticket together with its optional issue description and reproduction steps.
///
/// Returns `None` only when the ticket itself is absent; missing sections surface as `None` fields.
pub async fn reproduction_subgraph(
	executor: &mut PgConnection,
	ticket_id: &str,
) -> Result<Option<ReproductionSubgraph>> {
	let row = sqlx::query_as::<_, ReproductionSubgraph>(
		"\
SELECT
	t.key AS ticket_id,
	d.content AS description,
	s.content AS steps_to_reproduce
FROM kg_nodes t
LEFT JOIN LATERAL (
	SELECT n.content
	FROM kg_edges e
	JOIN kg_nodes n ON n.node_id = e.dst_id
	WHERE e.src_id = t.node_id
		AND e.rel_type = $3
		AND n.label = $4
	ORDER BY n.content
	LIMIT 1
) d ON TRUE
LEFT JOIN LATERAL (
	SELECT n.content
	FROM kg_edges e
	JOIN kg_nodes n ON n.node_id = e.dst_id
	WHERE e.src_id = t.node_id
		AND e.rel_type = $5
		AND n.label = $6
	ORDER BY n.content
	LIMIT 1
) s ON TRUE
WHERE t.label = $1 AND t.key = $2",
	)
	.bind(TICKET_LABEL)
	.bind(ticket_id)
	.bind(HAS_ISSUE_DESCRIPTION)
	.bind(ISSUE_DESCRIPTION_LABEL)
	.bind(HAS_STEPS_TO_REPRODUCE)
	.bind(STEP_REPRODUCE_LABEL)
	.fetch_optional(&mut *executor)
	.await?;

	Ok(row)
}
