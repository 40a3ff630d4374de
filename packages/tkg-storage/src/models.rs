/// Ticket neighbourhood used by the reproduction pattern. Each section is zero-or-one.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ReproductionSubgraph {
	pub ticket_id: String,
	pub description: Option<String>,
	pub steps_to_reproduce: Option<String>,
}
