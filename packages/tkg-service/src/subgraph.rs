use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Result, TkgService};

pub const NOT_FOUND: &str = "Not found";
pub const TICKET_ID_FIELD: &str = "ticket_id";
pub const DESCRIPTION_FIELD: &str = "description";
pub const STEPS_FIELD: &str = "steps_to_reproduce";

const REPRODUCE_PHRASE: &str = "how to reproduce";

/// Graph neighbourhood fetched around a resolved ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubgraphPattern {
	/// Ticket plus its issue description and reproduction steps.
	Reproduction,
	/// Ticket code only.
	Identity,
}
impl SubgraphPattern {
	// Phrase matching is a placeholder policy until intents drive the choice.
	pub fn select(rephrased_query: &str) -> Self {
		if rephrased_query.to_lowercase().contains(REPRODUCE_PHRASE) {
			Self::Reproduction
		} else {
			Self::Identity
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SubgraphRecord {
	Missing { error: String },
	Fields(BTreeMap<String, String>),
}
impl SubgraphRecord {
	pub fn missing(ticket_id: &str) -> Self {
		Self::Missing { error: format!("No subgraph data found for ticket {ticket_id}") }
	}

	pub fn get(&self, field: &str) -> Option<&str> {
		match self {
			Self::Missing { .. } => None,
			Self::Fields(fields) => fields.get(field).map(String::as_str),
		}
	}

	pub fn is_missing(&self) -> bool {
		matches!(self, Self::Missing { .. })
	}
}

impl TkgService {
	/// Fetches the subgraph for `ticket_id` with exactly one graph query.
	///
	/// An unknown ticket is not an error: it yields [`SubgraphRecord::Missing`]. Graph failures
	/// propagate.
	pub async fn extract_subgraph(
		&self,
		ticket_id: &str,
		rephrased_query: &str,
	) -> Result<SubgraphRecord> {
		let pattern = SubgraphPattern::select(rephrased_query);

		tracing::debug!(ticket_id, pattern = ?pattern, "Selected subgraph pattern.");

		let record = match pattern {
			SubgraphPattern::Reproduction => self
				.graph
				.reproduction_subgraph(ticket_id)
				.await?
				.map(|row| {
					SubgraphRecord::Fields(BTreeMap::from([
						(TICKET_ID_FIELD.to_string(), row.ticket_id),
						(
							DESCRIPTION_FIELD.to_string(),
							row.description.unwrap_or_else(|| NOT_FOUND.to_string()),
						),
						(
							STEPS_FIELD.to_string(),
							row.steps_to_reproduce.unwrap_or_else(|| NOT_FOUND.to_string()),
						),
					]))
				}),
			SubgraphPattern::Identity => self
				.graph
				.ticket_identity(ticket_id)
				.await?
				.map(|code| SubgraphRecord::Fields(BTreeMap::from([(TICKET_ID_FIELD.to_string(), code)]))),
		};

		Ok(record.unwrap_or_else(|| {
			tracing::info!(ticket_id, "No subgraph data for ticket.");

			SubgraphRecord::missing(ticket_id)
		}))
	}
}
