use regex::Regex;
use serde::Serialize;

use crate::{Entities, IndexBinding, SectionHit, TkgService};

/// Characters with meaning in full-text query syntax.
const FULL_TEXT_SYNTAX_PATTERN: &str = r#"[+\-&|!(){}\[\]^"~*?:\\/]"#;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TicketMatch {
	pub ticket_id: String,
	pub score: f32,
	pub section: String,
	pub binding: IndexBinding,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum Resolution {
	Vector(TicketMatch),
	FullText(TicketMatch),
	Default { ticket_id: String },
}
impl Resolution {
	pub fn ticket_id(&self) -> &str {
		match self {
			Self::Vector(found) | Self::FullText(found) => found.ticket_id.as_str(),
			Self::Default { ticket_id } => ticket_id.as_str(),
		}
	}

	pub fn into_ticket_id(self) -> String {
		match self {
			Self::Vector(found) | Self::FullText(found) => found.ticket_id,
			Self::Default { ticket_id } => ticket_id,
		}
	}
}

impl TkgService {
	pub async fn resolve(&self, entities: &Entities) -> String {
		self.resolve_ticket(entities).await.into_ticket_id()
	}

	/// Picks the ticket whose section best matches any extracted phrase.
	///
	/// Sections are searched in entity order and a later section only wins with a strictly higher
	/// score. Lookup failures count as misses. Only the winning neighbour is mapped to its owning
	/// ticket; a winner without one resolves to the configured default ticket. The summary
	/// full-text index is consulted only when no section yields a neighbour at all.
	pub async fn resolve_ticket(&self, entities: &Entities) -> Resolution {
		if entities.is_empty() {
			return self.default_resolution();
		}

		let mut best: Option<(SectionHit, &str, IndexBinding)> = None;

		for (label, phrase) in entities.iter() {
			let binding = IndexBinding::for_label(label);
			let hit = match self.index.nearest(binding, phrase).await {
				Ok(Some(hit)) => hit,
				Ok(None) => {
					tracing::debug!(section = label, index = binding.as_str(), "No vector match.");

					continue;
				},
				Err(err) => {
					tracing::warn!(
						error = %err,
						section = label,
						index = binding.as_str(),
						"Vector search failed; skipping section."
					);

					continue;
				},
			};

			if !hit.score.is_finite() {
				tracing::warn!(section = label, score = hit.score, "Ignoring non-finite score.");

				continue;
			}
			if best.as_ref().is_some_and(|(current, _, _)| hit.score <= current.score) {
				continue;
			}

			tracing::debug!(section = label, score = hit.score, node_id = %hit.node_id, "New best match.");

			best = Some((hit, label, binding));
		}

		let Some((hit, label, binding)) = best else {
			return self.resolve_full_text(entities).await.unwrap_or_else(|| self.default_resolution());
		};
		let Some(ticket_id) = self.owning_ticket(&hit).await else {
			return self.default_resolution();
		};

		tracing::info!(
			ticket_id = %ticket_id,
			score = hit.score,
			section = label,
			"Resolved ticket by vector similarity."
		);

		Resolution::Vector(TicketMatch {
			ticket_id,
			score: hit.score,
			section: label.to_string(),
			binding,
		})
	}

	async fn resolve_full_text(&self, entities: &Entities) -> Option<Resolution> {
		let (label, phrase) = entities.first()?;
		let query = full_text_query(phrase);

		if query.is_empty() {
			tracing::info!(section = label, "Full-text query is empty after sanitising.");

			return None;
		}

		let binding = IndexBinding::Summary;
		let hits = match self.index.full_text(binding, &query, self.cfg.resolver.full_text_limit).await
		{
			Ok(hits) => hits,
			Err(err) => {
				tracing::warn!(error = %err, "Full-text search failed.");

				return None;
			},
		};

		for hit in hits {
			if let Some(ticket_id) = self.owning_ticket(&hit).await {
				tracing::info!(ticket_id = %ticket_id, score = hit.score, "Resolved ticket by full-text search.");

				return Some(Resolution::FullText(TicketMatch {
					ticket_id,
					score: hit.score,
					section: label.to_string(),
					binding,
				}));
			}
		}

		None
	}

	async fn owning_ticket(&self, hit: &SectionHit) -> Option<String> {
		match self.graph.ticket_for_node(hit.node_id).await {
			Ok(Some(ticket_id)) => Some(ticket_id),
			Ok(None) => {
				tracing::warn!(node_id = %hit.node_id, "Matched section has no owning ticket.");

				None
			},
			Err(err) => {
				tracing::warn!(error = %err, node_id = %hit.node_id, "Owning ticket lookup failed.");

				None
			},
		}
	}

	fn default_resolution(&self) -> Resolution {
		let ticket_id = self.cfg.resolver.default_ticket_id.clone();

		tracing::info!(ticket_id = %ticket_id, "No resolution signal; using default ticket.");

		Resolution::Default { ticket_id }
	}
}

/// Strips full-text query syntax from a phrase and collapses whitespace.
pub fn full_text_query(input: &str) -> String {
	let stripped = match Regex::new(FULL_TEXT_SYNTAX_PATTERN) {
		Ok(re) => re.replace_all(input, " ").into_owned(),
		Err(_) => input.chars().filter(|c| c.is_alphanumeric() || c.is_whitespace()).collect(),
	};

	stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}
