use serde_json::Value;

use crate::{Result, TkgService, chat_message};

impl TkgService {
	/// Rewrites the question so it names the resolved ticket explicitly.
	pub async fn rephrase(&self, original_query: &str, ticket_id: &str) -> Result<String> {
		let messages = build_rephrase_messages(original_query, ticket_id);
		let rephrased = self.generate("rephrase", &messages).await?;
		let rephrased = rephrased.trim().to_string();

		tracing::debug!(ticket_id, rephrased = %rephrased, "Rephrased question.");

		Ok(rephrased)
	}
}

fn build_rephrase_messages(original_query: &str, ticket_id: &str) -> Vec<Value> {
	let system_prompt = "You rewrite customer support questions so they refer to a specific \
ticket. Keep the original intent and language. Respond with the rewritten question only.";
	let user_prompt = format!(
		"Rephrase the query to explicitly reference ticket {ticket_id}.\nQuery: {original_query}\nRephrased query:"
	);

	vec![chat_message("system", system_prompt), chat_message("user", user_prompt)]
}
