use serde_json::Value;

use crate::{
	Result, SubgraphRecord, TkgService, chat_message,
	subgraph::{DESCRIPTION_FIELD, STEPS_FIELD, TICKET_ID_FIELD},
};

const CONTEXT_FIELDS: [&str; 3] = [TICKET_ID_FIELD, DESCRIPTION_FIELD, STEPS_FIELD];

impl TkgService {
	/// Answers `query` from the subgraph context. The completion is returned untouched.
	pub async fn synthesize(&self, query: &str, context: &SubgraphRecord) -> Result<String> {
		let messages = build_answer_messages(query, context);

		self.generate("synthesize", &messages).await
	}
}

/// Renders every known context field, using an empty value for absent ones.
fn render_context(context: &SubgraphRecord) -> String {
	let mut lines = CONTEXT_FIELDS
		.iter()
		.map(|field| format!("{field}: {}", context.get(field).unwrap_or_default()))
		.collect::<Vec<_>>();

	match context {
		SubgraphRecord::Missing { error } => lines.push(format!("error: {error}")),
		SubgraphRecord::Fields(fields) => lines.extend(
			fields
				.iter()
				.filter(|(field, _)| !CONTEXT_FIELDS.contains(&field.as_str()))
				.map(|(field, value)| format!("{field}: {value}")),
		),
	}

	lines.join("\n")
}

fn build_answer_messages(query: &str, context: &SubgraphRecord) -> Vec<Value> {
	let context = render_context(context);
	let prompt = format!(
		"Answer the question based only on the following context:\n{context}\n\nQuestion: {query}\nUse natural language and be concise.\nAnswer:"
	);

	vec![chat_message("user", prompt)]
}
