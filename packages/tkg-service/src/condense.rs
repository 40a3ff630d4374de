use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Result, TkgService, chat_message};

/// One earlier exchange in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
	pub question: String,
	pub answer: String,
}

impl TkgService {
	/// Folds prior turns and a follow-up into a standalone question.
	///
	/// Without history the question is returned as is and no generation call is made.
	pub async fn condense(&self, question: &str, history: &[ChatTurn]) -> Result<String> {
		if history.is_empty() {
			return Ok(question.to_string());
		}

		let messages = build_condense_messages(question, history);
		let standalone = self.generate("condense", &messages).await?;
		let standalone = standalone.trim();

		if standalone.is_empty() {
			tracing::warn!(turns = history.len(), "Condensed question is empty; keeping follow-up.");

			return Ok(question.to_string());
		}

		tracing::debug!(turns = history.len(), standalone, "Condensed follow-up question.");

		Ok(standalone.to_string())
	}
}

fn build_condense_messages(question: &str, history: &[ChatTurn]) -> Vec<Value> {
	let transcript = history
		.iter()
		.map(|turn| format!("Human: {}\nAssistant: {}", turn.question, turn.answer))
		.collect::<Vec<_>>()
		.join("\n");
	let prompt = format!(
		"Given the following conversation and a follow up question, rephrase the follow up question to be a standalone question, in its original language.\nChat History:\n{transcript}\nFollow Up Input: {question}\nStandalone question:"
	);

	vec![chat_message("user", prompt)]
}
