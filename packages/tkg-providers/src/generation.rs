use color_eyre::{Result, eyre};
use serde::Deserialize;
use serde_json::Value;

use crate::Endpoint;

#[derive(Debug, Deserialize)]
struct CompletionResponse {
	choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
	message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
	content: Option<String>,
}

/// Sends one stateless chat completion request and returns the first choice's text.
pub async fn complete(cfg: &tkg_config::LlmProviderConfig, messages: &[Value]) -> Result<String> {
	let body = serde_json::json!({
		"model": cfg.model,
		"temperature": cfg.temperature,
		"messages": messages,
	});
	let json = Endpoint::from(cfg).post_json(&body).await?;

	parse_completion_content(json)
}

fn parse_completion_content(json: Value) -> Result<String> {
	let response: CompletionResponse = serde_json::from_value(json)?;

	response
		.choices
		.into_iter()
		.next()
		.and_then(|choice| choice.message.content)
		.ok_or_else(|| eyre::eyre!("Completion response has no message content."))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn takes_first_choice() {
		let json = serde_json::json!({
			"choices": [
				{ "message": { "role": "assistant", "content": "Restart the sync worker." } },
				{ "message": { "role": "assistant", "content": "ignored" } }
			]
		});

		assert_eq!(parse_completion_content(json).expect("parse failed"), "Restart the sync worker.");
	}

	#[test]
	fn error_payload_is_rejected() {
		let json = serde_json::json!({ "error": { "message": "rate limited" } });

		assert!(parse_completion_content(json).is_err());
	}

	#[test]
	fn null_content_is_rejected() {
		let json = serde_json::json!({ "choices": [{ "message": { "content": null } }] });

		assert!(parse_completion_content(json).is_err());
	}

	#[test]
	fn empty_choices_are_rejected() {
		assert!(parse_completion_content(serde_json::json!({ "choices": [] })).is_err());
	}
}
