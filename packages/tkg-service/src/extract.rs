use std::fmt;

use serde::{
	Deserialize, Deserializer, Serialize, Serializer,
	de::{MapAccess, Visitor},
};
use serde_json::Value;

use crate::{TkgService, chat_message, section::Section};

pub const INTENT_FIX_SOLUTION: &str = "fix solution";
pub const INTENT_REPRODUCE_ISSUE: &str = "reproduce issue";

const REPRODUCE_PHRASE: &str = "how to reproduce";

/// Section label to problem phrase, kept in insertion order.
///
/// Order matters: the resolver breaks score ties in favour of the earlier entry and the full-text
/// fallback uses the first phrase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Entities(Vec<(String, String)>);
impl Entities {
	pub fn new() -> Self {
		Self::default()
	}

	/// Replaces the phrase in place when the label already exists.
	pub fn insert(&mut self, label: impl Into<String>, phrase: impl Into<String>) {
		let label = label.into();
		let phrase = phrase.into();

		match self.0.iter_mut().find(|(existing, _)| *existing == label) {
			Some(entry) => entry.1 = phrase,
			None => self.0.push((label, phrase)),
		}
	}

	pub fn get(&self, label: &str) -> Option<&str> {
		self.0.iter().find(|(existing, _)| existing == label).map(|(_, phrase)| phrase.as_str())
	}

	pub fn first(&self) -> Option<(&str, &str)> {
		self.0.first().map(|(label, phrase)| (label.as_str(), phrase.as_str()))
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
		self.0.iter().map(|(label, phrase)| (label.as_str(), phrase.as_str()))
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}
impl<K, V> FromIterator<(K, V)> for Entities
where
	K: Into<String>,
	V: Into<String>,
{
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		let mut entities = Self::new();

		for (label, phrase) in iter {
			entities.insert(label, phrase);
		}

		entities
	}
}
impl Serialize for Entities {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.collect_map(self.0.iter().map(|(label, phrase)| (label, phrase)))
	}
}
impl<'de> Deserialize<'de> for Entities {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		struct EntitiesVisitor;

		impl<'de> Visitor<'de> for EntitiesVisitor {
			type Value = Entities;

			fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				f.write_str("a map of section labels to problem phrases")
			}

			fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
			where
				A: MapAccess<'de>,
			{
				let mut entities = Entities::new();

				while let Some((label, phrase)) = map.next_entry::<String, String>()? {
					entities.insert(label, phrase);
				}

				Ok(entities)
			}
		}

		deserializer.deserialize_map(EntitiesVisitor)
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityIntentResult {
	pub entities: Entities,
	pub intents: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ExtractionOutput {
	entities: Entities,
	intents: Vec<String>,
}

impl TkgService {
	/// Extracts section phrases and intents from a question. Never fails: any provider error or
	/// malformed completion degrades to [`fallback_extraction`].
	pub async fn extract(&self, question: &str) -> EntityIntentResult {
		let messages = build_extraction_messages(question);
		let raw = match self.generate("extract", &messages).await {
			Ok(raw) => raw,
			Err(err) => {
				tracing::warn!(error = %err, "Entity extraction failed; using heuristics.");

				return fallback_extraction(question);
			},
		};
		let Some(parsed) = parse_extraction(&raw) else {
			tracing::warn!("Entity extraction returned malformed JSON; using heuristics.");

			return fallback_extraction(question);
		};

		complete_extraction(parsed, question)
	}
}

/// Deterministic extraction used when the generation service cannot be trusted.
pub fn fallback_extraction(question: &str) -> EntityIntentResult {
	EntityIntentResult {
		entities: heuristic_entities(question),
		intents: heuristic_intents(question),
	}
}

fn heuristic_entities(question: &str) -> Entities {
	let lowered = question.to_lowercase();
	let mut entities = Entities::new();
	let keyword = if lowered.contains("error") {
		Some("error")
	} else if lowered.contains("issue") {
		Some("issue")
	} else {
		None
	};

	if let Some(keyword) = keyword {
		let phrase = question
			.split_whitespace()
			.filter(|word| word.to_lowercase().contains(keyword))
			.collect::<Vec<_>>()
			.join(" ");

		if !phrase.is_empty() {
			entities.insert(Section::IssueSummary.label(), phrase);
		}
	}
	if lowered.contains("priority") || lowered.contains("due to") {
		entities.insert(Section::IssueDescription.label(), question);
	}
	if entities.is_empty() {
		entities.insert(Section::IssueSummary.label(), question);
	}

	entities
}

fn heuristic_intents(question: &str) -> Vec<String> {
	if question.to_lowercase().contains(REPRODUCE_PHRASE) {
		vec![INTENT_REPRODUCE_ISSUE.to_string()]
	} else {
		vec![INTENT_FIX_SOLUTION.to_string()]
	}
}

/// Accepts only `{"entities": {label: phrase}, "intents": [..]}` with known section labels.
fn parse_extraction(raw: &str) -> Option<ExtractionOutput> {
	let parsed: ExtractionOutput = serde_json::from_str(strip_code_fence(raw)).ok()?;

	if parsed.entities.iter().any(|(label, _)| Section::from_label(label).is_none()) {
		return None;
	}

	Some(parsed)
}

/// Fills in sections for a valid extraction that named none. Intents are kept as returned.
fn complete_extraction(parsed: ExtractionOutput, question: &str) -> EntityIntentResult {
	let ExtractionOutput { entities, intents } = parsed;
	let mut entities = entities
		.iter()
		.filter(|(_, phrase)| !phrase.trim().is_empty())
		.collect::<Entities>();

	if entities.is_empty() {
		tracing::info!("Entity extraction returned no sections; using heuristic sections.");

		entities = heuristic_entities(question);
	}

	EntityIntentResult { entities, intents }
}

fn strip_code_fence(raw: &str) -> &str {
	let trimmed = raw.trim();
	let Some(body) = trimmed.strip_prefix("```") else {
		return trimmed;
	};
	let body = body.strip_prefix("json").unwrap_or(body);

	body.strip_suffix("```").unwrap_or(body).trim()
}

fn build_extraction_messages(question: &str) -> Vec<Value> {
	let schema = serde_json::json!({
		"entities": {
			"issue summary": "string",
			"issue description": "string",
			"step to reproduce": "string"
		},
		"intents": ["string"]
	});
	let schema_text = serde_json::to_string_pretty(&schema).unwrap_or_else(|_| {
		"{\"entities\": {\"issue summary\": \"string\"}, \"intents\": [\"string\"]}".to_string()
	});
	let system_prompt = "You are extracting problem-related entities from customer support \
questions. Output must be valid JSON only and must match the provided schema exactly. \
Only use the section keys shown in the schema and omit sections the question does not mention. \
Entities are specific issues, errors, or malfunctions (e.g. 'login issue', 'csv upload error'), \
not generic status words. Intents are short labels such as 'fix solution' or 'reproduce issue'.";
	let user_prompt = format!(
		"Return JSON matching this exact schema:\n{schema_text}\nQuestion:\n{question}"
	);

	vec![chat_message("system", system_prompt), chat_message("user", user_prompt)]
}

#[cfg(test)]
mod tests {
	use super::*;

	fn labels(result: &EntityIntentResult) -> Vec<&str> {
		result.entities.iter().map(|(label, _)| label).collect()
	}

	#[test]
	fn entities_preserve_insertion_order_through_json() {
		let raw = r#"{"step to reproduce": "upload csv", "issue summary": "csv error"}"#;
		let entities: Entities = serde_json::from_str(raw).expect("parse failed");

		assert_eq!(entities.first(), Some(("step to reproduce", "upload csv")));
		assert_eq!(
			serde_json::to_string(&entities).expect("encode failed"),
			r#"{"step to reproduce":"upload csv","issue summary":"csv error"}"#
		);
	}

	#[test]
	fn error_words_become_issue_summary() {
		let result = fallback_extraction("Login fails with timeout error and ErrorCode 42");

		assert_eq!(result.entities.get("issue summary"), Some("error ErrorCode"));
		assert_eq!(result.intents, vec!["fix solution"]);
	}

	#[test]
	fn issue_words_used_when_no_error_word() {
		let result = fallback_extraction("Payment issues after the upgrade");

		assert_eq!(result.entities.get("issue summary"), Some("issues"));
	}

	#[test]
	fn priority_questions_also_fill_description() {
		let question = "Why is the sync issue high priority?";
		let result = fallback_extraction(question);

		assert_eq!(labels(&result), vec!["issue summary", "issue description"]);
		assert_eq!(result.entities.get("issue description"), Some(question));
	}

	#[test]
	fn due_to_without_keywords_fills_description_only() {
		let question = "Dashboard is slow due to the new report";
		let result = fallback_extraction(question);

		assert_eq!(labels(&result), vec!["issue description"]);
	}

	#[test]
	fn plain_question_defaults_to_summary() {
		let question = "Why does payment function is not stable?";
		let result = fallback_extraction(question);

		assert_eq!(labels(&result), vec!["issue summary"]);
		assert_eq!(result.entities.get("issue summary"), Some(question));
	}

	#[test]
	fn reproduce_phrase_sets_reproduce_intent() {
		let result = fallback_extraction("How To Reproduce the export crash?");

		assert_eq!(result.intents, vec!["reproduce issue"]);
	}

	#[test]
	fn well_formed_output_is_accepted_unchanged() {
		let raw = r#"{"entities": {"issue description": "export crashes", "issue summary": "export error"}, "intents": ["fix solution", "reproduce issue"]}"#;
		let parsed = parse_extraction(raw).expect("Expected output to parse.");
		let result = complete_extraction(parsed, "ignored");

		assert_eq!(labels(&result), vec!["issue description", "issue summary"]);
		assert_eq!(result.intents, vec!["fix solution", "reproduce issue"]);
	}

	#[test]
	fn fenced_output_is_accepted() {
		let raw = "```json\n{\"entities\": {\"issue summary\": \"login error\"}, \"intents\": [\"fix solution\"]}\n```";

		assert!(parse_extraction(raw).is_some());
	}

	#[test]
	fn malformed_outputs_are_rejected() {
		for raw in [
			"Sure! The entities are login and timeout.",
			r#"{"entities": ["login"], "intents": []}"#,
			r#"{"entities": {"issue summary": 3}, "intents": []}"#,
			r#"{"entities": {"issue summary": "x"}}"#,
			r#"{"entities": {"root cause": "dns"}, "intents": ["fix solution"]}"#,
		] {
			assert!(parse_extraction(raw).is_none(), "Expected rejection of {raw}");
		}
	}

	#[test]
	fn empty_sections_fall_back_to_heuristics() {
		let parsed = parse_extraction(r#"{"entities": {"issue summary": "  "}, "intents": ["fix solution"]}"#)
			.expect("Expected output to parse.");
		let result = complete_extraction(parsed, "How to reproduce the upload error");

		assert_eq!(result.entities.get("issue summary"), Some("error"));
		assert_eq!(result.intents, vec!["fix solution"]);
	}

	#[test]
	fn empty_intents_are_kept() {
		let parsed =
			parse_extraction(r#"{"entities": {"issue summary": "export error"}, "intents": []}"#)
				.expect("Expected output to parse.");
		let result = complete_extraction(parsed, "Export crashes");

		assert_eq!(result.entities.get("issue summary"), Some("export error"));
		assert!(result.intents.is_empty());
	}
}
