use serde::{Deserialize, Serialize};

use crate::{ChatTurn, EntityIntentResult, Error, Result, SubgraphRecord, TkgService};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AskRequest {
	#[serde(default)]
	pub question: Option<String>,
	#[serde(default)]
	pub chat_history: Vec<ChatTurn>,
}

/// Every intermediate artifact of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineResult {
	#[serde(flatten)]
	pub extraction: EntityIntentResult,
	pub ticket_id: String,
	pub subgraph_data: SubgraphRecord,
	pub answer: String,
}

impl TkgService {
	/// Request boundary: rejects an empty question, condenses history, then runs the pipeline.
	pub async fn ask(&self, req: AskRequest) -> Result<PipelineResult> {
		let question = req.question.as_deref().map(str::trim).unwrap_or_default();

		if question.is_empty() {
			return Err(Error::InvalidRequest { message: "No question provided.".to_string() });
		}

		let standalone = self.condense(question, &req.chat_history).await?;

		self.process(&standalone).await
	}

	/// Runs extract, resolve, rephrase, subgraph extraction and synthesis in order.
	///
	/// Extraction and resolution degrade instead of failing. Any later stage error is returned.
	pub async fn process(&self, query: &str) -> Result<PipelineResult> {
		let extraction = self.extract(query).await;
		let ticket_id = self.resolve(&extraction.entities).await;
		let rephrased = self.rephrase(query, &ticket_id).await?;
		let subgraph_data = self.extract_subgraph(&ticket_id, &rephrased).await?;
		let answer = self.synthesize(query, &subgraph_data).await?;

		tracing::info!(
			ticket_id = %ticket_id,
			sections = extraction.entities.len(),
			subgraph_found = !subgraph_data.is_missing(),
			"Pipeline completed."
		);

		Ok(PipelineResult { extraction, ticket_id, subgraph_data, answer })
	}
}
