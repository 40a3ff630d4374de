pub mod condense;
pub mod extract;
pub mod graph;
pub mod index;
pub mod pipeline;
pub mod rephrase;
pub mod resolve;
pub mod section;
pub mod subgraph;
pub mod synthesize;

mod error;

use std::{future::Future, pin::Pin, sync::Arc};

use serde_json::Value;
use uuid::Uuid;

pub use condense::ChatTurn;
pub use error::{Error, Result};
pub use extract::{Entities, EntityIntentResult};
pub use graph::PgTicketGraph;
pub use index::QdrantSectionIndex;
pub use pipeline::{AskRequest, PipelineResult};
pub use resolve::{Resolution, TicketMatch};
pub use section::{IndexBinding, Section};
pub use subgraph::{SubgraphPattern, SubgraphRecord};
use tkg_config::{Config, EmbeddingProviderConfig, LlmProviderConfig};
use tkg_providers::{embedding, generation};
use tkg_storage::{db::Db, models::ReproductionSubgraph, qdrant::QdrantStore};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>>;
}

pub trait GenerationProvider
where
	Self: Send + Sync,
{
	fn complete<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, color_eyre::Result<String>>;
}

/// Read-only view of the ticket knowledge graph.
pub trait TicketGraph
where
	Self: Send + Sync,
{
	/// Owning ticket of a summary, issue description, or reproduction step node.
	fn ticket_for_node<'a>(&'a self, node_id: Uuid) -> BoxFuture<'a, Result<Option<String>>>;

	fn ticket_identity<'a>(&'a self, ticket_id: &'a str) -> BoxFuture<'a, Result<Option<String>>>;

	fn reproduction_subgraph<'a>(
		&'a self,
		ticket_id: &'a str,
	) -> BoxFuture<'a, Result<Option<ReproductionSubgraph>>>;

	fn close(&self) -> BoxFuture<'_, ()> {
		Box::pin(async {})
	}
}

/// Per-section similarity search over ticket section nodes.
pub trait SectionIndex
where
	Self: Send + Sync,
{
	/// Single nearest neighbour of `phrase` in the bound section index.
	fn nearest<'a>(
		&'a self,
		binding: IndexBinding,
		phrase: &'a str,
	) -> BoxFuture<'a, Result<Option<SectionHit>>>;

	fn full_text<'a>(
		&'a self,
		binding: IndexBinding,
		query: &'a str,
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<SectionHit>>>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct SectionHit {
	pub node_id: Uuid,
	pub content: String,
	pub score: f32,
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub generation: Arc<dyn GenerationProvider>,
}

pub struct TkgService {
	pub cfg: Config,
	pub graph: Arc<dyn TicketGraph>,
	pub index: Arc<dyn SectionIndex>,
	pub providers: Providers,
}

struct DefaultProviders;

impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>> {
		Box::pin(embedding::embed(cfg, texts))
	}
}

impl GenerationProvider for DefaultProviders {
	fn complete<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, color_eyre::Result<String>> {
		Box::pin(generation::complete(cfg, messages))
	}
}

impl Providers {
	pub fn new(
		embedding: Arc<dyn EmbeddingProvider>,
		generation: Arc<dyn GenerationProvider>,
	) -> Self {
		Self { embedding, generation }
	}
}

impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);
		Self { embedding: provider.clone(), generation: provider }
	}
}

impl TkgService {
	pub fn new(cfg: Config, db: Db, qdrant: QdrantStore) -> Self {
		let providers = Providers::default();
		let graph = Arc::new(PgTicketGraph::new(db));
		let index = Arc::new(QdrantSectionIndex::new(
			qdrant,
			providers.embedding.clone(),
			cfg.providers.embedding.clone(),
		));

		Self { cfg, graph, index, providers }
	}

	pub fn with_parts(
		cfg: Config,
		graph: Arc<dyn TicketGraph>,
		index: Arc<dyn SectionIndex>,
		providers: Providers,
	) -> Self {
		Self { cfg, graph, index, providers }
	}

	/// Releases the graph connection pool. Call once on process shutdown.
	pub async fn close(&self) {
		self.graph.close().await;
	}

	pub(crate) async fn generate(&self, stage: &'static str, messages: &[Value]) -> Result<String> {
		let completion = self
			.providers
			.generation
			.complete(&self.cfg.providers.llm, messages)
			.await
			.map_err(|err| {
				tracing::warn!(stage, error = %err, "Generation call failed.");

				Error::from(err)
			})?;

		tracing::debug!(stage, chars = completion.len(), "Generation call completed.");

		Ok(completion)
	}
}

pub(crate) fn chat_message(role: &str, content: impl Into<String>) -> Value {
	let content: String = content.into();

	serde_json::json!({ "role": role, "content": content })
}
