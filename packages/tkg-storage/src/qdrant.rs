pub const DENSE_VECTOR_NAME: &str = "dense";
pub const BM25_VECTOR_NAME: &str = "bm25";
pub const BM25_MODEL: &str = "qdrant/bm25";

/// Payload key holding the graph node a point was embedded from.
pub const NODE_ID_PAYLOAD_KEY: &str = "node_id";
pub const CONTENT_PAYLOAD_KEY: &str = "content";

use crate::Result;

pub struct QdrantStore {
	pub client: qdrant_client::Qdrant,
	pub collections: tkg_config::SectionCollections,
	pub vector_dim: u32,
}
impl QdrantStore {
	pub fn new(cfg: &tkg_config::Qdrant) -> Result<Self> {
		let client = qdrant_client::Qdrant::from_url(&cfg.url).build()?;

		Ok(Self { client, collections: cfg.collections.clone(), vector_dim: cfg.vector_dim })
	}
}
