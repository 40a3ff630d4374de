use std::{collections::HashMap, sync::Arc};

use qdrant_client::qdrant::{
	Document, Query, QueryPointsBuilder, ScoredPoint, Value, point_id::PointIdOptions, value::Kind,
};
use tkg_config::EmbeddingProviderConfig;
use tkg_storage::qdrant::{
	BM25_MODEL, BM25_VECTOR_NAME, CONTENT_PAYLOAD_KEY, DENSE_VECTOR_NAME, NODE_ID_PAYLOAD_KEY,
	QdrantStore,
};
use uuid::Uuid;

use crate::{BoxFuture, EmbeddingProvider, Error, IndexBinding, Result, SectionHit, SectionIndex};

/// [`SectionIndex`] backed by one Qdrant collection per ticket section.
pub struct QdrantSectionIndex {
	store: QdrantStore,
	embedding: Arc<dyn EmbeddingProvider>,
	cfg: EmbeddingProviderConfig,
}
impl QdrantSectionIndex {
	pub fn new(
		store: QdrantStore,
		embedding: Arc<dyn EmbeddingProvider>,
		cfg: EmbeddingProviderConfig,
	) -> Self {
		Self { store, embedding, cfg }
	}

	async fn embed_phrase(&self, phrase: &str) -> Result<Vec<f32>> {
		let texts = [phrase.to_string()];
		let vector = self.embedding.embed(&self.cfg, &texts).await?.into_iter().next().ok_or_else(
			|| Error::Provider { message: "Embedding provider returned no vectors.".to_string() },
		)?;

		if vector.len() != self.store.vector_dim as usize {
			return Err(Error::Provider {
				message: "Embedding vector dimension mismatch.".to_string(),
			});
		}

		Ok(vector)
	}

	async fn run_query(&self, search: QueryPointsBuilder) -> Result<Vec<SectionHit>> {
		let response = self
			.store
			.client
			.query(search)
			.await
			.map_err(|err| Error::Qdrant { message: err.to_string() })?;

		Ok(response.result.iter().filter_map(section_hit).collect())
	}
}

impl SectionIndex for QdrantSectionIndex {
	fn nearest<'a>(
		&'a self,
		binding: IndexBinding,
		phrase: &'a str,
	) -> BoxFuture<'a, Result<Option<SectionHit>>> {
		Box::pin(async move {
			let vector = self.embed_phrase(phrase).await?;
			let collection = binding.collection(&self.store.collections);
			let search = QueryPointsBuilder::new(collection.to_string())
				.query(Query::new_nearest(vector))
				.using(DENSE_VECTOR_NAME)
				.with_payload(true)
				.limit(1);

			Ok(self.run_query(search).await?.into_iter().next())
		})
	}

	fn full_text<'a>(
		&'a self,
		binding: IndexBinding,
		query: &'a str,
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<SectionHit>>> {
		Box::pin(async move {
			let collection = binding.collection(&self.store.collections);
			let search = QueryPointsBuilder::new(collection.to_string())
				.query(Query::new_nearest(Document::new(query.to_string(), BM25_MODEL)))
				.using(BM25_VECTOR_NAME)
				.with_payload(true)
				.limit(limit as u64);

			self.run_query(search).await
		})
	}
}

/// Points without a parsable node id are skipped.
fn section_hit(point: &ScoredPoint) -> Option<SectionHit> {
	let node_id = payload_uuid(&point.payload, NODE_ID_PAYLOAD_KEY).or_else(|| point_uuid(point))?;
	let content = payload_string(&point.payload, CONTENT_PAYLOAD_KEY).unwrap_or_default();

	Some(SectionHit { node_id, content, score: point.score })
}

fn point_uuid(point: &ScoredPoint) -> Option<Uuid> {
	match point.id.as_ref()?.point_id_options.as_ref()? {
		PointIdOptions::Uuid(text) => Uuid::parse_str(text).ok(),
		PointIdOptions::Num(_) => None,
	}
}

fn payload_uuid(payload: &HashMap<String, Value>, key: &str) -> Option<Uuid> {
	payload_string(payload, key).and_then(|text| Uuid::parse_str(&text).ok())
}

fn payload_string(payload: &HashMap<String, Value>, key: &str) -> Option<String> {
	match &payload.get(key)?.kind {
		Some(Kind::StringValue(text)) => Some(text.clone()),
		_ => None,
	}
}

#[cfg(test)]
mod tests {
	use qdrant_client::qdrant::PointId;

	use super::*;

	fn string_value(text: &str) -> Value {
		Value { kind: Some(Kind::StringValue(text.to_string())) }
	}

	#[test]
	fn hit_reads_node_id_and_content_from_payload() {
		let node_id = Uuid::new_v4();
		let point = ScoredPoint {
			payload: HashMap::from([
				(NODE_ID_PAYLOAD_KEY.to_string(), string_value(&node_id.to_string())),
				(CONTENT_PAYLOAD_KEY.to_string(), string_value("Login times out")),
			]),
			score: 0.82,
			..Default::default()
		};
		let hit = section_hit(&point).expect("Expected a hit.");

		assert_eq!(hit.node_id, node_id);
		assert_eq!(hit.content, "Login times out");
	}

	#[test]
	fn hit_falls_back_to_point_uuid() {
		let node_id = Uuid::new_v4();
		let point = ScoredPoint {
			id: Some(PointId { point_id_options: Some(PointIdOptions::Uuid(node_id.to_string())) }),
			score: 0.5,
			..Default::default()
		};

		assert_eq!(section_hit(&point).map(|hit| hit.node_id), Some(node_id));
	}

	#[test]
	fn point_without_node_id_is_skipped() {
		let point = ScoredPoint {
			payload: HashMap::from([(NODE_ID_PAYLOAD_KEY.to_string(), string_value("not-a-uuid"))]),
			..Default::default()
		};

		assert!(section_hit(&point).is_none());
	}
}
