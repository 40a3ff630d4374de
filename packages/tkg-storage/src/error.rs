#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Graph query failed: {0}")]
	Sqlx(#[from] sqlx::Error),
	#[error("Qdrant client error: {0}")]
	Qdrant(Box<qdrant_client::QdrantError>),
}
impl From<qdrant_client::QdrantError> for Error {
	fn from(err: qdrant_client::QdrantError) -> Self {
		Self::Qdrant(Box::new(err))
	}
}
