pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid test DSN: {0}")]
	InvalidDsn(String),
	#[error("Failed to {action}: {source}")]
	Admin { action: &'static str, source: sqlx::Error },
	#[error("Timed out while {0}.")]
	Timeout(String),
	#[error(transparent)]
	Qdrant(Box<qdrant_client::QdrantError>),
}
impl From<qdrant_client::QdrantError> for Error {
	fn from(err: qdrant_client::QdrantError) -> Self {
		Self::Qdrant(Box::new(err))
	}
}
