use std::sync::Arc;

use tkg_service::TkgService;
use tkg_storage::{db::Db, qdrant::QdrantStore};

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<TkgService>,
}
impl AppState {
	/// Opens the graph pool and Qdrant client once; every request shares them.
	pub async fn new(config: tkg_config::Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;

		db.ensure_schema().await?;

		let qdrant = QdrantStore::new(&config.storage.qdrant)?;
		let service = TkgService::new(config, db, qdrant);

		Ok(Self::from_service(service))
	}

	pub fn from_service(service: TkgService) -> Self {
		Self { service: Arc::new(service) }
	}
}
