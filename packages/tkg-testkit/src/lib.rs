//! Disposable Postgres databases and Qdrant collections for tests that need live services.
//!
//! Live tests read `TKG_PG_DSN` and `TKG_QDRANT_URL`; a [`TestDatabase`] drops everything it created
//! on [`TestDatabase::cleanup`] or, failing that, when dropped.

mod error;

pub use error::{Error, Result};

use std::{env, mem, str::FromStr, sync::Mutex, thread, time::Duration};

use qdrant_client::Qdrant;
use sqlx::{
	ConnectOptions, Connection, Executor,
	postgres::{PgConnectOptions, PgConnection},
};
use tokio::{runtime::Builder, time};
use uuid::Uuid;

use tkg_config::SectionCollections;

pub const PG_DSN_ENV: &str = "TKG_PG_DSN";
pub const QDRANT_URL_ENV: &str = "TKG_QDRANT_URL";

const MAINTENANCE_DATABASES: [&str; 2] = ["postgres", "template1"];
const QDRANT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct TestDatabase {
	name: String,
	dsn: String,
	maintenance: PgConnectOptions,
	collections: Mutex<Vec<String>>,
	released: bool,
}
impl TestDatabase {
	/// Creates an empty database named `tkg_test_<uuid>` on the server behind `base_dsn`.
	pub async fn new(base_dsn: &str) -> Result<Self> {
		let base =
			PgConnectOptions::from_str(base_dsn).map_err(|err| Error::InvalidDsn(err.to_string()))?;
		let (maintenance, mut conn) = open_maintenance(&base).await?;
		let name = format!("tkg_test_{}", Uuid::new_v4().simple());

		conn.execute(format!(r#"CREATE DATABASE "{name}""#).as_str())
			.await
			.map_err(|source| Error::Admin { action: "create test database", source })?;

		let dsn = base.database(&name).to_url_lossy().to_string();

		Ok(Self { name, dsn, maintenance, collections: Mutex::new(Vec::new()), released: false })
	}

	pub fn dsn(&self) -> &str {
		&self.dsn
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	/// Reserves one collection name per ticket section, removed again on cleanup.
	pub fn section_collections(&self) -> SectionCollections {
		let collections = SectionCollections {
			summary: format!("summary_{}", self.name),
			description: format!("description_{}", self.name),
			step: format!("step_{}", self.name),
		};
		let mut reserved = self.collections.lock().unwrap_or_else(|err| err.into_inner());

		for collection in [&collections.summary, &collections.description, &collections.step] {
			if !reserved.contains(collection) {
				reserved.push(collection.clone());
			}
		}

		collections
	}

	pub async fn cleanup(mut self) -> Result<()> {
		self.teardown().run().await
	}

	/// Takes ownership of everything this database created; later calls get an empty teardown.
	fn teardown(&mut self) -> Teardown {
		let database = (!self.released).then(|| self.name.clone());
		let collections =
			mem::take(&mut *self.collections.lock().unwrap_or_else(|err| err.into_inner()));

		self.released = true;

		Teardown { database, maintenance: self.maintenance.clone(), collections }
	}
}
impl Drop for TestDatabase {
	fn drop(&mut self) {
		if self.released {
			return;
		}

		let teardown = self.teardown();
		// Drop may run inside a runtime, so tear down on a dedicated thread with its own.
		let worker = thread::spawn(move || {
			match Builder::new_current_thread().enable_all().build() {
				Ok(runtime) =>
					if let Err(err) = runtime.block_on(teardown.run()) {
						eprintln!("Test teardown failed: {err}.");
					},
				Err(err) => eprintln!("Test teardown runtime failed to start: {err}."),
			}
		});

		let _ = worker.join();
	}
}

struct Teardown {
	database: Option<String>,
	maintenance: PgConnectOptions,
	collections: Vec<String>,
}
impl Teardown {
	/// Attempts both Qdrant and Postgres removal before reporting the first failure.
	async fn run(self) -> Result<()> {
		let qdrant = drop_collections(&self.collections).await;
		let postgres = match &self.database {
			Some(name) => drop_database(name, &self.maintenance).await,
			None => Ok(()),
		};

		qdrant.and(postgres)
	}
}

pub fn env_dsn() -> Option<String> {
	env::var(PG_DSN_ENV).ok()
}

pub fn env_qdrant_url() -> Option<String> {
	env::var(QDRANT_URL_ENV).ok()
}

async fn open_maintenance(base: &PgConnectOptions) -> Result<(PgConnectOptions, PgConnection)> {
	let mut last_err = None;

	for database in MAINTENANCE_DATABASES {
		let options = base.clone().database(database);

		match PgConnection::connect_with(&options).await {
			Ok(conn) => return Ok((options, conn)),
			Err(err) => last_err = Some(err),
		}
	}

	Err(Error::Admin {
		action: "connect to a maintenance database",
		source: last_err.unwrap_or(sqlx::Error::PoolClosed),
	})
}

async fn drop_database(name: &str, maintenance: &PgConnectOptions) -> Result<()> {
	let mut conn = PgConnection::connect_with(maintenance)
		.await
		.map_err(|source| Error::Admin { action: "reconnect for cleanup", source })?;

	conn.execute(format!(r#"DROP DATABASE IF EXISTS "{name}" WITH (FORCE)"#).as_str())
		.await
		.map_err(|source| Error::Admin { action: "drop test database", source })?;

	Ok(())
}

async fn drop_collections(collections: &[String]) -> Result<()> {
	if collections.is_empty() {
		return Ok(());
	}

	let Some(url) = env_qdrant_url() else {
		eprintln!("Leaving test collections in place; {QDRANT_URL_ENV} is not set.");

		return Ok(());
	};
	let client = Qdrant::from_url(&url).build()?;

	for collection in collections {
		let exists = time::timeout(QDRANT_TIMEOUT, client.collection_exists(collection.as_str()))
			.await
			.map_err(|_| Error::Timeout(format!("checking collection {collection}")))??;

		if exists {
			time::timeout(QDRANT_TIMEOUT, client.delete_collection(collection.clone()))
				.await
				.map_err(|_| Error::Timeout(format!("deleting collection {collection}")))??;
		}
	}

	Ok(())
}
