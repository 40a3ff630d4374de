use tkg_storage::{db::Db, graph, models::ReproductionSubgraph};
use uuid::Uuid;

use crate::{BoxFuture, Result, TicketGraph};

/// [`TicketGraph`] over the Postgres node and edge tables.
pub struct PgTicketGraph {
	db: Db,
}
impl PgTicketGraph {
	pub fn new(db: Db) -> Self {
		Self { db }
	}
}

impl TicketGraph for PgTicketGraph {
	fn ticket_for_node<'a>(&'a self, node_id: Uuid) -> BoxFuture<'a, Result<Option<String>>> {
		Box::pin(async move {
			let mut conn = self.db.pool.acquire().await?;

			Ok(graph::ticket_for_section_node(&mut conn, node_id).await?)
		})
	}

	fn ticket_identity<'a>(&'a self, ticket_id: &'a str) -> BoxFuture<'a, Result<Option<String>>> {
		Box::pin(async move {
			let mut conn = self.db.pool.acquire().await?;

			Ok(graph::ticket_identity(&mut conn, ticket_id).await?)
		})
	}

	fn reproduction_subgraph<'a>(
		&'a self,
		ticket_id: &'a str,
	) -> BoxFuture<'a, Result<Option<ReproductionSubgraph>>> {
		Box::pin(async move {
			let mut conn = self.db.pool.acquire().await?;

			Ok(graph::reproduction_subgraph(&mut conn, ticket_id).await?)
		})
	}

	fn close(&self) -> BoxFuture<'_, ()> {
		Box::pin(async move {
			self.db.pool.close().await;

			tracing::info!("Graph connection pool closed.");
		})
	}
}
