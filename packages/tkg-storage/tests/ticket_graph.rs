use sqlx::PgConnection;
use uuid::Uuid;

use tkg_config::Postgres;
use tkg_storage::{db::Db, graph, models::ReproductionSubgraph};
use tkg_testkit::TestDatabase;

async fn insert_node(conn: &mut PgConnection, label: &str, key: Option<&str>, content: &str) -> Uuid {
	let node_id = Uuid::new_v4();

	sqlx::query("INSERT INTO kg_nodes (node_id, label, key, content) VALUES ($1, $2, $3, $4)")
		.bind(node_id)
		.bind(label)
		.bind(key)
		.bind(content)
		.execute(&mut *conn)
		.await
		.expect("Failed to insert node.");

	node_id
}

async fn insert_edge(conn: &mut PgConnection, src_id: Uuid, rel_type: &str, dst_id: Uuid) {
	sqlx::query("INSERT INTO kg_edges (src_id, rel_type, dst_id) VALUES ($1, $2, $3)")
		.bind(src_id)
		.bind(rel_type)
		.bind(dst_id)
		.execute(&mut *conn)
		.await
		.expect("Failed to insert edge.");
}

async fn connect(test_db: &TestDatabase) -> Db {
	let cfg = Postgres { dsn: test_db.dsn().to_string(), pool_max_conns: 1 };
	let db = Db::connect(&cfg).await.expect("Failed to connect to Postgres.");

	db.ensure_schema().await.expect("Failed to ensure schema.");

	db
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set TKG_PG_DSN to run."]
async fn ensure_schema_is_idempotent() {
	let Some(base_dsn) = tkg_testkit::env_dsn() else {
		eprintln!("Skipping ensure_schema_is_idempotent; set TKG_PG_DSN to run.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let db = connect(&test_db).await;

	db.ensure_schema().await.expect("Second ensure_schema must succeed.");

	assert!(test_db.cleanup().await.is_ok(), "Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set TKG_PG_DSN to run."]
async fn section_nodes_resolve_to_owning_ticket() {
	let Some(base_dsn) = tkg_testkit::env_dsn() else {
		eprintln!("Skipping section_nodes_resolve_to_owning_ticket; set TKG_PG_DSN to run.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let db = connect(&test_db).await;
	let mut conn = db.pool.acquire().await.expect("Failed to acquire connection.");
	let ticket = insert_node(&mut conn, "Ticket", Some("ENT-23005"), "CSV upload fails").await;
	let summary = insert_node(&mut conn, "Summary", None, "CSV upload error").await;
	let step = insert_node(&mut conn, "StepReproduce", None, "Upload a 20MB CSV").await;
	let orphan = insert_node(&mut conn, "Summary", None, "Unlinked summary").await;
	let priority = insert_node(&mut conn, "Priority", None, "High").await;

	insert_edge(&mut conn, ticket, graph::HAS_SUMMARY, summary).await;
	insert_edge(&mut conn, ticket, graph::HAS_STEPS_TO_REPRODUCE, step).await;
	insert_edge(&mut conn, ticket, "HAS_PRIORITY", priority).await;

	for node in [summary, step] {
		let owner = graph::ticket_for_section_node(&mut conn, node)
			.await
			.expect("Failed to resolve owning ticket.");

		assert_eq!(owner.as_deref(), Some("ENT-23005"));
	}

	let orphan_owner =
		graph::ticket_for_section_node(&mut conn, orphan).await.expect("Failed to query orphan.");

	assert_eq!(orphan_owner, None);

	let priority_owner = graph::ticket_for_section_node(&mut conn, priority)
		.await
		.expect("Failed to query priority node.");

	assert_eq!(priority_owner, None, "Only section relationships lead back to a ticket.");

	let blank_ticket = insert_node(&mut conn, "Ticket", Some(""), "Ticket without a code").await;
	let blank_summary = insert_node(&mut conn, "Summary", None, "Export error").await;

	insert_edge(&mut conn, blank_ticket, graph::HAS_SUMMARY, blank_summary).await;

	let blank_owner = graph::ticket_for_section_node(&mut conn, blank_summary)
		.await
		.expect("Failed to query blank-coded ticket.");

	assert_eq!(blank_owner, None);

	drop(conn);

	assert!(test_db.cleanup().await.is_ok(), "Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set TKG_PG_DSN to run."]
async fn reproduction_subgraph_reports_missing_sections_as_none() {
	let Some(base_dsn) = tkg_testkit::env_dsn() else {
		eprintln!(
			"Skipping reproduction_subgraph_reports_missing_sections_as_none; set TKG_PG_DSN to run."
		);

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let db = connect(&test_db).await;
	let mut conn = db.pool.acquire().await.expect("Failed to acquire connection.");
	let full = insert_node(&mut conn, "Ticket", Some("ENT-1"), "Login timeout").await;
	insert_node(&mut conn, "Ticket", Some("ENT-2"), "Slow dashboard").await;
	let description = insert_node(&mut conn, "IssueDescription", None, "Login times out").await;
	let step = insert_node(&mut conn, "StepReproduce", None, "Log in over VPN").await;

	insert_edge(&mut conn, full, graph::HAS_ISSUE_DESCRIPTION, description).await;
	insert_edge(&mut conn, full, graph::HAS_STEPS_TO_REPRODUCE, step).await;

	let full_row = graph::reproduction_subgraph(&mut conn, "ENT-1")
		.await
		.expect("Failed to query reproduction subgraph.");

	assert_eq!(
		full_row,
		Some(ReproductionSubgraph {
			ticket_id: "ENT-1".to_string(),
			description: Some("Login times out".to_string()),
			steps_to_reproduce: Some("Log in over VPN".to_string()),
		})
	);

	let bare_row = graph::reproduction_subgraph(&mut conn, "ENT-2")
		.await
		.expect("Failed to query reproduction subgraph.");

	assert_eq!(
		bare_row,
		Some(ReproductionSubgraph {
			ticket_id: "ENT-2".to_string(),
			description: None,
			steps_to_reproduce: None,
		})
	);

	let missing = graph::reproduction_subgraph(&mut conn, "ENT-404")
		.await
		.expect("Failed to query missing ticket.");

	assert_eq!(missing, None);

	let identity = graph::ticket_identity(&mut conn, "ENT-2").await.expect("Failed identity.");

	assert_eq!(identity.as_deref(), Some("ENT-2"));

	for ticket_id in ["", " ENT-2 "] {
		let identity =
			graph::ticket_identity(&mut conn, ticket_id).await.expect("Failed identity.");
		let row = graph::reproduction_subgraph(&mut conn, ticket_id)
			.await
			.expect("Failed to query reproduction subgraph.");

		assert_eq!(identity, None, "Ticket id {ticket_id:?} must miss.");
		assert_eq!(row, None, "Ticket id {ticket_id:?} must miss.");
	}

	drop(conn);

	assert!(test_db.cleanup().await.is_ok(), "Failed to cleanup test database.");
}
