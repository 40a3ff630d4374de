/// Files `sql/init.sql` pulls in with `\ir`, embedded at build time.
const INCLUDES: [(&str, &str); 3] = [
	("00_extensions.sql", include_str!("../../../sql/00_extensions.sql")),
	("tables/001_kg_nodes.sql", include_str!("../../../sql/tables/001_kg_nodes.sql")),
	("tables/002_kg_edges.sql", include_str!("../../../sql/tables/002_kg_edges.sql")),
];

/// The full schema as one script, with every psql include inlined.
pub fn render_schema() -> String {
	include_str!("../../../sql/init.sql")
		.lines()
		.map(|line| match line.trim().strip_prefix("\\ir ") {
			Some(path) => INCLUDES
				.iter()
				.find(|(name, _)| *name == path.trim())
				.map(|(_, body)| body.to_string())
				.unwrap_or_else(|| format!("-- unknown include: {}", path.trim())),
			None => line.to_string(),
		})
		.collect::<Vec<_>>()
		.join("\n")
}
