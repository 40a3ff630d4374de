mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, EmbeddingProviderConfig, LlmProviderConfig, Postgres, Providers, Qdrant, Resolver,
	SectionCollections, Security, Service, Storage,
};

use std::{collections::HashSet, fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions != cfg.storage.qdrant.vector_dim {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must match storage.qdrant.vector_dim."
				.to_string(),
		});
	}

	let collections = &cfg.storage.qdrant.collections;
	let mut seen = HashSet::new();

	for (label, name) in [
		("summary", &collections.summary),
		("description", &collections.description),
		("step", &collections.step),
	] {
		if name.is_empty() {
			return Err(Error::Validation {
				message: format!("storage.qdrant.collections.{label} must be non-empty."),
			});
		}
		if !seen.insert(name.as_str()) {
			return Err(Error::Validation {
				message: format!(
					"storage.qdrant.collections.{label} must not reuse another section's collection."
				),
			});
		}
	}

	let temperature = cfg.providers.llm.temperature;

	if !temperature.is_finite() {
		return Err(Error::Validation {
			message: "providers.llm.temperature must be a finite number.".to_string(),
		});
	}
	if !(0.0..=2.0).contains(&temperature) {
		return Err(Error::Validation {
			message: "providers.llm.temperature must be in the range 0.0-2.0.".to_string(),
		});
	}

	for (label, key) in
		[("embedding", &cfg.providers.embedding.api_key), ("llm", &cfg.providers.llm.api_key)]
	{
		if key.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} api_key must be non-empty."),
			});
		}
	}

	if cfg.resolver.default_ticket_id.is_empty() {
		return Err(Error::Validation {
			message: "resolver.default_ticket_id must be non-empty.".to_string(),
		});
	}
	if cfg.resolver.full_text_limit == 0 {
		return Err(Error::Validation {
			message: "resolver.full_text_limit must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	cfg.resolver.default_ticket_id = cfg.resolver.default_ticket_id.trim().to_string();

	let collections = &mut cfg.storage.qdrant.collections;

	for name in [&mut collections.summary, &mut collections.description, &mut collections.step] {
		*name = name.trim().to_string();
	}
}
