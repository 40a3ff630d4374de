//! Clients for OpenAI-compatible chat completion and embedding endpoints.

pub mod embedding;
pub mod generation;

use std::time::Duration;

use color_eyre::{
	Result,
	eyre::{self, WrapErr},
};
use reqwest::{
	Client,
	header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue},
};
use serde_json::{Map, Value};
use tkg_config::{EmbeddingProviderConfig, LlmProviderConfig};

/// Where and how to reach one provider endpoint.
pub struct Endpoint<'a> {
	pub provider_id: &'a str,
	pub api_base: &'a str,
	pub path: &'a str,
	pub api_key: &'a str,
	pub timeout_ms: u64,
	pub default_headers: &'a Map<String, Value>,
}
impl Endpoint<'_> {
	pub fn url(&self) -> String {
		format!("{}/{}", self.api_base.trim_end_matches('/'), self.path.trim_start_matches('/'))
	}

	/// POSTs `body` and returns the decoded JSON of a successful response.
	pub async fn post_json(&self, body: &Value) -> Result<Value> {
		let client = Client::builder().timeout(Duration::from_millis(self.timeout_ms)).build()?;
		let headers = request_headers(self.api_key, self.default_headers)?;
		let res = client
			.post(self.url())
			.headers(headers)
			.json(body)
			.send()
			.await
			.wrap_err_with(|| format!("Provider {} is unreachable.", self.provider_id))?;
		let res = res
			.error_for_status()
			.wrap_err_with(|| format!("Provider {} rejected the request.", self.provider_id))?;

		Ok(res.json().await?)
	}
}
impl<'a> From<&'a EmbeddingProviderConfig> for Endpoint<'a> {
	fn from(cfg: &'a EmbeddingProviderConfig) -> Self {
		Self {
			provider_id: &cfg.provider_id,
			api_base: &cfg.api_base,
			path: &cfg.path,
			api_key: &cfg.api_key,
			timeout_ms: cfg.timeout_ms,
			default_headers: &cfg.default_headers,
		}
	}
}
impl<'a> From<&'a LlmProviderConfig> for Endpoint<'a> {
	fn from(cfg: &'a LlmProviderConfig) -> Self {
		Self {
			provider_id: &cfg.provider_id,
			api_base: &cfg.api_base,
			path: &cfg.path,
			api_key: &cfg.api_key,
			timeout_ms: cfg.timeout_ms,
			default_headers: &cfg.default_headers,
		}
	}
}

/// Bearer authorization plus the configured extra headers. Header values must be strings.
pub fn request_headers(api_key: &str, default_headers: &Map<String, Value>) -> Result<HeaderMap> {
	let mut headers = HeaderMap::with_capacity(default_headers.len() + 1);
	let bearer = HeaderValue::from_str(&format!("Bearer {api_key}"))
		.wrap_err("API key is not a valid header value.")?;

	headers.insert(AUTHORIZATION, bearer);

	for (name, value) in default_headers {
		let text = value
			.as_str()
			.ok_or_else(|| eyre::eyre!("Default header {name} must be a string."))?;

		headers.insert(HeaderName::from_bytes(name.as_bytes())?, HeaderValue::from_str(text)?);
	}

	Ok(headers)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn url_joins_base_and_path_with_one_slash() {
		let headers = Map::new();
		let endpoint = Endpoint {
			provider_id: "test",
			api_base: "https://api.example.com/",
			path: "/v1/chat/completions",
			api_key: "k",
			timeout_ms: 1_000,
			default_headers: &headers,
		};

		assert_eq!(endpoint.url(), "https://api.example.com/v1/chat/completions");
	}
}
