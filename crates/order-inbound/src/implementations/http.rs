//! HTTP client implementation for the inbound source system.
//!
//! Fetches order batches with a plain `GET {url}/orders` request. The remote
//! is an ordinary JSON API returning an array of loosely-typed order
//! records; anything other than a 2xx response counts as the system being
//! unavailable.

use crate::{InboundError, InboundFactory, InboundInterface, InboundRegistry};
use async_trait::async_trait;
use order_types::{ConfigSchema, Field, FieldType, ImplementationRegistry, RawOrderRecord, Schema};
use std::time::Duration;

/// Default request timeout in seconds.
///
/// Adapter calls are blocking network operations; the bound keeps a hung
/// remote from wedging an ingestion cycle indefinitely.
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// HTTP inbound client for system A.
pub struct HttpInbound {
	/// Base URL of the source system.
	url: String,
	/// Pooled HTTP client carrying the bounded request timeout.
	client: reqwest::Client,
}

impl HttpInbound {
	/// Creates a new HTTP inbound client.
	pub fn new(url: String, timeout: Duration) -> Result<Self, InboundError> {
		let client = reqwest::Client::builder()
			.timeout(timeout)
			.build()
			.map_err(|e| InboundError::Configuration(e.to_string()))?;

		Ok(Self {
			url: url.trim_end_matches('/').to_string(),
			client,
		})
	}
}

#[async_trait]
impl InboundInterface for HttpInbound {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(HttpInboundSchema)
	}

	async fn fetch_available_orders(&self) -> Result<Vec<RawOrderRecord>, InboundError> {
		let endpoint = format!("{}/orders", self.url);

		let response = self
			.client
			.get(&endpoint)
			.send()
			.await
			.map_err(|e| InboundError::Unavailable(e.to_string()))?;

		if !response.status().is_success() {
			return Err(InboundError::Unavailable(format!(
				"{} returned status {}",
				endpoint,
				response.status()
			)));
		}

		response
			.json::<Vec<RawOrderRecord>>()
			.await
			.map_err(|e| InboundError::Malformed(e.to_string()))
	}
}

/// Configuration schema for the HTTP inbound client.
pub struct HttpInboundSchema;

impl ConfigSchema for HttpInboundSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), order_types::ValidationError> {
		let schema = Schema::new(
			vec![
				Field::new("url", FieldType::String).with_validator(|value| {
					match value.as_str() {
						Some(url) if url.starts_with("http://") || url.starts_with("https://") => {
							Ok(())
						},
						Some(_) => Err("url must start with http:// or https://".to_string()),
						None => Err("Expected string value for url".to_string()),
					}
				}),
			],
			vec![Field::new(
				"timeout_seconds",
				FieldType::Integer {
					min: Some(1),
					max: Some(300),
				},
			)],
		);

		schema.validate(config)
	}
}

/// Factory function to create an HTTP inbound client from configuration.
///
/// Configuration parameters:
/// - `url`: Base URL of the source system (required)
/// - `timeout_seconds`: Request timeout (default: 10)
pub fn create_inbound(config: &toml::Value) -> Result<Box<dyn InboundInterface>, InboundError> {
	let url = config
		.get("url")
		.and_then(|v| v.as_str())
		.ok_or_else(|| InboundError::Configuration("url is required".to_string()))?
		.to_string();

	let timeout_secs = config
		.get("timeout_seconds")
		.and_then(|v| v.as_integer())
		.unwrap_or(DEFAULT_TIMEOUT_SECS as i64) as u64;

	let inbound = HttpInbound::new(url, Duration::from_secs(timeout_secs))?;
	Ok(Box::new(inbound))
}

/// Registry for the HTTP inbound implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "http";
	type Factory = InboundFactory;

	fn factory() -> Self::Factory {
		create_inbound
	}
}

impl InboundRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_factory_requires_url() {
		let config: toml::Value = toml::from_str("timeout_seconds = 5").unwrap();
		assert!(matches!(
			create_inbound(&config),
			Err(InboundError::Configuration(_))
		));
	}

	#[test]
	fn test_schema_rejects_non_http_url() {
		let config: toml::Value = toml::from_str(r#"url = "ftp://system-a""#).unwrap();
		assert!(HttpInboundSchema.validate(&config).is_err());

		let config: toml::Value = toml::from_str(r#"url = "http://system-a:8080""#).unwrap();
		assert!(HttpInboundSchema.validate(&config).is_ok());
	}

	#[test]
	fn test_base_url_trailing_slash_is_normalized() {
		let inbound =
			HttpInbound::new("http://system-a/".to_string(), Duration::from_secs(1)).unwrap();
		assert_eq!(inbound.url, "http://system-a");
	}
}
