//! HTTP client implementation for the outbound recipient system.
//!
//! Delivers one order per `POST {url}/orders` request with the order data as
//! a JSON body. A non-2xx acknowledgment is a rejected send; a transport
//! failure is a network error. Both leave the order eligible for retry on
//! the next dispatch cycle.

use crate::{OutboundError, OutboundFactory, OutboundInterface, OutboundRegistry};
use async_trait::async_trait;
use order_types::{ConfigSchema, Field, FieldType, ImplementationRegistry, OutboundPayload, Schema};
use std::time::Duration;

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// HTTP outbound client for system B.
pub struct HttpOutbound {
	/// Base URL of the recipient system.
	url: String,
	/// Pooled HTTP client carrying the bounded request timeout.
	client: reqwest::Client,
}

impl HttpOutbound {
	/// Creates a new HTTP outbound client.
	pub fn new(url: String, timeout: Duration) -> Result<Self, OutboundError> {
		let client = reqwest::Client::builder()
			.timeout(timeout)
			.build()
			.map_err(|e| OutboundError::Configuration(e.to_string()))?;

		Ok(Self {
			url: url.trim_end_matches('/').to_string(),
			client,
		})
	}
}

#[async_trait]
impl OutboundInterface for HttpOutbound {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(HttpOutboundSchema)
	}

	async fn send(&self, order_id: u64, payload: &OutboundPayload) -> Result<(), OutboundError> {
		let endpoint = format!("{}/orders", self.url);

		let response = self
			.client
			.post(&endpoint)
			.json(payload)
			.send()
			.await
			.map_err(|e| OutboundError::Network(e.to_string()))?;

		let status = response.status();
		if !status.is_success() {
			tracing::warn!(order_id, %status, "Recipient system rejected order");
			return Err(OutboundError::SendRejected(format!(
				"{} returned status {}",
				endpoint, status
			)));
		}

		tracing::debug!(order_id, "Order acknowledged by recipient system");
		Ok(())
	}
}

/// Configuration schema for the HTTP outbound client.
pub struct HttpOutboundSchema;

impl ConfigSchema for HttpOutboundSchema {
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

/// Factory function to create an HTTP outbound client from configuration.
///
/// Configuration parameters:
/// - `url`: Base URL of the recipient system (required)
/// - `timeout_seconds`: Request timeout (default: 10)
pub fn create_outbound(config: &toml::Value) -> Result<Box<dyn OutboundInterface>, OutboundError> {
	let url = config
		.get("url")
		.and_then(|v| v.as_str())
		.ok_or_else(|| OutboundError::Configuration("url is required".to_string()))?
		.to_string();

	let timeout_secs = config
		.get("timeout_seconds")
		.and_then(|v| v.as_integer())
		.unwrap_or(DEFAULT_TIMEOUT_SECS as i64) as u64;

	let outbound = HttpOutbound::new(url, Duration::from_secs(timeout_secs))?;
	Ok(Box::new(outbound))
}

/// Registry for the HTTP outbound implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "http";
	type Factory = OutboundFactory;

	fn factory() -> Self::Factory {
		create_outbound
	}
}

impl OutboundRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_factory_requires_url() {
		let config: toml::Value = toml::from_str("timeout_seconds = 5").unwrap();
		assert!(matches!(
			create_outbound(&config),
			Err(OutboundError::Configuration(_))
		));
	}

	#[test]
	fn test_schema_accepts_minimal_config() {
		let config: toml::Value = toml::from_str(r#"url = "http://system-b:9090""#).unwrap();
		assert!(HttpOutboundSchema.validate(&config).is_ok());
	}

	#[test]
	fn test_payload_wire_format() {
		use rust_decimal::Decimal;

		let payload = OutboundPayload {
			product_name: "Widget".to_string(),
			quantity: 3,
			total_price: Decimal::new(999, 2),
		};
		let json = serde_json::to_value(&payload).unwrap();

		// No id or status field crosses the wire.
		assert_eq!(
			json,
			serde_json::json!({
				"productName": "Widget",
				"quantity": 3,
				"totalPrice": "9.99"
			})
		);
	}
}
