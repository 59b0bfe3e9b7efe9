//! Builder pattern for constructing synchronizers.
//!
//! Provides a way to compose a Synchronizer from pluggable implementations
//! using factory functions, driven by the configuration's
//! primary/implementations sections.

use crate::Synchronizer;
use order_config::Config;
use order_inbound::{InboundFactory, InboundService};
use order_outbound::{OutboundFactory, OutboundService};
use order_storage::{OrderStore, StorageFactory};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur during synchronizer construction.
///
/// These errors indicate problems with configuration or missing required
/// components when assembling a synchronizer instance.
#[derive(Debug, Error)]
pub enum BuilderError {
	#[error("Configuration error: {0}")]
	Config(String),
	#[error("Missing required component: {0}")]
	MissingComponent(String),
}

/// Container for all factory functions needed to build a Synchronizer.
///
/// Each map goes from an implementation name (as referenced in the
/// configuration) to the factory that creates it from its TOML block.
pub struct SyncFactories {
	pub storage_factories: HashMap<String, StorageFactory>,
	pub inbound_factories: HashMap<String, InboundFactory>,
	pub outbound_factories: HashMap<String, OutboundFactory>,
}

/// Builder for constructing a Synchronizer with pluggable implementations.
pub struct SyncBuilder {
	config: Config,
}

impl SyncBuilder {
	/// Creates a new SyncBuilder with the given configuration.
	pub fn new(config: Config) -> Self {
		Self { config }
	}

	/// Builds the Synchronizer using factories for each component type.
	///
	/// For every section, the primary implementation named in the
	/// configuration is located in the corresponding factory map, its TOML
	/// block is validated against the implementation's schema, and the
	/// instance is created. Any failure aborts construction.
	pub fn build(self, factories: SyncFactories) -> Result<Synchronizer, BuilderError> {
		// Storage backend
		let storage_primary = &self.config.storage.primary;
		let storage_config = self
			.config
			.storage
			.implementations
			.get(storage_primary)
			.ok_or_else(|| {
				BuilderError::Config(format!(
					"No configuration for storage implementation '{}'",
					storage_primary
				))
			})?;
		let storage_factory = factories.storage_factories.get(storage_primary).ok_or_else(|| {
			BuilderError::MissingComponent(format!(
				"No factory registered for storage implementation '{}'",
				storage_primary
			))
		})?;
		let storage_backend = storage_factory(storage_config).map_err(|e| {
			BuilderError::Config(format!(
				"Failed to create storage implementation '{}': {}",
				storage_primary, e
			))
		})?;
		storage_backend
			.config_schema()
			.validate(storage_config)
			.map_err(|e| {
				BuilderError::Config(format!(
					"Invalid configuration for storage implementation '{}': {}",
					storage_primary, e
				))
			})?;
		tracing::info!(component = "storage", implementation = %storage_primary, "Loaded");

		// Inbound client
		let inbound_primary = &self.config.inbound.primary;
		let inbound_config = self
			.config
			.inbound
			.implementations
			.get(inbound_primary)
			.ok_or_else(|| {
				BuilderError::Config(format!(
					"No configuration for inbound implementation '{}'",
					inbound_primary
				))
			})?;
		let inbound_factory = factories.inbound_factories.get(inbound_primary).ok_or_else(|| {
			BuilderError::MissingComponent(format!(
				"No factory registered for inbound implementation '{}'",
				inbound_primary
			))
		})?;
		let inbound_impl = inbound_factory(inbound_config).map_err(|e| {
			BuilderError::Config(format!(
				"Failed to create inbound implementation '{}': {}",
				inbound_primary, e
			))
		})?;
		inbound_impl
			.config_schema()
			.validate(inbound_config)
			.map_err(|e| {
				BuilderError::Config(format!(
					"Invalid configuration for inbound implementation '{}': {}",
					inbound_primary, e
				))
			})?;
		tracing::info!(component = "inbound", implementation = %inbound_primary, "Loaded");

		// Outbound client
		let outbound_primary = &self.config.outbound.primary;
		let outbound_config = self
			.config
			.outbound
			.implementations
			.get(outbound_primary)
			.ok_or_else(|| {
				BuilderError::Config(format!(
					"No configuration for outbound implementation '{}'",
					outbound_primary
				))
			})?;
		let outbound_factory = factories
			.outbound_factories
			.get(outbound_primary)
			.ok_or_else(|| {
				BuilderError::MissingComponent(format!(
					"No factory registered for outbound implementation '{}'",
					outbound_primary
				))
			})?;
		let outbound_impl = outbound_factory(outbound_config).map_err(|e| {
			BuilderError::Config(format!(
				"Failed to create outbound implementation '{}': {}",
				outbound_primary, e
			))
		})?;
		outbound_impl
			.config_schema()
			.validate(outbound_config)
			.map_err(|e| {
				BuilderError::Config(format!(
					"Invalid configuration for outbound implementation '{}': {}",
					outbound_primary, e
				))
			})?;
		tracing::info!(component = "outbound", implementation = %outbound_primary, "Loaded");

		Ok(Synchronizer::new(
			Arc::new(OrderStore::new(storage_backend)),
			Arc::new(InboundService::new(inbound_impl)),
			Arc::new(OutboundService::new(outbound_impl)),
			self.config.sync,
		))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use order_types::ImplementationRegistry;

	fn test_config(storage_primary: &str) -> Config {
		format!(
			r#"
[service]
id = "test-sync"

[storage]
primary = "{}"
[storage.implementations.memory]

[inbound]
primary = "http"
[inbound.implementations.http]
url = "http://system-a:8080"

[outbound]
primary = "http"
[outbound.implementations.http]
url = "http://system-b:9090"
"#,
			storage_primary
		)
		.parse()
		.unwrap()
	}

	fn test_factories() -> SyncFactories {
		SyncFactories {
			storage_factories: order_storage::get_all_implementations()
				.into_iter()
				.map(|(name, factory)| (name.to_string(), factory))
				.collect(),
			inbound_factories: order_inbound::get_all_implementations()
				.into_iter()
				.map(|(name, factory)| (name.to_string(), factory))
				.collect(),
			outbound_factories: order_outbound::get_all_implementations()
				.into_iter()
				.map(|(name, factory)| (name.to_string(), factory))
				.collect(),
		}
	}

	#[test]
	fn test_registries_cover_configured_implementations() {
		let factories = test_factories();
		assert!(factories
			.storage_factories
			.contains_key(order_storage::implementations::memory::Registry::NAME));
		assert!(factories
			.storage_factories
			.contains_key(order_storage::implementations::file::Registry::NAME));
		assert!(factories.inbound_factories.contains_key("http"));
		assert!(factories.outbound_factories.contains_key("http"));
	}

	#[tokio::test]
	async fn test_build_with_memory_storage() {
		let sync = SyncBuilder::new(test_config("memory"))
			.build(test_factories())
			.unwrap();

		// The built synchronizer is immediately usable.
		assert!(sync.list_orders().await.unwrap().is_empty());
	}

	#[test]
	fn test_build_fails_for_unregistered_storage() {
		// Config validation requires the primary to exist among configured
		// implementations, so point it at one with no registered factory.
		let mut config = test_config("memory");
		config
			.storage
			.implementations
			.insert("redis".to_string(), toml::Value::Table(toml::map::Map::new()));
		config.storage.primary = "redis".to_string();

		let err = SyncBuilder::new(config).build(test_factories()).unwrap_err();
		assert!(matches!(err, BuilderError::MissingComponent(_)));
	}
}
