//! Inbound adapter module for the order synchronization system.
//!
//! This module handles fetching new order descriptions from the external
//! source system (system A). It provides the abstraction the synchronizer
//! ingests through, together with the HTTP implementation used in
//! production.

use async_trait::async_trait;
use order_types::{ConfigSchema, ImplementationRegistry, RawOrderRecord};
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod http;
}

/// Errors that can occur while fetching from the inbound source system.
#[derive(Debug, Error)]
pub enum InboundError {
	/// The remote system cannot be reached or returned a non-success status.
	/// The whole ingestion attempt aborts; nothing is retried automatically.
	#[error("Inbound system unavailable: {0}")]
	Unavailable(String),
	/// The remote system answered, but the response body was not a batch of
	/// order records.
	#[error("Malformed inbound response: {0}")]
	Malformed(String),
	/// Error that occurs during configuration validation.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// Trait defining the interface for inbound source clients.
///
/// This trait must be implemented by any client that supplies order records
/// to the synchronizer. Implementations are small and mockable so the
/// synchronizer stays testable without real network calls.
#[async_trait]
pub trait InboundInterface: Send + Sync {
	/// Returns the configuration schema for this inbound implementation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Fetches the current batch of order descriptions from the source
	/// system. Records arrive loosely typed; per-record validation is the
	/// caller's concern.
	async fn fetch_available_orders(&self) -> Result<Vec<RawOrderRecord>, InboundError>;
}

/// Type alias for inbound factory functions.
pub type InboundFactory = fn(&toml::Value) -> Result<Box<dyn InboundInterface>, InboundError>;

/// Registry trait for inbound implementations.
pub trait InboundRegistry: ImplementationRegistry<Factory = InboundFactory> {}

/// Get all registered inbound implementations.
///
/// Returns a vector of (name, factory) tuples for all available inbound
/// implementations.
pub fn get_all_implementations() -> Vec<(&'static str, InboundFactory)> {
	use implementations::http;

	vec![(http::Registry::NAME, http::Registry::factory())]
}

/// Service wrapping the configured inbound client.
pub struct InboundService {
	/// The configured inbound implementation.
	implementation: Box<dyn InboundInterface>,
}

impl InboundService {
	/// Creates a new InboundService with the specified implementation.
	pub fn new(implementation: Box<dyn InboundInterface>) -> Self {
		Self { implementation }
	}

	/// Fetches the current batch of order descriptions from system A.
	pub async fn fetch_available_orders(&self) -> Result<Vec<RawOrderRecord>, InboundError> {
		let records = self.implementation.fetch_available_orders().await?;
		tracing::debug!(count = records.len(), "Fetched inbound order records");
		Ok(records)
	}
}
