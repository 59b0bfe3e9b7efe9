//! Outbound adapter module for the order synchronization system.
//!
//! This module handles pushing processed orders to the external recipient
//! system (system B). One send call covers one order; success or failure is
//! reported per call so a single bad order never poisons a dispatch cycle.

use async_trait::async_trait;
use order_types::{ConfigSchema, ImplementationRegistry, OutboundPayload};
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod http;
}

/// Errors that can occur while sending to the outbound recipient system.
#[derive(Debug, Error)]
pub enum OutboundError {
	/// The recipient system answered with a failure acknowledgment.
	#[error("Send rejected: {0}")]
	SendRejected(String),
	/// The recipient system could not be reached.
	#[error("Network error: {0}")]
	Network(String),
	/// Error that occurs during configuration validation.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// Trait defining the interface for outbound recipient clients.
///
/// This trait must be implemented by any client that delivers processed
/// orders to the recipient system. Implementations are small and mockable
/// so the synchronizer stays testable without real network calls.
#[async_trait]
pub trait OutboundInterface: Send + Sync {
	/// Returns the configuration schema for this outbound implementation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Pushes one order's data to the recipient system.
	///
	/// The order id identifies the attempt for logging only; it is not part
	/// of the transmitted payload.
	async fn send(&self, order_id: u64, payload: &OutboundPayload) -> Result<(), OutboundError>;
}

/// Type alias for outbound factory functions.
pub type OutboundFactory = fn(&toml::Value) -> Result<Box<dyn OutboundInterface>, OutboundError>;

/// Registry trait for outbound implementations.
pub trait OutboundRegistry: ImplementationRegistry<Factory = OutboundFactory> {}

/// Get all registered outbound implementations.
///
/// Returns a vector of (name, factory) tuples for all available outbound
/// implementations.
pub fn get_all_implementations() -> Vec<(&'static str, OutboundFactory)> {
	use implementations::http;

	vec![(http::Registry::NAME, http::Registry::factory())]
}

/// Service wrapping the configured outbound client.
pub struct OutboundService {
	/// The configured outbound implementation.
	implementation: Box<dyn OutboundInterface>,
}

impl OutboundService {
	/// Creates a new OutboundService with the specified implementation.
	pub fn new(implementation: Box<dyn OutboundInterface>) -> Self {
		Self { implementation }
	}

	/// Pushes one order's data to system B.
	pub async fn send(
		&self,
		order_id: u64,
		payload: &OutboundPayload,
	) -> Result<(), OutboundError> {
		self.implementation.send(order_id, payload).await
	}
}
