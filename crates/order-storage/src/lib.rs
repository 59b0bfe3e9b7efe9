//! Storage module for the order synchronization system.
//!
//! This module provides abstractions for durable storage of order records,
//! supporting different backend implementations such as in-memory or
//! file-based storage.

use async_trait::async_trait;
use order_types::{ConfigSchema, ImplementationRegistry, Order, OrderStatus, StorageKey};
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod file;
	pub mod memory;
}

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
	/// Error that occurs when a requested item is not found.
	#[error("Not found")]
	NotFound,
	/// Error that occurs during serialization/deserialization.
	#[error("Serialization error: {0}")]
	Serialization(String),
	/// Error that occurs in the storage backend.
	#[error("Backend error: {0}")]
	Backend(String),
	/// Error that occurs during configuration validation.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// Trait defining the low-level interface for storage backends.
///
/// This trait must be implemented by any storage backend that wants to
/// integrate with the synchronization system. It provides key-value
/// operations plus the two primitives the synchronizer's concurrency
/// discipline relies on: per-key compare-and-swap and an atomic counter.
#[async_trait]
pub trait StorageInterface: Send + Sync {
	/// Retrieves raw bytes for the given key.
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError>;

	/// Stores raw bytes under the given key, creating or overwriting.
	async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError>;

	/// Deletes the value associated with the given key.
	///
	/// Returns true when a value existed and was removed; false otherwise.
	/// Deleting a missing key is not an error.
	async fn delete(&self, key: &str) -> Result<bool, StorageError>;

	/// Checks if a key exists in storage.
	async fn exists(&self, key: &str) -> Result<bool, StorageError>;

	/// Lists all keys beginning with the given namespace prefix
	/// (e.g. "orders:"). Ordering is unspecified.
	async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError>;

	/// Atomically replaces the value under `key` with `new` only if the
	/// current value equals `expected`.
	///
	/// Returns true when the swap happened; false when the current value
	/// differs or the key is gone. The per-key read-modify-write is the
	/// unit of atomicity; no table-wide locking is implied.
	async fn compare_and_swap(
		&self,
		key: &str,
		expected: &[u8],
		new: Vec<u8>,
	) -> Result<bool, StorageError>;

	/// Atomically increments the counter stored under `key` and returns the
	/// new value. A missing counter starts at zero, so the first call
	/// returns 1.
	async fn increment(&self, key: &str) -> Result<u64, StorageError>;

	/// Returns the configuration schema for validation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;
}

/// Type alias for storage factory functions.
///
/// This is the function signature that all storage implementations must
/// provide to create instances of their storage interface.
pub type StorageFactory = fn(&toml::Value) -> Result<Box<dyn StorageInterface>, StorageError>;

/// Registry trait for storage implementations.
///
/// This trait extends the base ImplementationRegistry to specify that
/// storage implementations must provide a StorageFactory.
pub trait StorageRegistry: ImplementationRegistry<Factory = StorageFactory> {}

/// Get all registered storage implementations.
///
/// Returns a vector of (name, factory) tuples for all available storage
/// implementations.
pub fn get_all_implementations() -> Vec<(&'static str, StorageFactory)> {
	use implementations::{file, memory};

	vec![
		(file::Registry::NAME, file::Registry::factory()),
		(memory::Registry::NAME, memory::Registry::factory()),
	]
}

/// Counter key used for order id assignment.
const ORDER_ID_COUNTER: &str = "order_id";

/// Typed order store over a low-level storage backend.
///
/// The OrderStore wraps a storage backend and provides the order-record
/// operations the synchronizer and the access surface work with: create with
/// store-assigned ids, keyed reads and writes, full scans, and the
/// compare-and-swap status transition used by dispatch.
pub struct OrderStore {
	/// The underlying storage backend implementation.
	backend: Box<dyn StorageInterface>,
}

impl OrderStore {
	/// Creates a new OrderStore with the specified backend.
	pub fn new(backend: Box<dyn StorageInterface>) -> Self {
		Self { backend }
	}

	fn order_key(id: u64) -> String {
		format!("{}:{}", StorageKey::Orders.as_str(), id)
	}

	fn counter_key() -> String {
		format!("{}:{}", StorageKey::Counters.as_str(), ORDER_ID_COUNTER)
	}

	fn encode(order: &Order) -> Result<Vec<u8>, StorageError> {
		serde_json::to_vec(order).map_err(|e| StorageError::Serialization(e.to_string()))
	}

	fn decode(bytes: &[u8]) -> Result<Order, StorageError> {
		serde_json::from_slice(bytes).map_err(|e| StorageError::Serialization(e.to_string()))
	}

	/// Persists a new order, assigning the next id from the store's counter.
	///
	/// Ids are monotonic and never reused within the store's lifetime, even
	/// after deletions. Returns the stored record.
	pub async fn create(
		&self,
		new_order: order_types::NewOrder,
		status: OrderStatus,
	) -> Result<Order, StorageError> {
		let id = self.backend.increment(&Self::counter_key()).await?;
		let order = Order {
			id,
			product_name: new_order.product_name,
			quantity: new_order.quantity,
			total_price: new_order.total_price,
			status,
		};
		self.backend
			.set_bytes(&Self::order_key(id), Self::encode(&order)?)
			.await?;
		Ok(order)
	}

	/// Retrieves the order with the given id.
	pub async fn get(&self, id: u64) -> Result<Order, StorageError> {
		let bytes = self.backend.get_bytes(&Self::order_key(id)).await?;
		Self::decode(&bytes)
	}

	/// Returns all stored orders in ascending id order.
	///
	/// Records deleted between the key scan and the per-key read are
	/// silently skipped.
	pub async fn list_all(&self) -> Result<Vec<Order>, StorageError> {
		let prefix = format!("{}:", StorageKey::Orders.as_str());
		let keys = self.backend.list_keys(&prefix).await?;

		let mut orders = Vec::with_capacity(keys.len());
		for key in keys {
			match self.backend.get_bytes(&key).await {
				Ok(bytes) => orders.push(Self::decode(&bytes)?),
				Err(StorageError::NotFound) => continue,
				Err(e) => return Err(e),
			}
		}
		orders.sort_by_key(|order| order.id);
		Ok(orders)
	}

	/// Persists the full record for an already existing order.
	///
	/// Returns NotFound when the id does not exist, making this semantically
	/// different from create.
	pub async fn update(&self, order: &Order) -> Result<(), StorageError> {
		let key = Self::order_key(order.id);
		if !self.backend.exists(&key).await? {
			return Err(StorageError::NotFound);
		}
		self.backend.set_bytes(&key, Self::encode(order)?).await
	}

	/// Removes the order with the given id.
	///
	/// Returns true when a record existed and was removed; false otherwise.
	pub async fn delete(&self, id: u64) -> Result<bool, StorageError> {
		self.backend.delete(&Self::order_key(id)).await
	}

	/// Moves the order from one status to another only if its current status
	/// still matches `from`.
	///
	/// Implemented as a compare-and-swap loop over the serialized record, so
	/// a concurrent caller-driven update wins: when the status has moved on,
	/// this is a silent no-op returning false. A missing record also
	/// returns false.
	pub async fn transition(
		&self,
		id: u64,
		from: OrderStatus,
		to: OrderStatus,
	) -> Result<bool, StorageError> {
		let key = Self::order_key(id);
		loop {
			let current = match self.backend.get_bytes(&key).await {
				Ok(bytes) => bytes,
				Err(StorageError::NotFound) => return Ok(false),
				Err(e) => return Err(e),
			};

			let mut order = Self::decode(&current)?;
			if order.status != from {
				return Ok(false);
			}
			order.status = to;

			if self
				.backend
				.compare_and_swap(&key, &current, Self::encode(&order)?)
				.await?
			{
				return Ok(true);
			}
			// Lost a race with a concurrent writer; re-read and re-check.
		}
	}
}
