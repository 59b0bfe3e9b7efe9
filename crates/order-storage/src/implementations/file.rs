//! File-based storage backend implementation.
//!
//! This module provides a filesystem implementation of the StorageInterface
//! trait, storing one JSON document per record so the store survives
//! restarts without requiring an external database.

use crate::{StorageError, StorageFactory, StorageInterface, StorageRegistry};
use async_trait::async_trait;
use order_types::{ConfigSchema, Field, FieldType, ImplementationRegistry, Schema, ValidationError};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;

/// File-based storage implementation.
///
/// Keys of the form `namespace:id` map to `<base>/<namespace>/<id>.json`.
/// Writes go through a temp file followed by a rename so a crash never
/// leaves a half-written record. Read-modify-write sequences
/// (compare-and-swap, counters) are serialized by a store-wide async mutex;
/// plain reads bypass it.
pub struct FileStorage {
	/// Base directory path for storing files.
	base_path: PathBuf,
	/// Serializes mutating read-modify-write sequences.
	write_lock: Mutex<()>,
}

impl FileStorage {
	/// Creates a new FileStorage instance rooted at the specified base path.
	pub fn new(base_path: PathBuf) -> Self {
		Self {
			base_path,
			write_lock: Mutex::new(()),
		}
	}

	/// Converts a storage key to its filesystem path.
	fn file_path(&self, key: &str) -> PathBuf {
		match key.split_once(':') {
			Some((namespace, id)) => self.base_path.join(namespace).join(format!("{}.json", id)),
			None => self.base_path.join(format!("{}.json", key)),
		}
	}

	/// Writes bytes atomically via a temp file and rename.
	async fn write_atomic(path: &Path, data: &[u8]) -> Result<(), StorageError> {
		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent)
				.await
				.map_err(|e| StorageError::Backend(e.to_string()))?;
		}

		let temp_path = path.with_extension("tmp");
		fs::write(&temp_path, data)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;
		fs::rename(&temp_path, path)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))
	}

	/// Reads a file, mapping a missing file to NotFound.
	async fn read_file(path: &Path) -> Result<Vec<u8>, StorageError> {
		match fs::read(path).await {
			Ok(data) => Ok(data),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StorageError::NotFound),
			Err(e) => Err(StorageError::Backend(e.to_string())),
		}
	}
}

#[async_trait]
impl StorageInterface for FileStorage {
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError> {
		Self::read_file(&self.file_path(key)).await
	}

	async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
		let _guard = self.write_lock.lock().await;
		Self::write_atomic(&self.file_path(key), &value).await
	}

	async fn delete(&self, key: &str) -> Result<bool, StorageError> {
		let _guard = self.write_lock.lock().await;
		match fs::remove_file(self.file_path(key)).await {
			Ok(_) => Ok(true),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
			Err(e) => Err(StorageError::Backend(e.to_string())),
		}
	}

	async fn exists(&self, key: &str) -> Result<bool, StorageError> {
		Ok(self.file_path(key).exists())
	}

	async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
		let namespace = prefix.trim_end_matches(':');
		let dir = self.base_path.join(namespace);
		if !dir.exists() {
			return Ok(Vec::new());
		}

		let mut keys = Vec::new();
		let mut entries = fs::read_dir(&dir)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;
		while let Some(entry) = entries
			.next_entry()
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?
		{
			let path = entry.path();
			if path.extension() != Some(std::ffi::OsStr::new("json")) {
				tracing::debug!("Skipping non-record file {:?}", path);
				continue;
			}
			if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
				keys.push(format!("{}:{}", namespace, stem));
			}
		}
		Ok(keys)
	}

	async fn compare_and_swap(
		&self,
		key: &str,
		expected: &[u8],
		new: Vec<u8>,
	) -> Result<bool, StorageError> {
		let _guard = self.write_lock.lock().await;
		let path = self.file_path(key);

		let current = match Self::read_file(&path).await {
			Ok(data) => data,
			Err(StorageError::NotFound) => return Ok(false),
			Err(e) => return Err(e),
		};
		if current != expected {
			return Ok(false);
		}

		Self::write_atomic(&path, &new).await?;
		Ok(true)
	}

	async fn increment(&self, key: &str) -> Result<u64, StorageError> {
		let _guard = self.write_lock.lock().await;
		let path = self.file_path(key);

		let current = match Self::read_file(&path).await {
			Ok(data) => std::str::from_utf8(&data)
				.ok()
				.and_then(|s| s.trim().parse::<u64>().ok())
				.ok_or_else(|| {
					StorageError::Serialization(format!("Corrupt counter at {}", key))
				})?,
			Err(StorageError::NotFound) => 0,
			Err(e) => return Err(e),
		};

		let next = current + 1;
		Self::write_atomic(&path, next.to_string().as_bytes()).await?;
		Ok(next)
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(FileStorageSchema)
	}
}

/// Configuration schema for FileStorage.
pub struct FileStorageSchema;

impl ConfigSchema for FileStorageSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![],
			vec![Field::new("storage_path", FieldType::String)],
		);
		schema.validate(config)
	}
}

/// Factory function to create a file storage backend from configuration.
///
/// Configuration parameters:
/// - `storage_path`: Base directory for file storage (default: "./data/storage")
pub fn create_storage(config: &toml::Value) -> Result<Box<dyn StorageInterface>, StorageError> {
	let storage_path = config
		.get("storage_path")
		.and_then(|v| v.as_str())
		.unwrap_or("./data/storage")
		.to_string();

	Ok(Box::new(FileStorage::new(PathBuf::from(storage_path))))
}

/// Registry for the file storage implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "file";
	type Factory = StorageFactory;

	fn factory() -> Self::Factory {
		create_storage
	}
}

impl StorageRegistry for Registry {}
