//! Configuration module for the order synchronization system.
//!
//! This module provides structures and utilities for managing the service
//! configuration. It supports loading configuration from TOML files with
//! environment-variable resolution and validates that all required values
//! are properly set before the service starts.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Extract just the message without the huge input dump
		let message = err.message().to_string();
		ConfigError::Parse(message)
	}
}

/// Main configuration structure for the order synchronization service.
///
/// Contains all sections the service needs to operate: service identity,
/// storage backend, the two external-system clients, scheduler intervals,
/// and the HTTP API server.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Configuration specific to this service instance.
	pub service: ServiceConfig,
	/// Configuration for the storage backend.
	pub storage: StorageConfig,
	/// Configuration for the inbound source system client.
	pub inbound: InboundConfig,
	/// Configuration for the outbound recipient system client.
	pub outbound: OutboundConfig,
	/// Scheduler intervals for the periodic synchronization tasks.
	#[serde(default)]
	pub sync: SyncConfig,
	/// Configuration for the HTTP API server.
	pub api: Option<ApiConfig>,
}

/// Configuration specific to this service instance.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
	/// Unique identifier for this service instance.
	pub id: String,
}

/// Configuration for the storage backend.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
	/// Which implementation to use as primary.
	pub primary: String,
	/// Map of storage implementation names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
}

/// Configuration for the inbound source system client.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InboundConfig {
	/// Which implementation to use as primary.
	pub primary: String,
	/// Map of inbound implementation names to their configurations.
	/// Each implementation has its own format stored as raw TOML values.
	pub implementations: HashMap<String, toml::Value>,
}

/// Configuration for the outbound recipient system client.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutboundConfig {
	/// Which implementation to use as primary.
	pub primary: String,
	/// Map of outbound implementation names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
}

/// Scheduler intervals for the periodic synchronization tasks.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SyncConfig {
	/// Seconds between ingestion runs.
	#[serde(default = "default_ingest_interval_seconds")]
	pub ingest_interval_seconds: u64,
	/// Seconds between dispatch runs.
	#[serde(default = "default_dispatch_interval_seconds")]
	pub dispatch_interval_seconds: u64,
}

impl Default for SyncConfig {
	fn default() -> Self {
		Self {
			ingest_interval_seconds: default_ingest_interval_seconds(),
			dispatch_interval_seconds: default_dispatch_interval_seconds(),
		}
	}
}

/// Returns the default ingestion interval in seconds.
fn default_ingest_interval_seconds() -> u64 {
	30
}

/// Returns the default dispatch interval in seconds.
fn default_dispatch_interval_seconds() -> u64 {
	60
}

/// Configuration for the HTTP API server.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
	/// Whether the API server is enabled.
	#[serde(default)]
	pub enabled: bool,
	/// Host address to bind the server to.
	#[serde(default = "default_api_host")]
	pub host: String,
	/// Port to bind the server to.
	#[serde(default = "default_api_port")]
	pub port: u16,
}

/// Returns the default API host.
fn default_api_host() -> String {
	"127.0.0.1".to_string()
}

/// Returns the default API port.
fn default_api_port() -> u16 {
	3000
}

/// Resolves environment variables in a string.
///
/// Replaces ${VAR_NAME} with the value of the environment variable VAR_NAME.
/// Supports default values with ${VAR_NAME:-default_value}.
///
/// Input strings are limited to 1MB to prevent ReDoS attacks.
fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024; // 1MB
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut result = input.to_string();
	let mut replacements = Vec::new();

	for cap in re.captures_iter(input) {
		let full_match = cap.get(0).unwrap();
		let var_name = cap.get(1).unwrap().as_str();
		let default_value = cap.get(2).map(|m| m.as_str());

		let value = match std::env::var(var_name) {
			Ok(v) => v,
			Err(_) => {
				if let Some(default) = default_value {
					default.to_string()
				} else {
					return Err(ConfigError::Validation(format!(
						"Environment variable '{}' not found",
						var_name
					)));
				}
			},
		};

		replacements.push((full_match.start(), full_match.end(), value));
	}

	// Apply replacements in reverse order to maintain positions
	for (start, end, value) in replacements.iter().rev() {
		result.replace_range(start..end, value);
	}

	Ok(result)
}

impl Config {
	/// Loads configuration from a TOML file.
	///
	/// Environment variables are resolved and the configuration is validated
	/// after parsing.
	pub fn from_file(path: &str) -> Result<Self, ConfigError> {
		let content = std::fs::read_to_string(path)?;
		content.parse()
	}

	/// Validates the configuration to ensure all required fields are set.
	///
	/// - Ensures the service id is not empty
	/// - Checks each pluggable section names a primary that exists among its
	///   configured implementations
	/// - Bounds the scheduler intervals
	fn validate(&self) -> Result<(), ConfigError> {
		if self.service.id.is_empty() {
			return Err(ConfigError::Validation("Service ID cannot be empty".into()));
		}

		Self::validate_section("storage", &self.storage.primary, &self.storage.implementations)?;
		Self::validate_section("inbound", &self.inbound.primary, &self.inbound.implementations)?;
		Self::validate_section(
			"outbound",
			&self.outbound.primary,
			&self.outbound.implementations,
		)?;

		for (name, interval) in [
			("ingest_interval_seconds", self.sync.ingest_interval_seconds),
			(
				"dispatch_interval_seconds",
				self.sync.dispatch_interval_seconds,
			),
		] {
			if interval == 0 {
				return Err(ConfigError::Validation(format!(
					"{} must be greater than 0",
					name
				)));
			}
			if interval > 86400 {
				return Err(ConfigError::Validation(format!(
					"{} cannot exceed 86400 (24 hours)",
					name
				)));
			}
		}

		Ok(())
	}

	/// Validates one primary/implementations section.
	fn validate_section(
		section: &str,
		primary: &str,
		implementations: &HashMap<String, toml::Value>,
	) -> Result<(), ConfigError> {
		if implementations.is_empty() {
			return Err(ConfigError::Validation(format!(
				"At least one {} implementation must be configured",
				section
			)));
		}
		if primary.is_empty() {
			return Err(ConfigError::Validation(format!(
				"{} primary implementation cannot be empty",
				section
			)));
		}
		if !implementations.contains_key(primary) {
			return Err(ConfigError::Validation(format!(
				"Primary {} '{}' not found in implementations",
				section, primary
			)));
		}
		Ok(())
	}
}

/// Implementation of FromStr trait for Config to enable parsing from string.
///
/// Environment variables are resolved and the configuration is automatically
/// validated after parsing.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}
