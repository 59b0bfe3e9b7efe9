//! Main entry point for the order synchronization service.
//!
//! This binary tracks customer orders through their lifecycle and keeps them
//! reconciled with the two external systems: the inbound source that
//! supplies new orders and the outbound recipient that receives processed
//! ones. It uses a modular architecture with pluggable implementations for
//! storage and the external-system clients.

use clap::Parser;
use order_config::Config;
use order_core::{SyncBuilder, SyncFactories, Synchronizer};
use std::path::PathBuf;
use std::sync::Arc;

mod server;

/// Command-line arguments for the synchronization service.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config.toml")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,
}

/// Main entry point for the synchronization service.
///
/// This function:
/// 1. Parses command-line arguments
/// 2. Initializes logging infrastructure
/// 3. Loads configuration from file
/// 4. Builds the synchronizer with all implementations
/// 5. Runs the scheduler (and the API server, when enabled) until interrupted
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	// Initialize tracing with env filter
	use tracing_subscriber::{fmt, EnvFilter};

	let default_directive = args.log_level.to_string();
	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

	fmt()
		.with_env_filter(env_filter)
		.with_thread_ids(true)
		.with_target(true)
		.init();

	tracing::info!("Started order synchronization service");

	// Load configuration
	let config = Config::from_file(args.config.to_str().unwrap())?;
	tracing::info!("Loaded configuration [{}]", config.service.id);

	let api_config = config.api.clone();
	let synchronizer = Arc::new(build_synchronizer(config)?);

	// Check if the API server should be started
	let api_enabled = api_config.as_ref().is_some_and(|api| api.enabled);

	if api_enabled {
		let api_config = api_config.unwrap();
		let api_synchronizer = Arc::clone(&synchronizer);

		// Run the scheduler and the API server concurrently
		let scheduler_task = synchronizer.run();
		let api_task = server::start_server(api_config, api_synchronizer);

		tokio::select! {
			result = scheduler_task => {
				tracing::info!("Scheduler finished");
				result?;
			}
			result = api_task => {
				tracing::info!("API server finished");
				result?;
			}
		}
	} else {
		// Run only the scheduler
		tracing::info!("Starting scheduler only");
		synchronizer.run().await?;
	}

	tracing::info!("Stopped order synchronization service");
	Ok(())
}

/// Builds the synchronizer with all registered implementations.
///
/// This function wires up the concrete implementations for:
/// - Storage backends (in-memory, file)
/// - Inbound source clients (HTTP)
/// - Outbound recipient clients (HTTP)
/// Each crate registers its implementations, so the factory maps stay in
/// sync with what the configuration can reference.
fn build_synchronizer(config: Config) -> Result<Synchronizer, Box<dyn std::error::Error>> {
	let factories = SyncFactories {
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
	};

	Ok(SyncBuilder::new(config).build(factories)?)
}
