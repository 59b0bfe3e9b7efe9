//! Core synchronization engine for the order system.
//!
//! This module provides the main orchestration logic, coordinating the order
//! store and the two external-system clients through the complete order
//! lifecycle: ingestion from system A, caller-driven processing, and
//! dispatch to system B. It also includes the builder used to assemble a
//! synchronizer from pluggable implementations.

use order_config::SyncConfig;
use order_inbound::{InboundError, InboundService};
use order_outbound::OutboundService;
use order_storage::{OrderStore, StorageError};
use order_types::{
	DispatchSummary, IngestSummary, NewOrder, Order, OrderStatus, OutboundPayload,
};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::MissedTickBehavior;

pub mod builder;

pub use builder::{BuilderError, SyncBuilder, SyncFactories};

/// Errors that can occur during synchronizer operations.
///
/// None of these are fatal to the process: every failure is either a
/// reported negative result or a per-item skip.
#[derive(Debug, Error)]
pub enum SyncError {
	/// A lookup, update, or delete referenced an unknown order id.
	#[error("Order {0} not found")]
	OrderNotFound(u64),
	/// A caller-driven status update would move the order backwards, or
	/// into a state only dispatch may set.
	#[error("Invalid status transition from {from} to {to}")]
	InvalidTransition {
		from: OrderStatus,
		to: OrderStatus,
	},
	/// A directly created order failed validation.
	#[error("Invalid order: {0}")]
	InvalidOrder(String),
	/// The inbound source system failed; the whole ingestion attempt aborts.
	#[error(transparent)]
	Inbound(#[from] InboundError),
	/// The order store failed.
	#[error("Storage error: {0}")]
	Store(#[from] StorageError),
}

/// The order synchronizer.
///
/// Orchestrates ingestion (inbound client → store, tagging new orders
/// PENDING) and dispatch (store scan for PROCESSED orders → outbound client
/// → SENT_TO_B on success), and exposes the caller-facing order operations.
/// All collaborators are injected at construction so tests can substitute
/// in-memory implementations.
pub struct Synchronizer {
	/// Typed order store.
	store: Arc<OrderStore>,
	/// Client for the inbound source system (A).
	inbound: Arc<InboundService>,
	/// Client for the outbound recipient system (B).
	outbound: Arc<OutboundService>,
	/// Scheduler intervals for the periodic runner.
	sync_config: SyncConfig,
}

impl std::fmt::Debug for Synchronizer {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Synchronizer")
			.field("sync_config", &self.sync_config)
			.finish_non_exhaustive()
	}
}

impl Synchronizer {
	/// Creates a new Synchronizer with the given collaborators.
	pub fn new(
		store: Arc<OrderStore>,
		inbound: Arc<InboundService>,
		outbound: Arc<OutboundService>,
		sync_config: SyncConfig,
	) -> Self {
		Self {
			store,
			inbound,
			outbound,
			sync_config,
		}
	}

	/// Pulls the current batch of order descriptions from system A and
	/// records them locally.
	///
	/// An inbound failure aborts the whole attempt before anything is
	/// written. Once a batch is in hand, each record stands alone: a
	/// malformed record is skipped and counted, never aborting the rest.
	/// Every created order starts PENDING regardless of the inbound payload.
	pub async fn ingest(&self) -> Result<IngestSummary, SyncError> {
		let records = self.inbound.fetch_available_orders().await?;

		let mut summary = IngestSummary::default();
		for record in records {
			match record.into_new_order() {
				Ok(new_order) => {
					let order = self.store.create(new_order, OrderStatus::Pending).await?;
					tracing::debug!(order_id = order.id, "Ingested order");
					summary.created += 1;
				},
				Err(e) => {
					tracing::warn!(error = %e, "Skipping malformed inbound record");
					summary.skipped += 1;
				},
			}
		}

		tracing::info!(
			created = summary.created,
			skipped = summary.skipped,
			"Ingestion finished"
		);
		Ok(summary)
	}

	/// Pushes every PROCESSED order to system B, marking acknowledged orders
	/// SENT_TO_B.
	///
	/// Orders are dispatched in ascending id order. One order's failure is
	/// counted and never blocks the rest of the batch; a failed order stays
	/// PROCESSED and is retried on the next run. The status write is a
	/// compare-and-swap: if a caller changed the status between the scan and
	/// the send, the order is left untouched.
	pub async fn dispatch(&self) -> Result<DispatchSummary, SyncError> {
		let processed: Vec<Order> = self
			.store
			.list_all()
			.await?
			.into_iter()
			.filter(|order| order.status == OrderStatus::Processed)
			.collect();

		let mut summary = DispatchSummary::default();
		for order in processed {
			let payload = OutboundPayload::from(&order);
			match self.outbound.send(order.id, &payload).await {
				Ok(()) => {
					summary.succeeded += 1;
					let transitioned = self
						.store
						.transition(order.id, OrderStatus::Processed, OrderStatus::SentToB)
						.await?;
					if transitioned {
						tracing::info!(order_id = order.id, "Order sent to recipient system");
					} else {
						tracing::debug!(
							order_id = order.id,
							"Order status changed during dispatch; left untouched"
						);
					}
				},
				Err(e) => {
					summary.failed += 1;
					tracing::warn!(
						order_id = order.id,
						error = %e,
						"Outbound send failed; order stays PROCESSED"
					);
				},
			}
		}

		tracing::info!(
			succeeded = summary.succeeded,
			failed = summary.failed,
			"Dispatch finished"
		);
		Ok(summary)
	}

	/// Creates a new order with status forced to PENDING.
	///
	/// Callers cannot choose an initial status; PENDING is the only entry
	/// point into the lifecycle.
	pub async fn create_order(&self, new_order: NewOrder) -> Result<Order, SyncError> {
		if new_order.product_name.trim().is_empty() {
			return Err(SyncError::InvalidOrder(
				"productName must not be empty".to_string(),
			));
		}

		let order = self.store.create(new_order, OrderStatus::Pending).await?;
		tracing::info!(order_id = order.id, "Created order");
		Ok(order)
	}

	/// Retrieves a single order by id.
	pub async fn get_order(&self, id: u64) -> Result<Order, SyncError> {
		match self.store.get(id).await {
			Ok(order) => Ok(order),
			Err(StorageError::NotFound) => Err(SyncError::OrderNotFound(id)),
			Err(e) => Err(e.into()),
		}
	}

	/// Returns all orders in ascending id order.
	pub async fn list_orders(&self) -> Result<Vec<Order>, SyncError> {
		Ok(self.store.list_all().await?)
	}

	/// Applies a caller-driven status update.
	///
	/// This is the only path that sets PROCESSED. The update is validated
	/// against the forward-only state machine: a same-status update is an
	/// accepted no-op, PENDING may advance to PROCESSED, and everything else
	/// is rejected. The write is a compare-and-swap, retried if a concurrent
	/// writer moved the order first.
	pub async fn update_status(
		&self,
		id: u64,
		status: OrderStatus,
	) -> Result<Order, SyncError> {
		loop {
			let order = self.get_order(id).await?;
			if order.status == status {
				return Ok(order);
			}
			if !order.status.can_update_to(status) {
				return Err(SyncError::InvalidTransition {
					from: order.status,
					to: status,
				});
			}

			if self.store.transition(id, order.status, status).await? {
				tracing::info!(order_id = id, status = %status, "Updated order status");
				return Ok(Order { status, ..order });
			}
			// A concurrent writer got there first; re-read and re-validate.
		}
	}

	/// Deletes an order by id.
	///
	/// Returns true when a record existed and was removed; false otherwise.
	/// Deleting a missing id is not an error.
	pub async fn delete_order(&self, id: u64) -> Result<bool, SyncError> {
		let deleted = self.store.delete(id).await?;
		if deleted {
			tracing::info!(order_id = id, "Deleted order");
		}
		Ok(deleted)
	}

	/// Periodic runner for the synchronizer.
	///
	/// Runs ingestion and dispatch on their configured intervals until
	/// Ctrl+C. Failures are logged and never stop the loop; each tick is
	/// also safe to overlap with on-demand invocations through the access
	/// surface, because the per-order compare-and-swap is the unit of
	/// atomicity.
	pub async fn run(&self) -> Result<(), SyncError> {
		let mut ingest_timer = tokio::time::interval(Duration::from_secs(
			self.sync_config.ingest_interval_seconds,
		));
		let mut dispatch_timer = tokio::time::interval(Duration::from_secs(
			self.sync_config.dispatch_interval_seconds,
		));
		ingest_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
		dispatch_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

		loop {
			tokio::select! {
				_ = ingest_timer.tick() => {
					if let Err(e) = self.ingest().await {
						tracing::warn!(error = %e, "Scheduled ingestion failed");
					}
				}

				_ = dispatch_timer.tick() => {
					if let Err(e) = self.dispatch().await {
						tracing::warn!(error = %e, "Scheduled dispatch failed");
					}
				}

				// Shutdown signal
				_ = tokio::signal::ctrl_c() => {
					break;
				}
			}
		}

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use async_trait::async_trait;
	use order_inbound::InboundInterface;
	use order_outbound::{OutboundError, OutboundInterface};
	use order_storage::implementations::memory::MemoryStorage;
	use order_types::{ConfigSchema, RawOrderRecord, ValidationError};
	use rust_decimal::Decimal;
	use std::sync::Mutex;

	struct NoopSchema;

	impl ConfigSchema for NoopSchema {
		fn validate(&self, _config: &toml::Value) -> Result<(), ValidationError> {
			Ok(())
		}
	}

	/// Inbound double returning a fixed batch, or failing entirely.
	struct StaticInbound {
		response: Result<Vec<serde_json::Value>, ()>,
	}

	#[async_trait]
	impl InboundInterface for StaticInbound {
		fn config_schema(&self) -> Box<dyn ConfigSchema> {
			Box::new(NoopSchema)
		}

		async fn fetch_available_orders(&self) -> Result<Vec<RawOrderRecord>, InboundError> {
			match &self.response {
				Ok(records) => Ok(records
					.iter()
					.map(|value| serde_json::from_value(value.clone()).unwrap())
					.collect()),
				Err(()) => Err(InboundError::Unavailable("connection refused".to_string())),
			}
		}
	}

	/// Outbound double recording every attempt, optionally rejecting them.
	struct RecordingOutbound {
		reject: bool,
		sent: Mutex<Vec<(u64, OutboundPayload)>>,
	}

	impl RecordingOutbound {
		fn new(reject: bool) -> Self {
			Self {
				reject,
				sent: Mutex::new(Vec::new()),
			}
		}
	}

	#[async_trait]
	impl OutboundInterface for RecordingOutbound {
		fn config_schema(&self) -> Box<dyn ConfigSchema> {
			Box::new(NoopSchema)
		}

		async fn send(
			&self,
			order_id: u64,
			payload: &OutboundPayload,
		) -> Result<(), OutboundError> {
			self.sent.lock().unwrap().push((order_id, payload.clone()));
			if self.reject {
				Err(OutboundError::SendRejected("status 500".to_string()))
			} else {
				Ok(())
			}
		}
	}

	fn synchronizer(
		inbound: StaticInbound,
		outbound: Arc<RecordingOutbound>,
	) -> Synchronizer {
		Synchronizer::new(
			Arc::new(OrderStore::new(Box::new(MemoryStorage::new()))),
			Arc::new(InboundService::new(Box::new(inbound))),
			Arc::new(OutboundService::new(Box::new(ArcOutbound(outbound)))),
			SyncConfig::default(),
		)
	}

	/// Adapter so a test can keep a handle on the recording double after
	/// handing ownership to the service.
	struct ArcOutbound(Arc<RecordingOutbound>);

	#[async_trait]
	impl OutboundInterface for ArcOutbound {
		fn config_schema(&self) -> Box<dyn ConfigSchema> {
			self.0.config_schema()
		}

		async fn send(
			&self,
			order_id: u64,
			payload: &OutboundPayload,
		) -> Result<(), OutboundError> {
			self.0.send(order_id, payload).await
		}
	}

	fn empty_inbound() -> StaticInbound {
		StaticInbound {
			response: Ok(Vec::new()),
		}
	}

	fn widget() -> NewOrder {
		NewOrder {
			product_name: "Widget".to_string(),
			quantity: 3,
			total_price: Decimal::new(999, 2),
		}
	}

	#[tokio::test]
	async fn test_ingest_counts_created_and_skipped() {
		let inbound = StaticInbound {
			response: Ok(vec![
				serde_json::json!({
					"productName": "Widget",
					"quantity": 3,
					"totalPrice": "9.99",
					"status": "PROCESSED"
				}),
				serde_json::json!({"quantity": 1, "totalPrice": "1.00"}),
			]),
		};
		let sync = synchronizer(inbound, Arc::new(RecordingOutbound::new(false)));

		let summary = sync.ingest().await.unwrap();
		assert_eq!(summary, IngestSummary { created: 1, skipped: 1 });

		// Exactly one new order, PENDING despite the inbound status field.
		let orders = sync.list_orders().await.unwrap();
		assert_eq!(orders.len(), 1);
		assert_eq!(orders[0].status, OrderStatus::Pending);
		assert_eq!(orders[0].product_name, "Widget");
	}

	#[tokio::test]
	async fn test_ingest_aborts_when_inbound_unavailable() {
		let inbound = StaticInbound { response: Err(()) };
		let sync = synchronizer(inbound, Arc::new(RecordingOutbound::new(false)));

		let err = sync.ingest().await.unwrap_err();
		assert!(matches!(err, SyncError::Inbound(InboundError::Unavailable(_))));

		// No partial writes.
		assert!(sync.list_orders().await.unwrap().is_empty());
	}

	#[tokio::test]
	async fn test_dispatch_sends_processed_order() {
		let outbound = Arc::new(RecordingOutbound::new(false));
		let sync = synchronizer(empty_inbound(), outbound.clone());

		let order = sync.create_order(widget()).await.unwrap();
		sync.update_status(order.id, OrderStatus::Processed)
			.await
			.unwrap();

		let summary = sync.dispatch().await.unwrap();
		assert_eq!(summary, DispatchSummary { succeeded: 1, failed: 0 });
		assert_eq!(
			sync.get_order(order.id).await.unwrap().status,
			OrderStatus::SentToB
		);

		// The transmitted payload carries no id or status.
		let sent = outbound.sent.lock().unwrap();
		assert_eq!(sent.len(), 1);
		assert_eq!(sent[0].0, order.id);
		assert_eq!(sent[0].1.product_name, "Widget");
		assert_eq!(sent[0].1.quantity, 3);
		assert_eq!(sent[0].1.total_price, Decimal::new(999, 2));
	}

	#[tokio::test]
	async fn test_dispatch_failure_leaves_order_processed_for_retry() {
		let outbound = Arc::new(RecordingOutbound::new(true));
		let sync = synchronizer(empty_inbound(), outbound.clone());

		let order = sync.create_order(widget()).await.unwrap();
		sync.update_status(order.id, OrderStatus::Processed)
			.await
			.unwrap();

		let summary = sync.dispatch().await.unwrap();
		assert_eq!(summary, DispatchSummary { succeeded: 0, failed: 1 });
		assert_eq!(
			sync.get_order(order.id).await.unwrap().status,
			OrderStatus::Processed
		);

		// A later dispatch re-attempts the same order.
		sync.dispatch().await.unwrap();
		assert_eq!(outbound.sent.lock().unwrap().len(), 2);
	}

	#[tokio::test]
	async fn test_dispatch_failure_does_not_block_other_orders() {
		// The double rejects every send, so both orders are attempted and
		// both are counted; neither aborts the batch.
		let outbound = Arc::new(RecordingOutbound::new(true));
		let sync = synchronizer(empty_inbound(), outbound.clone());

		for _ in 0..2 {
			let order = sync.create_order(widget()).await.unwrap();
			sync.update_status(order.id, OrderStatus::Processed)
				.await
				.unwrap();
		}

		let summary = sync.dispatch().await.unwrap();
		assert_eq!(summary, DispatchSummary { succeeded: 0, failed: 2 });
		assert_eq!(outbound.sent.lock().unwrap().len(), 2);
	}

	#[tokio::test]
	async fn test_dispatch_ignores_pending_and_sent_orders() {
		let outbound = Arc::new(RecordingOutbound::new(false));
		let sync = synchronizer(empty_inbound(), outbound.clone());

		// One PENDING, one PROCESSED.
		sync.create_order(widget()).await.unwrap();
		let processed = sync.create_order(widget()).await.unwrap();
		sync.update_status(processed.id, OrderStatus::Processed)
			.await
			.unwrap();

		let summary = sync.dispatch().await.unwrap();
		assert_eq!(summary, DispatchSummary { succeeded: 1, failed: 0 });

		// Only the PROCESSED order crossed the wire.
		{
			let sent = outbound.sent.lock().unwrap();
			assert_eq!(sent.len(), 1);
			assert_eq!(sent[0].0, processed.id);
		}

		// Idempotence: nothing is PROCESSED anymore, so a second run sends
		// nothing and the set of SENT_TO_B orders is unchanged.
		let summary = sync.dispatch().await.unwrap();
		assert_eq!(summary, DispatchSummary { succeeded: 0, failed: 0 });
		assert_eq!(outbound.sent.lock().unwrap().len(), 1);
	}

	#[tokio::test]
	async fn test_dispatch_processes_orders_in_ascending_id_order() {
		let outbound = Arc::new(RecordingOutbound::new(false));
		let sync = synchronizer(empty_inbound(), outbound.clone());

		let mut ids = Vec::new();
		for _ in 0..3 {
			let order = sync.create_order(widget()).await.unwrap();
			sync.update_status(order.id, OrderStatus::Processed)
				.await
				.unwrap();
			ids.push(order.id);
		}

		sync.dispatch().await.unwrap();
		let sent_ids: Vec<u64> = outbound.sent.lock().unwrap().iter().map(|(id, _)| *id).collect();
		assert_eq!(sent_ids, ids);
	}

	#[tokio::test]
	async fn test_create_order_forces_pending_and_validates_name() {
		let sync = synchronizer(empty_inbound(), Arc::new(RecordingOutbound::new(false)));

		let order = sync.create_order(widget()).await.unwrap();
		assert_eq!(order.status, OrderStatus::Pending);

		let err = sync
			.create_order(NewOrder {
				product_name: "  ".to_string(),
				quantity: 1,
				total_price: Decimal::ONE,
			})
			.await
			.unwrap_err();
		assert!(matches!(err, SyncError::InvalidOrder(_)));
	}

	#[tokio::test]
	async fn test_update_status_enforces_forward_only_transitions() {
		let sync = synchronizer(empty_inbound(), Arc::new(RecordingOutbound::new(false)));
		let order = sync.create_order(widget()).await.unwrap();

		// Same-status update is an accepted no-op.
		let unchanged = sync
			.update_status(order.id, OrderStatus::Pending)
			.await
			.unwrap();
		assert_eq!(unchanged.status, OrderStatus::Pending);

		// Callers may not skip straight to SENT_TO_B.
		assert!(matches!(
			sync.update_status(order.id, OrderStatus::SentToB).await,
			Err(SyncError::InvalidTransition { .. })
		));

		let updated = sync
			.update_status(order.id, OrderStatus::Processed)
			.await
			.unwrap();
		assert_eq!(updated.status, OrderStatus::Processed);

		// No reverse transitions.
		assert!(matches!(
			sync.update_status(order.id, OrderStatus::Pending).await,
			Err(SyncError::InvalidTransition { .. })
		));

		assert!(matches!(
			sync.update_status(99, OrderStatus::Processed).await,
			Err(SyncError::OrderNotFound(99))
		));
	}

	#[tokio::test]
	async fn test_delete_order_semantics() {
		let sync = synchronizer(empty_inbound(), Arc::new(RecordingOutbound::new(false)));
		let order = sync.create_order(widget()).await.unwrap();

		assert!(!sync.delete_order(99).await.unwrap());
		assert_eq!(sync.list_orders().await.unwrap().len(), 1);

		assert!(sync.delete_order(order.id).await.unwrap());
		assert!(matches!(
			sync.get_order(order.id).await,
			Err(SyncError::OrderNotFound(_))
		));
	}
}
