//! HTTP server for the order synchronization API.
//!
//! This module exposes the synchronizer's operations to callers: order CRUD,
//! caller-driven status updates, and on-demand ingest/dispatch runs. The
//! same operations the scheduler drives periodically can be invoked here
//! synchronously; both paths are safe to overlap.

use axum::{
	extract::{Path, Query, State},
	http::StatusCode,
	response::Json,
	routing::{get, post, put},
	Router,
};
use order_config::ApiConfig;
use order_core::{SyncError, Synchronizer};
use order_types::{
	CreateOrderRequest, DispatchSummary, ErrorResponse, IngestSummary, NewOrder, Order,
	OrderStatus,
};
use serde::Deserialize;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

/// Shared application state for the API server.
#[derive(Clone)]
pub struct AppState {
	/// Reference to the synchronizer for processing requests.
	pub synchronizer: Arc<Synchronizer>,
}

/// Error payload plus status, as returned by every handler.
type ApiError = (StatusCode, Json<ErrorResponse>);

/// Starts the HTTP server for the API.
///
/// This function creates and configures the HTTP server with routing,
/// middleware, and error handling for the access surface.
pub async fn start_server(
	api_config: ApiConfig,
	synchronizer: Arc<Synchronizer>,
) -> Result<(), Box<dyn std::error::Error>> {
	let app_state = AppState { synchronizer };

	let app = Router::new()
		.nest(
			"/api",
			Router::new()
				.route("/orders", get(handle_list_orders).post(handle_create_order))
				.route("/orders/{id}", get(handle_get_order).delete(handle_delete_order))
				.route("/orders/{id}/status", put(handle_update_status))
				.route("/orders/ingest", post(handle_ingest))
				.route("/orders/dispatch", post(handle_dispatch)),
		)
		.layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
		.with_state(app_state);

	let bind_address = format!("{}:{}", api_config.host, api_config.port);
	let listener = TcpListener::bind(&bind_address).await?;

	tracing::info!("Order API server starting on {}", bind_address);

	axum::serve(listener, app).await?;

	Ok(())
}

/// Maps a synchronizer error to an HTTP status and error body.
fn error_response(error: SyncError) -> ApiError {
	let (status_code, error_code) = match &error {
		SyncError::OrderNotFound(_) => (StatusCode::NOT_FOUND, "ORDER_NOT_FOUND"),
		SyncError::InvalidTransition { .. } => (StatusCode::CONFLICT, "INVALID_TRANSITION"),
		SyncError::InvalidOrder(_) => (StatusCode::BAD_REQUEST, "INVALID_ORDER"),
		SyncError::Inbound(_) => (StatusCode::BAD_GATEWAY, "INBOUND_UNAVAILABLE"),
		SyncError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR"),
	};

	(
		status_code,
		Json(ErrorResponse {
			error: error_code.to_string(),
			message: error.to_string(),
		}),
	)
}

/// Handles GET /api/orders requests.
async fn handle_list_orders(
	State(state): State<AppState>,
) -> Result<Json<Vec<Order>>, ApiError> {
	match state.synchronizer.list_orders().await {
		Ok(orders) => Ok(Json(orders)),
		Err(e) => Err(error_response(e)),
	}
}

/// Handles POST /api/orders requests.
///
/// The created order always starts PENDING; the request cannot carry a
/// status.
async fn handle_create_order(
	State(state): State<AppState>,
	Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
	let new_order = NewOrder {
		product_name: request.product_name,
		quantity: request.quantity,
		total_price: request.total_price,
	};

	match state.synchronizer.create_order(new_order).await {
		Ok(order) => Ok((StatusCode::CREATED, Json(order))),
		Err(e) => {
			tracing::warn!("Order creation failed: {}", e);
			Err(error_response(e))
		},
	}
}

/// Handles GET /api/orders/{id} requests.
async fn handle_get_order(
	Path(id): Path<u64>,
	State(state): State<AppState>,
) -> Result<Json<Order>, ApiError> {
	match state.synchronizer.get_order(id).await {
		Ok(order) => Ok(Json(order)),
		Err(e) => Err(error_response(e)),
	}
}

/// Query parameters for the status update endpoint.
#[derive(Debug, Deserialize)]
struct StatusParams {
	status: String,
}

/// Handles PUT /api/orders/{id}/status requests.
///
/// Caller-driven status update; this is the only path that sets PROCESSED.
/// Backward transitions are rejected with 409.
async fn handle_update_status(
	Path(id): Path<u64>,
	Query(params): Query<StatusParams>,
	State(state): State<AppState>,
) -> Result<Json<Order>, ApiError> {
	let status: OrderStatus = params.status.parse().map_err(|message: String| {
		(
			StatusCode::BAD_REQUEST,
			Json(ErrorResponse {
				error: "INVALID_STATUS".to_string(),
				message,
			}),
		)
	})?;

	match state.synchronizer.update_status(id, status).await {
		Ok(order) => Ok(Json(order)),
		Err(e) => {
			tracing::warn!(order_id = id, "Status update failed: {}", e);
			Err(error_response(e))
		},
	}
}

/// Handles DELETE /api/orders/{id} requests.
async fn handle_delete_order(
	Path(id): Path<u64>,
	State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
	match state.synchronizer.delete_order(id).await {
		Ok(true) => Ok(Json(serde_json::json!({
			"message": format!("Order with ID {} has been deleted.", id)
		}))),
		Ok(false) => Err((
			StatusCode::NOT_FOUND,
			Json(ErrorResponse {
				error: "ORDER_NOT_FOUND".to_string(),
				message: format!("Order with ID {} not found.", id),
			}),
		)),
		Err(e) => Err(error_response(e)),
	}
}

/// Handles POST /api/orders/ingest requests.
///
/// Runs one ingestion pass on demand. Returns 502 when the inbound source
/// system is unavailable; no partial writes happen in that case.
async fn handle_ingest(
	State(state): State<AppState>,
) -> Result<Json<IngestSummary>, ApiError> {
	match state.synchronizer.ingest().await {
		Ok(summary) => Ok(Json(summary)),
		Err(e) => {
			tracing::warn!("On-demand ingestion failed: {}", e);
			Err(error_response(e))
		},
	}
}

/// Handles POST /api/orders/dispatch requests.
///
/// Runs one dispatch pass on demand. Per-order send failures are counted in
/// the summary rather than surfaced as an error.
async fn handle_dispatch(
	State(state): State<AppState>,
) -> Result<Json<DispatchSummary>, ApiError> {
	match state.synchronizer.dispatch().await {
		Ok(summary) => Ok(Json(summary)),
		Err(e) => {
			tracing::warn!("On-demand dispatch failed: {}", e);
			Err(error_response(e))
		},
	}
}
