//! API types for HTTP endpoints and operation summaries.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Outcome of one ingestion run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestSummary {
	/// Orders created from well-formed inbound records.
	pub created: usize,
	/// Malformed inbound records skipped without aborting the batch.
	pub skipped: usize,
}

/// Outcome of one dispatch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchSummary {
	/// Orders acknowledged by the recipient system and marked SENT_TO_B.
	pub succeeded: usize,
	/// Orders whose send failed; they stay PROCESSED for the next run.
	pub failed: usize,
}

/// Request body for creating an order through the access surface.
///
/// There is deliberately no status field: every created order starts PENDING.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderRequest {
	#[serde(rename = "productName")]
	pub product_name: String,
	pub quantity: u32,
	#[serde(rename = "totalPrice")]
	pub total_price: Decimal,
}

/// Standard error response body returned by the HTTP API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
	/// Machine-readable error code.
	pub error: String,
	/// Human-readable description.
	pub message: String,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_summary_wire_format() {
		let summary = IngestSummary {
			created: 2,
			skipped: 1,
		};
		let json = serde_json::to_value(summary).unwrap();
		assert_eq!(json, serde_json::json!({"created": 2, "skipped": 1}));
	}

	#[test]
	fn test_create_request_has_no_status_field() {
		let request: CreateOrderRequest = serde_json::from_str(
			r#"{"productName": "Widget", "quantity": 3, "totalPrice": "9.99"}"#,
		)
		.unwrap();
		assert_eq!(request.quantity, 3);
		assert_eq!(request.total_price.to_string(), "9.99");
	}
}
