//! Order lifecycle types for the synchronization system.
//!
//! This module defines the order entity, its lifecycle status, and the
//! payloads exchanged with the external systems.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A customer order moving through the synchronization lifecycle.
///
/// Orders are created either directly through the access surface or by
/// ingesting records from the inbound source system. The store assigns the
/// id at creation; it is never reused within the store's lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
	/// Unique identifier assigned by the store at creation.
	pub id: u64,
	/// Name of the ordered product. Always non-empty.
	#[serde(rename = "productName")]
	pub product_name: String,
	/// Ordered quantity. Unsigned, so non-negativity holds by construction.
	pub quantity: u32,
	/// Total price as an exact decimal. Serialized as a decimal string to
	/// avoid binary floating-point drift in money values.
	#[serde(rename = "totalPrice")]
	pub total_price: Decimal,
	/// Current lifecycle status.
	pub status: OrderStatus,
}

/// A validated order payload without an id.
///
/// Produced by the access surface or by per-record validation of an inbound
/// record; the store turns it into an [`Order`] by assigning an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOrder {
	#[serde(rename = "productName")]
	pub product_name: String,
	pub quantity: u32,
	#[serde(rename = "totalPrice")]
	pub total_price: Decimal,
}

/// The payload pushed to the outbound recipient system for one order.
///
/// Carries no id or status field; the recipient only sees the order data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundPayload {
	#[serde(rename = "productName")]
	pub product_name: String,
	pub quantity: u32,
	#[serde(rename = "totalPrice")]
	pub total_price: Decimal,
}

impl From<&Order> for OutboundPayload {
	fn from(order: &Order) -> Self {
		Self {
			product_name: order.product_name.clone(),
			quantity: order.quantity,
			total_price: order.total_price,
		}
	}
}

/// Status of an order in the synchronization lifecycle.
///
/// Status only ever moves forward: PENDING → PROCESSED → SENT_TO_B.
/// SENT_TO_B is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
	/// Order has been created but not yet processed.
	Pending,
	/// Order has been reviewed and processed; eligible for dispatch.
	Processed,
	/// Order has been acknowledged by the outbound recipient system.
	SentToB,
}

impl OrderStatus {
	/// Returns the wire token for this status.
	pub fn as_str(&self) -> &'static str {
		match self {
			OrderStatus::Pending => "PENDING",
			OrderStatus::Processed => "PROCESSED",
			OrderStatus::SentToB => "SENT_TO_B",
		}
	}

	/// Whether a caller-driven update from `self` to `next` is allowed.
	///
	/// Callers may advance PENDING to PROCESSED; a same-status update is an
	/// accepted no-op. SENT_TO_B is reachable only through dispatch, which
	/// keeps the guarantee that every SENT_TO_B order was acknowledged by
	/// the recipient system.
	pub fn can_update_to(&self, next: OrderStatus) -> bool {
		matches!(
			(self, next),
			(OrderStatus::Pending, OrderStatus::Processed)
		) || *self == next
	}
}

impl fmt::Display for OrderStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for OrderStatus {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"PENDING" => Ok(OrderStatus::Pending),
			"PROCESSED" => Ok(OrderStatus::Processed),
			"SENT_TO_B" => Ok(OrderStatus::SentToB),
			other => Err(format!("Unknown order status: {}", other)),
		}
	}
}
