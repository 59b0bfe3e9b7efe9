//! Loosely-typed inbound records and their per-record validation.
//!
//! The inbound source system is not trusted to produce well-formed data, so
//! records arrive with every field optional and untyped. Validation turns a
//! record into a [`NewOrder`] or fails that one record without affecting the
//! rest of the batch.

use crate::NewOrder;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;
use thiserror::Error;

/// Reasons a single inbound record fails validation.
///
/// A malformed record is skipped and counted; it never aborts the batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedRecord {
	/// productName is absent or empty.
	#[error("Missing or empty productName")]
	MissingProductName,
	/// quantity is absent, not an integer, or negative.
	#[error("Invalid quantity: {0}")]
	InvalidQuantity(String),
	/// totalPrice is absent or does not parse as an exact decimal.
	#[error("Invalid totalPrice: {0}")]
	InvalidPrice(String),
}

/// One order description as supplied by the inbound source system.
///
/// Any `status` field in the external payload is ignored; ingested orders
/// always start PENDING.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawOrderRecord {
	#[serde(rename = "productName", default)]
	pub product_name: Option<String>,
	#[serde(default)]
	pub quantity: Option<Value>,
	#[serde(rename = "totalPrice", default)]
	pub total_price: Option<Value>,
}

impl RawOrderRecord {
	/// Validates this record into a [`NewOrder`].
	///
	/// The price is parsed as an exact decimal from either a string or a
	/// JSON number literal; binary floating point never enters the value.
	pub fn into_new_order(self) -> Result<NewOrder, MalformedRecord> {
		let product_name = match self.product_name {
			Some(name) if !name.trim().is_empty() => name,
			_ => return Err(MalformedRecord::MissingProductName),
		};

		let quantity = match &self.quantity {
			Some(Value::Number(n)) => n
				.as_u64()
				.and_then(|q| u32::try_from(q).ok())
				.ok_or_else(|| MalformedRecord::InvalidQuantity(n.to_string()))?,
			Some(other) => {
				return Err(MalformedRecord::InvalidQuantity(other.to_string()))
			},
			None => return Err(MalformedRecord::InvalidQuantity("missing".to_string())),
		};

		let total_price = match &self.total_price {
			Some(Value::String(s)) => Decimal::from_str(s.trim())
				.map_err(|_| MalformedRecord::InvalidPrice(s.clone()))?,
			// Parse the number from its literal text so the decimal stays exact.
			Some(Value::Number(n)) => Decimal::from_str(&n.to_string())
				.map_err(|_| MalformedRecord::InvalidPrice(n.to_string()))?,
			Some(other) => return Err(MalformedRecord::InvalidPrice(other.to_string())),
			None => return Err(MalformedRecord::InvalidPrice("missing".to_string())),
		};

		Ok(NewOrder {
			product_name,
			quantity,
			total_price,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	fn record(value: serde_json::Value) -> RawOrderRecord {
		serde_json::from_value(value).unwrap()
	}

	#[test]
	fn test_well_formed_record() {
		let new_order = record(json!({
			"productName": "Widget",
			"quantity": 3,
			"totalPrice": "9.99"
		}))
		.into_new_order()
		.unwrap();

		assert_eq!(new_order.product_name, "Widget");
		assert_eq!(new_order.quantity, 3);
		assert_eq!(new_order.total_price, Decimal::new(999, 2));
	}

	#[test]
	fn test_numeric_price_stays_exact() {
		let new_order = record(json!({
			"productName": "Widget",
			"quantity": 1,
			"totalPrice": 19.99
		}))
		.into_new_order()
		.unwrap();

		assert_eq!(new_order.total_price.to_string(), "19.99");
	}

	#[test]
	fn test_missing_or_empty_product_name() {
		let err = record(json!({"quantity": 1, "totalPrice": "1.00"}))
			.into_new_order()
			.unwrap_err();
		assert_eq!(err, MalformedRecord::MissingProductName);

		let err = record(json!({
			"productName": "  ",
			"quantity": 1,
			"totalPrice": "1.00"
		}))
		.into_new_order()
		.unwrap_err();
		assert_eq!(err, MalformedRecord::MissingProductName);
	}

	#[test]
	fn test_invalid_quantity() {
		for quantity in [json!("three"), json!(-1), json!(2.5), json!(null)] {
			let err = record(json!({
				"productName": "Widget",
				"quantity": quantity,
				"totalPrice": "1.00"
			}))
			.into_new_order()
			.unwrap_err();
			assert!(matches!(err, MalformedRecord::InvalidQuantity(_)));
		}
	}

	#[test]
	fn test_invalid_price() {
		let err = record(json!({
			"productName": "Widget",
			"quantity": 1,
			"totalPrice": "not-a-price"
		}))
		.into_new_order()
		.unwrap_err();
		assert!(matches!(err, MalformedRecord::InvalidPrice(_)));
	}

	#[test]
	fn test_external_status_field_is_ignored() {
		let new_order = record(json!({
			"productName": "Widget",
			"quantity": 1,
			"totalPrice": "1.00",
			"status": "SENT_TO_B"
		}))
		.into_new_order()
		.unwrap();
		assert_eq!(new_order.product_name, "Widget");
	}
}
