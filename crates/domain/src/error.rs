//! Domain error types.

use common::{ItemId, OrderId};
use thiserror::Error;

use crate::store::StoreError;

/// Errors that can occur during domain operations.
///
/// Every variant describes the failure of a single operation; none of them
/// leave partially-applied state behind.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Malformed or missing input.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The cart references items that are missing or unpriced.
    #[error("Cart items invalid or unavailable: {0}")]
    InvalidCartState(String),

    /// A referenced order, request or item does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The actor is neither the owner nor an administrator.
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// An active request already exists for the order.
    #[error(
        "A request for order {order_id} is already active; wait for it to be processed or deleted"
    )]
    DuplicateRequest { order_id: OrderId },

    /// Not enough stock to reserve the requested quantity.
    #[error(
        "Insufficient stock for {item_name} ({item_id}): {available} available, {requested} requested"
    )]
    InsufficientStock {
        item_id: ItemId,
        item_name: String,
        available: i64,
        requested: u32,
    },

    /// The entity is not in a state that allows the action.
    #[error("Invalid state transition: cannot {action} {entity} in {from} state")]
    InvalidStateTransition {
        entity: &'static str,
        from: String,
        action: &'static str,
    },

    /// A defensive invariant check failed.
    #[error("Internal consistency violation: {0}")]
    InternalConsistency(String),

    /// The backing store failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl DomainError {
    /// Creates a `NotFound` error for an entity.
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        DomainError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Creates the `Validation` error for a merged quantity that overflows.
    pub fn quantity_too_large(item_id: &ItemId) -> Self {
        DomainError::Validation(format!("quantity for {item_id} is too large"))
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(e: serde_json::Error) -> Self {
        DomainError::Store(StoreError::Serialization(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_request_message_asks_caller_to_wait() {
        let err = DomainError::DuplicateRequest {
            order_id: OrderId::new(),
        };
        assert!(err.to_string().contains("wait for it to be processed or deleted"));
    }

    #[test]
    fn insufficient_stock_message_names_item_and_quantities() {
        let err = DomainError::InsufficientStock {
            item_id: ItemId::new("SKU-001"),
            item_name: "Widget".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Widget (SKU-001): 3 available, 5 requested"
        );
    }

    #[test]
    fn not_found_helper_formats_entity() {
        let err = DomainError::not_found("Order", "abc");
        assert_eq!(err.to_string(), "Order not found: abc");
    }
}
