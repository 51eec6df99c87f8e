//! Order domain events.

use chrono::{DateTime, Utc};
use common::{OrderId, UserId};
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;
use crate::inventory::StockChange;
use crate::pricing::PriceBreakdown;
use crate::value_objects::ShippingAddress;

use super::{ApprovalStatus, FulfillmentStatus, OrderLine, PaymentStatus};

/// Events that can occur on an order aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum OrderEvent {
    /// Order was created from a cart snapshot.
    OrderPlaced(OrderPlacedData),

    /// An administrator decided on the order.
    ApprovalDecided(ApprovalDecidedData),

    /// Fulfillment status changed.
    FulfillmentChanged(FulfillmentChangedData),

    /// Payment label changed.
    PaymentChanged(PaymentChangedData),
}

impl DomainEvent for OrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::OrderPlaced(_) => "OrderPlaced",
            OrderEvent::ApprovalDecided(_) => "ApprovalDecided",
            OrderEvent::FulfillmentChanged(_) => "FulfillmentChanged",
            OrderEvent::PaymentChanged(_) => "PaymentChanged",
        }
    }
}

/// Data for OrderPlaced event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderPlacedData {
    pub order_id: OrderId,
    pub user_id: UserId,
    pub lines: Vec<OrderLine>,
    pub pricing: PriceBreakdown,
    pub shipping_address: ShippingAddress,
    pub payment_method: Option<String>,
    pub placed_at: DateTime<Utc>,
}

/// Data for ApprovalDecided event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalDecidedData {
    pub from: ApprovalStatus,
    pub to: ApprovalStatus,
    pub decided_by: UserId,

    /// Stock decrements committed together with this decision. Empty unless
    /// this decision performed the order's reservation.
    #[serde(default)]
    pub stock_changes: Vec<StockChange>,
    pub decided_at: DateTime<Utc>,
}

/// Data for FulfillmentChanged event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FulfillmentChangedData {
    pub from: FulfillmentStatus,
    pub to: FulfillmentStatus,
    pub changed_by: UserId,
    pub changed_at: DateTime<Utc>,
}

/// Data for PaymentChanged event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentChangedData {
    pub from: PaymentStatus,
    pub to: PaymentStatus,
    pub changed_by: UserId,
    pub changed_at: DateTime<Utc>,
}

// Convenience constructors for events
impl OrderEvent {
    pub fn approval_decided(
        from: ApprovalStatus,
        to: ApprovalStatus,
        decided_by: UserId,
        stock_changes: Vec<StockChange>,
    ) -> Self {
        OrderEvent::ApprovalDecided(ApprovalDecidedData {
            from,
            to,
            decided_by,
            stock_changes,
            decided_at: Utc::now(),
        })
    }

    pub fn fulfillment_changed(
        from: FulfillmentStatus,
        to: FulfillmentStatus,
        changed_by: UserId,
    ) -> Self {
        OrderEvent::FulfillmentChanged(FulfillmentChangedData {
            from,
            to,
            changed_by,
            changed_at: Utc::now(),
        })
    }

    pub fn payment_changed(from: PaymentStatus, to: PaymentStatus, changed_by: UserId) -> Self {
        OrderEvent::PaymentChanged(PaymentChangedData {
            from,
            to,
            changed_by,
            changed_at: Utc::now(),
        })
    }

    /// Returns when the event happened.
    pub fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            OrderEvent::OrderPlaced(data) => data.placed_at,
            OrderEvent::ApprovalDecided(data) => data.decided_at,
            OrderEvent::FulfillmentChanged(data) => data.changed_at,
            OrderEvent::PaymentChanged(data) => data.changed_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::ItemId;

    #[test]
    fn test_event_type() {
        let admin = UserId::new();

        let event =
            OrderEvent::approval_decided(ApprovalStatus::Pending, ApprovalStatus::Approved, admin, vec![]);
        assert_eq!(event.event_type(), "ApprovalDecided");

        let event = OrderEvent::fulfillment_changed(
            FulfillmentStatus::Pending,
            FulfillmentStatus::Processing,
            admin,
        );
        assert_eq!(event.event_type(), "FulfillmentChanged");

        let event = OrderEvent::payment_changed(PaymentStatus::Pending, PaymentStatus::Completed, admin);
        assert_eq!(event.event_type(), "PaymentChanged");
    }

    #[test]
    fn test_approval_decided_serialization() {
        let event = OrderEvent::approval_decided(
            ApprovalStatus::Pending,
            ApprovalStatus::Approved,
            UserId::new(),
            vec![StockChange {
                item_id: ItemId::new("SKU-001"),
                quantity: 2,
                remaining: 8,
            }],
        );

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "ApprovalDecided");
        assert_eq!(json["data"]["to"], "approved");

        let deserialized: OrderEvent = serde_json::from_value(json).unwrap();
        if let OrderEvent::ApprovalDecided(data) = deserialized {
            assert_eq!(data.stock_changes.len(), 1);
            assert_eq!(data.stock_changes[0].remaining, 8);
        } else {
            panic!("Expected ApprovalDecided event");
        }
    }
}
