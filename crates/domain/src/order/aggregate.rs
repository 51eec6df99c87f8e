//! Order aggregate implementation.

use chrono::{DateTime, Utc};
use common::{OrderId, UserId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::aggregate::Aggregate;
use crate::error::DomainError;
use crate::inventory::{ReservationLine, StockChange};
use crate::pricing::{PriceBreakdown, PricingConfig, out_of_range};
use crate::value_objects::{Money, ShippingAddress};

use super::{
    ApprovalDecision, ApprovalStatus, FulfillmentStatus, OrderEvent, OrderLine, PaymentStatus,
    events::{ApprovalDecidedData, OrderPlacedData},
};

/// Order aggregate root.
///
/// An order is created pending from a cart snapshot, decided by an
/// administrator, and then moves through fulfillment. It is never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    user_id: UserId,
    lines: Vec<OrderLine>,
    pricing: PriceBreakdown,
    approval_status: ApprovalStatus,
    fulfillment_status: FulfillmentStatus,
    payment_status: PaymentStatus,
    shipping_address: ShippingAddress,
    payment_method: Option<String>,

    /// Set by the first approval that reserved stock; never cleared.
    stock_reserved: bool,
    version: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Aggregate for Order {
    type Event = OrderEvent;

    fn aggregate_type() -> &'static str {
        "Order"
    }

    fn aggregate_id(&self) -> Uuid {
        self.id.as_uuid()
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn apply(&mut self, event: Self::Event) {
        self.updated_at = event.occurred_at();
        self.version += 1;
        match event {
            OrderEvent::OrderPlaced(_) => {
                // Creation goes through `from_history`
            }
            OrderEvent::ApprovalDecided(data) => self.apply_approval_decided(data),
            OrderEvent::FulfillmentChanged(data) => {
                self.fulfillment_status = data.to;
            }
            OrderEvent::PaymentChanged(data) => {
                self.payment_status = data.to;
            }
        }
    }
}

// Query methods
impl Order {
    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    pub fn pricing(&self) -> &PriceBreakdown {
        &self.pricing
    }

    pub fn total_amount(&self) -> Money {
        self.pricing.total
    }

    pub fn approval_status(&self) -> ApprovalStatus {
        self.approval_status
    }

    pub fn fulfillment_status(&self) -> FulfillmentStatus {
        self.fulfillment_status
    }

    pub fn payment_status(&self) -> PaymentStatus {
        self.payment_status
    }

    pub fn shipping_address(&self) -> &ShippingAddress {
        &self.shipping_address
    }

    pub fn payment_method(&self) -> Option<&str> {
        self.payment_method.as_deref()
    }

    /// Returns true once stock has been reserved for this order.
    pub fn stock_reserved(&self) -> bool {
        self.stock_reserved
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns the total quantity across all lines, saturating at `u32::MAX`.
    pub fn total_quantity(&self) -> u32 {
        self.lines
            .iter()
            .fold(0u32, |acc, line| acc.saturating_add(line.quantity))
    }

    /// Returns true if deciding `decision` must run the stock reservation.
    ///
    /// Stock is reserved by the first approval only; later approvals, even
    /// after an intermediate rejection, never touch inventory again.
    pub fn needs_reservation(&self, decision: ApprovalDecision) -> bool {
        decision == ApprovalDecision::Approved && !self.stock_reserved
    }

    /// Returns the lines to hand to the reservation protocol.
    pub fn reservation_lines(&self) -> Vec<ReservationLine> {
        self.lines
            .iter()
            .map(|line| ReservationLine {
                item_id: line.item_id.clone(),
                item_name: line.item_name.clone(),
                quantity: line.quantity,
            })
            .collect()
    }
}

// Command methods (return events)
impl Order {
    /// Places a new order.
    ///
    /// Lines must already carry the prices resolved from the catalog. The
    /// totals are computed here once and never recomputed.
    pub fn place(
        order_id: OrderId,
        user_id: UserId,
        lines: Vec<OrderLine>,
        pricing: &PricingConfig,
        shipping_address: ShippingAddress,
        payment_method: Option<String>,
        discount_code: Option<&str>,
    ) -> Result<Vec<OrderEvent>, DomainError> {
        if lines.is_empty() {
            return Err(DomainError::Validation(
                "an order needs at least one line".to_string(),
            ));
        }

        if let Some(line) = lines.iter().find(|line| line.quantity == 0) {
            return Err(DomainError::Validation(format!(
                "quantity for {} must be at least 1",
                line.item_id
            )));
        }

        if let Some(line) = lines.iter().find(|line| line.unit_price.is_negative()) {
            return Err(DomainError::InvalidCartState(format!(
                "{} has no valid price",
                line.item_id
            )));
        }

        shipping_address.validate()?;

        let subtotal = lines
            .iter()
            .try_fold(Money::zero(), |acc, line| {
                line.unit_price
                    .checked_multiply(line.quantity)
                    .and_then(|line_total| acc.checked_add(line_total))
            })
            .ok_or_else(out_of_range)?;
        let pricing = pricing.price(subtotal, discount_code)?;
        let payment_method = payment_method
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty());

        Ok(vec![OrderEvent::OrderPlaced(OrderPlacedData {
            order_id,
            user_id,
            lines,
            pricing,
            shipping_address,
            payment_method,
            placed_at: Utc::now(),
        })])
    }

    /// Records an administrator decision.
    ///
    /// `stock_changes` must hold the committed reservation when
    /// [`needs_reservation`](Self::needs_reservation) is true for the decision.
    /// Deciding the current status again with nothing to reserve yields no
    /// events.
    pub fn decide(
        &self,
        decision: ApprovalDecision,
        decided_by: UserId,
        stock_changes: Vec<StockChange>,
    ) -> Result<Vec<OrderEvent>, DomainError> {
        let to = decision.status();

        if self.needs_reservation(decision) && stock_changes.is_empty() {
            return Err(DomainError::InternalConsistency(format!(
                "order {} cannot be approved without reserving stock",
                self.id
            )));
        }

        if !self.needs_reservation(decision) && !stock_changes.is_empty() {
            return Err(DomainError::InternalConsistency(format!(
                "order {} already has reserved stock",
                self.id
            )));
        }

        if to == self.approval_status && stock_changes.is_empty() {
            return Ok(vec![]);
        }

        Ok(vec![OrderEvent::approval_decided(
            self.approval_status,
            to,
            decided_by,
            stock_changes,
        )])
    }

    /// Moves the order to a new fulfillment status.
    pub fn change_fulfillment(
        &self,
        to: FulfillmentStatus,
        changed_by: UserId,
    ) -> Result<Vec<OrderEvent>, DomainError> {
        if to == self.fulfillment_status {
            return Ok(vec![]);
        }

        if !self.fulfillment_status.can_transition_to(to) {
            return Err(DomainError::InvalidStateTransition {
                entity: "order",
                from: self.fulfillment_status.to_string(),
                action: fulfillment_action(to),
            });
        }

        Ok(vec![OrderEvent::fulfillment_changed(
            self.fulfillment_status,
            to,
            changed_by,
        )])
    }

    /// Changes the payment label.
    pub fn change_payment(
        &self,
        to: PaymentStatus,
        changed_by: UserId,
    ) -> Result<Vec<OrderEvent>, DomainError> {
        if to == self.payment_status {
            return Ok(vec![]);
        }

        if !self.payment_status.can_transition_to(to) {
            return Err(DomainError::InvalidStateTransition {
                entity: "payment of order",
                from: self.payment_status.to_string(),
                action: payment_action(to),
            });
        }

        Ok(vec![OrderEvent::payment_changed(
            self.payment_status,
            to,
            changed_by,
        )])
    }
}

// Reconstruction
impl Order {
    /// Rebuilds an order from its event history.
    ///
    /// Returns None unless the first event is `OrderPlaced`.
    pub fn from_history(events: impl IntoIterator<Item = OrderEvent>) -> Option<Order> {
        let mut events = events.into_iter();
        let mut order = match events.next()? {
            OrderEvent::OrderPlaced(data) => Order::from_placed(data),
            _ => return None,
        };
        order.apply_events(events);
        Some(order)
    }

    fn from_placed(data: OrderPlacedData) -> Order {
        Order {
            id: data.order_id,
            user_id: data.user_id,
            lines: data.lines,
            pricing: data.pricing,
            approval_status: ApprovalStatus::Pending,
            fulfillment_status: FulfillmentStatus::Pending,
            payment_status: PaymentStatus::Pending,
            shipping_address: data.shipping_address,
            payment_method: data.payment_method,
            stock_reserved: false,
            version: 1,
            created_at: data.placed_at,
            updated_at: data.placed_at,
        }
    }

    fn apply_approval_decided(&mut self, data: ApprovalDecidedData) {
        self.approval_status = data.to;
        if !data.stock_changes.is_empty() {
            self.stock_reserved = true;
        }
    }
}

fn fulfillment_action(to: FulfillmentStatus) -> &'static str {
    match to {
        FulfillmentStatus::Pending => "reopen",
        FulfillmentStatus::Processing => "start processing",
        FulfillmentStatus::Shipped => "ship",
        FulfillmentStatus::Delivered => "deliver",
        FulfillmentStatus::Cancelled => "cancel",
    }
}

fn payment_action(to: PaymentStatus) -> &'static str {
    match to {
        PaymentStatus::Pending => "reset",
        PaymentStatus::Completed => "complete",
        PaymentStatus::Failed => "fail",
        PaymentStatus::Refunded => "refund",
    }
}
