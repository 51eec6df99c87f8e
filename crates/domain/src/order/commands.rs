//! Order commands.

use common::OrderId;
use serde::Deserialize;

use crate::catalog::CartSnapshot;
use crate::value_objects::ShippingAddress;

use super::{ApprovalDecision, FulfillmentStatus, PaymentStatus};

/// Command to create an order from a cart snapshot.
#[derive(Debug, Clone)]
pub struct CreateOrder {
    pub cart: CartSnapshot,
    pub shipping_address: ShippingAddress,
    pub payment_method: Option<String>,
    pub discount_code: Option<String>,
}

impl CreateOrder {
    pub fn new(cart: CartSnapshot, shipping_address: ShippingAddress) -> Self {
        Self {
            cart,
            shipping_address,
            payment_method: None,
            discount_code: None,
        }
    }

    pub fn with_payment_method(mut self, method: impl Into<String>) -> Self {
        self.payment_method = Some(method.into());
        self
    }

    pub fn with_discount_code(mut self, code: impl Into<String>) -> Self {
        self.discount_code = Some(code.into());
        self
    }
}

/// Command to convert the caller's current cart into an order.
#[derive(Debug, Clone, Deserialize)]
pub struct Checkout {
    pub shipping_address: ShippingAddress,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub discount_code: Option<String>,
}

impl Checkout {
    /// Builds the create command from a cart snapshot.
    pub fn into_create(self, cart: CartSnapshot) -> CreateOrder {
        CreateOrder {
            cart,
            shipping_address: self.shipping_address,
            payment_method: self.payment_method,
            discount_code: self.discount_code,
        }
    }
}

/// Command to approve or reject an order.
#[derive(Debug, Clone, Copy)]
pub struct DecideOrder {
    pub order_id: OrderId,
    pub decision: ApprovalDecision,
}

impl DecideOrder {
    pub fn approve(order_id: OrderId) -> Self {
        Self {
            order_id,
            decision: ApprovalDecision::Approved,
        }
    }

    pub fn reject(order_id: OrderId) -> Self {
        Self {
            order_id,
            decision: ApprovalDecision::Rejected,
        }
    }
}

/// Command to move an order's fulfillment status.
#[derive(Debug, Clone, Copy)]
pub struct UpdateFulfillment {
    pub order_id: OrderId,
    pub status: FulfillmentStatus,
}

/// Command to change an order's payment label.
#[derive(Debug, Clone, Copy)]
pub struct UpdatePayment {
    pub order_id: OrderId,
    pub status: PaymentStatus,
}
