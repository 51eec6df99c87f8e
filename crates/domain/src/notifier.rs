//! Order confirmation summaries and their delivery.
//!
//! Rendering is pure; delivery goes through a [`Notifier`], whose transport
//! (mail, SMS, ...) lives outside the core.

use std::sync::Arc;

use async_trait::async_trait;
use common::OrderId;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::error::DomainError;
use crate::order::Order;
use crate::value_objects::{Money, ShippingAddress};

/// Who a summary is addressed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recipient {
    pub name: String,
    pub email: Option<String>,
}

impl Recipient {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Addresses the summary to the shipping recipient.
    pub fn from_address(address: &ShippingAddress) -> Self {
        Self::new(address.recipient.clone())
    }
}

/// One rendered line of a summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryLine {
    pub name: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub line_total: Money,
}

/// Human-readable order confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderSummary {
    pub order_id: OrderId,
    pub recipient_name: String,
    pub recipient_email: Option<String>,
    pub lines: Vec<SummaryLine>,
    pub subtotal: Money,
    pub shipping_fee: Money,
    pub discount: Money,
    pub discount_code: Option<String>,
    pub total: Money,
    pub shipping_address_text: String,
    pub payment_method: Option<String>,
}

impl OrderSummary {
    /// Renders the confirmation of an order from its stored amounts.
    pub fn render(order: &Order, recipient: &Recipient) -> Self {
        let pricing = order.pricing();
        Self {
            order_id: order.id(),
            recipient_name: recipient.name.clone(),
            recipient_email: recipient.email.clone(),
            lines: order
                .lines()
                .iter()
                .map(|line| SummaryLine {
                    name: line.item_name.clone(),
                    quantity: line.quantity,
                    unit_price: line.unit_price,
                    line_total: line.line_total(),
                })
                .collect(),
            subtotal: pricing.subtotal,
            shipping_fee: pricing.shipping_fee,
            discount: pricing.discount,
            discount_code: pricing.discount_code.clone(),
            total: pricing.total,
            shipping_address_text: order.shipping_address().to_string(),
            payment_method: order.payment_method().map(str::to_string),
        }
    }
}

impl std::fmt::Display for OrderSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Hello {},", self.recipient_name)?;
        writeln!(f)?;
        writeln!(f, "Thank you for your order {}.", self.order_id)?;
        writeln!(f)?;
        for line in &self.lines {
            writeln!(
                f,
                "  {} x{} @ {} = {}",
                line.name, line.quantity, line.unit_price, line.line_total
            )?;
        }
        writeln!(f)?;
        writeln!(f, "Subtotal: {}", self.subtotal)?;
        writeln!(f, "Shipping: {}", self.shipping_fee)?;
        match &self.discount_code {
            Some(code) => writeln!(f, "Discount ({code}): -{}", self.discount)?,
            None => writeln!(f, "Discount: -{}", self.discount)?,
        }
        writeln!(f, "Total: {}", self.total)?;
        writeln!(f)?;
        writeln!(f, "Ship to: {}", self.shipping_address_text)?;
        if let Some(method) = &self.payment_method {
            writeln!(f, "Payment: {method}")?;
        }
        Ok(())
    }
}

/// Delivers order summaries.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(&self, summary: &OrderSummary) -> Result<(), DomainError>;
}

/// Notifier that writes summaries to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn deliver(&self, summary: &OrderSummary) -> Result<(), DomainError> {
        tracing::info!(
            order_id = %summary.order_id,
            recipient = %summary.recipient_name,
            total = %summary.total,
            "order summary\n{summary}"
        );
        Ok(())
    }
}

/// Notifier that keeps every summary it is given.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    delivered: Arc<Mutex<Vec<OrderSummary>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the summaries delivered so far, oldest first.
    pub async fn delivered(&self) -> Vec<OrderSummary> {
        self.delivered.lock().await.clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn deliver(&self, summary: &OrderSummary) -> Result<(), DomainError> {
        self.delivered.lock().await.push(summary.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::OrderLine;
    use crate::pricing::PricingConfig;
    use common::UserId;

    fn order() -> Order {
        let address = ShippingAddress {
            recipient: "Ana Diaz".to_string(),
            line1: "12 Harbour St".to_string(),
            line2: None,
            city: "Lisbon".to_string(),
            postal_code: "1100-001".to_string(),
            country: "PT".to_string(),
            phone: None,
        };
        let events = Order::place(
            OrderId::new(),
            UserId::new(),
            vec![
                OrderLine::new("SKU-001", "Widget", 2, Money::from_cents(1250)),
                OrderLine::new("SKU-002", "Gadget", 1, Money::from_cents(999)),
            ],
            &PricingConfig::default(),
            address,
            Some("card".to_string()),
            Some("save10"),
        )
        .unwrap();
        Order::from_history(events).unwrap()
    }

    #[test]
    fn test_render_uses_stored_amounts() {
        let order = order();
        let summary = OrderSummary::render(&order, &Recipient::from_address(order.shipping_address()));

        assert_eq!(summary.recipient_name, "Ana Diaz");
        assert_eq!(summary.lines.len(), 2);
        assert_eq!(summary.lines[0].line_total.cents(), 2500);
        assert_eq!(summary.subtotal.cents(), 3499);
        assert_eq!(summary.discount.cents(), 350);
        assert_eq!(summary.total, order.total_amount());
        assert_eq!(summary.discount_code.as_deref(), Some("SAVE10"));
        assert_eq!(summary.payment_method.as_deref(), Some("card"));
    }

    #[test]
    fn test_plain_text_rendering() {
        let order = order();
        let summary = OrderSummary::render(&order, &Recipient::new("Ana"));
        let text = summary.to_string();

        assert!(text.starts_with("Hello Ana,"));
        assert!(text.contains("Widget x2 @ $12.50 = $25.00"));
        assert!(text.contains("Discount (SAVE10): -$3.50"));
        assert!(text.contains("Total: $36.49"));
        assert!(text.contains("Ship to: Ana Diaz, 12 Harbour St"));
    }

    #[tokio::test]
    async fn test_recording_notifier_keeps_summaries() {
        let notifier = RecordingNotifier::new();
        let order = order();
        let summary = OrderSummary::render(&order, &Recipient::new("Ana"));

        notifier.deliver(&summary).await.unwrap();
        LogNotifier.deliver(&summary).await.unwrap();

        assert_eq!(notifier.delivered().await, vec![summary]);
    }
}
