//! Order line items.

use common::ItemId;
use serde::{Deserialize, Serialize};

use crate::value_objects::Money;

/// A line of an order.
///
/// The unit price is captured when the order is created and never follows
/// later catalog price changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub item_id: ItemId,
    pub item_name: String,
    pub quantity: u32,
    pub unit_price: Money,
}

impl OrderLine {
    pub fn new(
        item_id: impl Into<ItemId>,
        item_name: impl Into<String>,
        quantity: u32,
        unit_price: Money,
    ) -> Self {
        Self {
            item_id: item_id.into(),
            item_name: item_name.into(),
            quantity,
            unit_price,
        }
    }

    /// Returns quantity * unit_price.
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_total() {
        let line = OrderLine::new("SKU-001", "Widget", 3, Money::from_cents(1000));
        assert_eq!(line.line_total().cents(), 3000);
    }
}
