//! Catalog and cart shapes the core consumes from its collaborators.

use common::ItemId;
use serde::{Deserialize, Serialize};

use crate::value_objects::Money;

/// A catalog item as seen by the core.
///
/// The catalog owns the item; the core only ever changes `stock`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: ItemId,
    pub name: String,
    pub unit_price: Money,
    pub stock: i64,
}

impl CatalogItem {
    /// Creates a new catalog item.
    pub fn new(id: impl Into<ItemId>, name: impl Into<String>, unit_price: Money, stock: i64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            unit_price,
            stock,
        }
    }

    /// Returns true if at least `quantity` units are in stock.
    pub fn has_stock(&self, quantity: u32) -> bool {
        self.stock >= i64::from(quantity)
    }
}

/// A line of a user's cart: an item reference and a quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub item_id: ItemId,
    pub quantity: u32,
}

impl CartLine {
    pub fn new(item_id: impl Into<ItemId>, quantity: u32) -> Self {
        Self {
            item_id: item_id.into(),
            quantity,
        }
    }
}

/// Point-in-time copy of a cart, taken when converting it into an order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSnapshot {
    pub lines: Vec<CartLine>,
}

impl CartSnapshot {
    pub fn new(lines: Vec<CartLine>) -> Self {
        Self { lines }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl FromIterator<CartLine> for CartSnapshot {
    fn from_iter<I: IntoIterator<Item = CartLine>>(iter: I) -> Self {
        Self {
            lines: iter.into_iter().collect(),
        }
    }
}
