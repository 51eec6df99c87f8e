//! Cart collaborator.
//!
//! The cart lives outside the core; checkout only needs a snapshot of it and
//! a way to empty it once the order exists.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::UserId;
use tokio::sync::RwLock;

use crate::catalog::{CartLine, CartSnapshot};
use crate::error::DomainError;

/// Source of users' carts.
#[async_trait]
pub trait CartProvider: Send + Sync {
    /// Returns a point-in-time copy of the user's cart.
    async fn snapshot(&self, user_id: UserId) -> Result<CartSnapshot, DomainError>;

    /// Empties the user's cart.
    async fn clear(&self, user_id: UserId) -> Result<(), DomainError>;
}

/// In-memory carts keyed by user.
#[derive(Clone, Default)]
pub struct InMemoryCart {
    carts: Arc<RwLock<HashMap<UserId, Vec<CartLine>>>>,
}

impl InMemoryCart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a line to the user's cart, merging it with an existing line for
    /// the same item. A merge that would overflow leaves the cart unchanged.
    pub async fn add_item(&self, user_id: UserId, line: CartLine) -> Result<CartSnapshot, DomainError> {
        if line.quantity == 0 {
            return Err(DomainError::Validation(format!(
                "quantity for {} must be at least 1",
                line.item_id
            )));
        }

        let mut carts = self.carts.write().await;
        let lines = carts.entry(user_id).or_default();
        match lines.iter_mut().find(|l| l.item_id == line.item_id) {
            Some(existing) => {
                existing.quantity = existing
                    .quantity
                    .checked_add(line.quantity)
                    .ok_or_else(|| DomainError::quantity_too_large(&line.item_id))?;
            }
            None => lines.push(line),
        }
        Ok(CartSnapshot::new(lines.clone()))
    }
}

#[async_trait]
impl CartProvider for InMemoryCart {
    async fn snapshot(&self, user_id: UserId) -> Result<CartSnapshot, DomainError> {
        let carts = self.carts.read().await;
        Ok(CartSnapshot::new(
            carts.get(&user_id).cloned().unwrap_or_default(),
        ))
    }

    async fn clear(&self, user_id: UserId) -> Result<(), DomainError> {
        self.carts.write().await.remove(&user_id);
        Ok(())
    }
}
