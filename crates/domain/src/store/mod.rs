//! Storage port for catalog stock, orders, requests and the audit log.
//!
//! Every state change of the core happens inside a [`UnitOfWork`]: an atomic
//! read-modify-write over several records. Locks taken through a unit of
//! work are held until it commits or rolls back, so two units of work that
//! touch the same order or item serialize, while disjoint ones do not
//! interfere with each other's outcome.

mod error;
mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{ItemId, OrderId, RequestId, UserId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::CatalogItem;
use crate::error::DomainError;
use crate::order::Order;
use crate::request::Request;

pub use error::{StoreError, StoreResult};
pub use memory::{InMemoryStore, InMemoryUnitOfWork};

/// One audit log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub aggregate_id: Uuid,
    pub aggregate_type: String,
    pub event_type: String,
    pub version: u64,
    pub payload: serde_json::Value,
    pub recorded_at: DateTime<Utc>,
}

/// Entry point to a store: point reads and units of work.
///
/// Point reads see committed state only.
#[async_trait]
pub trait Store: Send + Sync {
    /// The unit of work type opened by [`begin`](Self::begin).
    type UnitOfWork: UnitOfWork;

    /// Opens a unit of work.
    async fn begin(&self) -> StoreResult<Self::UnitOfWork>;

    /// Reads a catalog item.
    async fn get_item(&self, id: &ItemId) -> StoreResult<Option<CatalogItem>>;

    /// Inserts or replaces a catalog item.
    ///
    /// This is the catalog's own write path; the core only uses it to seed
    /// items and change prices.
    async fn upsert_item(&self, item: CatalogItem) -> StoreResult<()>;

    /// Reads an order.
    async fn get_order(&self, id: OrderId) -> StoreResult<Option<Order>>;

    /// Lists orders, newest first, optionally restricted to one owner.
    async fn list_orders(&self, owner: Option<UserId>) -> StoreResult<Vec<Order>>;

    /// Reads a request, deleted or not.
    async fn get_request(&self, id: RequestId) -> StoreResult<Option<Request>>;

    /// Lists non-deleted requests, newest first, optionally restricted to one owner.
    async fn list_requests(&self, owner: Option<UserId>) -> StoreResult<Vec<Request>>;

    /// Returns the audit log of one aggregate in version order.
    async fn events_for(&self, aggregate_id: Uuid) -> StoreResult<Vec<EventRecord>>;
}

/// An atomic unit of work.
///
/// Dropping a unit of work without calling [`commit`](Self::commit) discards
/// every change made through it.
#[async_trait]
pub trait UnitOfWork: Send + Sized {
    /// Locks and reads the given catalog items.
    ///
    /// Items are locked in ascending id order. Missing items are absent from
    /// the result.
    async fn lock_items(&mut self, ids: &[ItemId]) -> StoreResult<Vec<CatalogItem>>;

    /// Decrements an item's stock only if the result stays non-negative.
    ///
    /// Returns the new stock, or None if the item is missing or the
    /// decrement was refused.
    async fn decrement_stock(&mut self, id: &ItemId, quantity: u32) -> StoreResult<Option<i64>>;

    /// Locks and reads an order.
    async fn lock_order(&mut self, id: OrderId) -> StoreResult<Option<Order>>;

    async fn insert_order(&mut self, order: &Order) -> StoreResult<()>;

    async fn update_order(&mut self, order: &Order) -> StoreResult<()>;

    /// Returns the non-deleted request of an order, if any.
    async fn active_request_for_order(&mut self, order_id: OrderId)
    -> StoreResult<Option<Request>>;

    /// Locks and reads a request.
    async fn lock_request(&mut self, id: RequestId) -> StoreResult<Option<Request>>;

    async fn insert_request(&mut self, request: &Request) -> StoreResult<()>;

    async fn update_request(&mut self, request: &Request) -> StoreResult<()>;

    /// Appends records to the audit log.
    async fn append_events(&mut self, records: Vec<EventRecord>) -> StoreResult<()>;

    /// Makes every change of this unit of work durable and visible.
    async fn commit(self) -> StoreResult<()>;

    /// Discards every change of this unit of work.
    async fn rollback(self) -> StoreResult<()>;
}

/// Rolls back a unit of work after a failed operation and hands back the error.
pub(crate) async fn abort<U: UnitOfWork>(uow: U, err: DomainError) -> DomainError {
    if let DomainError::InternalConsistency(detail) = &err {
        tracing::error!(%detail, "Aborting unit of work after consistency violation");
    }
    if let Err(rollback_err) = uow.rollback().await {
        tracing::warn!(error = %rollback_err, "Rollback failed; changes are discarded with the unit of work");
    }
    err
}
