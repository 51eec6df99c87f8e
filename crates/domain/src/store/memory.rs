use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{ItemId, OrderId, RequestId, UserId};
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use super::{EventRecord, Store, StoreError, StoreResult, UnitOfWork};
use crate::catalog::CatalogItem;
use crate::order::Order;
use crate::request::Request;

#[derive(Debug, Default)]
struct Tables {
    items: HashMap<ItemId, CatalogItem>,
    orders: HashMap<OrderId, Order>,
    requests: HashMap<RequestId, Request>,
    events: Vec<EventRecord>,
}

/// In-memory store implementation.
///
/// A unit of work holds the single table lock from `begin` until it commits
/// or is dropped, so units of work run one at a time. Writes are staged and
/// only reach the tables on commit.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store seeded with catalog items.
    pub fn with_items(items: impl IntoIterator<Item = CatalogItem>) -> Self {
        let tables = Tables {
            items: items.into_iter().map(|item| (item.id.clone(), item)).collect(),
            ..Tables::default()
        };
        Self {
            tables: Arc::new(Mutex::new(tables)),
        }
    }

    /// Returns the committed stock of an item.
    pub async fn stock_of(&self, id: &ItemId) -> Option<i64> {
        self.tables.lock().await.items.get(id).map(|item| item.stock)
    }

    /// Returns the total number of audit log records.
    pub async fn event_count(&self) -> usize {
        self.tables.lock().await.events.len()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    type UnitOfWork = InMemoryUnitOfWork;

    async fn begin(&self) -> StoreResult<InMemoryUnitOfWork> {
        let guard = self.tables.clone().lock_owned().await;
        Ok(InMemoryUnitOfWork {
            tables: guard,
            items: HashMap::new(),
            orders: HashMap::new(),
            requests: HashMap::new(),
            events: Vec::new(),
        })
    }

    async fn get_item(&self, id: &ItemId) -> StoreResult<Option<CatalogItem>> {
        Ok(self.tables.lock().await.items.get(id).cloned())
    }

    async fn upsert_item(&self, item: CatalogItem) -> StoreResult<()> {
        self.tables.lock().await.items.insert(item.id.clone(), item);
        Ok(())
    }

    async fn get_order(&self, id: OrderId) -> StoreResult<Option<Order>> {
        Ok(self.tables.lock().await.orders.get(&id).cloned())
    }

    async fn list_orders(&self, owner: Option<UserId>) -> StoreResult<Vec<Order>> {
        let tables = self.tables.lock().await;
        let mut orders: Vec<_> = tables
            .orders
            .values()
            .filter(|order| owner.is_none_or(|owner| order.user_id() == owner))
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(orders)
    }

    async fn get_request(&self, id: RequestId) -> StoreResult<Option<Request>> {
        Ok(self.tables.lock().await.requests.get(&id).cloned())
    }

    async fn list_requests(&self, owner: Option<UserId>) -> StoreResult<Vec<Request>> {
        let tables = self.tables.lock().await;
        let mut requests: Vec<_> = tables
            .requests
            .values()
            .filter(|request| request.is_active())
            .filter(|request| owner.is_none_or(|owner| request.user_id() == owner))
            .cloned()
            .collect();
        requests.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(requests)
    }

    async fn events_for(&self, aggregate_id: Uuid) -> StoreResult<Vec<EventRecord>> {
        let tables = self.tables.lock().await;
        let mut events: Vec<_> = tables
            .events
            .iter()
            .filter(|e| e.aggregate_id == aggregate_id)
            .cloned()
            .collect();
        events.sort_by_key(|e| e.version);
        Ok(events)
    }
}

/// Unit of work over an [`InMemoryStore`].
pub struct InMemoryUnitOfWork {
    tables: OwnedMutexGuard<Tables>,
    items: HashMap<ItemId, CatalogItem>,
    orders: HashMap<OrderId, Order>,
    requests: HashMap<RequestId, Request>,
    events: Vec<EventRecord>,
}

impl InMemoryUnitOfWork {
    fn item(&self, id: &ItemId) -> Option<&CatalogItem> {
        self.items.get(id).or_else(|| self.tables.items.get(id))
    }

    fn order(&self, id: OrderId) -> Option<&Order> {
        self.orders.get(&id).or_else(|| self.tables.orders.get(&id))
    }

    fn request(&self, id: RequestId) -> Option<&Request> {
        self.requests.get(&id).or_else(|| self.tables.requests.get(&id))
    }
}

#[async_trait]
impl UnitOfWork for InMemoryUnitOfWork {
    async fn lock_items(&mut self, ids: &[ItemId]) -> StoreResult<Vec<CatalogItem>> {
        let mut ids = ids.to_vec();
        ids.sort();
        ids.dedup();
        Ok(ids.iter().filter_map(|id| self.item(id).cloned()).collect())
    }

    async fn decrement_stock(&mut self, id: &ItemId, quantity: u32) -> StoreResult<Option<i64>> {
        let Some(mut item) = self.item(id).cloned() else {
            return Ok(None);
        };
        if !item.has_stock(quantity) {
            return Ok(None);
        }
        item.stock -= i64::from(quantity);
        let stock = item.stock;
        self.items.insert(id.clone(), item);
        Ok(Some(stock))
    }

    async fn lock_order(&mut self, id: OrderId) -> StoreResult<Option<Order>> {
        Ok(self.order(id).cloned())
    }

    async fn insert_order(&mut self, order: &Order) -> StoreResult<()> {
        if self.order(order.id()).is_some() {
            return Err(StoreError::Conflict(format!(
                "order {} already exists",
                order.id()
            )));
        }
        self.orders.insert(order.id(), order.clone());
        Ok(())
    }

    async fn update_order(&mut self, order: &Order) -> StoreResult<()> {
        if self.order(order.id()).is_none() {
            return Err(StoreError::MissingRecord {
                entity: "order",
                id: order.id().to_string(),
            });
        }
        self.orders.insert(order.id(), order.clone());
        Ok(())
    }

    async fn active_request_for_order(
        &mut self,
        order_id: OrderId,
    ) -> StoreResult<Option<Request>> {
        let staged = self
            .requests
            .values()
            .find(|r| r.order_id() == order_id && r.is_active());
        if let Some(request) = staged {
            return Ok(Some(request.clone()));
        }

        Ok(self
            .tables
            .requests
            .values()
            .filter(|r| !self.requests.contains_key(&r.id()))
            .find(|r| r.order_id() == order_id && r.is_active())
            .cloned())
    }

    async fn lock_request(&mut self, id: RequestId) -> StoreResult<Option<Request>> {
        Ok(self.request(id).cloned())
    }

    async fn insert_request(&mut self, request: &Request) -> StoreResult<()> {
        if self.request(request.id()).is_some() {
            return Err(StoreError::Conflict(format!(
                "request {} already exists",
                request.id()
            )));
        }
        self.requests.insert(request.id(), request.clone());
        Ok(())
    }

    async fn update_request(&mut self, request: &Request) -> StoreResult<()> {
        if self.request(request.id()).is_none() {
            return Err(StoreError::MissingRecord {
                entity: "request",
                id: request.id().to_string(),
            });
        }
        self.requests.insert(request.id(), request.clone());
        Ok(())
    }

    async fn append_events(&mut self, records: Vec<EventRecord>) -> StoreResult<()> {
        self.events.extend(records);
        Ok(())
    }

    async fn commit(self) -> StoreResult<()> {
        let InMemoryUnitOfWork {
            mut tables,
            items,
            orders,
            requests,
            events,
        } = self;
        tables.items.extend(items);
        tables.orders.extend(orders);
        tables.requests.extend(requests);
        tables.events.extend(events);
        Ok(())
    }

    async fn rollback(self) -> StoreResult<()> {
        Ok(())
    }
}
