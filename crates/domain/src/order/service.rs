//! Order service: the entry point for every order operation.

use common::OrderId;

use crate::aggregate::{Aggregate, event_records};
use crate::cart::CartProvider;
use crate::catalog::CartLine;
use crate::error::DomainError;
use crate::inventory::reserve;
use crate::notifier::{OrderSummary, Recipient};
use crate::pricing::PricingConfig;
use crate::store::{EventRecord, Store, UnitOfWork, abort};
use crate::value_objects::Actor;

use super::{
    Checkout, CreateOrder, DecideOrder, Order, OrderEvent, OrderLine, UpdateFulfillment,
    UpdatePayment,
};

/// Service for managing orders.
///
/// Every write runs in one unit of work of the underlying store; a failed
/// operation rolls it back and leaves no partial state.
pub struct OrderService<S: Store> {
    store: S,
    pricing: PricingConfig,
}

impl<S: Store> OrderService<S> {
    /// Creates a new order service with default pricing.
    pub fn new(store: S) -> Self {
        Self::with_pricing(store, PricingConfig::default())
    }

    /// Creates a new order service with the given pricing rules.
    pub fn with_pricing(store: S, pricing: PricingConfig) -> Self {
        Self { store, pricing }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn pricing(&self) -> &PricingConfig {
        &self.pricing
    }

    /// Creates a pending order from a cart snapshot.
    ///
    /// Prices are read from the catalog now and frozen on the order. No
    /// stock is touched.
    #[tracing::instrument(skip(self))]
    pub async fn create_order(&self, actor: &Actor, cmd: CreateOrder) -> Result<Order, DomainError> {
        if cmd.cart.is_empty() {
            return Err(DomainError::Validation("cart is empty".to_string()));
        }

        let mut lines = Vec::new();
        for cart_line in merge_cart_lines(&cmd.cart.lines)? {
            let item = self
                .store
                .get_item(&cart_line.item_id)
                .await?
                .ok_or_else(|| {
                    DomainError::InvalidCartState(format!(
                        "{} is not in the catalog",
                        cart_line.item_id
                    ))
                })?;
            lines.push(OrderLine::new(
                item.id,
                item.name,
                cart_line.quantity,
                item.unit_price,
            ));
        }

        let order_id = OrderId::new();
        let events = Order::place(
            order_id,
            actor.user_id,
            lines,
            &self.pricing,
            cmd.shipping_address,
            cmd.payment_method,
            cmd.discount_code.as_deref(),
        )?;
        let records = event_records(Order::aggregate_type(), order_id.as_uuid(), 0, &events)?;
        let order = Order::from_history(events).ok_or_else(|| {
            DomainError::InternalConsistency(format!("order {order_id} has no placement event"))
        })?;

        let mut uow = self.store.begin().await?;
        let stored = async {
            uow.insert_order(&order).await?;
            uow.append_events(records).await?;
            Ok::<_, DomainError>(())
        }
        .await;
        if let Err(e) = stored {
            return Err(abort(uow, e).await);
        }
        uow.commit().await?;

        metrics::counter!("orders_created_total").increment(1);
        tracing::info!(
            %order_id,
            user_id = %actor.user_id,
            total = %order.total_amount(),
            "order created"
        );
        Ok(order)
    }

    /// Converts the caller's current cart into an order.
    ///
    /// The cart is cleared only once the order exists. Failing to clear it
    /// does not undo the order.
    #[tracing::instrument(skip(self, carts))]
    pub async fn checkout<C>(&self, carts: &C, actor: &Actor, cmd: Checkout) -> Result<Order, DomainError>
    where
        C: CartProvider + ?Sized,
    {
        let snapshot = carts.snapshot(actor.user_id).await?;
        let order = self.create_order(actor, cmd.into_create(snapshot)).await?;

        if let Err(e) = carts.clear(actor.user_id).await {
            tracing::warn!(order_id = %order.id(), error = %e, "failed to clear cart after checkout");
        }
        Ok(order)
    }

    /// Approves or rejects an order.
    ///
    /// The first approval reserves stock for every line in the same unit of
    /// work that persists the status; if any line cannot be reserved the
    /// order keeps its previous status and no stock moves.
    #[tracing::instrument(skip(self))]
    pub async fn decide_order(&self, actor: &Actor, cmd: DecideOrder) -> Result<Order, DomainError> {
        actor.require_admin("decide orders")?;

        let mut uow = self.store.begin().await?;
        let decided = async {
            let mut order = uow
                .lock_order(cmd.order_id)
                .await?
                .ok_or_else(|| DomainError::not_found("Order", cmd.order_id))?;

            let stock_changes = if order.needs_reservation(cmd.decision) {
                reserve(&mut uow, &order.reservation_lines()).await?
            } else {
                vec![]
            };

            let events = order.decide(cmd.decision, actor.user_id, stock_changes)?;
            if !events.is_empty() {
                let records = order.record(events)?;
                uow.update_order(&order).await?;
                uow.append_events(records).await?;
            }
            Ok::<_, DomainError>(order)
        }
        .await;

        let order = match decided {
            Ok(order) => order,
            Err(e) => return Err(abort(uow, e).await),
        };
        uow.commit().await?;

        metrics::counter!("order_decisions_total", "decision" => cmd.decision.status().as_str())
            .increment(1);
        tracing::info!(
            order_id = %cmd.order_id,
            decision = %cmd.decision,
            stock_reserved = order.stock_reserved(),
            "order decided"
        );
        Ok(order)
    }

    /// Loads an order visible to the actor.
    #[tracing::instrument(skip(self))]
    pub async fn get_order(&self, actor: &Actor, order_id: OrderId) -> Result<Order, DomainError> {
        let order = self
            .store
            .get_order(order_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Order", order_id))?;

        if !actor.can_access(order.user_id()) {
            return Err(DomainError::AccessDenied(format!(
                "order {order_id} belongs to another user"
            )));
        }
        Ok(order)
    }

    /// Lists every order for administrators, the actor's own otherwise.
    #[tracing::instrument(skip(self))]
    pub async fn list_orders(&self, actor: &Actor) -> Result<Vec<Order>, DomainError> {
        let owner = (!actor.is_admin()).then_some(actor.user_id);
        Ok(self.store.list_orders(owner).await?)
    }

    /// Moves an order through fulfillment.
    #[tracing::instrument(skip(self))]
    pub async fn update_fulfillment_status(
        &self,
        actor: &Actor,
        cmd: UpdateFulfillment,
    ) -> Result<Order, DomainError> {
        actor.require_admin("update fulfillment")?;
        self.execute(cmd.order_id, |order| {
            order.change_fulfillment(cmd.status, actor.user_id)
        })
        .await
    }

    /// Changes an order's payment label.
    #[tracing::instrument(skip(self))]
    pub async fn update_payment_status(
        &self,
        actor: &Actor,
        cmd: UpdatePayment,
    ) -> Result<Order, DomainError> {
        actor.require_admin("update payment status")?;
        self.execute(cmd.order_id, |order| {
            order.change_payment(cmd.status, actor.user_id)
        })
        .await
    }

    /// Returns the audit log of an order visible to the actor.
    #[tracing::instrument(skip(self))]
    pub async fn order_events(
        &self,
        actor: &Actor,
        order_id: OrderId,
    ) -> Result<Vec<EventRecord>, DomainError> {
        self.get_order(actor, order_id).await?;
        Ok(self.store.events_for(order_id.as_uuid()).await?)
    }

    /// Renders the confirmation summary of an order visible to the actor.
    #[tracing::instrument(skip(self))]
    pub async fn order_summary(
        &self,
        actor: &Actor,
        order_id: OrderId,
    ) -> Result<OrderSummary, DomainError> {
        let order = self.get_order(actor, order_id).await?;
        let recipient = Recipient::from_address(order.shipping_address());
        Ok(OrderSummary::render(&order, &recipient))
    }

    /// Runs a synchronous command against a locked order.
    async fn execute<F>(&self, order_id: OrderId, command: F) -> Result<Order, DomainError>
    where
        F: FnOnce(&Order) -> Result<Vec<OrderEvent>, DomainError> + Send,
    {
        let mut uow = self.store.begin().await?;
        let changed = async {
            let mut order = uow
                .lock_order(order_id)
                .await?
                .ok_or_else(|| DomainError::not_found("Order", order_id))?;

            let events = command(&order)?;
            if !events.is_empty() {
                let records = order.record(events)?;
                uow.update_order(&order).await?;
                uow.append_events(records).await?;
            }
            Ok::<_, DomainError>(order)
        }
        .await;

        match changed {
            Ok(order) => {
                uow.commit().await?;
                Ok(order)
            }
            Err(e) => Err(abort(uow, e).await),
        }
    }
}

/// Merges cart lines for the same item, keeping first-seen order.
fn merge_cart_lines(lines: &[CartLine]) -> Result<Vec<CartLine>, DomainError> {
    let mut merged: Vec<CartLine> = Vec::with_capacity(lines.len());
    for line in lines {
        if line.quantity == 0 {
            return Err(DomainError::Validation(format!(
                "quantity for {} must be at least 1",
                line.item_id
            )));
        }
        match merged.iter_mut().find(|m| m.item_id == line.item_id) {
            Some(existing) => {
                existing.quantity = existing
                    .quantity
                    .checked_add(line.quantity)
                    .ok_or_else(|| DomainError::quantity_too_large(&line.item_id))?;
            }
            None => merged.push(line.clone()),
        }
    }
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CartSnapshot, CatalogItem};
    use crate::order::{ApprovalStatus, FulfillmentStatus, PaymentStatus};
    use crate::store::InMemoryStore;
    use crate::value_objects::{Money, ShippingAddress};
    use common::{ItemId, UserId};

    fn address() -> ShippingAddress {
        ShippingAddress {
            recipient: "Ana Diaz".to_string(),
            line1: "12 Harbour St".to_string(),
            line2: None,
            city: "Lisbon".to_string(),
            postal_code: "1100-001".to_string(),
            country: "PT".to_string(),
            phone: None,
        }
    }

    fn service() -> OrderService<InMemoryStore> {
        OrderService::new(InMemoryStore::with_items([
            CatalogItem::new("SKU-001", "Widget", Money::from_cents(1000), 10),
            CatalogItem::new("SKU-002", "Gadget", Money::from_cents(250), 1),
        ]))
    }

    fn cart(lines: &[(&str, u32)]) -> CartSnapshot {
        lines
            .iter()
            .map(|(id, qty)| CartLine::new(*id, *qty))
            .collect()
    }

    #[tokio::test]
    async fn test_create_order_freezes_catalog_prices() {
        let service = service();
        let customer = Actor::customer(UserId::new());

        let order = service
            .create_order(
                &customer,
                CreateOrder::new(cart(&[("SKU-001", 2), ("SKU-002", 1)]), address()),
            )
            .await
            .unwrap();

        assert_eq!(order.user_id(), customer.user_id);
        assert_eq!(order.lines()[0].item_name, "Widget");
        assert_eq!(order.pricing().subtotal.cents(), 2250);
        assert_eq!(order.total_amount().cents(), 2750);
        assert_eq!(
            service.store().stock_of(&ItemId::new("SKU-001")).await,
            Some(10)
        );
    }

    #[tokio::test]
    async fn test_create_order_merges_duplicate_lines() {
        let service = service();
        let order = service
            .create_order(
                &Actor::customer(UserId::new()),
                CreateOrder::new(cart(&[("SKU-001", 1), ("SKU-001", 2)]), address()),
            )
            .await
            .unwrap();

        assert_eq!(order.lines().len(), 1);
        assert_eq!(order.lines()[0].quantity, 3);
    }

    #[tokio::test]
    async fn test_create_order_rejects_merged_quantity_overflow() {
        let service = service();
        let customer = Actor::customer(UserId::new());

        let result = service
            .create_order(
                &customer,
                CreateOrder::new(cart(&[("SKU-001", u32::MAX), ("SKU-001", 2)]), address()),
            )
            .await;

        assert!(
            matches!(result, Err(DomainError::Validation(ref msg)) if msg == "quantity for SKU-001 is too large")
        );
        assert!(service.list_orders(&customer).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_order_rejects_bad_carts() {
        let service = service();
        let customer = Actor::customer(UserId::new());

        let empty = service
            .create_order(&customer, CreateOrder::new(CartSnapshot::default(), address()))
            .await;
        assert!(matches!(empty, Err(DomainError::Validation(_))));

        let unknown = service
            .create_order(&customer, CreateOrder::new(cart(&[("NOPE", 1)]), address()))
            .await;
        assert!(matches!(unknown, Err(DomainError::InvalidCartState(_))));

        let zero = service
            .create_order(&customer, CreateOrder::new(cart(&[("SKU-001", 0)]), address()))
            .await;
        assert!(matches!(zero, Err(DomainError::Validation(_))));

        assert!(service.list_orders(&customer).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_approval_reserves_and_rejection_does_not() {
        let service = service();
        let customer = Actor::customer(UserId::new());
        let admin = Actor::admin(UserId::new());

        let order = service
            .create_order(&customer, CreateOrder::new(cart(&[("SKU-001", 4)]), address()))
            .await
            .unwrap();

        let rejected = service
            .decide_order(&admin, DecideOrder::reject(order.id()))
            .await
            .unwrap();
        assert_eq!(rejected.approval_status(), ApprovalStatus::Rejected);
        assert_eq!(
            service.store().stock_of(&ItemId::new("SKU-001")).await,
            Some(10)
        );

        let approved = service
            .decide_order(&admin, DecideOrder::approve(order.id()))
            .await
            .unwrap();
        assert_eq!(approved.approval_status(), ApprovalStatus::Approved);
        assert!(approved.stock_reserved());
        assert_eq!(
            service.store().stock_of(&ItemId::new("SKU-001")).await,
            Some(6)
        );
    }

    #[tokio::test]
    async fn test_insufficient_stock_leaves_order_pending() {
        let service = service();
        let customer = Actor::customer(UserId::new());
        let admin = Actor::admin(UserId::new());

        let order = service
            .create_order(
                &customer,
                CreateOrder::new(cart(&[("SKU-001", 1), ("SKU-002", 2)]), address()),
            )
            .await
            .unwrap();

        let result = service
            .decide_order(&admin, DecideOrder::approve(order.id()))
            .await;
        assert!(matches!(
            result,
            Err(DomainError::InsufficientStock { available: 1, requested: 2, .. })
        ));

        let order = service.get_order(&admin, order.id()).await.unwrap();
        assert_eq!(order.approval_status(), ApprovalStatus::Pending);
        assert_eq!(
            service.store().stock_of(&ItemId::new("SKU-001")).await,
            Some(10)
        );
    }

    #[tokio::test]
    async fn test_customers_cannot_decide() {
        let service = service();
        let customer = Actor::customer(UserId::new());
        let order = service
            .create_order(&customer, CreateOrder::new(cart(&[("SKU-001", 1)]), address()))
            .await
            .unwrap();

        let result = service
            .decide_order(&customer, DecideOrder::approve(order.id()))
            .await;
        assert!(matches!(result, Err(DomainError::AccessDenied(_))));

        let missing = service
            .decide_order(&Actor::admin(UserId::new()), DecideOrder::approve(OrderId::new()))
            .await;
        assert!(matches!(missing, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_fulfillment_and_payment_updates() {
        let service = service();
        let customer = Actor::customer(UserId::new());
        let admin = Actor::admin(UserId::new());
        let order = service
            .create_order(&customer, CreateOrder::new(cart(&[("SKU-001", 1)]), address()))
            .await
            .unwrap();

        let order = service
            .update_fulfillment_status(
                &admin,
                UpdateFulfillment {
                    order_id: order.id(),
                    status: FulfillmentStatus::Cancelled,
                },
            )
            .await
            .unwrap();
        assert_eq!(order.fulfillment_status(), FulfillmentStatus::Cancelled);

        let reopen = service
            .update_fulfillment_status(
                &admin,
                UpdateFulfillment {
                    order_id: order.id(),
                    status: FulfillmentStatus::Processing,
                },
            )
            .await;
        assert!(matches!(
            reopen,
            Err(DomainError::InvalidStateTransition { .. })
        ));

        let order = service
            .update_payment_status(
                &admin,
                UpdatePayment {
                    order_id: order.id(),
                    status: PaymentStatus::Failed,
                },
            )
            .await
            .unwrap();
        assert_eq!(order.payment_status(), PaymentStatus::Failed);

        let denied = service
            .update_payment_status(
                &customer,
                UpdatePayment {
                    order_id: order.id(),
                    status: PaymentStatus::Completed,
                },
            )
            .await;
        assert!(matches!(denied, Err(DomainError::AccessDenied(_))));
    }

    #[tokio::test]
    async fn test_list_orders_scoped_to_actor() {
        let service = service();
        let alice = Actor::customer(UserId::new());
        let bob = Actor::customer(UserId::new());

        for actor in [&alice, &bob, &alice] {
            service
                .create_order(actor, CreateOrder::new(cart(&[("SKU-001", 1)]), address()))
                .await
                .unwrap();
        }

        assert_eq!(service.list_orders(&alice).await.unwrap().len(), 2);
        assert_eq!(service.list_orders(&bob).await.unwrap().len(), 1);
        assert_eq!(
            service
                .list_orders(&Actor::admin(UserId::new()))
                .await
                .unwrap()
                .len(),
            3
        );
    }

    #[tokio::test]
    async fn test_events_and_summary_follow_access_rules() {
        let service = service();
        let customer = Actor::customer(UserId::new());
        let admin = Actor::admin(UserId::new());
        let order = service
            .create_order(&customer, CreateOrder::new(cart(&[("SKU-001", 1)]), address()))
            .await
            .unwrap();
        service
            .decide_order(&admin, DecideOrder::approve(order.id()))
            .await
            .unwrap();

        let events = service.order_events(&customer, order.id()).await.unwrap();
        let types: Vec<_> = events.iter().map(|e| e.event_type.as_str()).collect();
        assert_eq!(types, ["OrderPlaced", "ApprovalDecided"]);
        assert_eq!(events[1].version, 2);

        let summary = service.order_summary(&customer, order.id()).await.unwrap();
        assert_eq!(summary.recipient_name, "Ana Diaz");

        let stranger = Actor::customer(UserId::new());
        assert!(matches!(
            service.order_summary(&stranger, order.id()).await,
            Err(DomainError::AccessDenied(_))
        ));
    }
}
