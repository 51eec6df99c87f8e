//! Request service.

use common::RequestId;

use crate::aggregate::{Aggregate, event_records};
use crate::error::DomainError;
use crate::store::{Store, StoreError, UnitOfWork, abort};
use crate::value_objects::Actor;

use super::{CreateRequest, DecideRequest, Request, RequestEvent};

/// Service for managing replacement and refund requests.
pub struct RequestService<S: Store> {
    store: S,
}

impl<S: Store> RequestService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Opens a request for one of the actor's orders.
    ///
    /// The order row is locked while checking for an active request, so two
    /// concurrent attempts for the same order cannot both succeed.
    #[tracing::instrument(skip(self))]
    pub async fn create_request(
        &self,
        actor: &Actor,
        cmd: CreateRequest,
    ) -> Result<Request, DomainError> {
        let mut uow = self.store.begin().await?;
        let created = async {
            let order = uow
                .lock_order(cmd.order_id)
                .await?
                .filter(|order| order.user_id() == actor.user_id)
                .ok_or_else(|| DomainError::not_found("Order", cmd.order_id))?;

            let request_id = RequestId::new();
            let events = Request::open(
                request_id,
                order.id(),
                actor.user_id,
                cmd.kind,
                &cmd.reason,
                cmd.attachments.clone(),
            )?;

            if uow.active_request_for_order(order.id()).await?.is_some() {
                return Err(DomainError::DuplicateRequest {
                    order_id: order.id(),
                });
            }

            let records =
                event_records(Request::aggregate_type(), request_id.as_uuid(), 0, &events)?;
            let request = Request::from_history(events).ok_or_else(|| {
                DomainError::InternalConsistency(format!(
                    "request {request_id} has no opening event"
                ))
            })?;

            match uow.insert_request(&request).await {
                Err(StoreError::Conflict(_)) => {
                    return Err(DomainError::DuplicateRequest {
                        order_id: order.id(),
                    });
                }
                other => other?,
            }
            uow.append_events(records).await?;
            Ok::<_, DomainError>(request)
        }
        .await;

        let request = match created {
            Ok(request) => request,
            Err(e) => {
                if matches!(e, DomainError::DuplicateRequest { .. }) {
                    metrics::counter!("requests_rejected_duplicate_total").increment(1);
                }
                return Err(abort(uow, e).await);
            }
        };
        uow.commit().await?;

        metrics::counter!("requests_created_total").increment(1);
        tracing::info!(
            request_id = %request.id(),
            order_id = %request.order_id(),
            kind = %request.kind(),
            "request created"
        );
        Ok(request)
    }

    /// Approves or rejects a request.
    #[tracing::instrument(skip(self))]
    pub async fn decide_request(
        &self,
        actor: &Actor,
        cmd: DecideRequest,
    ) -> Result<Request, DomainError> {
        actor.require_admin("decide requests")?;
        let DecideRequest {
            request_id,
            decision,
            admin_response,
        } = cmd;

        let request = self
            .execute(request_id, |request| {
                request.decide(decision, admin_response, actor.user_id)
            })
            .await?;

        tracing::info!(%request_id, status = %request.status(), "request decided");
        Ok(request)
    }

    /// Soft-deletes a request, freeing its order for a new one.
    #[tracing::instrument(skip(self))]
    pub async fn soft_delete_request(
        &self,
        actor: &Actor,
        request_id: RequestId,
    ) -> Result<Request, DomainError> {
        actor.require_admin("delete requests")?;
        let request = self
            .execute(request_id, |request| request.soft_delete(actor.user_id))
            .await?;

        tracing::info!(%request_id, order_id = %request.order_id(), "request deleted");
        Ok(request)
    }

    /// Loads a request visible to the actor.
    #[tracing::instrument(skip(self))]
    pub async fn get_request(
        &self,
        actor: &Actor,
        request_id: RequestId,
    ) -> Result<Request, DomainError> {
        let request = self
            .store
            .get_request(request_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Request", request_id))?;

        if !actor.can_access(request.user_id()) {
            return Err(DomainError::AccessDenied(format!(
                "request {request_id} belongs to another user"
            )));
        }
        Ok(request)
    }

    /// Lists non-deleted requests: all of them for administrators, the
    /// actor's own otherwise.
    #[tracing::instrument(skip(self))]
    pub async fn list_requests(&self, actor: &Actor) -> Result<Vec<Request>, DomainError> {
        let owner = (!actor.is_admin()).then_some(actor.user_id);
        Ok(self.store.list_requests(owner).await?)
    }

    async fn execute<F>(&self, request_id: RequestId, command: F) -> Result<Request, DomainError>
    where
        F: FnOnce(&Request) -> Result<Vec<RequestEvent>, DomainError> + Send,
    {
        let mut uow = self.store.begin().await?;
        let changed = async {
            let mut request = uow
                .lock_request(request_id)
                .await?
                .ok_or_else(|| DomainError::not_found("Request", request_id))?;

            let events = command(&request)?;
            if !events.is_empty() {
                let records = request.record(events)?;
                uow.update_request(&request).await?;
                uow.append_events(records).await?;
            }
            Ok::<_, DomainError>(request)
        }
        .await;

        match changed {
            Ok(request) => {
                uow.commit().await?;
                Ok(request)
            }
            Err(e) => Err(abort(uow, e).await),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CartLine, CartSnapshot, CatalogItem};
    use crate::order::{CreateOrder, OrderService};
    use crate::request::{RequestDecision, RequestKind, RequestStatus};
    use crate::store::InMemoryStore;
    use crate::value_objects::{Money, ShippingAddress};
    use common::{OrderId, UserId};

    struct Fixture {
        requests: RequestService<InMemoryStore>,
        customer: Actor,
        admin: Actor,
        order_id: OrderId,
    }

    async fn fixture() -> Fixture {
        let store = InMemoryStore::with_items([CatalogItem::new(
            "SKU-001",
            "Widget",
            Money::from_cents(1000),
            5,
        )]);
        let orders = OrderService::new(store.clone());
        let customer = Actor::customer(UserId::new());
        let address = ShippingAddress {
            recipient: "Ana Diaz".to_string(),
            line1: "12 Harbour St".to_string(),
            line2: None,
            city: "Lisbon".to_string(),
            postal_code: "1100-001".to_string(),
            country: "PT".to_string(),
            phone: None,
        };
        let order = orders
            .create_order(
                &customer,
                CreateOrder::new(CartSnapshot::new(vec![CartLine::new("SKU-001", 1)]), address),
            )
            .await
            .unwrap();

        Fixture {
            requests: RequestService::new(store),
            customer,
            admin: Actor::admin(UserId::new()),
            order_id: order.id(),
        }
    }

    #[tokio::test]
    async fn test_second_active_request_is_rejected() {
        let f = fixture().await;
        f.requests
            .create_request(
                &f.customer,
                CreateRequest::new(f.order_id, RequestKind::Replacement, "cracked screen"),
            )
            .await
            .unwrap();

        let second = f
            .requests
            .create_request(
                &f.customer,
                CreateRequest::new(f.order_id, RequestKind::Refund, "changed my mind"),
            )
            .await;
        let err = second.unwrap_err();
        assert!(matches!(err, DomainError::DuplicateRequest { .. }));
        assert!(err.to_string().contains("wait for it to be processed or deleted"));
    }

    #[tokio::test]
    async fn test_soft_delete_frees_the_order() {
        let f = fixture().await;
        let first = f
            .requests
            .create_request(
                &f.customer,
                CreateRequest::new(f.order_id, RequestKind::Refund, "late delivery"),
            )
            .await
            .unwrap();

        let deleted = f
            .requests
            .soft_delete_request(&f.admin, first.id())
            .await
            .unwrap();
        assert_eq!(deleted.status(), RequestStatus::Deleted);
        assert!(deleted.is_deleted());

        let again = f
            .requests
            .soft_delete_request(&f.admin, first.id())
            .await
            .unwrap();
        assert_eq!(again.version(), deleted.version());

        f.requests
            .create_request(
                &f.customer,
                CreateRequest::new(f.order_id, RequestKind::Refund, "late delivery"),
            )
            .await
            .unwrap();
        assert_eq!(f.requests.list_requests(&f.admin).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_only_owner_can_open_a_request() {
        let f = fixture().await;
        let stranger = Actor::customer(UserId::new());

        let result = f
            .requests
            .create_request(
                &stranger,
                CreateRequest::new(f.order_id, RequestKind::Refund, "not mine"),
            )
            .await;
        assert!(matches!(result, Err(DomainError::NotFound { .. })));

        let missing = f
            .requests
            .create_request(
                &f.customer,
                CreateRequest::new(OrderId::new(), RequestKind::Refund, "no order"),
            )
            .await;
        assert!(matches!(missing, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_blank_reason_is_rejected() {
        let f = fixture().await;
        let result = f
            .requests
            .create_request(
                &f.customer,
                CreateRequest::new(f.order_id, RequestKind::Refund, "  "),
            )
            .await;
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn test_decide_request_admin_only() {
        let f = fixture().await;
        let request = f
            .requests
            .create_request(
                &f.customer,
                CreateRequest::new(f.order_id, RequestKind::Replacement, "wrong colour")
                    .with_attachment("uploads/box.jpg"),
            )
            .await
            .unwrap();

        let denied = f
            .requests
            .decide_request(
                &f.customer,
                DecideRequest::new(request.id(), RequestDecision::Approved),
            )
            .await;
        assert!(matches!(denied, Err(DomainError::AccessDenied(_))));

        let decided = f
            .requests
            .decide_request(
                &f.admin,
                DecideRequest::new(request.id(), RequestDecision::Approved)
                    .with_response("replacement shipped"),
            )
            .await
            .unwrap();
        assert_eq!(decided.status(), RequestStatus::Approved);
        assert_eq!(decided.admin_response(), Some("replacement shipped"));

        f.requests
            .soft_delete_request(&f.admin, request.id())
            .await
            .unwrap();
        let after_delete = f
            .requests
            .decide_request(
                &f.admin,
                DecideRequest::new(request.id(), RequestDecision::Rejected),
            )
            .await;
        assert!(matches!(
            after_delete,
            Err(DomainError::InvalidStateTransition { .. })
        ));
    }

    #[tokio::test]
    async fn test_get_and_list_follow_ownership() {
        let f = fixture().await;
        let request = f
            .requests
            .create_request(
                &f.customer,
                CreateRequest::new(f.order_id, RequestKind::Refund, "broken"),
            )
            .await
            .unwrap();

        let stranger = Actor::customer(UserId::new());
        assert!(matches!(
            f.requests.get_request(&stranger, request.id()).await,
            Err(DomainError::AccessDenied(_))
        ));
        assert!(f.requests.list_requests(&stranger).await.unwrap().is_empty());
        assert_eq!(f.requests.list_requests(&f.customer).await.unwrap().len(), 1);
        assert_eq!(
            f.requests
                .get_request(&f.admin, request.id())
                .await
                .unwrap()
                .attachments()
                .len(),
            0
        );
    }
}
