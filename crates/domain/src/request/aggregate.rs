//! Request aggregate implementation.

use chrono::{DateTime, Utc};
use common::{OrderId, RequestId, UserId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::aggregate::Aggregate;
use crate::error::DomainError;

use super::{
    RequestDecision, RequestEvent, RequestKind, RequestStatus, events::RequestOpenedData,
};

/// Request aggregate root.
///
/// A replacement or refund ticket tied to exactly one order. Requests are
/// soft-deleted, never removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    id: RequestId,
    order_id: OrderId,
    user_id: UserId,
    kind: RequestKind,
    reason: String,
    attachments: Vec<String>,
    status: RequestStatus,
    admin_response: Option<String>,

    /// Mirrors `status == Deleted`.
    deleted: bool,
    version: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Aggregate for Request {
    type Event = RequestEvent;

    fn aggregate_type() -> &'static str {
        "Request"
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
            RequestEvent::RequestOpened(_) => {}
            RequestEvent::RequestDecided(data) => {
                self.status = data.to;
                self.admin_response = data.admin_response;
            }
            RequestEvent::RequestDeleted(_) => {
                self.status = RequestStatus::Deleted;
                self.deleted = true;
            }
        }
    }
}

// Query methods
impl Request {
    pub fn id(&self) -> RequestId {
        self.id
    }

    pub fn order_id(&self) -> OrderId {
        self.order_id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn kind(&self) -> RequestKind {
        self.kind
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn attachments(&self) -> &[String] {
        &self.attachments
    }

    pub fn status(&self) -> RequestStatus {
        self.status
    }

    pub fn admin_response(&self) -> Option<&str> {
        self.admin_response.as_deref()
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    /// Returns true unless the request was soft-deleted.
    pub fn is_active(&self) -> bool {
        !self.deleted
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

// Command methods (return events)
impl Request {
    /// Opens a new request for an order.
    pub fn open(
        request_id: RequestId,
        order_id: OrderId,
        user_id: UserId,
        kind: RequestKind,
        reason: &str,
        attachments: Vec<String>,
    ) -> Result<Vec<RequestEvent>, DomainError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(DomainError::Validation(
                "a request needs a reason".to_string(),
            ));
        }

        let attachments = attachments
            .into_iter()
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .collect();

        Ok(vec![RequestEvent::RequestOpened(RequestOpenedData {
            request_id,
            order_id,
            user_id,
            kind,
            reason: reason.to_string(),
            attachments,
            opened_at: Utc::now(),
        })])
    }

    /// Records an administrator decision and optional response.
    pub fn decide(
        &self,
        decision: RequestDecision,
        admin_response: Option<String>,
        decided_by: UserId,
    ) -> Result<Vec<RequestEvent>, DomainError> {
        if !self.status.can_decide() {
            return Err(DomainError::InvalidStateTransition {
                entity: "request",
                from: self.status.to_string(),
                action: "decide",
            });
        }

        let admin_response = admin_response
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());

        Ok(vec![RequestEvent::request_decided(
            self.status,
            decision.status(),
            admin_response,
            decided_by,
        )])
    }

    /// Soft-deletes the request. Deleting twice yields no events.
    pub fn soft_delete(&self, deleted_by: UserId) -> Result<Vec<RequestEvent>, DomainError> {
        if self.deleted {
            return Ok(vec![]);
        }
        Ok(vec![RequestEvent::request_deleted(self.status, deleted_by)])
    }
}

// Reconstruction
impl Request {
    /// Rebuilds a request from its event history.
    ///
    /// Returns None unless the first event is `RequestOpened`.
    pub fn from_history(events: impl IntoIterator<Item = RequestEvent>) -> Option<Request> {
        let mut events = events.into_iter();
        let mut request = match events.next()? {
            RequestEvent::RequestOpened(data) => Request::from_opened(data),
            _ => return None,
        };
        request.apply_events(events);
        Some(request)
    }

    fn from_opened(data: RequestOpenedData) -> Request {
        Request {
            id: data.request_id,
            order_id: data.order_id,
            user_id: data.user_id,
            kind: data.kind,
            reason: data.reason,
            attachments: data.attachments,
            status: RequestStatus::Pending,
            admin_response: None,
            deleted: false,
            version: 1,
            created_at: data.opened_at,
            updated_at: data.opened_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_request() -> Request {
        let events = Request::open(
            RequestId::new(),
            OrderId::new(),
            UserId::new(),
            RequestKind::Refund,
            "  arrived broken ",
            vec!["uploads/photo-1.jpg".to_string(), " ".to_string()],
        )
        .unwrap();
        Request::from_history(events).unwrap()
    }

    #[test]
    fn test_open_request() {
        let request = open_request();
        assert_eq!(request.status(), RequestStatus::Pending);
        assert_eq!(request.reason(), "arrived broken");
        assert_eq!(request.attachments(), ["uploads/photo-1.jpg".to_string()]);
        assert!(request.is_active());
        assert_eq!(request.version(), 1);
    }

    #[test]
    fn test_open_without_reason_fails() {
        let result = Request::open(
            RequestId::new(),
            OrderId::new(),
            UserId::new(),
            RequestKind::Replacement,
            "   ",
            vec![],
        );
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_decide_sets_status_and_response() {
        let mut request = open_request();
        let admin = UserId::new();
        request.apply_events(
            request
                .decide(
                    RequestDecision::Approved,
                    Some("refund issued".to_string()),
                    admin,
                )
                .unwrap(),
        );
        assert_eq!(request.status(), RequestStatus::Approved);
        assert_eq!(request.admin_response(), Some("refund issued"));

        request.apply_events(
            request
                .decide(RequestDecision::Rejected, None, admin)
                .unwrap(),
        );
        assert_eq!(request.status(), RequestStatus::Rejected);
        assert_eq!(request.admin_response(), None);
    }

    #[test]
    fn test_soft_delete_is_terminal_and_idempotent() {
        let mut request = open_request();
        let admin = UserId::new();
        request.apply_events(request.soft_delete(admin).unwrap());

        assert_eq!(request.status(), RequestStatus::Deleted);
        assert!(request.is_deleted());
        assert!(!request.is_active());
        assert!(request.soft_delete(admin).unwrap().is_empty());

        let result = request.decide(RequestDecision::Approved, None, admin);
        assert!(matches!(
            result,
            Err(DomainError::InvalidStateTransition { .. })
        ));
    }

    #[test]
    fn test_from_history_requires_opened_first() {
        let event = RequestEvent::request_deleted(RequestStatus::Pending, UserId::new());
        assert!(Request::from_history(vec![event]).is_none());
    }
}
