//! Request domain events.

use chrono::{DateTime, Utc};
use common::{OrderId, RequestId, UserId};
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;

use super::{RequestKind, RequestStatus};

/// Events that can occur on a request aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum RequestEvent {
    /// Customer opened a request for one of their orders.
    RequestOpened(RequestOpenedData),

    /// An administrator approved or rejected the request.
    RequestDecided(RequestDecidedData),

    /// An administrator soft-deleted the request.
    RequestDeleted(RequestDeletedData),
}

impl DomainEvent for RequestEvent {
    fn event_type(&self) -> &'static str {
        match self {
            RequestEvent::RequestOpened(_) => "RequestOpened",
            RequestEvent::RequestDecided(_) => "RequestDecided",
            RequestEvent::RequestDeleted(_) => "RequestDeleted",
        }
    }
}

/// Data for RequestOpened event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestOpenedData {
    pub request_id: RequestId,
    pub order_id: OrderId,
    pub user_id: UserId,
    pub kind: RequestKind,
    pub reason: String,
    #[serde(default)]
    pub attachments: Vec<String>,
    pub opened_at: DateTime<Utc>,
}

/// Data for RequestDecided event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestDecidedData {
    pub from: RequestStatus,
    pub to: RequestStatus,
    pub admin_response: Option<String>,
    pub decided_by: UserId,
    pub decided_at: DateTime<Utc>,
}

/// Data for RequestDeleted event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestDeletedData {
    pub from: RequestStatus,
    pub deleted_by: UserId,
    pub deleted_at: DateTime<Utc>,
}

impl RequestEvent {
    pub fn request_decided(
        from: RequestStatus,
        to: RequestStatus,
        admin_response: Option<String>,
        decided_by: UserId,
    ) -> Self {
        RequestEvent::RequestDecided(RequestDecidedData {
            from,
            to,
            admin_response,
            decided_by,
            decided_at: Utc::now(),
        })
    }

    pub fn request_deleted(from: RequestStatus, deleted_by: UserId) -> Self {
        RequestEvent::RequestDeleted(RequestDeletedData {
            from,
            deleted_by,
            deleted_at: Utc::now(),
        })
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            RequestEvent::RequestOpened(data) => data.opened_at,
            RequestEvent::RequestDecided(data) => data.decided_at,
            RequestEvent::RequestDeleted(data) => data.deleted_at,
        }
    }
}
