//! Request commands.

use common::{OrderId, RequestId};
use serde::Deserialize;

use super::{RequestDecision, RequestKind};

/// Command to open a request for an order.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateRequest {
    pub order_id: OrderId,
    pub kind: RequestKind,
    pub reason: String,
    #[serde(default)]
    pub attachments: Vec<String>,
}

impl CreateRequest {
    pub fn new(order_id: OrderId, kind: RequestKind, reason: impl Into<String>) -> Self {
        Self {
            order_id,
            kind,
            reason: reason.into(),
            attachments: Vec::new(),
        }
    }

    pub fn with_attachment(mut self, reference: impl Into<String>) -> Self {
        self.attachments.push(reference.into());
        self
    }
}

/// Command to approve or reject a request.
#[derive(Debug, Clone)]
pub struct DecideRequest {
    pub request_id: RequestId,
    pub decision: RequestDecision,
    pub admin_response: Option<String>,
}

impl DecideRequest {
    pub fn new(request_id: RequestId, decision: RequestDecision) -> Self {
        Self {
            request_id,
            decision,
            admin_response: None,
        }
    }

    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        self.admin_response = Some(response.into());
        self
    }
}
