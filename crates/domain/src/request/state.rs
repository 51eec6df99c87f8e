//! Request status and kind.

use serde::{Deserialize, Serialize};

/// Lifecycle of a request.
///
/// ```text
/// Pending ──┬──► Approved ──┐
///           ├──► Rejected ──┼──► Deleted
///           └───────────────┘
/// ```
///
/// Approved and Rejected may be overwritten by a later decision. Deleted is
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    Deleted,
}

impl RequestStatus {
    /// Returns true unless the request was soft-deleted.
    pub fn is_active(&self) -> bool {
        !matches!(self, RequestStatus::Deleted)
    }

    pub fn can_decide(&self) -> bool {
        self.is_active()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
            RequestStatus::Deleted => "deleted",
        }
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What the customer asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestKind {
    Replacement,
    Refund,
}

impl RequestKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestKind::Replacement => "replacement",
            RequestKind::Refund => "refund",
        }
    }
}

impl std::fmt::Display for RequestKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The decision an administrator can take on a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestDecision {
    Approved,
    Rejected,
}

impl RequestDecision {
    pub fn status(&self) -> RequestStatus {
        match self {
            RequestDecision::Approved => RequestStatus::Approved,
            RequestDecision::Rejected => RequestStatus::Rejected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_deleted_is_inactive() {
        assert!(RequestStatus::Pending.is_active());
        assert!(RequestStatus::Approved.is_active());
        assert!(RequestStatus::Rejected.is_active());
        assert!(!RequestStatus::Deleted.is_active());
        assert!(!RequestStatus::Deleted.can_decide());
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(
            serde_json::to_string(&RequestKind::Replacement).unwrap(),
            "\"replacement\""
        );
        let decision: RequestDecision = serde_json::from_str("\"rejected\"").unwrap();
        assert_eq!(decision.status(), RequestStatus::Rejected);
    }
}
