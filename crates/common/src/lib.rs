//! Shared identifier types for the order fulfillment system.

mod types;

pub use types::{ItemId, OrderId, RequestId, UserId};
