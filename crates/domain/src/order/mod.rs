//! Order aggregate and related types.

mod aggregate;
mod commands;
mod events;
mod line;
mod service;
mod state;

pub use aggregate::Order;
pub use commands::*;
pub use events::{
    ApprovalDecidedData, FulfillmentChangedData, OrderEvent, OrderPlacedData, PaymentChangedData,
};
pub use line::OrderLine;
pub use service::OrderService;
pub use state::{ApprovalDecision, ApprovalStatus, FulfillmentStatus, PaymentStatus};
