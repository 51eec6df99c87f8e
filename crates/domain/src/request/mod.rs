//! Post-sale replacement and refund requests.

mod aggregate;
mod commands;
mod events;
mod service;
mod state;

pub use aggregate::Request;
pub use commands::{CreateRequest, DecideRequest};
pub use events::{RequestDecidedData, RequestDeletedData, RequestEvent, RequestOpenedData};
pub use service::RequestService;
pub use state::{RequestDecision, RequestKind, RequestStatus};
