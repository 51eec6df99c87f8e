//! Domain layer of the order and inventory engine.
//!
//! This crate provides:
//! - Order and Request aggregates, whose state changes are domain events
//! - The all-or-nothing inventory reservation protocol run on approval
//! - Pricing (shipping fee and discount codes) applied once at order creation
//! - Store, cart and notifier ports with in-memory adapters
//! - `OrderService` and `RequestService`, the entry points callers use

pub mod aggregate;
pub mod cart;
pub mod catalog;
pub mod error;
pub mod inventory;
pub mod notifier;
pub mod order;
pub mod pricing;
pub mod request;
pub mod store;
pub mod value_objects;

pub use aggregate::{Aggregate, DomainEvent};
pub use cart::{CartProvider, InMemoryCart};
pub use catalog::{CartLine, CartSnapshot, CatalogItem};
pub use error::DomainError;
pub use inventory::{ReservationLine, StockChange, plan_reservation, reserve};
pub use notifier::{LogNotifier, Notifier, OrderSummary, Recipient, RecordingNotifier};
pub use order::{
    ApprovalDecision, ApprovalStatus, Checkout, CreateOrder, DecideOrder, FulfillmentStatus,
    Order, OrderEvent, OrderLine, OrderService, PaymentStatus, UpdateFulfillment, UpdatePayment,
};
pub use pricing::{PriceBreakdown, PricingConfig};
pub use request::{
    CreateRequest, DecideRequest, Request, RequestDecision, RequestEvent, RequestKind,
    RequestService, RequestStatus,
};
pub use store::{EventRecord, InMemoryStore, Store, StoreError, StoreResult, UnitOfWork};
pub use value_objects::{Actor, Money, Role, ShippingAddress};
