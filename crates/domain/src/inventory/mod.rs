//! Inventory reservation protocol.
//!
//! Approving an order reserves stock for every line or for none of them.
//! The protocol runs inside a caller-owned [`UnitOfWork`](crate::store::UnitOfWork)
//! so the decrements commit or roll back together with the order status.

mod reservation;

pub use reservation::{
    PlannedDecrement, ReservationLine, StockChange, merge_lines, plan_reservation, reserve,
};
