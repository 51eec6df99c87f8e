//! PostgreSQL implementation of the domain store port.
//!
//! Orders and requests are stored as JSONB documents next to the columns
//! used for locking, filtering and constraints. Catalog stock is a plain
//! column guarded by `CHECK (stock >= 0)`.

mod postgres;

pub use postgres::{PostgresStore, PostgresUnitOfWork};
