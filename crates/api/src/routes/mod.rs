//! Route handlers.

pub mod cart;
pub mod catalog;
pub mod health;
pub mod metrics;
pub mod orders;
pub mod requests;

use std::str::FromStr;

use crate::error::ApiError;

/// Parses a path identifier, answering 400 when it is not a UUID.
pub(crate) fn parse_id<T>(id: &str) -> Result<T, ApiError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    id.parse()
        .map_err(|e| ApiError::BadRequest(format!("Invalid ID format: {e}")))
}
