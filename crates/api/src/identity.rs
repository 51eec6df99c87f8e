//! Caller identity taken from request headers.
//!
//! Authentication happens upstream; the gateway forwards the resolved user
//! in `x-user-id` and their role in `x-user-role`.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use common::UserId;
use domain::{Actor, Role};

use crate::error::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// The authenticated caller of a request.
#[derive(Debug, Clone, Copy)]
pub struct Caller(pub Actor);

impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| ApiError::Unauthorized(format!("missing {USER_ID_HEADER} header")))?
            .to_str()
            .ok()
            .and_then(|value| value.trim().parse::<UserId>().ok())
            .ok_or_else(|| ApiError::Unauthorized(format!("invalid {USER_ID_HEADER} header")))?;

        let role = match parts.headers.get(USER_ROLE_HEADER) {
            None => Role::Customer,
            Some(value) => match value.to_str().map(str::trim) {
                Ok(r) if r.eq_ignore_ascii_case("admin") => Role::Admin,
                Ok(r) if r.eq_ignore_ascii_case("customer") => Role::Customer,
                _ => {
                    return Err(ApiError::BadRequest(format!(
                        "invalid {USER_ROLE_HEADER} header"
                    )));
                }
            },
        };

        Ok(Caller(Actor { user_id, role }))
    }
}
