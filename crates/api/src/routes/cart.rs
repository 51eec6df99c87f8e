//! Cart endpoints.
//!
//! Carts live in memory beside the core; checkout reads them through the
//! `CartProvider` port.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use domain::{CartLine, CartProvider, CartSnapshot, Store};
use serde::Deserialize;

use crate::AppState;
use crate::error::ApiError;
use crate::identity::Caller;

#[derive(Deserialize)]
pub struct AddItemRequest {
    pub item_id: String,
    pub quantity: u32,
}

/// GET /cart: the caller's current cart.
#[tracing::instrument(skip(state))]
pub async fn get<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Caller(actor): Caller,
) -> Result<Json<CartSnapshot>, ApiError> {
    Ok(Json(state.carts.snapshot(actor.user_id).await?))
}

/// POST /cart/items: add an item to the caller's cart.
#[tracing::instrument(skip(state, req))]
pub async fn add_item<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Caller(actor): Caller,
    Json(req): Json<AddItemRequest>,
) -> Result<Json<CartSnapshot>, ApiError> {
    if req.item_id.trim().is_empty() {
        return Err(ApiError::BadRequest("item_id is required".to_string()));
    }
    let snapshot = state
        .carts
        .add_item(actor.user_id, CartLine::new(req.item_id.trim(), req.quantity))
        .await?;
    Ok(Json(snapshot))
}

/// DELETE /cart: empty the caller's cart.
#[tracing::instrument(skip(state))]
pub async fn clear<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Caller(actor): Caller,
) -> Result<StatusCode, ApiError> {
    state.carts.clear(actor.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
