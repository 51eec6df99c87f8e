//! Catalog maintenance endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::ItemId;
use domain::{CatalogItem, DomainError, Money, Store};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::ApiError;
use crate::identity::Caller;

#[derive(Deserialize)]
pub struct UpsertItemRequest {
    pub id: String,
    pub name: String,
    pub unit_price_cents: i64,
    pub stock: i64,
}

#[derive(Serialize)]
pub struct ItemResponse {
    pub id: String,
    pub name: String,
    pub unit_price_cents: i64,
    pub stock: i64,
}

impl From<CatalogItem> for ItemResponse {
    fn from(item: CatalogItem) -> Self {
        Self {
            id: item.id.to_string(),
            name: item.name,
            unit_price_cents: item.unit_price.cents(),
            stock: item.stock,
        }
    }
}

/// POST /catalog/items: create or replace a catalog item (admin only).
#[tracing::instrument(skip(state, req))]
pub async fn upsert<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Caller(actor): Caller,
    Json(req): Json<UpsertItemRequest>,
) -> Result<(StatusCode, Json<ItemResponse>), ApiError> {
    actor.require_admin("maintain the catalog")?;

    if req.id.trim().is_empty() || req.name.trim().is_empty() {
        return Err(ApiError::BadRequest("item id and name are required".to_string()));
    }
    if req.unit_price_cents < 0 || req.stock < 0 {
        return Err(ApiError::BadRequest(
            "price and stock must not be negative".to_string(),
        ));
    }

    let item = CatalogItem::new(
        req.id.trim(),
        req.name,
        Money::from_cents(req.unit_price_cents),
        req.stock,
    );
    state
        .store()
        .upsert_item(item.clone())
        .await
        .map_err(DomainError::from)?;

    tracing::info!(item_id = %item.id, stock = item.stock, "catalog item saved");
    Ok((StatusCode::CREATED, Json(item.into())))
}

/// GET /catalog/items/:id: read a catalog item and its current stock.
#[tracing::instrument(skip(state))]
pub async fn get<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<ItemResponse>, ApiError> {
    let item_id = ItemId::new(id);
    let item = state
        .store()
        .get_item(&item_id)
        .await
        .map_err(DomainError::from)?
        .ok_or_else(|| DomainError::not_found("Item", &item_id))?;

    Ok(Json(item.into()))
}
