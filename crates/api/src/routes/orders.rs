//! Order endpoints: checkout, reads and administrative status changes.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::OrderId;
use domain::{
    Aggregate, ApprovalDecision, ApprovalStatus, Checkout, DecideOrder, EventRecord,
    FulfillmentStatus, Order, OrderSummary, PaymentStatus, Recipient, ShippingAddress, Store,
    UpdateFulfillment, UpdatePayment,
};
use serde::{Deserialize, Serialize};

use super::parse_id;
use crate::AppState;
use crate::error::ApiError;
use crate::identity::Caller;

// -- Request types --

#[derive(Deserialize)]
pub struct DecisionRequest {
    pub decision: ApprovalDecision,
}

#[derive(Deserialize)]
pub struct FulfillmentRequest {
    pub status: FulfillmentStatus,
}

#[derive(Deserialize)]
pub struct PaymentRequest {
    pub status: PaymentStatus,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub user_id: String,
    pub approval_status: ApprovalStatus,
    pub fulfillment_status: FulfillmentStatus,
    pub payment_status: PaymentStatus,
    pub stock_reserved: bool,
    pub items: Vec<OrderItemResponse>,
    pub subtotal_cents: i64,
    pub shipping_fee_cents: i64,
    pub discount_cents: i64,
    pub discount_code: Option<String>,
    pub total_cents: i64,
    pub shipping_address: ShippingAddress,
    pub payment_method: Option<String>,
    pub version: u64,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Serialize)]
pub struct OrderItemResponse {
    pub item_id: String,
    pub item_name: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
}

impl From<&Order> for OrderResponse {
    fn from(order: &Order) -> Self {
        let pricing = order.pricing();
        Self {
            id: order.id().to_string(),
            user_id: order.user_id().to_string(),
            approval_status: order.approval_status(),
            fulfillment_status: order.fulfillment_status(),
            payment_status: order.payment_status(),
            stock_reserved: order.stock_reserved(),
            items: order
                .lines()
                .iter()
                .map(|line| OrderItemResponse {
                    item_id: line.item_id.to_string(),
                    item_name: line.item_name.clone(),
                    quantity: line.quantity,
                    unit_price_cents: line.unit_price.cents(),
                })
                .collect(),
            subtotal_cents: pricing.subtotal.cents(),
            shipping_fee_cents: pricing.shipping_fee.cents(),
            discount_cents: pricing.discount.cents(),
            discount_code: pricing.discount_code.clone(),
            total_cents: pricing.total.cents(),
            shipping_address: order.shipping_address().clone(),
            payment_method: order.payment_method().map(str::to_string),
            version: order.version(),
            created_at: order.created_at().to_rfc3339(),
            updated_at: order.updated_at().to_rfc3339(),
        }
    }
}

#[derive(Serialize)]
pub struct SummaryResponse {
    #[serde(flatten)]
    pub summary: OrderSummary,
    pub text: String,
}

// -- Handlers --

/// POST /orders: turn the caller's cart into a pending order.
///
/// The confirmation summary goes out through the notifier once the order
/// exists; a failed delivery does not fail the checkout.
#[tracing::instrument(skip(state, cmd))]
pub async fn checkout<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Caller(actor): Caller,
    Json(cmd): Json<Checkout>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let order = state.orders.checkout(&state.carts, &actor, cmd).await?;

    let recipient = Recipient::from_address(order.shipping_address());
    let summary = OrderSummary::render(&order, &recipient);
    if let Err(e) = state.notifier.deliver(&summary).await {
        tracing::warn!(order_id = %order.id(), error = %e, "failed to deliver order summary");
    }

    Ok((StatusCode::CREATED, Json(OrderResponse::from(&order))))
}

/// GET /orders: every order for administrators, the caller's own otherwise.
#[tracing::instrument(skip(state))]
pub async fn list<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Caller(actor): Caller,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let orders = state.orders.list_orders(&actor).await?;
    Ok(Json(orders.iter().map(OrderResponse::from).collect()))
}

/// GET /orders/:id: load one order.
#[tracing::instrument(skip(state))]
pub async fn get<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Caller(actor): Caller,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id: OrderId = parse_id(&id)?;
    let order = state.orders.get_order(&actor, order_id).await?;
    Ok(Json(OrderResponse::from(&order)))
}

/// GET /orders/:id/summary: the confirmation summary, structured and as text.
#[tracing::instrument(skip(state))]
pub async fn summary<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Caller(actor): Caller,
    Path(id): Path<String>,
) -> Result<Json<SummaryResponse>, ApiError> {
    let order_id: OrderId = parse_id(&id)?;
    let summary = state.orders.order_summary(&actor, order_id).await?;
    let text = summary.to_string();
    Ok(Json(SummaryResponse { summary, text }))
}

/// GET /orders/:id/events: the order's audit log, oldest first.
#[tracing::instrument(skip(state))]
pub async fn events<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Caller(actor): Caller,
    Path(id): Path<String>,
) -> Result<Json<Vec<EventRecord>>, ApiError> {
    let order_id: OrderId = parse_id(&id)?;
    Ok(Json(state.orders.order_events(&actor, order_id).await?))
}

/// POST /orders/:id/decision: approve or reject an order (admin only).
#[tracing::instrument(skip(state, req))]
pub async fn decide<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Caller(actor): Caller,
    Path(id): Path<String>,
    Json(req): Json<DecisionRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id: OrderId = parse_id(&id)?;
    let cmd = DecideOrder {
        order_id,
        decision: req.decision,
    };
    let order = state.orders.decide_order(&actor, cmd).await?;
    Ok(Json(OrderResponse::from(&order)))
}

/// POST /orders/:id/fulfillment: move an order through fulfillment (admin only).
#[tracing::instrument(skip(state, req))]
pub async fn update_fulfillment<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Caller(actor): Caller,
    Path(id): Path<String>,
    Json(req): Json<FulfillmentRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id: OrderId = parse_id(&id)?;
    let order = state
        .orders
        .update_fulfillment_status(
            &actor,
            UpdateFulfillment {
                order_id,
                status: req.status,
            },
        )
        .await?;
    Ok(Json(OrderResponse::from(&order)))
}

/// POST /orders/:id/payment: change an order's payment label (admin only).
#[tracing::instrument(skip(state, req))]
pub async fn update_payment<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Caller(actor): Caller,
    Path(id): Path<String>,
    Json(req): Json<PaymentRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id: OrderId = parse_id(&id)?;
    let order = state
        .orders
        .update_payment_status(
            &actor,
            UpdatePayment {
                order_id,
                status: req.status,
            },
        )
        .await?;
    Ok(Json(OrderResponse::from(&order)))
}
