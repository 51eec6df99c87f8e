//! Replacement and refund request endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::RequestId;
use domain::{
    CreateRequest, DecideRequest, Request, RequestDecision, RequestKind, RequestStatus, Store,
};
use serde::{Deserialize, Serialize};

use super::parse_id;
use crate::AppState;
use crate::error::ApiError;
use crate::identity::Caller;

#[derive(Deserialize)]
pub struct DecideRequestBody {
    pub status: RequestDecision,
    #[serde(default)]
    pub admin_response: Option<String>,
}

#[derive(Serialize)]
pub struct RequestResponse {
    pub id: String,
    pub order_id: String,
    pub user_id: String,
    pub kind: RequestKind,
    pub reason: String,
    pub attachments: Vec<String>,
    pub status: RequestStatus,
    pub admin_response: Option<String>,
    pub deleted: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Request> for RequestResponse {
    fn from(request: &Request) -> Self {
        Self {
            id: request.id().to_string(),
            order_id: request.order_id().to_string(),
            user_id: request.user_id().to_string(),
            kind: request.kind(),
            reason: request.reason().to_string(),
            attachments: request.attachments().to_vec(),
            status: request.status(),
            admin_response: request.admin_response().map(str::to_string),
            deleted: request.is_deleted(),
            created_at: request.created_at().to_rfc3339(),
            updated_at: request.updated_at().to_rfc3339(),
        }
    }
}

/// POST /requests: open a request for one of the caller's orders.
#[tracing::instrument(skip(state, cmd))]
pub async fn create<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Caller(actor): Caller,
    Json(cmd): Json<CreateRequest>,
) -> Result<(StatusCode, Json<RequestResponse>), ApiError> {
    let request = state.requests.create_request(&actor, cmd).await?;
    Ok((StatusCode::CREATED, Json(RequestResponse::from(&request))))
}

/// GET /requests: non-deleted requests visible to the caller.
#[tracing::instrument(skip(state))]
pub async fn list<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Caller(actor): Caller,
) -> Result<Json<Vec<RequestResponse>>, ApiError> {
    let requests = state.requests.list_requests(&actor).await?;
    Ok(Json(requests.iter().map(RequestResponse::from).collect()))
}

/// GET /requests/:id: load one request, deleted or not.
#[tracing::instrument(skip(state))]
pub async fn get<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Caller(actor): Caller,
    Path(id): Path<String>,
) -> Result<Json<RequestResponse>, ApiError> {
    let request_id: RequestId = parse_id(&id)?;
    let request = state.requests.get_request(&actor, request_id).await?;
    Ok(Json(RequestResponse::from(&request)))
}

/// POST /requests/:id/decision: approve or reject a request (admin only).
#[tracing::instrument(skip(state, body))]
pub async fn decide<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Caller(actor): Caller,
    Path(id): Path<String>,
    Json(body): Json<DecideRequestBody>,
) -> Result<Json<RequestResponse>, ApiError> {
    let request_id: RequestId = parse_id(&id)?;
    let cmd = DecideRequest {
        request_id,
        decision: body.status,
        admin_response: body.admin_response,
    };
    let request = state.requests.decide_request(&actor, cmd).await?;
    Ok(Json(RequestResponse::from(&request)))
}

/// DELETE /requests/:id: soft-delete a request (admin only).
#[tracing::instrument(skip(state))]
pub async fn delete<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Caller(actor): Caller,
    Path(id): Path<String>,
) -> Result<Json<RequestResponse>, ApiError> {
    let request_id: RequestId = parse_id(&id)?;
    let request = state.requests.soft_delete_request(&actor, request_id).await?;
    Ok(Json(RequestResponse::from(&request)))
}
