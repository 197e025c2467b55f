use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use hatchr_shared::errors::{AppError, AppResult, ErrorCode};
use hatchr_shared::middleware::{ApiJson, ApiPath, ApiQuery};
use hatchr_shared::types::auth::AuthUser;
use hatchr_shared::types::ApiResponse;

use crate::domain::handshake::ConnectionStatus;
use crate::services::connection_service;
use crate::views::{ConnectionView, ConnectionWithUser, Deleted};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ConnectionFilter {
    pub with: Option<Uuid>,
    pub status: Option<String>,
}

// --- GET /api/connections ---

pub async fn list_connections(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    ApiQuery(filter): ApiQuery<ConnectionFilter>,
) -> AppResult<Json<ApiResponse<Vec<ConnectionView>>>> {
    let status = filter
        .status
        .as_deref()
        .map(str::parse::<ConnectionStatus>)
        .transpose()?;

    let mut conn = state.db.get()?;
    let rows = connection_service::list(&mut conn, user.id, filter.with, status)?;
    Ok(Json(ApiResponse::ok(rows.into_iter().map(ConnectionView::from).collect())))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConnectionRequest {
    pub recipient_id: Option<String>,
}

fn parse_recipient(raw: Option<&str>) -> Result<Uuid, AppError> {
    let raw = raw
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .ok_or_else(|| AppError::new(ErrorCode::ValidationError, "recipientId is required"))?;
    Uuid::parse_str(raw).map_err(|_| AppError::new(ErrorCode::ValidationError, "recipientId must be a user id"))
}

// --- POST /api/connections ---

pub async fn request_connection(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<ConnectionRequest>,
) -> AppResult<Json<ApiResponse<ConnectionView>>> {
    let recipient = parse_recipient(req.recipient_id.as_deref())?;
    if recipient == user.id {
        return Err(AppError::new(ErrorCode::CannotConnectSelf, "cannot connect with yourself"));
    }

    let mut conn = state.db.get()?;
    let outcome = connection_service::request(&mut conn, &user, recipient)?;
    drop(conn);

    if outcome.created {
        state.feed.connection_changed(&outcome.connection, user.id, "requested").await;
    }
    if let Some(notification) = &outcome.notification {
        state.feed.notification_created(notification).await;
    }

    Ok(Json(ApiResponse::ok(ConnectionView::from(outcome.connection))))
}

// --- GET /api/connections/my-connections ---

pub async fn my_connections(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Vec<ConnectionWithUser>>>> {
    let mut conn = state.db.get()?;
    let connections = connection_service::my_connections(&mut conn, user.id)?;
    Ok(Json(ApiResponse::ok(connections)))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RespondRequest {
    pub status: Option<String>,
}

// --- PUT /api/connections/:id ---

pub async fn respond_connection(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    ApiPath(connection_id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<RespondRequest>,
) -> AppResult<Json<ApiResponse<ConnectionView>>> {
    let status = ConnectionStatus::parse_response(req.status.as_deref())?;

    let mut conn = state.db.get()?;
    let (updated, notification) = connection_service::respond(&mut conn, &user, connection_id, status)?;
    drop(conn);

    state.feed.connection_changed(&updated, user.id, status.as_str()).await;
    if let Some(notification) = &notification {
        state.feed.notification_created(notification).await;
    }

    Ok(Json(ApiResponse::ok(ConnectionView::from(updated))))
}

// --- DELETE /api/connections/:id ---

pub async fn remove_connection(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    ApiPath(connection_id): ApiPath<Uuid>,
) -> AppResult<Json<ApiResponse<Deleted>>> {
    let mut conn = state.db.get()?;
    let removed = connection_service::remove(&mut conn, user.id, connection_id)?;
    drop(conn);
    state.feed.connection_changed(&removed, user.id, "removed").await;

    Ok(Json(ApiResponse::ok(Deleted { deleted: true })))
}
