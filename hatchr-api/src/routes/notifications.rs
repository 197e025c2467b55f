use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use hatchr_shared::errors::AppResult;
use hatchr_shared::middleware::{ApiJson, ApiPath, ApiQuery};
use hatchr_shared::types::auth::AuthUser;
use hatchr_shared::types::pagination::{Paginated, PaginationParams};
use hatchr_shared::types::ApiResponse;

use crate::services::notification_service;
use crate::views::{MarkedRead, NotificationView, UnreadCount};
use crate::AppState;

// --- GET /api/notifications ---

pub async fn list_notifications(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<PaginationParams>,
) -> AppResult<Json<ApiResponse<Paginated<NotificationView>>>> {
    let mut conn = state.db.get()?;
    let page = notification_service::list(&mut conn, user.id, &params)?;
    Ok(Json(ApiResponse::ok(page)))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct MarkReadRequest {
    pub ids: Vec<Uuid>,
}

// --- POST /api/notifications ---

pub async fn mark_read(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<MarkReadRequest>,
) -> AppResult<Json<ApiResponse<MarkedRead>>> {
    let mut conn = state.db.get()?;
    let updated = notification_service::mark_read(&mut conn, user.id, &req.ids)?;
    Ok(Json(ApiResponse::ok(MarkedRead { updated })))
}

// --- GET /api/notifications/unread-count ---

pub async fn unread_count(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<UnreadCount>>> {
    let mut conn = state.db.get()?;
    let count = notification_service::count_unread(&mut conn, user.id)?;
    Ok(Json(ApiResponse::ok(UnreadCount { count })))
}

// --- POST /api/notifications/mark-all-read ---

pub async fn mark_all_read(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<MarkedRead>>> {
    let mut conn = state.db.get()?;
    let updated = notification_service::mark_all_read(&mut conn, user.id)?;
    Ok(Json(ApiResponse::ok(MarkedRead { updated })))
}

// --- POST /api/notifications/:id/read ---

pub async fn mark_one_read(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    ApiPath(notification_id): ApiPath<Uuid>,
) -> AppResult<Json<ApiResponse<MarkedRead>>> {
    let mut conn = state.db.get()?;
    notification_service::mark_one_read(&mut conn, user.id, notification_id)?;
    Ok(Json(ApiResponse::ok(MarkedRead { updated: 1 })))
}
