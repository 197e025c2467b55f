use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use hatchr_shared::errors::AppResult;
use hatchr_shared::middleware::{ApiJson, ApiPath, OptionalAuthUser};
use hatchr_shared::types::auth::AuthUser;
use hatchr_shared::types::ApiResponse;

use crate::domain::submission::ProjectPayload;
use crate::services::project_service::{self, ProjectOrder};
use crate::views::{Deleted, ProjectView};
use crate::AppState;

// --- GET /api/projects ---

pub async fn list_projects(
    OptionalAuthUser(viewer): OptionalAuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Vec<ProjectView>>>> {
    let mut conn = state.db.get()?;
    let projects = project_service::list(&mut conn, None, ProjectOrder::TopVoted, viewer.map(|u| u.id))?;
    Ok(Json(ApiResponse::ok(projects)))
}

// --- POST /api/projects ---

pub async fn create_project(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<ProjectPayload>,
) -> AppResult<(StatusCode, Json<ApiResponse<ProjectView>>)> {
    let submission = payload.into_submission()?;

    let mut conn = state.db.get()?;
    let project = project_service::create(&mut conn, &user, submission)?;
    let view = project_service::get(&mut conn, project.id, Some(user.id))?;
    drop(conn);

    state.feed.project_created(&project).await;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(view))))
}

// --- GET /api/projects/:id ---

pub async fn get_project(
    OptionalAuthUser(viewer): OptionalAuthUser,
    State(state): State<Arc<AppState>>,
    ApiPath(project_id): ApiPath<Uuid>,
) -> AppResult<Json<ApiResponse<ProjectView>>> {
    let mut conn = state.db.get()?;
    let project = project_service::get(&mut conn, project_id, viewer.map(|u| u.id))?;
    Ok(Json(ApiResponse::ok(project)))
}

// --- PUT /api/projects/:id ---

pub async fn update_project(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    ApiPath(project_id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<ProjectPayload>,
) -> AppResult<Json<ApiResponse<ProjectView>>> {
    let submission = payload.into_submission()?;

    let mut conn = state.db.get()?;
    let project = project_service::update(&mut conn, project_id, user.id, submission)?;
    let view = project_service::get(&mut conn, project_id, Some(user.id))?;
    drop(conn);

    state.feed.project_updated(&project).await;
    Ok(Json(ApiResponse::ok(view)))
}

// --- DELETE /api/projects/:id ---

pub async fn delete_project(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    ApiPath(project_id): ApiPath<Uuid>,
) -> AppResult<Json<ApiResponse<Deleted>>> {
    let mut conn = state.db.get()?;
    let project = project_service::delete(&mut conn, project_id, user.id)?;
    drop(conn);
    state.feed.project_deleted(&project).await;

    Ok(Json(ApiResponse::ok(Deleted { deleted: true })))
}
