use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use hatchr_shared::errors::{AppError, AppResult, ErrorCode};
use hatchr_shared::middleware::{ApiJson, ApiPath, ApiQuery};
use hatchr_shared::types::auth::AuthUser;
use hatchr_shared::types::ApiResponse;

use crate::domain::threads::{self, ThreadNode};
use crate::services::{comment_service, profile_service};
use crate::views::CommentView;
use crate::AppState;

const MAX_COMMENT_CHARS: usize = 5000;

#[derive(Debug, Default, Deserialize)]
pub struct CommentListQuery {
    #[serde(default)]
    pub threaded: bool,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum CommentListing {
    Flat(Vec<CommentView>),
    Threaded(Vec<ThreadNode<CommentView>>),
}

// --- GET /api/projects/:id/comments ---

pub async fn list_comments(
    State(state): State<Arc<AppState>>,
    ApiPath(project_id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<CommentListQuery>,
) -> AppResult<Json<ApiResponse<CommentListing>>> {
    let mut conn = state.db.get()?;
    let comments = comment_service::list(&mut conn, project_id)?;

    let listing = if query.threaded {
        CommentListing::Threaded(threads::build_tree(comments))
    } else {
        CommentListing::Flat(comments)
    };
    Ok(Json(ApiResponse::ok(listing)))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateCommentRequest {
    pub content: Option<String>,
    pub parent_id: Option<Uuid>,
}

fn comment_body(raw: Option<String>) -> Result<String, AppError> {
    let content = raw.as_deref().map(str::trim).unwrap_or_default();
    if content.is_empty() {
        return Err(AppError::new(ErrorCode::ValidationError, "comment content is required"));
    }
    if content.chars().count() > MAX_COMMENT_CHARS {
        return Err(AppError::new(
            ErrorCode::ValidationError,
            format!("comment must be at most {MAX_COMMENT_CHARS} characters"),
        ));
    }
    Ok(content.to_string())
}

// --- POST /api/projects/:id/comments ---

pub async fn create_comment(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    ApiPath(project_id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<CreateCommentRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<CommentView>>)> {
    let content = comment_body(req.content)?;

    let mut conn = state.db.get()?;
    let outcome = comment_service::create(&mut conn, project_id, &user, content, req.parent_id)?;
    let avatar = profile_service::find_by_user(&mut conn, user.id)?.and_then(|p| p.avatar_url);
    drop(conn);

    state.feed.comment_created(&outcome.comment).await;
    for notification in &outcome.notifications {
        state.feed.notification_created(notification).await;
    }

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(CommentView::build(outcome.comment, avatar)))))
}
