use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use hatchr_shared::errors::AppResult;
use hatchr_shared::middleware::{ApiJson, ApiPath};
use hatchr_shared::types::auth::AuthUser;
use hatchr_shared::types::ApiResponse;

use crate::domain::voting::VoteDirection;
use crate::services::vote_service;
use crate::views::VoteResult;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct VoteRequest {
    pub direction: Option<String>,
}

// --- POST /api/projects/:id/vote ---

pub async fn cast_vote(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    ApiPath(project_id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<VoteRequest>,
) -> AppResult<Json<ApiResponse<VoteResult>>> {
    let direction = VoteDirection::parse_request(req.direction.as_deref())?;

    let mut conn = state.db.get()?;
    let outcome = vote_service::cast(&mut conn, project_id, &user, direction)?;
    drop(conn);

    state
        .feed
        .votes_changed(project_id, user.id, outcome.tally, outcome.user_vote)
        .await;
    if let Some(notification) = &outcome.notification {
        state.feed.notification_created(notification).await;
    }

    Ok(Json(ApiResponse::ok(VoteResult {
        project_id: outcome.project_id,
        votes: outcome.tally.into(),
        user_vote: outcome.user_vote,
    })))
}
