use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use hatchr_shared::errors::AppResult;
use hatchr_shared::middleware::{ApiPath, OptionalAuthUser};
use hatchr_shared::types::ApiResponse;

use crate::domain::handshake;
use crate::services::project_service::{self, ProjectOrder};
use crate::services::{connection_service, profile_service};
use crate::views::{ProjectView, PublicProfileView};
use crate::AppState;

// --- GET /api/users/:username ---

pub async fn get_public_profile(
    OptionalAuthUser(viewer): OptionalAuthUser,
    State(state): State<Arc<AppState>>,
    ApiPath(username): ApiPath<String>,
) -> AppResult<Json<ApiResponse<PublicProfileView>>> {
    let mut conn = state.db.get()?;
    let profile = profile_service::find_by_username(&mut conn, &username)?;
    let stats = profile_service::stats(&mut conn, &profile)?;

    let relationship = match viewer {
        Some(viewer) if viewer.id != profile.user_id => {
            let link = connection_service::find_between(&mut conn, viewer.id, profile.user_id)?;
            Some(handshake::classify(viewer.id, link.as_ref()))
        }
        _ => None,
    };

    Ok(Json(ApiResponse::ok(PublicProfileView {
        profile: profile.into(),
        stats,
        relationship,
    })))
}

// --- GET /api/users/:username/projects ---

pub async fn list_user_projects(
    OptionalAuthUser(viewer): OptionalAuthUser,
    State(state): State<Arc<AppState>>,
    ApiPath(username): ApiPath<String>,
) -> AppResult<Json<ApiResponse<Vec<ProjectView>>>> {
    let mut conn = state.db.get()?;
    let profile = profile_service::find_by_username(&mut conn, &username)?;
    let projects = project_service::list(
        &mut conn,
        Some(profile.user_id),
        ProjectOrder::Newest,
        viewer.map(|u| u.id),
    )?;
    Ok(Json(ApiResponse::ok(projects)))
}
