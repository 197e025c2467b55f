use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use validator::Validate;

use hatchr_shared::errors::AppResult;
use hatchr_shared::middleware::ApiJson;
use hatchr_shared::types::auth::AuthUser;
use hatchr_shared::types::ApiResponse;

use crate::domain::username;
use crate::models::ProfileChanges;
use crate::services::profile_service;
use crate::views::{ProfileView, UsernameAvailability};
use crate::AppState;

// --- GET /api/user/profile ---

pub async fn get_profile(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<ProfileView>>> {
    let mut conn = state.db.get()?;
    let profile = profile_service::get_or_create(&mut conn, &user)?;
    Ok(Json(ApiResponse::ok(profile.into())))
}

/// Absent and `null` fields are left alone; an empty string clears the field.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateProfileRequest {
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub website: Option<String>,
    pub twitter: Option<String>,
    pub github: Option<String>,
    pub linkedin: Option<String>,
    pub avatar_url: Option<String>,
    pub location: Option<String>,
}

/// The values an update would write, checked before anything touches the database.
#[derive(Debug, Validate)]
struct ProfileFields {
    #[validate(length(max = 80, message = "display name must be at most 80 characters"))]
    display_name: Option<String>,
    #[validate(length(max = 500, message = "bio must be at most 500 characters"))]
    bio: Option<String>,
    #[validate(url(message = "website must be a valid URL"))]
    website: Option<String>,
    #[validate(length(max = 200))]
    twitter: Option<String>,
    #[validate(length(max = 200))]
    github: Option<String>,
    #[validate(length(max = 200))]
    linkedin: Option<String>,
    #[validate(url(message = "avatar url must be a valid URL"))]
    avatar_url: Option<String>,
    #[validate(length(max = 100))]
    location: Option<String>,
}

fn clearable(raw: Option<String>) -> Option<Option<String>> {
    raw.map(|v| Some(v.trim().to_string()).filter(|v| !v.is_empty()))
}

impl UpdateProfileRequest {
    pub fn into_changes(self) -> AppResult<ProfileChanges> {
        let username = match self.username {
            Some(raw) => Some(Some(username::normalize(Some(&raw))?)),
            None => None,
        };

        let changes = ProfileChanges {
            username,
            display_name: clearable(self.display_name),
            bio: clearable(self.bio),
            website: clearable(self.website),
            twitter: clearable(self.twitter),
            github: clearable(self.github),
            linkedin: clearable(self.linkedin),
            avatar_url: clearable(self.avatar_url),
            location: clearable(self.location),
        };

        ProfileFields {
            display_name: changes.display_name.clone().flatten(),
            bio: changes.bio.clone().flatten(),
            website: changes.website.clone().flatten(),
            twitter: changes.twitter.clone().flatten(),
            github: changes.github.clone().flatten(),
            linkedin: changes.linkedin.clone().flatten(),
            avatar_url: changes.avatar_url.clone().flatten(),
            location: changes.location.clone().flatten(),
        }
        .validate()?;

        Ok(changes)
    }
}

// --- PUT /api/user/profile ---

pub async fn update_profile(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<UpdateProfileRequest>,
) -> AppResult<Json<ApiResponse<ProfileView>>> {
    let changes = req.into_changes()?;

    let mut conn = state.db.get()?;
    let profile = profile_service::update(&mut conn, &user, changes)?;
    Ok(Json(ApiResponse::ok(profile.into())))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CheckUsernameRequest {
    pub username: Option<String>,
}

// --- POST /api/user/check-username ---

pub async fn check_username(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<CheckUsernameRequest>,
) -> AppResult<Json<ApiResponse<UsernameAvailability>>> {
    let username = username::normalize(req.username.as_deref())?;

    let mut conn = state.db.get()?;
    let available = profile_service::is_username_available(&mut conn, &username)?;
    Ok(Json(ApiResponse::ok(UsernameAvailability { username, available })))
}

// --- POST /api/user/onboard ---

pub async fn complete_onboarding(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<ProfileView>>> {
    let mut conn = state.db.get()?;
    let profile = profile_service::onboard(&mut conn, &user)?;
    Ok(Json(ApiResponse::ok(profile.into())))
}
