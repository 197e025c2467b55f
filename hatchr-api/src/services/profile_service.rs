use std::collections::HashMap;

use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use uuid::Uuid;

use hatchr_shared::errors::{AppError, AppResult, ErrorCode};
use hatchr_shared::types::auth::AuthUser;

use crate::domain::handshake::ConnectionStatus;
use crate::models::{NewUserProfile, ProfileChanges, UserProfile};
use crate::schema::{comments, connections, projects, user_profiles, votes};
use crate::views::ProfileStats;

pub fn find_by_user(conn: &mut PgConnection, user_id: Uuid) -> AppResult<Option<UserProfile>> {
    let profile = user_profiles::table
        .filter(user_profiles::user_id.eq(user_id))
        .first::<UserProfile>(conn)
        .optional()?;
    Ok(profile)
}

/// Returns the caller's profile, creating it from the token claims on first
/// access.
pub fn get_or_create(conn: &mut PgConnection, user: &AuthUser) -> AppResult<UserProfile> {
    if let Some(profile) = find_by_user(conn, user.id)? {
        return Ok(profile);
    }

    let new_profile = NewUserProfile {
        user_id: user.id,
        display_name: user.name.clone(),
        avatar_url: user.avatar_url.clone(),
        is_onboarded: false,
    };

    // A concurrent first request may have inserted the row already.
    diesel::insert_into(user_profiles::table)
        .values(&new_profile)
        .on_conflict(user_profiles::user_id)
        .do_nothing()
        .execute(conn)?;

    let profile = user_profiles::table
        .filter(user_profiles::user_id.eq(user.id))
        .first::<UserProfile>(conn)?;

    tracing::info!(profile_id = %profile.id, user_id = %user.id, "profile created");
    Ok(profile)
}

pub fn update(conn: &mut PgConnection, user: &AuthUser, changes: ProfileChanges) -> AppResult<UserProfile> {
    let profile = get_or_create(conn, user)?;

    if let Some(Some(username)) = &changes.username {
        if profile.username.as_deref() != Some(username.as_str()) && !is_username_available(conn, username)? {
            return Err(AppError::new(ErrorCode::UsernameTaken, "username is already taken"));
        }
    }

    let updated = diesel::update(user_profiles::table.find(profile.id))
        .set((&changes, user_profiles::updated_at.eq(Utc::now())))
        .get_result::<UserProfile>(conn)
        .map_err(|e| match e {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                AppError::new(ErrorCode::UsernameTaken, "username is already taken")
            }
            other => AppError::Database(other),
        })?;

    tracing::info!(profile_id = %updated.id, user_id = %user.id, "profile updated");
    Ok(updated)
}

/// Expects the already-normalised (lowercase) name.
pub fn is_username_available(conn: &mut PgConnection, username: &str) -> AppResult<bool> {
    let taken: i64 = user_profiles::table
        .filter(user_profiles::username.eq(username))
        .count()
        .get_result(conn)?;
    Ok(taken == 0)
}

pub fn onboard(conn: &mut PgConnection, user: &AuthUser) -> AppResult<UserProfile> {
    let profile = get_or_create(conn, user)?;
    if profile.is_onboarded {
        return Ok(profile);
    }

    let updated = diesel::update(user_profiles::table.find(profile.id))
        .set((user_profiles::is_onboarded.eq(true), user_profiles::updated_at.eq(Utc::now())))
        .get_result::<UserProfile>(conn)?;

    tracing::info!(user_id = %user.id, "onboarding completed");
    Ok(updated)
}

pub fn find_by_username(conn: &mut PgConnection, username: &str) -> AppResult<UserProfile> {
    user_profiles::table
        .filter(user_profiles::username.eq(username.to_ascii_lowercase()))
        .first::<UserProfile>(conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::ProfileNotFound, "user not found"))
}

/// Profiles keyed by identity-provider user id. Unknown ids are absent.
pub fn load_many(conn: &mut PgConnection, user_ids: &[Uuid]) -> AppResult<HashMap<Uuid, UserProfile>> {
    if user_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let profiles = user_profiles::table
        .filter(user_profiles::user_id.eq_any(user_ids))
        .load::<UserProfile>(conn)?;
    Ok(profiles.into_iter().map(|p| (p.user_id, p)).collect())
}

/// Current avatars keyed by user id, for overriding author snapshots.
pub fn avatars(conn: &mut PgConnection, user_ids: &[Uuid]) -> AppResult<HashMap<Uuid, String>> {
    Ok(load_many(conn, user_ids)?
        .into_iter()
        .filter_map(|(id, p)| p.avatar_url.map(|url| (id, url)))
        .collect())
}

pub fn public_name(profile: &UserProfile) -> Option<String> {
    profile
        .display_name
        .clone()
        .filter(|n| !n.trim().is_empty())
        .or_else(|| profile.username.clone())
}

pub fn stats(conn: &mut PgConnection, profile: &UserProfile) -> AppResult<ProfileStats> {
    let owner = profile.user_id;

    let total_projects: i64 = projects::table
        .filter(projects::author_id.eq(owner))
        .count()
        .get_result(conn)?;

    let total_votes: i64 = votes::table
        .inner_join(projects::table)
        .filter(projects::author_id.eq(owner))
        .count()
        .get_result(conn)?;

    let total_comments: i64 = comments::table
        .inner_join(projects::table)
        .filter(projects::author_id.eq(owner))
        .count()
        .get_result(conn)?;

    let total_connections: i64 = connections::table
        .filter(connections::status.eq(ConnectionStatus::Accepted.as_str()))
        .filter(connections::requester_id.eq(owner).or(connections::recipient_id.eq(owner)))
        .count()
        .get_result(conn)?;

    Ok(ProfileStats {
        total_projects,
        total_votes,
        total_comments,
        total_connections,
        joined_at: profile.created_at,
    })
}
