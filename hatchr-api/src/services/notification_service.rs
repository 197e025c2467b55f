use diesel::pg::PgConnection;
use diesel::prelude::*;
use uuid::Uuid;

use hatchr_shared::errors::{AppError, AppResult, ErrorCode};
use hatchr_shared::types::pagination::{Paginated, PaginationParams};

use crate::models::{NewNotification, Notification, NotificationKind, UserProfile};
use crate::schema::notifications;
use crate::services::profile_service;
use crate::views::{ActorView, NotificationView};

/// Inserts a notification for `target`. Side-channel only: failures are
/// logged and yield `None` so the triggering mutation still succeeds.
pub fn notify(
    conn: &mut PgConnection,
    target: Uuid,
    actor: Uuid,
    kind: NotificationKind,
    data: serde_json::Value,
) -> Option<Notification> {
    if target == actor {
        return None;
    }

    let new_notification = NewNotification {
        user_id: target,
        actor_id: Some(actor),
        notification_type: kind.as_str().to_string(),
        data,
    };

    match diesel::insert_into(notifications::table)
        .values(&new_notification)
        .get_result::<Notification>(conn)
    {
        Ok(notification) => {
            tracing::debug!(
                notification_id = %notification.id,
                user_id = %target,
                notification_type = kind.as_str(),
                "notification created"
            );
            Some(notification)
        }
        Err(e) => {
            tracing::error!(user_id = %target, notification_type = kind.as_str(), error = %e, "failed to create notification");
            None
        }
    }
}

/// Newest first, each item carrying the actor's current name and avatar.
pub fn list(conn: &mut PgConnection, user_id: Uuid, params: &PaginationParams) -> AppResult<Paginated<NotificationView>> {
    let total: i64 = notifications::table
        .filter(notifications::user_id.eq(user_id))
        .count()
        .get_result(conn)?;

    let rows = notifications::table
        .filter(notifications::user_id.eq(user_id))
        .order((notifications::created_at.desc(), notifications::id.desc()))
        .limit(params.sql_limit())
        .offset(params.sql_offset())
        .load::<Notification>(conn)?;

    let actor_ids: Vec<Uuid> = rows.iter().filter_map(|n| n.actor_id).collect();
    let actors = profile_service::load_many(conn, &actor_ids)?;

    let items = rows
        .into_iter()
        .map(|n| {
            let profile = n.actor_id.and_then(|id| actors.get(&id));
            NotificationView::build(n, actor_view(profile))
        })
        .collect();

    Ok(Paginated::new(items, total.max(0) as u64, params))
}

pub fn count_unread(conn: &mut PgConnection, user_id: Uuid) -> AppResult<i64> {
    let count = notifications::table
        .filter(notifications::user_id.eq(user_id))
        .filter(notifications::is_read.eq(false))
        .count()
        .get_result(conn)?;
    Ok(count)
}

/// Marks the given ids read. Ids owned by other users are ignored.
pub fn mark_read(conn: &mut PgConnection, user_id: Uuid, ids: &[Uuid]) -> AppResult<usize> {
    if ids.is_empty() {
        return Ok(0);
    }
    let updated = diesel::update(
        notifications::table
            .filter(notifications::user_id.eq(user_id))
            .filter(notifications::id.eq_any(ids)),
    )
    .set(notifications::is_read.eq(true))
    .execute(conn)?;
    Ok(updated)
}

pub fn mark_all_read(conn: &mut PgConnection, user_id: Uuid) -> AppResult<usize> {
    let updated = diesel::update(
        notifications::table
            .filter(notifications::user_id.eq(user_id))
            .filter(notifications::is_read.eq(false)),
    )
    .set(notifications::is_read.eq(true))
    .execute(conn)?;
    Ok(updated)
}

pub fn mark_one_read(conn: &mut PgConnection, user_id: Uuid, id: Uuid) -> AppResult<()> {
    let updated = diesel::update(
        notifications::table
            .filter(notifications::id.eq(id))
            .filter(notifications::user_id.eq(user_id)),
    )
    .set(notifications::is_read.eq(true))
    .execute(conn)?;

    if updated == 0 {
        return Err(AppError::new(ErrorCode::NotificationNotFound, "notification not found"));
    }
    Ok(())
}

fn actor_view(profile: Option<&UserProfile>) -> ActorView {
    match profile {
        Some(p) => ActorView {
            name: profile_service::public_name(p).unwrap_or_else(|| "Someone".to_string()),
            avatar_url: p.avatar_url.clone(),
        },
        None => ActorView { name: "Someone".to_string(), avatar_url: None },
    }
}
