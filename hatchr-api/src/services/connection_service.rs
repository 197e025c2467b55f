use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use uuid::Uuid;

use hatchr_shared::errors::{AppError, AppResult, ErrorCode};
use hatchr_shared::types::auth::AuthUser;

use crate::domain::handshake::{self, ConnectionStatus, RequestPlan};
use crate::models::{NewConnection, Notification, NotificationKind, UserConnection};
use crate::schema::connections;
use crate::services::{notification_service, profile_service};
use crate::views::{AuthorView, ConnectionView, ConnectionWithUser};

/// Rows linking the two users, in either direction.
fn between(conn: &mut PgConnection, a: Uuid, b: Uuid) -> AppResult<Vec<UserConnection>> {
    let rows = connections::table
        .filter(
            connections::requester_id
                .eq(a)
                .and(connections::recipient_id.eq(b))
                .or(connections::requester_id.eq(b).and(connections::recipient_id.eq(a))),
        )
        .order(connections::created_at.asc())
        .load::<UserConnection>(conn)?;
    Ok(rows)
}

/// Most recent link between the two users, if any.
pub fn find_between(conn: &mut PgConnection, a: Uuid, b: Uuid) -> AppResult<Option<UserConnection>> {
    Ok(between(conn, a, b)?.pop())
}

fn load(conn: &mut PgConnection, id: Uuid) -> AppResult<UserConnection> {
    connections::table
        .find(id)
        .first::<UserConnection>(conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::ConnectionNotFound, "connection not found"))
}

pub fn list(
    conn: &mut PgConnection,
    caller: Uuid,
    with: Option<Uuid>,
    status: Option<ConnectionStatus>,
) -> AppResult<Vec<UserConnection>> {
    let mut query = connections::table
        .filter(connections::requester_id.eq(caller).or(connections::recipient_id.eq(caller)))
        .into_boxed();

    if let Some(other) = with {
        query = query.filter(connections::requester_id.eq(other).or(connections::recipient_id.eq(other)));
    }
    if let Some(status) = status {
        query = query.filter(connections::status.eq(status.as_str()));
    }

    let rows = query
        .order(connections::created_at.desc())
        .load::<UserConnection>(conn)?;
    Ok(rows)
}

#[derive(Debug)]
pub struct RequestOutcome {
    pub connection: UserConnection,
    pub created: bool,
    pub notification: Option<Notification>,
}

pub fn request(conn: &mut PgConnection, caller: &AuthUser, recipient: Uuid) -> AppResult<RequestOutcome> {
    let (connection, created) = conn.transaction::<_, AppError, _>(|conn| {
        let existing = between(conn, caller.id, recipient)?;
        match handshake::plan_request(caller.id, recipient, &existing)? {
            RequestPlan::AlreadyPending(id) => Ok((load(conn, id)?, false)),
            RequestPlan::Create => {
                let inserted = diesel::insert_into(connections::table)
                    .values(&NewConnection {
                        requester_id: caller.id,
                        recipient_id: recipient,
                        status: ConnectionStatus::Pending.as_str().to_string(),
                    })
                    .on_conflict((connections::requester_id, connections::recipient_id))
                    .do_nothing()
                    .get_result::<UserConnection>(conn)
                    .optional()?;

                match inserted {
                    Some(row) => Ok((row, true)),
                    // Lost a race with an identical request; re-plan against the winner.
                    None => {
                        let existing = between(conn, caller.id, recipient)?;
                        match handshake::plan_request(caller.id, recipient, &existing)? {
                            RequestPlan::AlreadyPending(id) => Ok((load(conn, id)?, false)),
                            RequestPlan::Create => Err(AppError::new(
                                ErrorCode::Conflict,
                                "connection changed concurrently, retry the request",
                            )),
                        }
                    }
                }
            }
        }
    })?;

    if !created {
        return Ok(RequestOutcome { connection, created, notification: None });
    }

    tracing::info!(
        connection_id = %connection.id,
        requester_id = %caller.id,
        recipient_id = %recipient,
        "connection requested"
    );

    let requester_name = display_name_of(conn, caller);
    let notification = notification_service::notify(
        conn,
        recipient,
        caller.id,
        NotificationKind::ConnectionRequest,
        serde_json::json!({
            "connectionId": connection.id,
            "requesterName": requester_name,
        }),
    );

    Ok(RequestOutcome { connection, created, notification })
}

pub fn respond(
    conn: &mut PgConnection,
    caller: &AuthUser,
    id: Uuid,
    status: ConnectionStatus,
) -> AppResult<(UserConnection, Option<Notification>)> {
    let updated = conn.transaction::<_, AppError, _>(|conn| {
        let link = connections::table
            .find(id)
            .for_update()
            .first::<UserConnection>(conn)
            .optional()?
            .ok_or_else(|| AppError::new(ErrorCode::ConnectionNotFound, "connection not found"))?;
        handshake::ensure_can_respond(caller.id, &link)?;

        let updated = diesel::update(connections::table.find(id))
            .set((connections::status.eq(status.as_str()), connections::updated_at.eq(Utc::now())))
            .get_result::<UserConnection>(conn)?;
        Ok(updated)
    })?;

    tracing::info!(connection_id = %id, user_id = %caller.id, status = status.as_str(), "connection answered");

    let notification = if status == ConnectionStatus::Accepted {
        let recipient_name = display_name_of(conn, caller);
        notification_service::notify(
            conn,
            updated.requester_id,
            caller.id,
            NotificationKind::ConnectionAccepted,
            serde_json::json!({
                "connectionId": updated.id,
                "recipientName": recipient_name,
            }),
        )
    } else {
        None
    };

    Ok((updated, notification))
}

pub fn remove(conn: &mut PgConnection, caller: Uuid, id: Uuid) -> AppResult<UserConnection> {
    let link = load(conn, id)?;
    handshake::ensure_party(caller, &link)?;

    diesel::delete(connections::table.find(id)).execute(conn)?;

    tracing::info!(connection_id = %id, user_id = %caller, "connection removed");
    Ok(link)
}

/// Accepted connections, newest first, with the other side's profile.
pub fn my_connections(conn: &mut PgConnection, caller: Uuid) -> AppResult<Vec<ConnectionWithUser>> {
    let rows = list(conn, caller, None, Some(ConnectionStatus::Accepted))?;

    let others: Vec<Uuid> = rows.iter().map(|c| c.other_party(caller)).collect();
    let profiles = profile_service::load_many(conn, &others)?;

    Ok(rows
        .into_iter()
        .map(|link| {
            let other_id = link.other_party(caller);
            let profile = profiles.get(&other_id);
            let other_user = AuthorView {
                id: other_id,
                name: profile
                    .and_then(profile_service::public_name)
                    .unwrap_or_else(|| "Unknown User".to_string()),
                avatar_url: profile.and_then(|p| p.avatar_url.clone()),
            };
            ConnectionWithUser {
                connection: ConnectionView::from(link),
                other_user,
            }
        })
        .collect())
}

/// Name shown to the other side in notifications: profile name, else token name.
fn display_name_of(conn: &mut PgConnection, user: &AuthUser) -> String {
    match profile_service::find_by_user(conn, user.id) {
        Ok(Some(profile)) => profile_service::public_name(&profile).unwrap_or_else(|| user.display_name()),
        _ => user.display_name(),
    }
}
