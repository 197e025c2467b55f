//! Service behaviour against a real PostgreSQL schema: toggled votes, FK
//! cascades, ownership rules and per-user notification state.

use diesel::pg::PgConnection;
use diesel::prelude::*;
use uuid::Uuid;

use hatchr_api::domain::handshake::ConnectionStatus;
use hatchr_api::domain::submission::{ImagePayload, ProjectPayload};
use hatchr_api::domain::threads::MAX_REPLY_DEPTH;
use hatchr_api::domain::voting::VoteDirection;
use hatchr_api::models::{NotificationKind, Project};
use hatchr_api::schema::{comments, notifications, project_images, votes};
use hatchr_api::services::{
    comment_service, connection_service, notification_service, project_service, vote_service,
};
use hatchr_shared::errors::ErrorCode;
use hatchr_shared::types::auth::AuthUser;

mod support;

use support::test_database;

fn user(name: &str) -> AuthUser {
    AuthUser {
        id: Uuid::new_v4(),
        email: Some(format!("{name}@hatchr.test")),
        name: Some(name.to_string()),
        avatar_url: None,
    }
}

fn publish(conn: &mut PgConnection, author: &AuthUser) -> Project {
    let submission = ProjectPayload {
        title: Some("Lamp".into()),
        short_description: Some("A desk lamp".into()),
        full_description: Some("Printed, wired, glowing".into()),
        images: Some(vec![
            ImagePayload { url: Some("https://cdn.hatchr.test/1.png".into()), ..Default::default() },
            ImagePayload { url: Some("https://cdn.hatchr.test/2.png".into()), ..Default::default() },
        ]),
        ..Default::default()
    }
    .into_submission()
    .expect("valid submission");
    project_service::create(conn, author, submission).expect("create project")
}

fn vote_rows(conn: &mut PgConnection, project_id: Uuid) -> Vec<String> {
    votes::table
        .filter(votes::project_id.eq(project_id))
        .select(votes::vote_type)
        .load(conn)
        .expect("load votes")
}

fn notifications_of(conn: &mut PgConnection, user_id: Uuid, kind: NotificationKind) -> i64 {
    notifications::table
        .filter(notifications::user_id.eq(user_id))
        .filter(notifications::notification_type.eq(kind.as_str()))
        .count()
        .get_result(conn)
        .expect("count notifications")
}

#[test]
fn same_vote_twice_toggles_it_off() {
    let Some(mut db) = test_database() else { return };
    let conn = &mut db.conn;
    let (author, voter) = (user("ada"), user("bo"));
    let project = publish(conn, &author);

    let first = vote_service::cast(conn, project.id, &voter, VoteDirection::Up).expect("first vote");
    assert_eq!((first.tally.up, first.tally.down), (1, 0));
    assert_eq!(first.user_vote, Some(VoteDirection::Up));
    assert!(first.notification.is_some());

    let second = vote_service::cast(conn, project.id, &voter, VoteDirection::Up).expect("second vote");
    assert_eq!((second.tally.up, second.tally.down), (0, 0));
    assert_eq!(second.user_vote, None);
    assert!(second.notification.is_none());

    assert!(vote_rows(conn, project.id).is_empty());
    let stored = project_service::load(conn, project.id).expect("reload project");
    assert_eq!((stored.upvotes, stored.downvotes, stored.net_votes), (0, 0, 0));
}

#[test]
fn switching_direction_keeps_a_single_row() {
    let Some(mut db) = test_database() else { return };
    let conn = &mut db.conn;
    let (author, voter) = (user("ada"), user("bo"));
    let project = publish(conn, &author);

    vote_service::cast(conn, project.id, &voter, VoteDirection::Up).expect("up");
    let switched = vote_service::cast(conn, project.id, &voter, VoteDirection::Down).expect("down");
    assert_eq!(switched.user_vote, Some(VoteDirection::Down));
    assert!(switched.notification.is_none());

    assert_eq!(vote_rows(conn, project.id), ["down"]);
    let stored = project_service::load(conn, project.id).expect("reload project");
    assert_eq!((stored.upvotes, stored.downvotes, stored.net_votes), (0, 1, -1));
    assert_eq!(notifications_of(conn, author.id, NotificationKind::NewVote), 1);
}

#[test]
fn voting_on_a_missing_project_fails() {
    let Some(mut db) = test_database() else { return };
    let err = vote_service::cast(&mut db.conn, Uuid::new_v4(), &user("bo"), VoteDirection::Up).unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::ProjectNotFound));
}

#[test]
fn only_the_author_edits_or_deletes_and_delete_cascades() {
    let Some(mut db) = test_database() else { return };
    let conn = &mut db.conn;
    let (author, other) = (user("ada"), user("bo"));
    let project = publish(conn, &author);

    vote_service::cast(conn, project.id, &other, VoteDirection::Up).expect("vote");
    let root = comment_service::create(conn, project.id, &other, "nice".into(), None).expect("comment");
    comment_service::create(conn, project.id, &author, "thanks".into(), Some(root.comment.id)).expect("reply");

    let edit = ProjectPayload {
        title: Some("Hijacked".into()),
        short_description: Some("x".into()),
        full_description: Some("x".into()),
        thumbnail_url: Some("https://cdn.hatchr.test/x.png".into()),
        ..Default::default()
    }
    .into_submission()
    .expect("valid edit");
    let err = project_service::update(conn, project.id, other.id, edit).unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::NotProjectOwner));
    let err = project_service::delete(conn, project.id, other.id).unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::NotProjectOwner));
    assert_eq!(project_service::load(conn, project.id).expect("still there").title, "Lamp");

    project_service::delete(conn, project.id, author.id).expect("author deletes");

    let err = project_service::load(conn, project.id).unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::ProjectNotFound));
    assert!(vote_rows(conn, project.id).is_empty());
    let leftover_comments: i64 = comments::table
        .filter(comments::project_id.eq(project.id))
        .count()
        .get_result(conn)
        .expect("count comments");
    let leftover_images: i64 = project_images::table
        .filter(project_images::project_id.eq(project.id))
        .count()
        .get_result(conn)
        .expect("count images");
    assert_eq!((leftover_comments, leftover_images), (0, 0));
}

#[test]
fn only_the_recipient_answers_a_request_once() {
    let Some(mut db) = test_database() else { return };
    let conn = &mut db.conn;
    let (ada, bo, cy) = (user("ada"), user("bo"), user("cy"));

    let first = connection_service::request(conn, &ada, bo.id).expect("request");
    assert!(first.created);
    assert!(first.notification.is_some());

    let again = connection_service::request(conn, &ada, bo.id).expect("repeat request");
    assert!(!again.created);
    assert_eq!(again.connection.id, first.connection.id);
    assert_eq!(notifications_of(conn, bo.id, NotificationKind::ConnectionRequest), 1);

    let err = connection_service::request(conn, &bo, ada.id).unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::ConnectionAlreadyExists));

    let id = first.connection.id;
    let err = connection_service::respond(conn, &ada, id, ConnectionStatus::Accepted).unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::NotConnectionRecipient));

    let (accepted, notification) =
        connection_service::respond(conn, &bo, id, ConnectionStatus::Accepted).expect("accept");
    assert_eq!(accepted.status, "accepted");
    assert_eq!(notification.map(|n| n.user_id), Some(ada.id));

    let err = connection_service::respond(conn, &bo, id, ConnectionStatus::Declined).unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::ConnectionNotPending));

    let err = connection_service::remove(conn, cy.id, id).unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::NotConnectionParty));
    connection_service::remove(conn, ada.id, id).expect("party removes");
    assert!(connection_service::find_between(conn, ada.id, bo.id).expect("lookup").is_none());
}

#[test]
fn marking_read_only_touches_the_callers_notifications() {
    let Some(mut db) = test_database() else { return };
    let conn = &mut db.conn;
    let (ada, bo, cy) = (user("ada"), user("bo"), user("cy"));

    let for_ada = notification_service::notify(conn, ada.id, cy.id, NotificationKind::NewVote, serde_json::json!({}))
        .expect("ada's notification");
    let for_bo = notification_service::notify(conn, bo.id, cy.id, NotificationKind::NewVote, serde_json::json!({}))
        .expect("bo's notification");
    assert!(notification_service::notify(conn, cy.id, cy.id, NotificationKind::NewVote, serde_json::json!({})).is_none());

    assert_eq!(notification_service::mark_read(conn, bo.id, &[for_ada.id]).expect("mark"), 0);
    assert_eq!(notification_service::mark_read(conn, ada.id, &[for_bo.id]).expect("mark"), 0);
    let err = notification_service::mark_one_read(conn, bo.id, for_ada.id).unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::NotificationNotFound));
    assert_eq!(notification_service::count_unread(conn, ada.id).expect("unread"), 1);

    assert_eq!(notification_service::mark_all_read(conn, bo.id).expect("mark all"), 1);
    assert_eq!(notification_service::count_unread(conn, ada.id).expect("unread"), 1);
    assert_eq!(notification_service::count_unread(conn, bo.id).expect("unread"), 0);

    notification_service::mark_one_read(conn, ada.id, for_ada.id).expect("owner marks");
    assert_eq!(notification_service::count_unread(conn, ada.id).expect("unread"), 0);
}

#[test]
fn comment_count_is_recounted_on_every_insert() {
    let Some(mut db) = test_database() else { return };
    let conn = &mut db.conn;
    let (author, fan) = (user("ada"), user("bo"));
    let project = publish(conn, &author);
    let elsewhere = publish(conn, &author);

    let root = comment_service::create(conn, project.id, &fan, "first".into(), None).expect("comment");
    assert_eq!(root.notifications.len(), 1);
    let reply = comment_service::create(conn, project.id, &author, "reply".into(), Some(root.comment.id))
        .expect("reply");
    assert_eq!(reply.notifications.iter().map(|n| n.user_id).collect::<Vec<_>>(), [fan.id]);

    assert_eq!(project_service::load(conn, project.id).expect("reload").comments_count, 2);

    let err = comment_service::create(conn, elsewhere.id, &fan, "lost".into(), Some(root.comment.id)).unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::InvalidParentComment));
    assert_eq!(project_service::load(conn, elsewhere.id).expect("reload").comments_count, 0);

    let listed = comment_service::list(conn, project.id).expect("list");
    assert_eq!(listed.len(), 2);
}

#[test]
fn replies_stop_at_the_nesting_limit() {
    let Some(mut db) = test_database() else { return };
    let conn = &mut db.conn;
    let author = user("ada");
    let project = publish(conn, &author);

    let mut parent = None;
    for level in 0..=MAX_REPLY_DEPTH {
        let created = comment_service::create(conn, project.id, &author, format!("level {level}"), parent)
            .expect("reply within the limit");
        parent = Some(created.comment.id);
    }

    let err = comment_service::create(conn, project.id, &author, "too deep".into(), parent).unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::InvalidParentComment));
    assert_eq!(
        project_service::load(conn, project.id).expect("reload").comments_count as usize,
        MAX_REPLY_DEPTH + 1
    );
}
