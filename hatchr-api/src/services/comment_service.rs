use std::collections::HashMap;

use diesel::pg::PgConnection;
use diesel::prelude::*;
use uuid::Uuid;

use hatchr_shared::errors::{AppError, AppResult, ErrorCode};
use hatchr_shared::types::auth::AuthUser;

use crate::domain::threads;
use crate::models::{Comment, NewComment, Notification, NotificationKind};
use crate::schema::{comments, projects};
use crate::services::{notification_service, profile_service, project_service};
use crate::views::CommentView;

const PREVIEW_CHARS: usize = 100;

/// A project's comments in posting order.
pub fn list(conn: &mut PgConnection, project_id: Uuid) -> AppResult<Vec<CommentView>> {
    project_service::load(conn, project_id)?;

    let rows = comments::table
        .filter(comments::project_id.eq(project_id))
        .order((comments::created_at.asc(), comments::id.asc()))
        .load::<Comment>(conn)?;

    let mut author_ids: Vec<Uuid> = rows.iter().map(|c| c.author_id).collect();
    author_ids.sort_unstable();
    author_ids.dedup();
    let avatars = profile_service::avatars(conn, &author_ids)?;

    Ok(rows
        .into_iter()
        .map(|c| {
            let avatar = avatars.get(&c.author_id).cloned();
            CommentView::build(c, avatar)
        })
        .collect())
}

#[derive(Debug)]
pub struct CommentOutcome {
    pub comment: Comment,
    pub notifications: Vec<Notification>,
}

/// `content` must already be trimmed and non-empty.
pub fn create(
    conn: &mut PgConnection,
    project_id: Uuid,
    author: &AuthUser,
    content: String,
    parent_id: Option<Uuid>,
) -> AppResult<CommentOutcome> {
    let profile = profile_service::find_by_user(conn, author.id)?;
    let author_name = profile
        .as_ref()
        .and_then(profile_service::public_name)
        .unwrap_or_else(|| author.display_name());
    let author_avatar_url = profile
        .and_then(|p| p.avatar_url)
        .or_else(|| author.avatar_url.clone());

    let (project, comment, parent_author) = conn.transaction::<_, AppError, _>(|conn| {
        let project = project_service::load(conn, project_id)?;

        let parent_author = match parent_id {
            Some(pid) => {
                let parent = comments::table
                    .find(pid)
                    .first::<Comment>(conn)
                    .optional()?
                    .filter(|p| p.project_id == project_id)
                    .ok_or_else(|| {
                        AppError::new(ErrorCode::InvalidParentComment, "parent comment does not belong to this project")
                    })?;

                let parents: HashMap<Uuid, Option<Uuid>> = comments::table
                    .filter(comments::project_id.eq(project_id))
                    .select((comments::id, comments::parent_id))
                    .load::<(Uuid, Option<Uuid>)>(conn)?
                    .into_iter()
                    .collect();
                if threads::depth_of(pid, &parents) >= threads::MAX_REPLY_DEPTH {
                    return Err(AppError::new(
                        ErrorCode::InvalidParentComment,
                        format!("replies cannot nest more than {} levels", threads::MAX_REPLY_DEPTH),
                    ));
                }
                Some(parent.author_id)
            }
            None => None,
        };

        let comment = diesel::insert_into(comments::table)
            .values(&NewComment {
                project_id,
                author_id: author.id,
                author_name,
                author_avatar_url,
                content,
                parent_id,
            })
            .get_result::<Comment>(conn)?;

        let count: i64 = comments::table
            .filter(comments::project_id.eq(project_id))
            .count()
            .get_result(conn)?;
        diesel::update(projects::table.find(project_id))
            .set(projects::comments_count.eq(count as i32))
            .execute(conn)?;

        Ok((project, comment, parent_author))
    })?;

    tracing::info!(
        comment_id = %comment.id,
        project_id = %project_id,
        user_id = %author.id,
        reply = parent_id.is_some(),
        "comment created"
    );

    let preview: String = comment.content.chars().take(PREVIEW_CHARS).collect();
    let notifications = threads::notification_targets(author.id, project.author_id, parent_author)
        .into_iter()
        .filter_map(|target| {
            notification_service::notify(
                conn,
                target,
                author.id,
                NotificationKind::NewComment,
                serde_json::json!({
                    "projectId": project.id,
                    "projectTitle": project.title,
                    "commentId": comment.id,
                    "commenterName": comment.author_name,
                    "isReply": target != project.author_id,
                    "preview": preview,
                }),
            )
        })
        .collect();

    Ok(CommentOutcome { comment, notifications })
}
