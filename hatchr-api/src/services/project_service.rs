use std::collections::HashMap;

use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use uuid::Uuid;

use hatchr_shared::errors::{AppError, AppResult, ErrorCode};
use hatchr_shared::types::auth::AuthUser;

use crate::domain::submission::{GalleryImage, ProjectSubmission};
use crate::domain::voting::VoteDirection;
use crate::models::{NewProject, NewProjectImage, Project, ProjectChanges, ProjectImage};
use crate::schema::{project_images, projects, votes};
use crate::services::profile_service;
use crate::views::ProjectView;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectOrder {
    /// Leaderboard: highest net votes first, newer first on ties.
    TopVoted,
    Newest,
}

pub fn load(conn: &mut PgConnection, project_id: Uuid) -> AppResult<Project> {
    projects::table
        .find(project_id)
        .first::<Project>(conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::ProjectNotFound, "project not found"))
}

pub fn list(
    conn: &mut PgConnection,
    author: Option<Uuid>,
    order: ProjectOrder,
    viewer: Option<Uuid>,
) -> AppResult<Vec<ProjectView>> {
    let mut query = projects::table.into_boxed();
    if let Some(author_id) = author {
        query = query.filter(projects::author_id.eq(author_id));
    }
    query = match order {
        ProjectOrder::TopVoted => query.order((projects::net_votes.desc(), projects::created_at.desc())),
        ProjectOrder::Newest => query.order(projects::created_at.desc()),
    };
    let rows = query.load::<Project>(conn)?;

    to_views(conn, rows, viewer)
}

pub fn get(conn: &mut PgConnection, project_id: Uuid, viewer: Option<Uuid>) -> AppResult<ProjectView> {
    let project = load(conn, project_id)?;
    let images = project_images::table
        .filter(project_images::project_id.eq(project_id))
        .order((project_images::display_order.asc(), project_images::created_at.asc()))
        .load::<ProjectImage>(conn)?;

    let view = to_views(conn, vec![project], viewer)?
        .pop()
        .ok_or_else(|| AppError::new(ErrorCode::ProjectNotFound, "project not found"))?;
    Ok(view.with_images(images))
}

fn to_views(conn: &mut PgConnection, rows: Vec<Project>, viewer: Option<Uuid>) -> AppResult<Vec<ProjectView>> {
    let mut author_ids: Vec<Uuid> = rows.iter().map(|p| p.author_id).collect();
    author_ids.sort_unstable();
    author_ids.dedup();
    let avatars = profile_service::avatars(conn, &author_ids)?;

    let user_votes: HashMap<Uuid, VoteDirection> = match viewer {
        Some(viewer_id) if !rows.is_empty() => {
            let ids: Vec<Uuid> = rows.iter().map(|p| p.id).collect();
            votes::table
                .filter(votes::user_id.eq(viewer_id))
                .filter(votes::project_id.eq_any(&ids))
                .select((votes::project_id, votes::vote_type))
                .load::<(Uuid, String)>(conn)?
                .into_iter()
                .filter_map(|(project_id, vote_type)| vote_type.parse().ok().map(|dir| (project_id, dir)))
                .collect()
        }
        _ => HashMap::new(),
    };

    Ok(rows
        .into_iter()
        .map(|p| {
            let avatar = avatars.get(&p.author_id).cloned();
            let user_vote = user_votes.get(&p.id).copied();
            ProjectView::build(p, avatar, user_vote)
        })
        .collect())
}

pub fn create(conn: &mut PgConnection, author: &AuthUser, submission: ProjectSubmission) -> AppResult<Project> {
    // Snapshot the author as their profile shows them now.
    let profile = profile_service::find_by_user(conn, author.id)?;
    let author_name = profile
        .as_ref()
        .and_then(profile_service::public_name)
        .unwrap_or_else(|| author.display_name());
    let author_avatar_url = profile
        .and_then(|p| p.avatar_url)
        .or_else(|| author.avatar_url.clone());

    let project = conn.transaction::<_, AppError, _>(|conn| {
        let project = diesel::insert_into(projects::table)
            .values(&NewProject {
                title: submission.title,
                short_description: submission.short_description,
                full_description: submission.full_description,
                thumbnail_url: submission.thumbnail_url,
                media_url: submission.media_url,
                code_embed_url: submission.code_embed_url,
                author_id: author.id,
                author_name,
                author_avatar_url,
            })
            .get_result::<Project>(conn)?;

        insert_gallery(conn, project.id, &submission.images)?;
        Ok(project)
    })?;

    tracing::info!(project_id = %project.id, user_id = %author.id, "project created");
    Ok(project)
}

pub fn update(
    conn: &mut PgConnection,
    project_id: Uuid,
    caller: Uuid,
    submission: ProjectSubmission,
) -> AppResult<Project> {
    let project = conn.transaction::<_, AppError, _>(|conn| {
        let existing = projects::table
            .find(project_id)
            .for_update()
            .first::<Project>(conn)
            .optional()?
            .ok_or_else(|| AppError::new(ErrorCode::ProjectNotFound, "project not found"))?;
        ensure_owner(&existing, caller)?;

        let changes = ProjectChanges {
            title: submission.title,
            short_description: submission.short_description,
            full_description: submission.full_description,
            thumbnail_url: submission.thumbnail_url,
            media_url: submission.media_url,
            code_embed_url: submission.code_embed_url,
        };
        let project = diesel::update(projects::table.find(project_id))
            .set((&changes, projects::updated_at.eq(Utc::now())))
            .get_result::<Project>(conn)?;

        if submission.replaces_gallery {
            diesel::delete(project_images::table.filter(project_images::project_id.eq(project_id)))
                .execute(conn)?;
            insert_gallery(conn, project_id, &submission.images)?;
        }
        Ok(project)
    })?;

    tracing::info!(project_id = %project_id, user_id = %caller, "project updated");
    Ok(project)
}

/// Images, votes and comments go with the project through the FK cascade.
pub fn delete(conn: &mut PgConnection, project_id: Uuid, caller: Uuid) -> AppResult<Project> {
    let project = load(conn, project_id)?;
    ensure_owner(&project, caller)?;

    diesel::delete(projects::table.find(project_id)).execute(conn)?;

    tracing::info!(project_id = %project_id, user_id = %caller, "project deleted");
    Ok(project)
}

pub fn ensure_owner(project: &Project, caller: Uuid) -> AppResult<()> {
    if project.author_id != caller {
        return Err(AppError::new(ErrorCode::NotProjectOwner, "only the author can change this project"));
    }
    Ok(())
}

fn insert_gallery(conn: &mut PgConnection, project_id: Uuid, images: &[GalleryImage]) -> AppResult<()> {
    if images.is_empty() {
        return Ok(());
    }
    let rows: Vec<NewProjectImage> = images
        .iter()
        .map(|image| NewProjectImage {
            project_id,
            url: image.url.clone(),
            alt_text: image.alt_text.clone(),
            display_order: image.display_order,
            is_thumbnail: image.is_thumbnail,
        })
        .collect();

    diesel::insert_into(project_images::table)
        .values(&rows)
        .execute(conn)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_author_owns_project() {
        let author = Uuid::new_v4();
        let project = Project {
            id: Uuid::new_v4(),
            title: "t".into(),
            short_description: "s".into(),
            full_description: "f".into(),
            thumbnail_url: "https://a/1.png".into(),
            media_url: None,
            code_embed_url: None,
            author_id: author,
            author_name: "Ada".into(),
            author_avatar_url: None,
            upvotes: 0,
            downvotes: 0,
            net_votes: 0,
            comments_count: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(ensure_owner(&project, author).is_ok());
        assert_eq!(
            ensure_owner(&project, Uuid::new_v4()).unwrap_err().code(),
            Some(ErrorCode::NotProjectOwner)
        );
    }
}
