use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use uuid::Uuid;

use hatchr_shared::errors::{AppError, AppResult, ErrorCode};
use hatchr_shared::types::auth::AuthUser;

use crate::domain::voting::{VoteAction, VoteDirection, VoteTally};
use crate::models::{NewVote, Notification, NotificationKind, Project};
use crate::schema::{projects, votes};
use crate::services::notification_service;

#[derive(Debug)]
pub struct VoteOutcome {
    pub project_id: Uuid,
    pub tally: VoteTally,
    pub user_vote: Option<VoteDirection>,
    pub notification: Option<Notification>,
}

/// Applies a vote request as a toggle and recounts the project's tallies,
/// all inside one transaction. The project row is locked so concurrent
/// votes on the same project recount one after another.
pub fn cast(conn: &mut PgConnection, project_id: Uuid, voter: &AuthUser, direction: VoteDirection) -> AppResult<VoteOutcome> {
    let (project, action, tally) = conn.transaction::<_, AppError, _>(|conn| {
        let project = projects::table
            .find(project_id)
            .for_update()
            .first::<Project>(conn)
            .optional()?
            .ok_or_else(|| AppError::new(ErrorCode::ProjectNotFound, "project not found"))?;

        let existing = votes::table
            .filter(votes::project_id.eq(project_id))
            .filter(votes::user_id.eq(voter.id))
            .select(votes::vote_type)
            .first::<String>(conn)
            .optional()?
            .and_then(|v| v.parse::<VoteDirection>().ok());

        let action = VoteAction::resolve(existing, direction);
        let now = Utc::now();
        match action {
            VoteAction::Insert(dir) => {
                diesel::insert_into(votes::table)
                    .values(&NewVote {
                        project_id,
                        user_id: voter.id,
                        vote_type: dir.as_str().to_string(),
                    })
                    .on_conflict((votes::project_id, votes::user_id))
                    .do_update()
                    .set((votes::vote_type.eq(dir.as_str()), votes::updated_at.eq(now)))
                    .execute(conn)?;
            }
            VoteAction::Switch(dir) => {
                diesel::update(
                    votes::table
                        .filter(votes::project_id.eq(project_id))
                        .filter(votes::user_id.eq(voter.id)),
                )
                .set((votes::vote_type.eq(dir.as_str()), votes::updated_at.eq(now)))
                .execute(conn)?;
            }
            VoteAction::Remove => {
                diesel::delete(
                    votes::table
                        .filter(votes::project_id.eq(project_id))
                        .filter(votes::user_id.eq(voter.id)),
                )
                .execute(conn)?;
            }
        }

        let tally = recount(conn, project_id)?;
        Ok((project, action, tally))
    })?;

    tracing::info!(
        project_id = %project_id,
        user_id = %voter.id,
        action = ?action,
        up = tally.up,
        down = tally.down,
        "vote recorded"
    );

    let notification = if action.is_new_vote() {
        notification_service::notify(
            conn,
            project.author_id,
            voter.id,
            NotificationKind::NewVote,
            serde_json::json!({
                "projectId": project.id,
                "projectTitle": project.title,
                "voterName": voter.display_name(),
                "direction": direction.as_str(),
            }),
        )
    } else {
        None
    };

    Ok(VoteOutcome {
        project_id,
        tally,
        user_vote: action.resulting_vote(),
        notification,
    })
}

/// Recounts from the vote rows rather than adjusting the cached counters.
fn recount(conn: &mut PgConnection, project_id: Uuid) -> AppResult<VoteTally> {
    let tally: VoteTally = votes::table
        .filter(votes::project_id.eq(project_id))
        .select(votes::vote_type)
        .load::<String>(conn)?
        .iter()
        .filter_map(|v| v.parse::<VoteDirection>().ok())
        .collect();

    diesel::update(projects::table.find(project_id))
        .set((
            projects::upvotes.eq(tally.up),
            projects::downvotes.eq(tally.down),
            projects::net_votes.eq(tally.net()),
        ))
        .execute(conn)?;

    Ok(tally)
}
