//! JSON shapes returned by the API. Columns are snake_case, views camelCase.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::handshake::Relationship;
use crate::domain::threads::ThreadItem;
use crate::domain::voting::{VoteDirection, VoteTally};
use crate::models::{Comment, Notification, Project, ProjectImage, UserConnection, UserProfile};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileView {
    pub id: Uuid,
    pub user_id: Uuid,
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub website: Option<String>,
    pub twitter: Option<String>,
    pub github: Option<String>,
    pub linkedin: Option<String>,
    pub avatar_url: Option<String>,
    pub location: Option<String>,
    pub is_onboarded: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserProfile> for ProfileView {
    fn from(p: UserProfile) -> Self {
        Self {
            id: p.id,
            user_id: p.user_id,
            username: p.username,
            display_name: p.display_name,
            bio: p.bio,
            website: p.website,
            twitter: p.twitter,
            github: p.github,
            linkedin: p.linkedin,
            avatar_url: p.avatar_url,
            location: p.location,
            is_onboarded: p.is_onboarded,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileStats {
    pub total_projects: i64,
    pub total_votes: i64,
    pub total_comments: i64,
    pub total_connections: i64,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicProfileView {
    #[serde(flatten)]
    pub profile: ProfileView,
    pub stats: ProfileStats,
    /// Present only for signed-in viewers looking at someone else.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relationship: Option<Relationship>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsernameAvailability {
    pub username: String,
    pub available: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorView {
    pub id: Uuid,
    pub name: String,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct VoteCounts {
    pub up: i32,
    pub down: i32,
    pub net: i32,
}

impl From<VoteTally> for VoteCounts {
    fn from(t: VoteTally) -> Self {
        Self { up: t.up, down: t.down, net: t.net() }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageView {
    pub id: Uuid,
    pub url: String,
    pub alt_text: Option<String>,
    pub display_order: i32,
    pub is_thumbnail: bool,
}

impl From<ProjectImage> for ImageView {
    fn from(i: ProjectImage) -> Self {
        Self {
            id: i.id,
            url: i.url,
            alt_text: i.alt_text,
            display_order: i.display_order,
            is_thumbnail: i.is_thumbnail,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectView {
    pub id: Uuid,
    pub title: String,
    pub short_description: String,
    pub full_description: String,
    pub thumbnail_url: String,
    pub media_url: Option<String>,
    pub code_embed_url: Option<String>,
    pub author: AuthorView,
    pub votes: VoteCounts,
    pub comments_count: i32,
    pub user_vote: Option<VoteDirection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<ImageView>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProjectView {
    /// `current_avatar` is the author's profile avatar today; the snapshot
    /// taken at submission is the fallback.
    pub fn build(project: Project, current_avatar: Option<String>, user_vote: Option<VoteDirection>) -> Self {
        Self {
            author: AuthorView {
                id: project.author_id,
                name: project.author_name,
                avatar_url: current_avatar.or(project.author_avatar_url),
            },
            votes: VoteCounts {
                up: project.upvotes,
                down: project.downvotes,
                net: project.net_votes,
            },
            id: project.id,
            title: project.title,
            short_description: project.short_description,
            full_description: project.full_description,
            thumbnail_url: project.thumbnail_url,
            media_url: project.media_url,
            code_embed_url: project.code_embed_url,
            comments_count: project.comments_count,
            user_vote,
            images: None,
            created_at: project.created_at,
            updated_at: project.updated_at,
        }
    }

    pub fn with_images(mut self, images: Vec<ProjectImage>) -> Self {
        self.images = Some(images.into_iter().map(ImageView::from).collect());
        self
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteResult {
    pub project_id: Uuid,
    pub votes: VoteCounts,
    pub user_vote: Option<VoteDirection>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: Uuid,
    pub project_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub author: AuthorView,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl CommentView {
    pub fn build(comment: Comment, current_avatar: Option<String>) -> Self {
        Self {
            id: comment.id,
            project_id: comment.project_id,
            parent_id: comment.parent_id,
            author: AuthorView {
                id: comment.author_id,
                name: comment.author_name,
                avatar_url: current_avatar.or(comment.author_avatar_url),
            },
            content: comment.content,
            created_at: comment.created_at,
        }
    }
}

impl ThreadItem for CommentView {
    fn id(&self) -> Uuid {
        self.id
    }

    fn parent_id(&self) -> Option<Uuid> {
        self.parent_id
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionView {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub recipient_id: Uuid,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserConnection> for ConnectionView {
    fn from(c: UserConnection) -> Self {
        Self {
            id: c.id,
            requester_id: c.requester_id,
            recipient_id: c.recipient_id,
            status: c.status,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionWithUser {
    #[serde(flatten)]
    pub connection: ConnectionView,
    pub other_user: AuthorView,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorView {
    pub name: String,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationView {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: String,
    pub data: serde_json::Value,
    pub is_read: bool,
    pub actor_id: Option<Uuid>,
    pub actor: ActorView,
    pub created_at: DateTime<Utc>,
}

impl NotificationView {
    pub fn build(n: Notification, actor: ActorView) -> Self {
        Self {
            id: n.id,
            kind: n.notification_type,
            data: n.data,
            is_read: n.is_read,
            actor_id: n.actor_id,
            actor,
            created_at: n.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UnreadCount {
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct MarkedRead {
    pub updated: usize,
}

#[derive(Debug, Serialize)]
pub struct Deleted {
    pub deleted: bool,
}

#[derive(Debug, Serialize)]
pub struct UploadedImage {
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project() -> Project {
        Project {
            id: Uuid::new_v4(),
            title: "Hatchr".into(),
            short_description: "short".into(),
            full_description: "full".into(),
            thumbnail_url: "https://a/1.png".into(),
            media_url: None,
            code_embed_url: None,
            author_id: Uuid::new_v4(),
            author_name: "Ada".into(),
            author_avatar_url: Some("https://a/snapshot.png".into()),
            upvotes: 3,
            downvotes: 1,
            net_votes: 2,
            comments_count: 4,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn project_view_is_camel_case_with_vote_block() {
        let json = serde_json::to_value(ProjectView::build(project(), None, Some(VoteDirection::Up))).unwrap();
        assert_eq!(json["shortDescription"], "short");
        assert_eq!(json["votes"]["net"], 2);
        assert_eq!(json["commentsCount"], 4);
        assert_eq!(json["userVote"], "up");
        assert!(json.get("images").is_none());
    }

    #[test]
    fn current_avatar_wins_over_snapshot() {
        let view = ProjectView::build(project(), Some("https://a/now.png".into()), None);
        assert_eq!(view.author.avatar_url.as_deref(), Some("https://a/now.png"));
        let view = ProjectView::build(project(), None, None);
        assert_eq!(view.author.avatar_url.as_deref(), Some("https://a/snapshot.png"));
    }

    #[test]
    fn notification_type_field_is_renamed() {
        let n = Notification {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            actor_id: None,
            notification_type: "new_vote".into(),
            data: serde_json::json!({ "projectId": "x" }),
            is_read: false,
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(NotificationView::build(
            n,
            ActorView { name: "Someone".into(), avatar_url: None },
        ))
        .unwrap();
        assert_eq!(json["type"], "new_vote");
        assert_eq!(json["isRead"], false);
        assert_eq!(json["actor"]["name"], "Someone");
    }
}
