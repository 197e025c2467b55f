use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::schema::{comments, connections, notifications, project_images, projects, user_profiles, votes};

// --- UserProfile ---

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = user_profiles)]
pub struct UserProfile {
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

#[derive(Debug, Insertable)]
#[diesel(table_name = user_profiles)]
pub struct NewUserProfile {
    pub user_id: Uuid,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub is_onboarded: bool,
}

/// Partial profile update. The outer `None` leaves a column untouched,
/// `Some(None)` clears it.
#[derive(Debug, Default, AsChangeset)]
#[diesel(table_name = user_profiles)]
pub struct ProfileChanges {
    pub username: Option<Option<String>>,
    pub display_name: Option<Option<String>>,
    pub bio: Option<Option<String>>,
    pub website: Option<Option<String>>,
    pub twitter: Option<Option<String>>,
    pub github: Option<Option<String>>,
    pub linkedin: Option<Option<String>>,
    pub avatar_url: Option<Option<String>>,
    pub location: Option<Option<String>>,
}

// --- Project ---

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = projects)]
pub struct Project {
    pub id: Uuid,
    pub title: String,
    pub short_description: String,
    pub full_description: String,
    pub thumbnail_url: String,
    pub media_url: Option<String>,
    pub code_embed_url: Option<String>,
    pub author_id: Uuid,
    pub author_name: String,
    pub author_avatar_url: Option<String>,
    pub upvotes: i32,
    pub downvotes: i32,
    pub net_votes: i32,
    pub comments_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = projects)]
pub struct NewProject {
    pub title: String,
    pub short_description: String,
    pub full_description: String,
    pub thumbnail_url: String,
    pub media_url: Option<String>,
    pub code_embed_url: Option<String>,
    pub author_id: Uuid,
    pub author_name: String,
    pub author_avatar_url: Option<String>,
}

/// Edits always rewrite the whole editable surface; `media_url` and
/// `code_embed_url` are written even when `None` so they can be cleared.
#[derive(Debug, AsChangeset)]
#[diesel(table_name = projects, treat_none_as_null = true)]
pub struct ProjectChanges {
    pub title: String,
    pub short_description: String,
    pub full_description: String,
    pub thumbnail_url: String,
    pub media_url: Option<String>,
    pub code_embed_url: Option<String>,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = project_images, belongs_to(Project))]
pub struct ProjectImage {
    pub id: Uuid,
    pub project_id: Uuid,
    pub url: String,
    pub alt_text: Option<String>,
    pub display_order: i32,
    pub is_thumbnail: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = project_images)]
pub struct NewProjectImage {
    pub project_id: Uuid,
    pub url: String,
    pub alt_text: Option<String>,
    pub display_order: i32,
    pub is_thumbnail: bool,
}

// --- Vote ---

#[derive(Debug, Insertable)]
#[diesel(table_name = votes)]
pub struct NewVote {
    pub project_id: Uuid,
    pub user_id: Uuid,
    pub vote_type: String,
}

// --- Comment ---

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = comments)]
pub struct Comment {
    pub id: Uuid,
    pub project_id: Uuid,
    pub author_id: Uuid,
    pub author_name: String,
    pub author_avatar_url: Option<String>,
    pub content: String,
    pub parent_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = comments)]
pub struct NewComment {
    pub project_id: Uuid,
    pub author_id: Uuid,
    pub author_name: String,
    pub author_avatar_url: Option<String>,
    pub content: String,
    pub parent_id: Option<Uuid>,
}

// --- Connection ---

/// A row of `connections`. Named apart from diesel's `Connection` trait.
#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = connections)]
pub struct UserConnection {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub recipient_id: Uuid,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserConnection {
    pub fn other_party(&self, user_id: Uuid) -> Uuid {
        if self.requester_id == user_id {
            self.recipient_id
        } else {
            self.requester_id
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = connections)]
pub struct NewConnection {
    pub requester_id: Uuid,
    pub recipient_id: Uuid,
    pub status: String,
}

// --- Notification ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    ConnectionRequest,
    ConnectionAccepted,
    NewVote,
    NewComment,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConnectionRequest => "connection_request",
            Self::ConnectionAccepted => "connection_accepted",
            Self::NewVote => "new_vote",
            Self::NewComment => "new_comment",
        }
    }
}

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = notifications)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub actor_id: Option<Uuid>,
    pub notification_type: String,
    pub data: serde_json::Value,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = notifications)]
pub struct NewNotification {
    pub user_id: Uuid,
    pub actor_id: Option<Uuid>,
    pub notification_type: String,
    pub data: serde_json::Value,
}
