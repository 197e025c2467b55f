use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Change-feed envelope published for every mutation.
///
/// Routing key format: `hatchr.{table}.{action}`
/// Example: `hatchr.votes.changed`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event<T: Serialize> {
    pub id: Uuid,
    pub source: String,
    pub event_type: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
    pub data: T,
}

impl<T: Serialize> Event<T> {
    pub fn new(source: impl Into<String>, event_type: impl Into<String>, data: T) -> Self {
        Self {
            id: Uuid::now_v7(),
            source: source.into(),
            event_type: event_type.into(),
            timestamp: Utc::now(),
            user_id: None,
            data,
        }
    }

    pub fn with_user(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }
}

/// RabbitMQ routing keys
pub mod routing_keys {
    pub const VOTES_CHANGED: &str = "hatchr.votes.changed";

    pub const PROJECTS_CREATED: &str = "hatchr.projects.created";
    pub const PROJECTS_UPDATED: &str = "hatchr.projects.updated";
    pub const PROJECTS_DELETED: &str = "hatchr.projects.deleted";

    pub const COMMENTS_CREATED: &str = "hatchr.comments.created";

    pub const CONNECTIONS_CHANGED: &str = "hatchr.connections.changed";

    pub const NOTIFICATIONS_CREATED: &str = "hatchr.notifications.created";
}

pub mod payloads {
    use serde::{Deserialize, Serialize};
    use uuid::Uuid;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct VotesChanged {
        pub project_id: Uuid,
        pub voter_id: Uuid,
        pub upvotes: i32,
        pub downvotes: i32,
        pub net_votes: i32,
        pub user_vote: Option<String>,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ProjectChanged {
        pub project_id: Uuid,
        pub author_id: Uuid,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub title: Option<String>,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CommentCreated {
        pub comment_id: Uuid,
        pub project_id: Uuid,
        pub author_id: Uuid,
        pub parent_id: Option<Uuid>,
    }

    /// `change` is one of `requested`, `accepted`, `declined`, `removed`.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ConnectionChanged {
        pub connection_id: Uuid,
        pub requester_id: Uuid,
        pub recipient_id: Uuid,
        pub change: String,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct NotificationCreated {
        pub notification_id: Uuid,
        pub user_id: Uuid,
        pub notification_type: String,
    }
}
