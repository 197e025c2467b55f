use serde::Serialize;
use uuid::Uuid;

use hatchr_shared::clients::rabbitmq::RabbitMQClient;
use hatchr_shared::types::event::{payloads, routing_keys, Event};

use crate::domain::voting::{VoteDirection, VoteTally};
use crate::models::{Comment, Notification, Project, UserConnection};

const SOURCE: &str = "hatchr-api";

/// Publishes row changes to the broker feeding the realtime platform.
/// Without a broker every publish is a no-op; failures are logged, never
/// returned, so a broker outage cannot fail a request.
#[derive(Clone, Default)]
pub struct ChangeFeed {
    rabbitmq: Option<RabbitMQClient>,
}

impl ChangeFeed {
    pub fn new(rabbitmq: Option<RabbitMQClient>) -> Self {
        if rabbitmq.is_none() {
            tracing::debug!("change feed disabled: no RabbitMQ url configured");
        }
        Self { rabbitmq }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    async fn emit<T: Serialize>(&self, routing_key: &str, actor: Uuid, data: T) {
        let Some(rabbitmq) = &self.rabbitmq else {
            return;
        };
        let event = Event::new(SOURCE, routing_key, data).with_user(actor);
        if let Err(e) = rabbitmq.publish(routing_key, &event).await {
            tracing::error!(routing_key, error = %e, "failed to publish change event");
        }
    }

    pub async fn votes_changed(&self, project_id: Uuid, voter_id: Uuid, tally: VoteTally, user_vote: Option<VoteDirection>) {
        let data = payloads::VotesChanged {
            project_id,
            voter_id,
            upvotes: tally.up,
            downvotes: tally.down,
            net_votes: tally.net(),
            user_vote: user_vote.map(|d| d.as_str().to_string()),
        };
        self.emit(routing_keys::VOTES_CHANGED, voter_id, data).await;
    }

    pub async fn project_created(&self, project: &Project) {
        self.emit(routing_keys::PROJECTS_CREATED, project.author_id, project_payload(project, true)).await;
    }

    pub async fn project_updated(&self, project: &Project) {
        self.emit(routing_keys::PROJECTS_UPDATED, project.author_id, project_payload(project, true)).await;
    }

    pub async fn project_deleted(&self, project: &Project) {
        self.emit(routing_keys::PROJECTS_DELETED, project.author_id, project_payload(project, false)).await;
    }

    pub async fn comment_created(&self, comment: &Comment) {
        let data = payloads::CommentCreated {
            comment_id: comment.id,
            project_id: comment.project_id,
            author_id: comment.author_id,
            parent_id: comment.parent_id,
        };
        self.emit(routing_keys::COMMENTS_CREATED, comment.author_id, data).await;
    }

    pub async fn connection_changed(&self, link: &UserConnection, actor: Uuid, change: &str) {
        let data = payloads::ConnectionChanged {
            connection_id: link.id,
            requester_id: link.requester_id,
            recipient_id: link.recipient_id,
            change: change.to_string(),
        };
        self.emit(routing_keys::CONNECTIONS_CHANGED, actor, data).await;
    }

    pub async fn notification_created(&self, notification: &Notification) {
        let data = payloads::NotificationCreated {
            notification_id: notification.id,
            user_id: notification.user_id,
            notification_type: notification.notification_type.clone(),
        };
        let actor = notification.actor_id.unwrap_or(notification.user_id);
        self.emit(routing_keys::NOTIFICATIONS_CREATED, actor, data).await;
    }
}

fn project_payload(project: &Project, with_title: bool) -> payloads::ProjectChanged {
    payloads::ProjectChanged {
        project_id: project.id,
        author_id: project.author_id,
        title: with_title.then(|| project.title.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disabled_feed_swallows_events() {
        let feed = ChangeFeed::disabled();
        feed.votes_changed(Uuid::new_v4(), Uuid::new_v4(), VoteTally { up: 1, down: 0 }, Some(VoteDirection::Up))
            .await;
    }
}
