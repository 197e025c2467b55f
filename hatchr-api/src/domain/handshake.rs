use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use hatchr_shared::errors::{AppError, ErrorCode};

use crate::models::UserConnection;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Pending,
    Accepted,
    Declined,
}

impl ConnectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Declined => "declined",
        }
    }

    /// Status a recipient may answer with. `pending` is not an answer.
    pub fn parse_response(raw: Option<&str>) -> Result<Self, AppError> {
        match raw.map(str::parse::<Self>) {
            Some(Ok(status @ (Self::Accepted | Self::Declined))) => Ok(status),
            _ => Err(AppError::new(
                ErrorCode::InvalidConnectionStatus,
                "status must be \"accepted\" or \"declined\"",
            )),
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConnectionStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "declined" => Ok(Self::Declined),
            other => Err(AppError::new(
                ErrorCode::InvalidConnectionStatus,
                format!("unknown connection status \"{other}\""),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestPlan {
    Create,
    /// The caller already has a pending request out to this user.
    AlreadyPending(Uuid),
}

/// Decides what a connection request from `caller` to `recipient` does, given
/// the rows that already link the pair in either direction.
pub fn plan_request(caller: Uuid, recipient: Uuid, existing: &[UserConnection]) -> Result<RequestPlan, AppError> {
    if caller == recipient {
        return Err(AppError::new(ErrorCode::CannotConnectSelf, "cannot connect with yourself"));
    }

    let mut pending_outgoing = None;
    for link in existing {
        let status: ConnectionStatus = link.status.parse()?;
        match status {
            ConnectionStatus::Pending if link.requester_id == caller => pending_outgoing = Some(link.id),
            ConnectionStatus::Pending => {
                return Err(AppError::new(
                    ErrorCode::ConnectionAlreadyExists,
                    "this user has already sent you a connection request",
                ));
            }
            ConnectionStatus::Accepted => {
                return Err(AppError::new(ErrorCode::ConnectionAlreadyExists, "you are already connected"));
            }
            ConnectionStatus::Declined => {
                return Err(AppError::new(
                    ErrorCode::ConnectionAlreadyExists,
                    "a previous connection request was declined",
                ));
            }
        }
    }

    Ok(pending_outgoing.map_or(RequestPlan::Create, RequestPlan::AlreadyPending))
}

/// Only the recipient answers, and only while the request is pending.
pub fn ensure_can_respond(caller: Uuid, link: &UserConnection) -> Result<(), AppError> {
    if link.recipient_id != caller {
        return Err(AppError::new(
            ErrorCode::NotConnectionRecipient,
            "only the recipient can respond to a connection request",
        ));
    }
    if link.status.parse::<ConnectionStatus>()? != ConnectionStatus::Pending {
        return Err(AppError::new(ErrorCode::ConnectionNotPending, "connection request was already answered"));
    }
    Ok(())
}

pub fn ensure_party(caller: Uuid, link: &UserConnection) -> Result<(), AppError> {
    if link.requester_id != caller && link.recipient_id != caller {
        return Err(AppError::new(ErrorCode::NotConnectionParty, "you are not part of this connection"));
    }
    Ok(())
}

/// How a connection looks from one side of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Relationship {
    None,
    Outgoing,
    Incoming,
    Connected,
    Declined,
}

pub fn classify(viewer: Uuid, link: Option<&UserConnection>) -> Relationship {
    let Some(link) = link else {
        return Relationship::None;
    };
    match link.status.parse::<ConnectionStatus>() {
        Ok(ConnectionStatus::Accepted) => Relationship::Connected,
        Ok(ConnectionStatus::Declined) => Relationship::Declined,
        Ok(ConnectionStatus::Pending) if link.requester_id == viewer => Relationship::Outgoing,
        Ok(ConnectionStatus::Pending) => Relationship::Incoming,
        Err(_) => Relationship::None,
    }
}
