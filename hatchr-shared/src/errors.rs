use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::types::ApiErrorResponse;

/// Application error codes following the pattern E{area}{sequence}
///
/// Ranges:
/// - E0xxx: Shared/infrastructure errors
/// - E1xxx: Token errors
/// - E2xxx: Profile errors
/// - E3xxx: Project, vote and comment errors
/// - E4xxx: Connection errors
/// - E5xxx: Notification errors
/// - E6xxx: Media storage errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Shared (E0xxx)
    InternalError,
    ValidationError,
    NotFound,
    Unauthorized,
    ServiceUnavailable,
    BadRequest,
    PayloadTooLarge,
    Conflict,

    // Tokens (E1xxx)
    TokenExpired,
    TokenInvalid,

    // Profiles (E2xxx)
    ProfileNotFound,
    UsernameTaken,
    InvalidUsername,

    // Projects (E3xxx)
    ProjectNotFound,
    NotProjectOwner,
    InvalidVoteDirection,
    InvalidParentComment,
    MissingProjectImage,

    // Connections (E4xxx)
    ConnectionNotFound,
    CannotConnectSelf,
    ConnectionAlreadyExists,
    NotConnectionRecipient,
    NotConnectionParty,
    ConnectionNotPending,
    InvalidConnectionStatus,

    // Notifications (E5xxx)
    NotificationNotFound,

    // Storage (E6xxx)
    StorageUnavailable,
    UploadFailed,
    UnsupportedMediaType,
}

impl ErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            // Shared
            Self::InternalError => "E0001",
            Self::ValidationError => "E0002",
            Self::NotFound => "E0003",
            Self::Unauthorized => "E0004",
            Self::ServiceUnavailable => "E0006",
            Self::BadRequest => "E0007",
            Self::PayloadTooLarge => "E0008",
            Self::Conflict => "E0009",

            // Tokens
            Self::TokenExpired => "E1001",
            Self::TokenInvalid => "E1002",

            // Profiles
            Self::ProfileNotFound => "E2001",
            Self::UsernameTaken => "E2002",
            Self::InvalidUsername => "E2003",

            // Projects
            Self::ProjectNotFound => "E3001",
            Self::NotProjectOwner => "E3002",
            Self::InvalidVoteDirection => "E3003",
            Self::InvalidParentComment => "E3005",
            Self::MissingProjectImage => "E3006",

            // Connections
            Self::ConnectionNotFound => "E4001",
            Self::CannotConnectSelf => "E4002",
            Self::ConnectionAlreadyExists => "E4003",
            Self::NotConnectionRecipient => "E4004",
            Self::NotConnectionParty => "E4005",
            Self::ConnectionNotPending => "E4006",
            Self::InvalidConnectionStatus => "E4007",

            // Notifications
            Self::NotificationNotFound => "E5001",

            // Storage
            Self::StorageUnavailable => "E6001",
            Self::UploadFailed => "E6002",
            Self::UnsupportedMediaType => "E6003",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ServiceUnavailable | Self::StorageUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::ValidationError | Self::BadRequest | Self::InvalidUsername
            | Self::InvalidVoteDirection | Self::InvalidParentComment | Self::MissingProjectImage
            | Self::CannotConnectSelf | Self::InvalidConnectionStatus => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::NotFound | Self::ProfileNotFound | Self::ProjectNotFound
            | Self::ConnectionNotFound
            | Self::NotificationNotFound => StatusCode::NOT_FOUND,
            Self::Unauthorized | Self::TokenExpired | Self::TokenInvalid => StatusCode::UNAUTHORIZED,
            Self::NotProjectOwner | Self::NotConnectionRecipient
            | Self::NotConnectionParty => StatusCode::FORBIDDEN,
            Self::Conflict | Self::UsernameTaken | Self::ConnectionAlreadyExists
            | Self::ConnectionNotPending => StatusCode::CONFLICT,
            Self::UploadFailed => StatusCode::BAD_GATEWAY,
            Self::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{message}")]
    Known {
        code: ErrorCode,
        message: String,
        details: Option<serde_json::Value>,
    },

    #[error("internal server error")]
    Internal(#[from] anyhow::Error),

    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("database pool error: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),
}

impl AppError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Known {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(code: ErrorCode, message: impl Into<String>, details: serde_json::Value) -> Self {
        Self::Known {
            code,
            message: message.into(),
            details: Some(details),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, message)
    }

    /// Status the error renders with, without building the response.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Known { code, .. } => code.status_code(),
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Database(diesel::result::Error::NotFound) => StatusCode::NOT_FOUND,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Pool(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Returns the error code for known errors.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            AppError::Known { code, .. } => Some(*code),
            _ => None,
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let details = serde_json::to_value(&errors).unwrap_or(serde_json::Value::Null);
        let fields: Vec<&str> = errors.field_errors().keys().copied().collect();
        let message = if fields.is_empty() {
            "invalid request".to_string()
        } else {
            format!("invalid fields: {}", fields.join(", "))
        };
        Self::with_details(ErrorCode::ValidationError, message, details)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_response = match &self {
            AppError::Known { code, message, details } => {
                let mut resp = ApiErrorResponse::new(code.code(), message);
                if let Some(d) = details {
                    resp = resp.with_details(d.clone());
                }
                resp
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "internal server error");
                ApiErrorResponse::new(ErrorCode::InternalError.code(), "internal server error")
            }
            AppError::Database(err) => {
                tracing::error!(error = %err, "database error");
                match err {
                    diesel::result::Error::NotFound => {
                        ApiErrorResponse::new(ErrorCode::NotFound.code(), "resource not found")
                    }
                    _ => ApiErrorResponse::new(ErrorCode::InternalError.code(), "database error"),
                }
            }
            AppError::Pool(err) => {
                tracing::error!(error = %err, "database pool exhausted or unreachable");
                ApiErrorResponse::new(ErrorCode::ServiceUnavailable.code(), "database unavailable")
            }
        };

        (status, Json(error_response)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
