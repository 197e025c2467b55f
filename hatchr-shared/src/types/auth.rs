use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Profile hints the identity provider attaches to its tokens. Every field is
/// optional; OAuth providers fill different subsets.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
}

/// Claims of a bearer token issued by the external identity provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub exp: i64,
    #[serde(default)]
    pub iat: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub user_metadata: UserMetadata,
}

impl Claims {
    pub fn new(user_id: Uuid, duration_secs: i64) -> Self {
        let now = Utc::now().timestamp();
        Self {
            sub: user_id,
            exp: now + duration_secs,
            iat: now,
            aud: None,
            email: None,
            role: Some("authenticated".to_string()),
            user_metadata: UserMetadata::default(),
        }
    }

    pub fn with_audience(mut self, aud: impl Into<String>) -> Self {
        self.aud = Some(aud.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.user_metadata.full_name = Some(name.into());
        self
    }

    pub fn with_avatar(mut self, url: impl Into<String>) -> Self {
        self.user_metadata.avatar_url = Some(url.into());
        self
    }

    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }
}

/// The caller, as resolved from a verified token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: Option<String>,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
}

impl AuthUser {
    /// Name used for author snapshots: the provider name, else the local part
    /// of the email, else "anonymous".
    pub fn display_name(&self) -> String {
        if let Some(name) = self.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            return name.to_string();
        }
        self.email
            .as_deref()
            .and_then(|e| e.split('@').next())
            .filter(|local| !local.is_empty())
            .unwrap_or("anonymous")
            .to_string()
    }
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        let meta = claims.user_metadata;
        let name = meta.full_name.or(meta.name).or(meta.user_name);
        let avatar_url = meta.avatar_url.or(meta.picture);
        Self {
            id: claims.sub,
            email: claims.email,
            name,
            avatar_url,
        }
    }
}
