use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::errors::{AppError, ErrorCode};
use crate::types::auth::{AuthUser, Claims};

/// Verifier for the identity provider's HS256 tokens.
#[derive(Clone)]
pub struct AuthSettings {
    decoding: DecodingKey,
    encoding: EncodingKey,
    audience: Option<String>,
}

impl AuthSettings {
    pub fn new(secret: &str, audience: Option<String>) -> Self {
        Self {
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            audience: audience.filter(|a| !a.is_empty()),
        }
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        match &self.audience {
            Some(aud) => validation.set_audience(&[aud]),
            None => validation.validate_aud = false,
        }

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AppError::new(ErrorCode::TokenExpired, "token has expired"),
            _ => AppError::new(ErrorCode::TokenInvalid, format!("invalid token: {e}")),
        })?;

        Ok(data.claims)
    }

    /// Signs claims with the shared secret. Only local tooling and tests mint
    /// tokens; production tokens come from the identity provider.
    pub fn sign(&self, claims: &Claims) -> Result<String, AppError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to sign token: {e}")))
    }
}

/// Gives the extractors access to the token verifier held in router state.
pub trait AuthState {
    fn auth_settings(&self) -> &AuthSettings;
}

impl AuthState for AuthSettings {
    fn auth_settings(&self) -> &AuthSettings {
        self
    }
}

impl<T: AuthState> AuthState for Arc<T> {
    fn auth_settings(&self) -> &AuthSettings {
        (**self).auth_settings()
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: AuthState + Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(&parts.headers)?;
        let claims = state.auth_settings().verify(token)?;

        if claims.is_expired() {
            return Err(AppError::new(ErrorCode::TokenExpired, "token has expired"));
        }

        Ok(AuthUser::from(claims))
    }
}

fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| AppError::unauthorized("missing authorization header"))?
        .to_str()
        .map_err(|_| AppError::unauthorized("invalid authorization header"))?;

    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::unauthorized("authorization header must use Bearer scheme"))
}

/// Resolves to `None` for anonymous callers and for tokens that fail verification.
pub struct OptionalAuthUser(pub Option<AuthUser>);

#[axum::async_trait]
impl<S> FromRequestParts<S> for OptionalAuthUser
where
    S: AuthState + Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match AuthUser::from_request_parts(parts, state).await {
            Ok(user) => Ok(Self(Some(user))),
            Err(_) => Ok(Self(None)),
        }
    }
}
