use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::Json;
use uuid::Uuid;

use hatchr_shared::errors::{AppError, AppResult, ErrorCode};
use hatchr_shared::types::auth::AuthUser;
use hatchr_shared::types::ApiResponse;

use crate::views::UploadedImage;
use crate::AppState;

pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Request body cap for the upload route: the file plus multipart framing.
pub const UPLOAD_BODY_LIMIT: usize = MAX_UPLOAD_BYTES + 64 * 1024;

pub fn image_extension(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        _ => None,
    }
}

pub fn object_key(user: &AuthUser, ext: &str) -> String {
    format!("project-images/{}/{}.{}", user.id, Uuid::now_v7(), ext)
}

// --- POST /api/uploads ---

pub async fn upload_image(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> AppResult<Json<ApiResponse<UploadedImage>>> {
    let storage = state
        .storage
        .as_ref()
        .ok_or_else(|| AppError::new(ErrorCode::StorageUnavailable, "image uploads are not configured"))?;

    let field = multipart
        .next_field()
        .await
        .map_err(|e| AppError::bad_request(format!("failed to read multipart body: {e}")))?
        .ok_or_else(|| AppError::bad_request("no file provided"))?;

    let content_type = field.content_type().unwrap_or("application/octet-stream").to_string();
    let ext = image_extension(&content_type).ok_or_else(|| {
        AppError::new(
            ErrorCode::UnsupportedMediaType,
            "unsupported image format, accepted: jpeg, png, webp, gif",
        )
    })?;

    let data = field
        .bytes()
        .await
        .map_err(|e| AppError::bad_request(format!("failed to read file data: {e}")))?;
    if data.is_empty() {
        return Err(AppError::bad_request("uploaded file is empty"));
    }
    if data.len() > MAX_UPLOAD_BYTES {
        return Err(AppError::new(ErrorCode::PayloadTooLarge, "image must be at most 10 MiB"));
    }

    let key = object_key(&user, ext);
    let url = storage.upload(&key, data.to_vec(), &content_type).await?;

    tracing::info!(user_id = %user.id, key = %key, bytes = data.len(), "image uploaded");
    Ok(Json(ApiResponse::ok(UploadedImage { url })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_web_image_types_are_accepted() {
        assert_eq!(image_extension("image/jpeg"), Some("jpg"));
        assert_eq!(image_extension("image/webp"), Some("webp"));
        assert_eq!(image_extension("image/svg+xml"), None);
        assert_eq!(image_extension("application/pdf"), None);
    }

    #[test]
    fn keys_are_scoped_per_user() {
        let user = AuthUser { id: Uuid::new_v4(), email: None, name: None, avatar_url: None };
        let key = object_key(&user, "png");
        assert!(key.starts_with(&format!("project-images/{}/", user.id)));
        assert!(key.ends_with(".png"));
        assert_ne!(key, object_key(&user, "png"));
    }
}
