use serde::{Deserialize, Serialize};
use validator::Validate;

use hatchr_shared::errors::{AppError, ErrorCode};

/// Body of `POST /api/projects` and `PUT /api/projects/:id`. Every field is
/// optional at the serde level so missing fields surface as validation
/// errors instead of body rejections.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectPayload {
    pub title: Option<String>,
    pub short_description: Option<String>,
    pub full_description: Option<String>,
    pub thumbnail_url: Option<String>,
    pub media_url: Option<String>,
    pub code_embed_url: Option<String>,
    pub images: Option<Vec<ImagePayload>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImagePayload {
    pub url: Option<String>,
    pub alt_text: Option<String>,
    pub display_order: Option<i32>,
    pub is_thumbnail: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GalleryImage {
    pub url: String,
    pub alt_text: Option<String>,
    pub display_order: i32,
    pub is_thumbnail: bool,
}

/// A project body that passed validation, with blanks normalised and the
/// thumbnail resolved.
#[derive(Debug, Clone, Validate)]
pub struct ProjectSubmission {
    #[validate(length(min = 1, max = 120, message = "title is required (max 120 characters)"))]
    pub title: String,
    #[validate(length(min = 1, max = 300, message = "short description is required (max 300 characters)"))]
    pub short_description: String,
    #[validate(length(min = 1, message = "full description is required"))]
    pub full_description: String,
    #[validate(url(message = "media url must be a valid URL"))]
    pub media_url: Option<String>,
    #[validate(url(message = "code embed url must be a valid URL"))]
    pub code_embed_url: Option<String>,
    #[validate(length(max = 10, message = "at most 10 images"))]
    pub images: Vec<GalleryImage>,
    pub thumbnail_url: String,
    /// `true` when the body carried an `images` array, so an edit replaces the gallery.
    pub replaces_gallery: bool,
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl ProjectPayload {
    pub fn into_submission(self) -> Result<ProjectSubmission, AppError> {
        let replaces_gallery = self.images.is_some();
        let mut images = Vec::new();
        for (index, image) in self.images.unwrap_or_default().into_iter().enumerate() {
            let url = trimmed(image.url).ok_or_else(|| {
                AppError::with_details(
                    ErrorCode::ValidationError,
                    "invalid fields: images",
                    serde_json::json!({ "images": format!("image {index} has no url") }),
                )
            })?;
            images.push(GalleryImage {
                url,
                alt_text: trimmed(image.alt_text),
                display_order: image.display_order.unwrap_or(index as i32),
                is_thumbnail: image.is_thumbnail.unwrap_or(false),
            });
        }

        let thumbnail_url = mark_thumbnail(&mut images).or_else(|| trimmed(self.thumbnail_url));

        let submission = ProjectSubmission {
            title: trimmed(self.title).unwrap_or_default(),
            short_description: trimmed(self.short_description).unwrap_or_default(),
            full_description: trimmed(self.full_description).unwrap_or_default(),
            media_url: trimmed(self.media_url),
            code_embed_url: trimmed(self.code_embed_url),
            images,
            thumbnail_url: thumbnail_url.clone().unwrap_or_default(),
            replaces_gallery,
        };
        submission.validate()?;

        if thumbnail_url.is_none() {
            return Err(AppError::with_details(
                ErrorCode::MissingProjectImage,
                "at least one image is required",
                serde_json::json!({ "images": "provide an images array or a thumbnailUrl" }),
            ));
        }

        Ok(submission)
    }
}

/// Keeps exactly one image flagged as thumbnail (the first flagged one, else
/// the first image) and returns its url.
fn mark_thumbnail(images: &mut [GalleryImage]) -> Option<String> {
    let chosen = images.iter().position(|i| i.is_thumbnail).unwrap_or(0);
    for (index, image) in images.iter_mut().enumerate() {
        image.is_thumbnail = index == chosen;
    }
    images.get(chosen).map(|i| i.url.clone())
}
