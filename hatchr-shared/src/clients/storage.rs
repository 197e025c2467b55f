use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::Client as S3Client;

use crate::errors::{AppError, ErrorCode};

#[derive(Debug, Clone)]
pub struct StorageSettings {
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    pub bucket: String,
    /// Base URL clients use to fetch objects; defaults to the endpoint.
    pub public_url: Option<String>,
}

/// S3-compatible bucket holding project images.
#[derive(Clone)]
pub struct ObjectStorage {
    client: S3Client,
    bucket: String,
    public_url: String,
}

impl ObjectStorage {
    pub async fn connect(settings: &StorageSettings) -> Self {
        let credentials = Credentials::new(
            &settings.access_key,
            &settings.secret_key,
            None,
            None,
            "hatchr-storage",
        );

        let config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(&settings.endpoint)
            .region(Region::new("us-east-1"))
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        let client = S3Client::from_conf(config);

        // Fails harmlessly when the bucket already exists.
        if let Err(e) = client.create_bucket().bucket(&settings.bucket).send().await {
            tracing::debug!(bucket = %settings.bucket, error = %e, "create_bucket skipped");
        }

        tracing::info!(endpoint = %settings.endpoint, bucket = %settings.bucket, "object storage initialized");

        let public_url = settings
            .public_url
            .clone()
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| settings.endpoint.clone());

        Self {
            client,
            bucket: settings.bucket.clone(),
            public_url: public_url.trim_end_matches('/').to_string(),
        }
    }

    /// Stores the object and returns its public URL.
    pub async fn upload(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<String, AppError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body.into())
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(key, error = %e, "object upload failed");
                AppError::new(ErrorCode::UploadFailed, "upload to storage failed")
            })?;

        Ok(self.public_url_for(key))
    }

    pub fn public_url_for(&self, key: &str) -> String {
        format!("{}/{}/{}", self.public_url, self.bucket, key)
    }
}
