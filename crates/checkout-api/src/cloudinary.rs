//! # Cloudinary Uploader
//!
//! Signed image uploads for store logos and product images.

use async_trait::async_trait;
use checkout_core::{Asset, AssetUploader, CheckoutError, CheckoutResult, UploadedAsset};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::env;
use tracing::{error, info, instrument};

const SERVICE: &str = "cloudinary";

/// Folder uploads are filed under
pub const UPLOAD_FOLDER: &str = "checkout-pages";

/// Cloudinary account configuration
#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: SecretString,
    /// API base URL (for testing/mocking)
    pub api_base_url: String,
    pub folder: String,
}

impl CloudinaryConfig {
    /// Load configuration from environment variables.
    ///
    /// Required env vars:
    /// - `CLOUDINARY_CLOUD_NAME`
    /// - `CLOUDINARY_API_KEY`
    /// - `CLOUDINARY_API_SECRET`
    pub fn from_env() -> CheckoutResult<Self> {
        dotenvy::dotenv().ok();

        let required = |key: &str| {
            env::var(key)
                .ok()
                .filter(|v| !v.is_empty())
                .ok_or_else(|| CheckoutError::Configuration(format!("{} not set", key)))
        };

        let mut config = Self::new(
            required("CLOUDINARY_CLOUD_NAME")?,
            required("CLOUDINARY_API_KEY")?,
            required("CLOUDINARY_API_SECRET")?,
        );
        if let Ok(url) = env::var("CLOUDINARY_API_BASE_URL") {
            config.api_base_url = url;
        }
        Ok(config)
    }

    pub fn new(
        cloud_name: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        Self {
            cloud_name: cloud_name.into(),
            api_key: api_key.into(),
            api_secret: SecretString::from(api_secret.into()),
            api_base_url: "https://api.cloudinary.com".to_string(),
            folder: UPLOAD_FOLDER.to_string(),
        }
    }

    /// Builder: set custom API base URL (for testing)
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    pub fn upload_url(&self) -> String {
        format!("{}/v1_1/{}/image/upload", self.api_base_url, self.cloud_name)
    }
}

/// Request signature: sha256 over the sorted signed params followed by the secret
pub fn sign_upload(folder: &str, timestamp: i64, api_secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("folder={}&timestamp={}", folder, timestamp));
    hasher.update(api_secret);
    hex::encode(hasher.finalize())
}

pub struct CloudinaryUploader {
    config: CloudinaryConfig,
    client: Client,
}

impl CloudinaryUploader {
    pub fn new(config: CloudinaryConfig) -> CheckoutResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .map_err(|e| {
                CheckoutError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { config, client })
    }

    /// Create from environment variables
    pub fn from_env() -> CheckoutResult<Self> {
        Self::new(CloudinaryConfig::from_env()?)
    }
}

#[async_trait]
impl AssetUploader for CloudinaryUploader {
    #[instrument(skip(self, asset), fields(file = %asset.file_name, size = asset.len()))]
    async fn upload(&self, asset: &Asset) -> CheckoutResult<UploadedAsset> {
        let timestamp = chrono::Utc::now().timestamp();
        let signature = sign_upload(
            &self.config.folder,
            timestamp,
            self.config.api_secret.expose_secret(),
        );

        let mut part = Part::bytes(asset.bytes.clone()).file_name(asset.file_name.clone());
        if let Some(content_type) = &asset.content_type {
            part = part.mime_str(content_type).map_err(|e| {
                CheckoutError::InvalidRequest(format!("Invalid content type: {}", e))
            })?;
        }

        let form = Form::new()
            .part("file", part)
            .text("api_key", self.config.api_key.clone())
            .text("timestamp", timestamp.to_string())
            .text("folder", self.config.folder.clone())
            .text("signature_algorithm", "sha256")
            .text("signature", signature);

        let response = self
            .client
            .post(self.config.upload_url())
            .multipart(form)
            .send()
            .await
            .map_err(|e| CheckoutError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CheckoutError::Network(e.to_string()))?;

        if !status.is_success() {
            error!("Cloudinary upload failed: status={}, body={}", status, body);
            let message = serde_json::from_str::<CloudinaryErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| format!("HTTP {}: {}", status, body));
            return Err(CheckoutError::upstream(SERVICE, message));
        }

        let uploaded: UploadedAsset = serde_json::from_str(&body).map_err(|e| {
            CheckoutError::Serialization(format!("Failed to parse Cloudinary response: {}", e))
        })?;

        info!("Uploaded {} as {}", asset.file_name, uploaded.public_id);
        Ok(uploaded)
    }
}

#[derive(Debug, Deserialize)]
struct CloudinaryErrorResponse {
    error: CloudinaryError,
}

#[derive(Debug, Deserialize)]
struct CloudinaryError {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_signature() {
        assert_eq!(
            sign_upload("checkout-pages", 1_700_000_000, "abcd"),
            "704130ad56c4508ae910483ce749c5ef67b2329377e181222bb24326c4ee17ad"
        );
    }

    #[test]
    fn test_upload_url() {
        let config = CloudinaryConfig::new("demo", "key", "secret");
        assert_eq!(
            config.upload_url(),
            "https://api.cloudinary.com/v1_1/demo/image/upload"
        );
        assert_eq!(config.folder, UPLOAD_FOLDER);
    }

    #[tokio::test]
    async fn test_upload_sends_signed_form() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1_1/demo/image/upload"))
            .and(body_string_contains("checkout-pages"))
            .and(body_string_contains("sha256"))
            .and(body_string_contains("logo.png"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "public_id": "checkout-pages/abc123",
                "secure_url": "https://res.cloudinary.com/demo/image/upload/checkout-pages/abc123.png",
                "format": "png",
                "bytes": 4,
                "width": 1,
                "height": 1
            })))
            .expect(1)
            .mount(&server)
            .await;

        let uploader = CloudinaryUploader::new(
            CloudinaryConfig::new("demo", "key", "secret").with_api_base_url(server.uri()),
        )
        .unwrap();
        let asset = Asset::new("logo.png", vec![0x89, b'P', b'N', b'G']).with_content_type("image/png");

        let uploaded = uploader.upload(&asset).await.unwrap();
        assert_eq!(uploaded.public_id, "checkout-pages/abc123");
        assert!(uploaded.secure_url.starts_with("https://"));
        assert_eq!(uploaded.width, Some(1));
    }

    #[tokio::test]
    async fn test_upload_error_message_passed_through() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": { "message": "Invalid Signature" }
            })))
            .mount(&server)
            .await;

        let uploader = CloudinaryUploader::new(
            CloudinaryConfig::new("demo", "key", "secret").with_api_base_url(server.uri()),
        )
        .unwrap();

        match uploader.upload(&Asset::new("a.png", vec![1])).await {
            Err(CheckoutError::Upstream { service, message }) => {
                assert_eq!(service, SERVICE);
                assert_eq!(message, "Invalid Signature");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
