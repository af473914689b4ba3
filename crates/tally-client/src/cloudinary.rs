use std::time::Duration;

use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use sha2::{Digest, Sha256};

use tally_core::error::AppError;

const API_BASE: &str = "https://api.cloudinary.com/v1_1";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Cloudinary account credentials for signed admin calls.
#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
}

impl CloudinaryConfig {
    /// Read credentials from `CLOUDINARY_CLOUD_NAME`, `CLOUDINARY_API_KEY`,
    /// and `CLOUDINARY_API_SECRET`. Returns `None` when any is unset, in
    /// which case the media endpoints are simply disabled.
    pub fn from_env() -> Option<Self> {
        Some(Self {
            cloud_name: std::env::var("CLOUDINARY_CLOUD_NAME").ok()?,
            api_key: std::env::var("CLOUDINARY_API_KEY").ok()?,
            api_secret: std::env::var("CLOUDINARY_API_SECRET").ok()?,
        })
    }
}

/// Signed client for the Cloudinary admin API.
///
/// The mobile clients upload avatars and prize images straight to the CDN;
/// the server only ever needs the deletion call, proxied so the API secret
/// never ships in an app bundle.
#[derive(Clone)]
pub struct CloudinaryClient {
    client: Client,
    config: CloudinaryConfig,
    timeout_secs: u64,
}

impl CloudinaryClient {
    pub fn new(config: CloudinaryConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| AppError::Upstream(e.to_string()))?;

        Ok(Self {
            client,
            config,
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
        })
    }

    /// Delete an uploaded image by its public id.
    ///
    /// Returns Cloudinary's result string: `"ok"` on deletion, `"not found"`
    /// for an unknown public id.
    pub async fn destroy(&self, public_id: &str) -> Result<String, AppError> {
        let url = format!("{API_BASE}/{}/image/destroy", self.config.cloud_name);
        let timestamp = Utc::now().timestamp().to_string();

        let signature = sign(
            &[("public_id", public_id), ("timestamp", &timestamp)],
            &self.config.api_secret,
        );

        let form = [
            ("public_id", public_id),
            ("timestamp", timestamp.as_str()),
            ("api_key", self.config.api_key.as_str()),
            ("signature", signature.as_str()),
            ("signature_algorithm", "sha256"),
        ];

        let response = self
            .client
            .post(&url)
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::Timeout(self.timeout_secs)
                } else {
                    AppError::Upstream(format!("Cloudinary request failed: {e}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<CloudinaryError>(&body)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| format!("HTTP {status}: {body}"));
            return Err(AppError::Upstream(format!("Cloudinary: {message}")));
        }

        let outcome: DestroyResponse = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Failed to parse Cloudinary response: {e}")))?;

        tracing::info!(public_id, result = %outcome.result, "Cloudinary destroy");

        Ok(outcome.result)
    }
}

/// Cloudinary request signature: parameters sorted by name, serialized as
/// `k=v` pairs joined with `&`, the API secret appended, SHA-256, hex.
fn sign(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut sorted: Vec<_> = params.to_vec();
    sorted.sort_by_key(|(k, _)| *k);

    let to_sign = sorted
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    format!("{:x}", hasher.finalize())
}

// ---- Cloudinary API types ----

#[derive(Deserialize)]
struct DestroyResponse {
    result: String,
}

#[derive(Deserialize)]
struct CloudinaryError {
    error: CloudinaryErrorDetail,
}

#[derive(Deserialize)]
struct CloudinaryErrorDetail {
    message: String,
}
