//! Image generation and object storage backends.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

use diary_core::ImageConfig;

use crate::error::{AgentError, Result};

/// Output size and guidance for generated images.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImageParams {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Prompt adherence.
    pub cfg_scale: f32,
    /// Images per request.
    pub number_of_images: u32,
}

impl Default for ImageParams {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 1280,
            cfg_scale: 6.5,
            number_of_images: 1,
        }
    }
}

/// Generates and stores diary images.
#[async_trait]
pub trait ImageBackend: Send + Sync {
    /// Generate one image and return it base64 encoded.
    async fn generate(&self, positive: &str, negative: &str, seed: u32) -> Result<String>;

    /// Store PNG bytes under `key`.
    async fn upload(&self, key: &str, png: Vec<u8>) -> Result<()>;
}

/// Backend speaking the text-to-image invoke contract over HTTP and storing
/// objects with plain `PUT` requests.
pub struct HttpImageBackend {
    client: reqwest::Client,
    api_url: Option<String>,
    object_store_url: Option<String>,
    model: String,
    params: ImageParams,
}

impl HttpImageBackend {
    /// Create a backend from configuration.
    pub fn from_config(config: &ImageConfig, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AgentError::Configuration(format!("HTTP client: {}", e)))?;
        Ok(Self {
            client,
            api_url: config.api_url.as_ref().map(|u| u.trim_end_matches('/').to_string()),
            object_store_url: config
                .object_store_url
                .as_ref()
                .map(|u| u.trim_end_matches('/').to_string()),
            model: config.model.clone(),
            params: ImageParams::default(),
        })
    }
}

#[derive(Deserialize)]
struct InvokeResponse {
    #[serde(default)]
    images: Vec<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Request body for a text-to-image invocation.
pub fn text_to_image_body(positive: &str, negative: &str, seed: u32, params: &ImageParams) -> serde_json::Value {
    json!({
        "taskType": "TEXT_IMAGE",
        "textToImageParams": {
            "text": positive,
            "negativeText": negative,
        },
        "imageGenerationConfig": {
            "cfgScale": params.cfg_scale,
            "seed": seed,
            "width": params.width,
            "height": params.height,
            "numberOfImages": params.number_of_images,
        }
    })
}

#[async_trait]
impl ImageBackend for HttpImageBackend {
    async fn generate(&self, positive: &str, negative: &str, seed: u32) -> Result<String> {
        let base = self
            .api_url
            .as_deref()
            .ok_or_else(|| AgentError::Configuration("IMAGE_API_URL is not set".into()))?;
        let url = format!("{}/model/{}/invoke", base, self.model);

        info!(seed, model = %self.model, "Generating image");
        let response = self
            .client
            .post(&url)
            .json(&text_to_image_body(positive, negative, seed, &self.params))
            .send()
            .await
            .map_err(|e| AgentError::backend("image", e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AgentError::backend("image", format!("{}: {}", status, text)));
        }

        let parsed: InvokeResponse = response
            .json()
            .await
            .map_err(|e| AgentError::ResponseParse(format!("image response: {}", e)))?;

        if let Some(error) = parsed.error {
            return Err(AgentError::backend("image", error));
        }
        parsed
            .images
            .into_iter()
            .next()
            .ok_or_else(|| AgentError::backend("image", "no images returned"))
    }

    async fn upload(&self, key: &str, png: Vec<u8>) -> Result<()> {
        let base = self
            .object_store_url
            .as_deref()
            .ok_or_else(|| AgentError::Configuration("OBJECT_STORE_URL is not set".into()))?;

        debug!(key, bytes = png.len(), "Uploading image");
        let response = self
            .client
            .put(format!("{}/{}", base, key))
            .header(reqwest::header::CONTENT_TYPE, "image/png")
            .body(png)
            .send()
            .await
            .map_err(|e| AgentError::backend("object store", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AgentError::backend("object store", status));
        }
        Ok(())
    }
}

/// Calendar date an image belongs to: `record_date` when it parses as an
/// RFC 3339 timestamp, a naive ISO timestamp or `YYYY-MM-DD`, else `now`.
pub fn record_day(record_date: Option<&str>, now: DateTime<Utc>) -> NaiveDate {
    let Some(raw) = record_date.map(str::trim).filter(|s| !s.is_empty()) else {
        return now.date_naive();
    };
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.with_timezone(&Utc).date_naive();
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return dt.date();
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap_or_else(|_| now.date_naive())
}

/// Object key `{user_id}/history/{YYYY}/{MM}/{DD}/image_{millis}.png`.
pub fn object_key(user_id: &str, record_date: Option<&str>, now: DateTime<Utc>) -> String {
    let day = record_day(record_date, now);
    format!(
        "{}/history/{:04}/{:02}/{:02}/image_{}.png",
        user_id,
        day.year(),
        day.month(),
        day.day(),
        now.timestamp_millis()
    )
}

/// Public URL of an object in `bucket`.
pub fn object_url(bucket: &str, region: &str, key: &str) -> String {
    format!("https://{}.s3.{}.amazonaws.com/{}", bucket, region, key)
}

/// Random seed in `0..=i32::MAX`.
pub fn random_seed() -> u32 {
    (uuid::Uuid::new_v4().as_u128() as u32) & 0x7fff_ffff
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 9, 30, 0).unwrap()
    }

    #[test]
    fn test_object_key_from_record_date() {
        let key = object_key("user-1", Some("2024-05-03"), now());
        assert_eq!(
            key,
            format!("user-1/history/2024/05/03/image_{}.png", now().timestamp_millis())
        );
    }

    #[test]
    fn test_record_day_formats() {
        assert_eq!(
            record_day(Some("2024-05-03T23:10:00Z"), now()),
            NaiveDate::from_ymd_opt(2024, 5, 3).unwrap()
        );
        assert_eq!(
            record_day(Some("2024-05-03T10:00:00"), now()),
            NaiveDate::from_ymd_opt(2024, 5, 3).unwrap()
        );
        assert_eq!(record_day(Some("어제"), now()), now().date_naive());
        assert_eq!(record_day(None, now()), now().date_naive());
    }

    #[test]
    fn test_object_url() {
        assert_eq!(
            object_url("diary-bucket", "us-east-1", "u/history/2024/05/03/image_1.png"),
            "https://diary-bucket.s3.us-east-1.amazonaws.com/u/history/2024/05/03/image_1.png"
        );
    }

    #[test]
    fn test_text_to_image_body() {
        let body = text_to_image_body("a cat", "blurry", 7, &ImageParams::default());
        assert_eq!(body["taskType"], "TEXT_IMAGE");
        assert_eq!(body["textToImageParams"]["negativeText"], "blurry");
        assert_eq!(body["imageGenerationConfig"]["height"], 1280);
        assert_eq!(body["imageGenerationConfig"]["seed"], 7);
    }

    #[test]
    fn test_random_seed_range() {
        for _ in 0..32 {
            assert!(random_seed() <= i32::MAX as u32);
        }
    }
}
