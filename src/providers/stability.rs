use anyhow::{Result, anyhow};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Deserialize;
use serde_json::json;

use super::retry::{
    RATE_LIMIT_BASE_DELAY, RATE_LIMIT_MAX_RETRIES, is_rate_limited, retry_after, wait_with_backoff,
};
use super::{GenerateFuture, GeneratedImage, ImageProvider};

const DEFAULT_BASE_URL: &str = "https://api.stability.ai/v1/generation";
pub(crate) const DEFAULT_ENGINE: &str = "stable-diffusion-xl-1024-v1-0";

#[derive(Debug, Clone)]
pub struct Stability {
    key: String,
    engine: String,
}

impl Stability {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            engine: DEFAULT_ENGINE.to_string(),
        }
    }

    pub fn with_engine(mut self, engine: impl Into<String>) -> Self {
        let engine = engine.into();
        if !engine.trim().is_empty() {
            self.engine = engine;
        }
        self
    }
}

impl ImageProvider for Stability {
    fn generate(&self, prompt: String, width: u32, height: u32) -> GenerateFuture {
        let key = self.key.clone();
        let engine = self.engine.clone();
        Box::pin(async move {
            let client = reqwest::Client::new();
            let url = format!("{}/{}/text-to-image", base_url(), engine);
            // SDXL engines only accept dimensions in multiples of 64
            let body = json!({
                "text_prompts": [{ "text": prompt }],
                "width": round_to_multiple(width, 64),
                "height": round_to_multiple(height, 64),
                "samples": 1,
            });

            let mut attempt = 0usize;
            let mut delay = RATE_LIMIT_BASE_DELAY;
            loop {
                attempt += 1;
                let response = client
                    .post(&url)
                    .bearer_auth(&key)
                    .header("accept", "application/json")
                    .json(&body)
                    .send()
                    .await?;

                let status = response.status();
                let retry_after = retry_after(response.headers());
                let text = response.text().await.unwrap_or_default();
                if status.is_success() {
                    return extract_artifact(&text, &engine);
                }
                if is_rate_limited(status, &text) && attempt < RATE_LIMIT_MAX_RETRIES {
                    delay = wait_with_backoff("Stability", attempt, delay, retry_after).await;
                    continue;
                }
                return Err(anyhow!(
                    "Stability API error ({}): {}",
                    status,
                    extract_error(&text).unwrap_or(text)
                ));
            }
        })
    }
}

fn base_url() -> String {
    std::env::var("STABILITY_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string())
}

fn round_to_multiple(value: u32, multiple: u32) -> u32 {
    let rounded = ((value + multiple / 2) / multiple) * multiple;
    rounded.max(multiple)
}

fn extract_artifact(text: &str, engine: &str) -> Result<GeneratedImage> {
    let payload: GenerationResponse = serde_json::from_str(text)
        .map_err(|err| anyhow!("failed to parse Stability response JSON: {}", err))?;
    let artifact = payload
        .artifacts
        .into_iter()
        .find(|artifact| artifact.finish_reason.as_deref() != Some("ERROR"))
        .ok_or_else(|| anyhow!("Stability response contained no usable artifacts"))?;
    let bytes = BASE64
        .decode(artifact.base64.as_bytes())
        .map_err(|err| anyhow!("failed to decode Stability image payload: {}", err))?;
    Ok(GeneratedImage {
        bytes,
        mime: "image/png".to_string(),
        model: engine.to_string(),
    })
}

fn extract_error(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct ErrorBody {
        message: Option<String>,
        name: Option<String>,
    }

    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    let mut parts = Vec::new();
    if let Some(message) = parsed.message
        && !message.trim().is_empty()
    {
        parts.push(message);
    }
    if let Some(name) = parsed.name
        && !name.trim().is_empty()
    {
        parts.push(format!("name: {}", name));
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" | "))
    }
}

#[derive(Debug, Deserialize)]
struct GenerationResponse {
    artifacts: Vec<Artifact>,
}

#[derive(Debug, Deserialize)]
struct Artifact {
    base64: String,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_first_usable_artifact() {
        let payload = r#"{"artifacts":[{"base64":"aGVsbG8=","finishReason":"SUCCESS"}]}"#;
        let image = extract_artifact(payload, DEFAULT_ENGINE).unwrap();
        assert_eq!(image.bytes, b"hello");
        assert_eq!(image.model, DEFAULT_ENGINE);
    }

    #[test]
    fn errored_artifacts_are_skipped() {
        let payload = r#"{"artifacts":[{"base64":"eA==","finishReason":"ERROR"},{"base64":"aGVsbG8=","finishReason":"SUCCESS"}]}"#;
        let image = extract_artifact(payload, DEFAULT_ENGINE).unwrap();
        assert_eq!(image.bytes, b"hello");
    }

    #[test]
    fn all_errored_artifacts_fail() {
        let payload = r#"{"artifacts":[{"base64":"eA==","finishReason":"ERROR"}]}"#;
        assert!(extract_artifact(payload, DEFAULT_ENGINE).is_err());
    }

    #[test]
    fn dimensions_round_to_engine_grid() {
        assert_eq!(round_to_multiple(1080, 64), 1088);
        assert_eq!(round_to_multiple(1920, 64), 1920);
        assert_eq!(round_to_multiple(10, 64), 64);
    }
}
