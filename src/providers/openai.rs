use anyhow::{Result, anyhow};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Deserialize;
use serde_json::json;

use super::retry::{
    RATE_LIMIT_BASE_DELAY, RATE_LIMIT_MAX_RETRIES, is_rate_limited, retry_after, wait_with_backoff,
};
use super::{GenerateFuture, GeneratedImage, ImageProvider};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1/images/generations";
pub(crate) const DEFAULT_MODEL: &str = "gpt-image-1";

#[derive(Debug, Clone)]
pub struct OpenAI {
    key: String,
    model: String,
}

impl OpenAI {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        let model = model.into();
        if !model.trim().is_empty() {
            self.model = model;
        }
        self
    }
}

impl ImageProvider for OpenAI {
    fn generate(&self, prompt: String, width: u32, height: u32) -> GenerateFuture {
        let key = self.key.clone();
        let model = self.model.clone();
        Box::pin(async move {
            let client = reqwest::Client::new();
            let url = base_url();
            let body = json!({
                "model": model,
                "prompt": prompt,
                "n": 1,
                "size": format!("{}x{}", width, height),
            });

            let mut attempt = 0usize;
            let mut delay = RATE_LIMIT_BASE_DELAY;
            loop {
                attempt += 1;
                let response = client
                    .post(&url)
                    .bearer_auth(&key)
                    .json(&body)
                    .send()
                    .await?;

                let status = response.status();
                let retry_after = retry_after(response.headers());
                let text = response.text().await.unwrap_or_default();
                if status.is_success() {
                    return extract_image(&text, &model);
                }
                if is_rate_limited(status, &text) && attempt < RATE_LIMIT_MAX_RETRIES {
                    delay = wait_with_backoff("OpenAI", attempt, delay, retry_after).await;
                    continue;
                }
                return Err(anyhow!(
                    "OpenAI image API error ({}): {}",
                    status,
                    extract_error(&text).unwrap_or(text)
                ));
            }
        })
    }
}

fn base_url() -> String {
    std::env::var("OPENAI_IMAGES_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string())
}

fn extract_image(text: &str, model: &str) -> Result<GeneratedImage> {
    let payload: ImagesResponse = serde_json::from_str(text)
        .map_err(|err| anyhow!("failed to parse OpenAI images response JSON: {}", err))?;
    let first = payload
        .data
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("OpenAI images response contained no images"))?;
    let encoded = first
        .b64_json
        .ok_or_else(|| anyhow!("OpenAI images response missing b64_json payload"))?;
    let bytes = BASE64
        .decode(encoded.as_bytes())
        .map_err(|err| anyhow!("failed to decode OpenAI image payload: {}", err))?;
    Ok(GeneratedImage {
        bytes,
        mime: "image/png".to_string(),
        model: model.to_string(),
    })
}

fn extract_error(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: Option<OpenAIError>,
    }

    #[derive(Deserialize)]
    struct OpenAIError {
        message: Option<String>,
        #[serde(rename = "type")]
        kind: Option<String>,
        code: Option<serde_json::Value>,
    }

    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    let error = parsed.error?;
    let mut parts = Vec::new();
    if let Some(message) = error.message
        && !message.trim().is_empty()
    {
        parts.push(message);
    }
    if let Some(kind) = error.kind
        && !kind.trim().is_empty()
    {
        parts.push(format!("type: {}", kind));
    }
    if let Some(code) = error.code {
        parts.push(format!("code: {}", code));
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" | "))
    }
}

#[derive(Debug, Deserialize)]
struct ImagesResponse {
    data: Vec<ImageDatum>,
}

#[derive(Debug, Deserialize)]
struct ImageDatum {
    b64_json: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_b64_payload() {
        let payload = r#"{"created":1,"data":[{"b64_json":"aGVsbG8="}]}"#;
        let image = extract_image(payload, "gpt-image-1").unwrap();
        assert_eq!(image.bytes, b"hello");
        assert_eq!(image.mime, "image/png");
        assert_eq!(image.model, "gpt-image-1");
    }

    #[test]
    fn missing_payload_is_an_error() {
        let payload = r#"{"created":1,"data":[{"url":"https://example.com/x.png"}]}"#;
        let err = extract_image(payload, "gpt-image-1").unwrap_err();
        assert!(err.to_string().contains("missing b64_json"));
    }

    #[test]
    fn empty_data_is_an_error() {
        let err = extract_image(r#"{"created":1,"data":[]}"#, "gpt-image-1").unwrap_err();
        assert!(err.to_string().contains("no images"));
    }

    #[test]
    fn error_body_is_summarized() {
        let body = r#"{"error":{"message":"Billing hard limit","type":"invalid_request_error","code":"billing_hard_limit_reached"}}"#;
        let summary = extract_error(body).unwrap();
        assert!(summary.contains("Billing hard limit"));
        assert!(summary.contains("type: invalid_request_error"));
    }
}
