use anyhow::{Context, Result, anyhow};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Deserialize;
use serde_json::json;
use std::path::PathBuf;
use tera::{Context as TeraContext, Tera};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::info;

use crate::deck::Deck;
use crate::providers::retry::{
    RATE_LIMIT_BASE_DELAY, RATE_LIMIT_MAX_RETRIES, is_rate_limited, retry_after, wait_with_backoff,
};
use crate::settings::Settings;

const DEFAULT_CAPTION_TEMPLATE: &str = include_str!("templates/caption.tera");
const TOKEN_ENV: &str = "SLIDESMITH_SCHEDULER_TOKEN";

#[derive(Debug)]
pub struct SchedulerClient {
    base_url: String,
    token: String,
}

#[derive(Debug, Clone)]
pub struct ScheduledPost {
    pub id: String,
    pub status: String,
}

impl SchedulerClient {
    pub fn from_settings(settings: &Settings, override_token: Option<&str>) -> Result<Self> {
        let base_url = settings
            .scheduler_base_url
            .clone()
            .ok_or_else(|| anyhow!("scheduler base_url is not configured (set [scheduler] base_url)"))?;
        let token = match override_token {
            Some(token) => token.to_string(),
            None => std::env::var(TOKEN_ENV)
                .ok()
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| anyhow!("scheduler token not found (set {})", TOKEN_ENV))?,
        };
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    pub async fn upload_media(&self, filename: &str, bytes: &[u8]) -> Result<String> {
        let body = json!({
            "filename": filename,
            "mime": "image/png",
            "data": BASE64.encode(bytes),
        });
        let text = self
            .post_json(&format!("{}/media", self.base_url), &body)
            .await?;
        let parsed: MediaResponse = serde_json::from_str(&text)
            .map_err(|err| anyhow!("failed to parse media upload response: {}", err))?;
        Ok(parsed.id)
    }

    pub async fn create_post(
        &self,
        media_ids: &[String],
        caption: &str,
        profiles: &[String],
        scheduled_at: OffsetDateTime,
    ) -> Result<ScheduledPost> {
        let scheduled = scheduled_at
            .format(&Rfc3339)
            .with_context(|| "failed to format scheduled time")?;
        let body = json!({
            "caption": caption,
            "media_ids": media_ids,
            "profile_ids": profiles,
            "scheduled_at": scheduled,
        });
        let text = self
            .post_json(&format!("{}/posts", self.base_url), &body)
            .await?;
        let parsed: PostResponse = serde_json::from_str(&text)
            .map_err(|err| anyhow!("failed to parse post creation response: {}", err))?;
        Ok(ScheduledPost {
            id: parsed.id,
            status: parsed.status.unwrap_or_else(|| "scheduled".to_string()),
        })
    }

    async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<String> {
        let client = reqwest::Client::new();
        let mut attempt = 0usize;
        let mut delay = RATE_LIMIT_BASE_DELAY;
        loop {
            attempt += 1;
            let response = client
                .post(url)
                .bearer_auth(&self.token)
                .json(body)
                .send()
                .await?;

            let status = response.status();
            let retry_after = retry_after(response.headers());
            let text = response.text().await.unwrap_or_default();
            if status.is_success() {
                return Ok(text);
            }
            if is_rate_limited(status, &text) && attempt < RATE_LIMIT_MAX_RETRIES {
                delay = wait_with_backoff("scheduler", attempt, delay, retry_after).await;
                continue;
            }
            return Err(anyhow!("scheduler API error ({}): {}", status, text));
        }
    }
}

/// Upload every composed slide and create one scheduled post holding them.
pub async fn publish_slides(
    client: &SchedulerClient,
    slide_paths: &[PathBuf],
    deck: &Deck,
    settings: &Settings,
    scheduled_at: OffsetDateTime,
) -> Result<ScheduledPost> {
    if slide_paths.is_empty() {
        return Err(anyhow!("nothing to publish: no composed slides"));
    }
    let mut media_ids = Vec::with_capacity(slide_paths.len());
    for path in slide_paths {
        let bytes = std::fs::read(path)
            .with_context(|| format!("failed to read slide: {}", path.display()))?;
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("slide.png");
        let id = client.upload_media(filename, &bytes).await?;
        info!("uploaded {} as media {}", filename, id);
        media_ids.push(id);
    }

    let caption = render_caption(deck, settings)?;
    let post = client
        .create_post(&media_ids, &caption, &settings.scheduler_profiles, scheduled_at)
        .await?;
    info!("created post {} ({})", post.id, post.status);
    Ok(post)
}

pub fn render_caption(deck: &Deck, settings: &Settings) -> Result<String> {
    let template = settings
        .caption_template
        .as_deref()
        .unwrap_or(DEFAULT_CAPTION_TEMPLATE);
    let mut hashtags = settings.caption_hashtags.clone();
    hashtags.extend(deck.hashtags.iter().cloned());
    hashtags.dedup();

    let mut context = TeraContext::new();
    context.insert("title", &deck.title);
    context.insert("slide_count", &deck.slides.len());
    context.insert("hashtags", &hashtags);
    Tera::one_off(template, &context, false).with_context(|| "failed to render caption template")
}

/// Accepts an RFC-3339 timestamp; a missing value schedules one hour out.
pub fn parse_schedule(value: Option<&str>) -> Result<OffsetDateTime> {
    match value {
        Some(raw) => OffsetDateTime::parse(raw.trim(), &Rfc3339)
            .map_err(|err| anyhow!("invalid schedule time '{}' (expected RFC-3339): {}", raw, err)),
        None => Ok(OffsetDateTime::now_utc() + time::Duration::hours(1)),
    }
}

#[derive(Debug, Deserialize)]
struct MediaResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct PostResponse {
    id: String,
    status: Option<String>,
}
