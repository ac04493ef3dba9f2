use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::paths;

const DEFAULT_SETTINGS_TOML: &str = include_str!("../settings.toml");

#[derive(Debug, Clone)]
pub struct Settings {
    pub overlay_text_color: String,
    pub overlay_band_fill: String,
    pub overlay_band_stroke: String,
    pub overlay_band_opacity: f32,
    pub overlay_font_family: Option<String>,
    pub overlay_font_path: Option<String>,
    pub background_provider: Option<String>,
    pub background_size: String,
    pub background_prompts: Vec<String>,
    pub scheduler_base_url: Option<String>,
    pub scheduler_profiles: Vec<String>,
    pub caption_template: Option<String>,
    pub caption_hashtags: Vec<String>,
    pub admin_token: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            overlay_text_color: "#1f1f1f".to_string(),
            overlay_band_fill: "#ffffff".to_string(),
            overlay_band_stroke: "#1f1f1f".to_string(),
            overlay_band_opacity: 0.92,
            overlay_font_family: None,
            overlay_font_path: None,
            background_provider: None,
            background_size: "1024x1792".to_string(),
            background_prompts: Vec::new(),
            scheduler_base_url: None,
            scheduler_profiles: Vec::new(),
            caption_template: None,
            caption_hashtags: Vec::new(),
            admin_token: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    overlay: Option<OverlaySettings>,
    backgrounds: Option<BackgroundSettings>,
    scheduler: Option<SchedulerSettings>,
    captions: Option<CaptionSettings>,
    server: Option<ServerSettings>,
}

#[derive(Debug, Default, Deserialize)]
struct OverlaySettings {
    text_color: Option<String>,
    band_fill: Option<String>,
    band_stroke: Option<String>,
    band_opacity: Option<f32>,
    font_family: Option<String>,
    font_path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct BackgroundSettings {
    provider: Option<String>,
    size: Option<String>,
    prompts: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct SchedulerSettings {
    base_url: Option<String>,
    profiles: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct CaptionSettings {
    template: Option<String>,
    hashtags: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerSettings {
    admin_token: Option<String>,
}

pub fn load_settings(extra_path: Option<&Path>) -> Result<Settings> {
    let mut settings = Settings::default();
    ensure_home_settings_file()?;

    let mut ordered_paths = Vec::new();
    ordered_paths.push(PathBuf::from("settings.toml"));
    ordered_paths.push(PathBuf::from("settings.local.toml"));

    if let Some(home) = paths::settings_dir() {
        ordered_paths.push(home.join("settings.toml"));
        ordered_paths.push(home.join("settings.local.toml"));
    }

    if let Some(extra) = extra_path {
        if !extra.exists() {
            return Err(anyhow!("settings file not found: {}", extra.display()));
        }
        ordered_paths.push(extra.to_path_buf());
    }

    for path in ordered_paths {
        if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("failed to read settings: {}", path.display()))?;
            let parsed: SettingsFile = toml::from_str(&content)
                .with_context(|| format!("failed to parse settings: {}", path.display()))?;
            settings.merge(parsed);
        }
    }

    Ok(settings)
}

impl Settings {
    fn merge(&mut self, incoming: SettingsFile) {
        if let Some(overlay) = incoming.overlay {
            if let Some(color) = non_empty(overlay.text_color) {
                self.overlay_text_color = color;
            }
            if let Some(color) = non_empty(overlay.band_fill) {
                self.overlay_band_fill = color;
            }
            if let Some(color) = non_empty(overlay.band_stroke) {
                self.overlay_band_stroke = color;
            }
            if let Some(opacity) = overlay.band_opacity {
                if (0.0..=1.0).contains(&opacity) {
                    self.overlay_band_opacity = opacity;
                }
            }
            if let Some(family) = non_empty(overlay.font_family) {
                self.overlay_font_family = Some(family);
            }
            if let Some(path) = non_empty(overlay.font_path) {
                self.overlay_font_path = Some(path);
            }
        }
        if let Some(backgrounds) = incoming.backgrounds {
            if let Some(provider) = non_empty(backgrounds.provider) {
                self.background_provider = Some(provider);
            }
            if let Some(size) = non_empty(backgrounds.size) {
                self.background_size = size;
            }
            if let Some(prompts) = backgrounds.prompts {
                if !prompts.is_empty() {
                    self.background_prompts = prompts;
                }
            }
        }
        if let Some(scheduler) = incoming.scheduler {
            if let Some(base_url) = non_empty(scheduler.base_url) {
                self.scheduler_base_url = Some(base_url);
            }
            if let Some(profiles) = scheduler.profiles {
                if !profiles.is_empty() {
                    self.scheduler_profiles = profiles;
                }
            }
        }
        if let Some(captions) = incoming.captions {
            if let Some(template) = non_empty(captions.template) {
                self.caption_template = Some(template);
            }
            if let Some(hashtags) = captions.hashtags {
                if !hashtags.is_empty() {
                    self.caption_hashtags = hashtags;
                }
            }
        }
        if let Some(server) = incoming.server {
            if let Some(token) = non_empty(server.admin_token) {
                self.admin_token = Some(token);
            }
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

fn ensure_home_settings_file() -> Result<()> {
    let Some(home) = paths::settings_dir() else {
        return Ok(());
    };
    fs::create_dir_all(&home)
        .with_context(|| format!("failed to create settings directory: {}", home.display()))?;
    let path = home.join("settings.toml");
    if !path.exists() {
        fs::write(&path, DEFAULT_SETTINGS_TOML)
            .with_context(|| format!("failed to write settings: {}", path.display()))?;
    }
    Ok(())
}
