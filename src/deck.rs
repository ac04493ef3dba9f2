use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::layout::{CropStrategy, Position, Role};
use crate::render::BandStyle;

/// One slide of a deck script: the text lines plus optional explicit variant
/// choices. Anything left unset is filled in by the variant picker.
#[derive(Debug, Clone)]
pub struct Slide {
    pub lines: Vec<String>,
    pub role: Role,
    pub position: Option<Position>,
    pub style: Option<BandStyle>,
    pub crop: Option<CropStrategy>,
    pub background: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Deck {
    pub title: Option<String>,
    pub hashtags: Vec<String>,
    pub slides: Vec<Slide>,
}

#[derive(Debug, Deserialize)]
struct DeckFile {
    title: Option<String>,
    hashtags: Option<Vec<String>>,
    slides: Vec<SlideEntry>,
}

#[derive(Debug, Deserialize)]
struct SlideEntry {
    lines: Vec<String>,
    role: Option<String>,
    position: Option<String>,
    style: Option<String>,
    crop: Option<String>,
    background: Option<String>,
}

pub fn load_deck(path: &Path) -> Result<Deck> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read deck script: {}", path.display()))?;
    let parsed: DeckFile = toml::from_str(&content)
        .with_context(|| format!("failed to parse deck script: {}", path.display()))?;
    deck_from_file(parsed)
}

fn deck_from_file(file: DeckFile) -> Result<Deck> {
    if file.slides.is_empty() {
        return Err(anyhow!("deck script has no slides"));
    }
    let count = file.slides.len();
    let mut slides = Vec::with_capacity(count);
    for (index, entry) in file.slides.into_iter().enumerate() {
        if entry.lines.iter().all(|line| line.trim().is_empty()) {
            return Err(anyhow!("slide {} has no text", index + 1));
        }
        let role = match entry.role.as_deref() {
            Some(name) => Role::parse(name)
                .ok_or_else(|| anyhow!("unknown role '{}' in slide {}", name, index + 1))?,
            None => default_role(index, count),
        };
        let position = entry
            .position
            .as_deref()
            .map(|name| {
                Position::parse(name)
                    .ok_or_else(|| anyhow!("unknown position '{}' in slide {}", name, index + 1))
            })
            .transpose()?;
        let style = entry
            .style
            .as_deref()
            .map(|name| {
                BandStyle::parse(name)
                    .ok_or_else(|| anyhow!("unknown style '{}' in slide {}", name, index + 1))
            })
            .transpose()?;
        let crop = entry
            .crop
            .as_deref()
            .map(|name| {
                CropStrategy::parse(name)
                    .ok_or_else(|| anyhow!("unknown crop '{}' in slide {}", name, index + 1))
            })
            .transpose()?;
        slides.push(Slide {
            lines: entry.lines,
            role,
            position,
            style,
            crop,
            background: entry.background,
        });
    }
    Ok(Deck {
        title: file.title,
        hashtags: file.hashtags.unwrap_or_default(),
        slides,
    })
}

// First slide hooks, last slide calls to action, everything between is body.
fn default_role(index: usize, count: usize) -> Role {
    if index == 0 {
        Role::Hook
    } else if index + 1 == count {
        Role::Cta
    } else {
        Role::Body
    }
}
