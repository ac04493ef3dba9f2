use anyhow::{Context, Result, anyhow};
use std::path::Path;
use std::sync::Arc;
use ttf_parser::Face;
use ttf_parser::name_id;
use usvg::fontdb;

/// Font handed to the rasterizer: a family name for the SVG text elements and
/// the raw face data to register in the render fontdb.
#[derive(Clone)]
pub struct ResolvedFont {
    data: Arc<Vec<u8>>,
    family: String,
}

impl ResolvedFont {
    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn data(&self) -> &[u8] {
        self.data.as_ref()
    }
}

#[cfg(target_os = "macos")]
pub fn fallback_families() -> &'static [&'static str] {
    &["Inter", "Helvetica Neue", "sans-serif"]
}

#[cfg(target_os = "windows")]
pub fn fallback_families() -> &'static [&'static str] {
    &["Inter", "Segoe UI", "sans-serif"]
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
pub fn fallback_families() -> &'static [&'static str] {
    &["Inter", "DejaVu Sans", "sans-serif"]
}

pub fn resolve_slide_font(
    font_path: Option<&Path>,
    font_family: Option<&str>,
    fallback: &[&str],
) -> Result<ResolvedFont> {
    if let Some(path) = font_path {
        let data = std::fs::read(path)
            .with_context(|| format!("failed to read font: {}", path.display()))?;
        return font_from_data(data, font_family)
            .map_err(|err| anyhow!("failed to parse font: {} ({})", path.display(), err));
    }

    let mut db = fontdb::Database::new();
    db.load_system_fonts();

    if let Some(family) = font_family {
        return font_from_family(&db, family);
    }

    for candidate in fallback {
        if let Ok(resolved) = font_from_family(&db, candidate) {
            return Ok(resolved);
        }
    }

    Err(anyhow!("no fallback fonts found"))
}

fn font_from_data(data: Vec<u8>, fallback_family: Option<&str>) -> Result<ResolvedFont> {
    let count = ttf_parser::fonts_in_collection(&data).unwrap_or(1);
    let mut family = None;
    for index in 0..count {
        if let Ok(face) = Face::parse(&data, index) {
            family = extract_family_name(&face);
            if family.is_some() {
                break;
            }
        }
    }
    let family = family
        .or_else(|| fallback_family.map(|name| name.to_string()))
        .unwrap_or_else(|| "sans-serif".to_string());
    Ok(ResolvedFont {
        data: Arc::new(data),
        family,
    })
}

fn font_from_family(db: &fontdb::Database, family: &str) -> Result<ResolvedFont> {
    let is_sans = family.eq_ignore_ascii_case("sans-serif");
    let families = if is_sans {
        vec![fontdb::Family::SansSerif]
    } else {
        vec![fontdb::Family::Name(family)]
    };
    let query = fontdb::Query {
        families: &families,
        ..Default::default()
    };
    let id = db
        .query(&query)
        .ok_or_else(|| anyhow!("font not found: {}", family))?;
    let data = db
        .with_face_data(id, |data, _index| data.to_vec())
        .ok_or_else(|| anyhow!("failed to load font data: {}", family))?;
    font_from_data(data, Some(family))
}

fn extract_family_name(face: &Face<'_>) -> Option<String> {
    let mut fallback = None;
    for name in face.names() {
        if name.name_id == name_id::TYPOGRAPHIC_FAMILY {
            if let Some(value) = name.to_string() {
                return Some(value);
            }
        } else if name.name_id == name_id::FAMILY && fallback.is_none() {
            fallback = name.to_string();
        }
    }
    fallback
}
