use anyhow::{Context, Result, anyhow};
use image::imageops::FilterType;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::deck::{Deck, Slide};
use crate::fonts::{ResolvedFont, fallback_families, resolve_slide_font};
use crate::layout::{CANVAS_H, CANVAS_W, autofit, crop_region, place_band};
use crate::render::{SlideTheme, render_svg_bytes, slide_svg};
use crate::settings::Settings;
use crate::variants::{SlideVariants, VariantPicker};

const BACKGROUND_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "webp"];

pub struct Composer {
    theme: SlideTheme,
    font: Option<ResolvedFont>,
}

impl Composer {
    pub fn from_settings(settings: &Settings) -> Self {
        let font_path = settings.overlay_font_path.as_deref().map(Path::new);
        let font_family = settings.overlay_font_family.as_deref();
        let font = match resolve_slide_font(font_path, font_family, fallback_families()) {
            Ok(font) => Some(font),
            Err(err) => {
                warn!("no overlay font resolved, falling back to renderer defaults: {}", err);
                None
            }
        };
        Self {
            theme: SlideTheme {
                band_fill: settings.overlay_band_fill.clone(),
                band_stroke: settings.overlay_band_stroke.clone(),
                text_color: settings.overlay_text_color.clone(),
                band_opacity: settings.overlay_band_opacity,
            },
            font,
        }
    }

    /// Run the full pipeline for one slide: crop the background to the canvas
    /// ratio, lay out the text band, rasterize the overlay, return PNG bytes.
    pub fn compose_slide(
        &self,
        background: &[u8],
        slide: &Slide,
        variants: SlideVariants,
    ) -> Result<Vec<u8>> {
        let kind = infer::get(background)
            .ok_or_else(|| anyhow!("background bytes are not a recognized file type"))?;
        if !kind.mime_type().starts_with("image/") {
            return Err(anyhow!(
                "background is not an image (detected {})",
                kind.mime_type()
            ));
        }

        let decoded =
            image::load_from_memory(background).with_context(|| "failed to decode background image")?;
        let position = slide.position.unwrap_or(variants.position);
        let style = slide.style.unwrap_or(variants.style);
        let crop = slide.crop.unwrap_or(variants.crop);

        let region = crop_region(decoded.width(), decoded.height(), crop);
        let cropped = decoded.crop_imm(region.left, region.top, region.width, region.height);
        let resized = cropped.resize_exact(CANVAS_W as u32, CANVAS_H as u32, FilterType::Lanczos3);
        let mut background_jpeg = Vec::new();
        image::DynamicImage::ImageRgb8(resized.to_rgb8())
            .write_to(&mut Cursor::new(&mut background_jpeg), image::ImageFormat::Jpeg)
            .with_context(|| "failed to encode cropped background")?;

        let wrap = autofit(&slide.lines, slide.role, position.safe_area().max_w);
        let overlay = place_band(wrap, position);
        let svg = slide_svg(
            &background_jpeg,
            "image/jpeg",
            &overlay,
            style,
            &self.theme,
            self.font.as_ref().map(|font| font.family()),
        );
        render_svg_bytes(&svg, "image/png", self.font.as_ref())
    }
}

pub fn compose_deck(
    deck: &Deck,
    backgrounds_dir: &Path,
    out_dir: &Path,
    picker: &mut dyn VariantPicker,
    settings: &Settings,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create output directory: {}", out_dir.display()))?;
    let composer = Composer::from_settings(settings);
    let mut written = Vec::with_capacity(deck.slides.len());
    for (index, slide) in deck.slides.iter().enumerate() {
        let background_path =
            resolve_background(backgrounds_dir, index, slide.background.as_deref())?;
        let background = std::fs::read(&background_path).with_context(|| {
            format!("failed to read background: {}", background_path.display())
        })?;
        let variants = picker.pick(index);
        let bytes = composer.compose_slide(&background, slide, variants)?;
        let out_path = write_slide(out_dir, index, &bytes)?;
        info!(
            "composed slide {} ({} role) -> {}",
            index + 1,
            slide.role.as_str(),
            out_path.display()
        );
        written.push(out_path);
    }
    Ok(written)
}

/// Explicit background names win; otherwise slides map to `bg-NN.<ext>` in
/// the backgrounds directory.
pub fn resolve_background(dir: &Path, index: usize, explicit: Option<&str>) -> Result<PathBuf> {
    if let Some(name) = explicit {
        let candidate = Path::new(name);
        let path = if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            dir.join(candidate)
        };
        if path.exists() {
            return Ok(path);
        }
        return Err(anyhow!("background not found: {}", path.display()));
    }
    for ext in BACKGROUND_EXTENSIONS {
        let path = dir.join(format!("bg-{:02}.{}", index + 1, ext));
        if path.exists() {
            return Ok(path);
        }
    }
    Err(anyhow!(
        "no background for slide {} in {} (expected bg-{:02} with one of: {})",
        index + 1,
        dir.display(),
        index + 1,
        BACKGROUND_EXTENSIONS.join(", ")
    ))
}

fn write_slide(out_dir: &Path, index: usize, bytes: &[u8]) -> Result<PathBuf> {
    let final_path = out_dir.join(format!("slide-{:02}.png", index + 1));
    let file = tempfile::Builder::new()
        .prefix("slidesmith-")
        .suffix(".png")
        .tempfile_in(out_dir)
        .with_context(|| "failed to create temp slide file")?;
    std::fs::write(file.path(), bytes).with_context(|| "failed to write slide bytes")?;
    file.persist(&final_path)
        .map_err(|err| anyhow!("failed to persist {}: {}", final_path.display(), err))?;
    Ok(final_path)
}
