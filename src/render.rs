use anyhow::{Context, Result, anyhow};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use resvg::render;
use std::io::Cursor;
use std::sync::Arc;
use tiny_skia::Pixmap;
use usvg::{Options, Tree, fontdb};

use crate::fonts::ResolvedFont;
use crate::layout::{CANVAS_H, CANVAS_W, SlideOverlay};

/// Visual treatment of the band behind the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BandStyle {
    Solid,
    Shadow,
    Outline,
}

pub const ALL_BAND_STYLES: [BandStyle; 3] = [BandStyle::Solid, BandStyle::Shadow, BandStyle::Outline];

impl BandStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            BandStyle::Solid => "solid",
            BandStyle::Shadow => "shadow",
            BandStyle::Outline => "outline",
        }
    }

    pub fn parse(name: &str) -> Option<BandStyle> {
        match name.trim().to_lowercase().as_str() {
            "solid" => Some(BandStyle::Solid),
            "shadow" => Some(BandStyle::Shadow),
            "outline" => Some(BandStyle::Outline),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SlideTheme {
    pub band_fill: String,
    pub band_stroke: String,
    pub text_color: String,
    pub band_opacity: f32,
}

/// Assemble the SVG for one slide: the already-cropped background scaled to
/// the canvas, the band, then the anchored text runs.
pub fn slide_svg(
    background: &[u8],
    background_mime: &str,
    overlay: &SlideOverlay,
    style: BandStyle,
    theme: &SlideTheme,
    font_family: Option<&str>,
) -> String {
    let encoded = BASE64.encode(background);
    let data_uri = format!("data:{};base64,{}", background_mime, encoded);

    let mut svg = String::new();
    svg.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = CANVAS_W,
        h = CANVAS_H
    ));
    if style == BandStyle::Shadow {
        svg.push_str(
            r##"<defs><filter id="band-shadow" x="-20%" y="-20%" width="140%" height="140%"><feDropShadow dx="0" dy="10" stdDeviation="14" flood-color="#000000" flood-opacity="0.4"/></filter></defs>"##,
        );
    }
    svg.push_str(&format!(
        r#"<image href="{uri}" xlink:href="{uri}" x="0" y="0" width="{w}" height="{h}" preserveAspectRatio="none"/>"#,
        uri = data_uri,
        w = CANVAS_W,
        h = CANVAS_H
    ));

    let band = &overlay.band;
    let band_attrs = match style {
        BandStyle::Solid | BandStyle::Shadow => format!(
            r#"fill="{fill}" fill-opacity="{opacity}""#,
            fill = theme.band_fill,
            opacity = theme.band_opacity
        ),
        BandStyle::Outline => format!(
            r#"fill="{fill}" fill-opacity="{opacity}" stroke="{stroke}" stroke-width="3""#,
            fill = theme.band_fill,
            opacity = theme.band_opacity,
            stroke = theme.band_stroke
        ),
    };
    let filter_attr = if style == BandStyle::Shadow {
        r#" filter="url(#band-shadow)""#
    } else {
        ""
    };
    svg.push_str(&format!(
        r#"<rect x="{x}" y="{y}" width="{w}" height="{h}" rx="{rx}" {attrs}{filter}/>"#,
        x = band.x,
        y = band.y,
        w = band.w,
        h = band.h,
        rx = band.radius,
        attrs = band_attrs,
        filter = filter_attr
    ));

    if !overlay.lines.is_empty() {
        let family_attr = font_family
            .map(|family| format!(r#" font-family="{}""#, escape_xml(family)))
            .unwrap_or_default();
        svg.push_str(&format!(
            r#"<text x="{x}" y="{y}" font-size="{size}" fill="{color}" text-anchor="{anchor}"{family}>"#,
            x = overlay.text_x,
            y = overlay.first_baseline_y,
            size = overlay.font_size,
            color = theme.text_color,
            anchor = overlay.anchor.as_svg(),
            family = family_attr
        ));
        for (index, line) in overlay.lines.iter().enumerate() {
            let escaped = escape_xml(line);
            if index == 0 {
                svg.push_str(&escaped);
            } else {
                svg.push_str(&format!(
                    r#"<tspan x="{x}" dy="{dy}">{text}</tspan>"#,
                    x = overlay.text_x,
                    dy = overlay.line_height,
                    text = escaped
                ));
            }
        }
        svg.push_str("</text>");
    }

    svg.push_str("</svg>");
    svg
}

/// Rasterize an SVG and encode it for `output_mime`.
pub fn render_svg_bytes(svg: &str, output_mime: &str, font: Option<&ResolvedFont>) -> Result<Vec<u8>> {
    let mut db = fontdb::Database::new();
    db.load_system_fonts();
    if let Some(font) = font {
        db.load_font_data(font.data().to_vec());
    }
    let options = Options {
        fontdb: Arc::new(db),
        ..Options::default()
    };
    let tree = Tree::from_str(svg, &options).with_context(|| "failed to parse slide SVG")?;
    let size = tree.size().to_int_size();
    let mut pixmap =
        Pixmap::new(size.width(), size.height()).ok_or_else(|| anyhow!("empty SVG size"))?;
    let mut pixmap_mut = pixmap.as_mut();
    render(&tree, tiny_skia::Transform::identity(), &mut pixmap_mut);
    let image = image::RgbaImage::from_raw(size.width(), size.height(), pixmap.data().to_vec())
        .ok_or_else(|| anyhow!("failed to build image buffer from SVG"))?;
    let format = image_format_from_mime(output_mime)
        .ok_or_else(|| anyhow!("unsupported output image mime '{}'", output_mime))?;
    let mut bytes = Vec::new();
    let mut cursor = Cursor::new(&mut bytes);
    image::DynamicImage::ImageRgba8(image)
        .write_to(&mut cursor, format)
        .with_context(|| "failed to encode slide image")?;
    Ok(bytes)
}

pub fn image_format_from_mime(mime: &str) -> Option<image::ImageFormat> {
    match mime {
        "image/png" => Some(image::ImageFormat::Png),
        "image/jpeg" | "image/jpg" => Some(image::ImageFormat::Jpeg),
        "image/webp" => Some(image::ImageFormat::WebP),
        "image/bmp" => Some(image::ImageFormat::Bmp),
        _ => None,
    }
}

fn escape_xml(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
