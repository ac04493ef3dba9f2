use super::fit::WrapResult;
use super::{
    BAND_MIN_W, BAND_PAD_X, BAND_PAD_Y, BAND_RADIUS, CANVAS_H, CANVAS_W, HAlign, MAX_TEXT_LINES,
    Position, SAFE_BOTTOM, SAFE_LEFT, SAFE_RIGHT, SAFE_TOP, VAlign,
};

// Bands that hit the line limit get a little extra breathing room.
const FULL_BAND_WIDEN: f32 = 1.05;
const BAND_H_FUDGE: f32 = 6.0;
const EDGE_OFFSET: f32 = 12.0;

/// Rounded rectangle behind the text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    pub radius: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAnchor {
    Start,
    Middle,
    End,
}

impl TextAnchor {
    pub fn as_svg(&self) -> &'static str {
        match self {
            TextAnchor::Start => "start",
            TextAnchor::Middle => "middle",
            TextAnchor::End => "end",
        }
    }
}

/// Vector description of one slide overlay: the band plus anchored text runs,
/// ready for the rasterizer.
#[derive(Debug, Clone)]
pub struct SlideOverlay {
    pub band: Band,
    pub lines: Vec<String>,
    pub font_size: f32,
    pub line_height: f32,
    pub anchor: TextAnchor,
    pub text_x: f32,
    pub first_baseline_y: f32,
}

/// Size the band around the wrapped text and pin it inside the safe area for
/// `position`.
pub fn place_band(wrap: WrapResult, position: Position) -> SlideOverlay {
    let safe = position.safe_area();

    let mut w = wrap.max_line_width + 2.0 * BAND_PAD_X;
    if wrap.lines.len() >= MAX_TEXT_LINES {
        w *= FULL_BAND_WIDEN;
    }
    let w = w.min(safe.max_w).max(BAND_MIN_W);
    let h = wrap.lines.len() as f32 * wrap.line_height + 2.0 * BAND_PAD_Y + BAND_H_FUDGE;

    let x = match position.h_align() {
        HAlign::Left => SAFE_LEFT,
        HAlign::Center => (CANVAS_W - w) / 2.0,
        HAlign::Right => CANVAS_W - SAFE_RIGHT - w,
    };
    let y = match position.v_align() {
        VAlign::Top => SAFE_TOP + EDGE_OFFSET,
        VAlign::Bottom => CANVAS_H - SAFE_BOTTOM - h - EDGE_OFFSET,
    };

    let (anchor, text_x) = match position.h_align() {
        HAlign::Left => (TextAnchor::Start, x + BAND_PAD_X),
        HAlign::Center => (TextAnchor::Middle, x + w / 2.0),
        HAlign::Right => (TextAnchor::End, x + w - BAND_PAD_X),
    };
    let first_baseline_y = y + BAND_PAD_Y + wrap.font_size;

    SlideOverlay {
        band: Band {
            x,
            y,
            w,
            h,
            radius: BAND_RADIUS,
        },
        font_size: wrap.font_size,
        line_height: wrap.line_height,
        lines: wrap.lines,
        anchor,
        text_x,
        first_baseline_y,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{ALL_POSITIONS, Role, autofit};

    fn owned(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|line| line.to_string()).collect()
    }

    fn overlay_for(lines: &[&str], role: Role, position: Position) -> SlideOverlay {
        let wrap = autofit(&owned(lines), role, position.safe_area().max_w);
        place_band(wrap, position)
    }

    #[test]
    fn band_width_stays_within_bounds() {
        let cases: &[&[&str]] = &[
            &["hi"],
            &["I screenshot it.", "Then it dies."],
            &["a much longer body line that will wrap", "and another one", "third"],
        ];
        for lines in cases {
            for position in ALL_POSITIONS {
                let overlay = overlay_for(lines, Role::Body, position);
                let max_w = position.safe_area().max_w;
                assert!(overlay.band.w >= BAND_MIN_W, "below minimum: {:?}", lines);
                assert!(overlay.band.w <= max_w, "above safe max: {:?}", lines);
            }
        }
    }

    #[test]
    fn hook_scenario_band_is_centered() {
        let overlay = overlay_for(
            &["I screenshot it.", "Then it dies."],
            Role::Hook,
            Position::TopCenter,
        );
        assert_eq!(overlay.font_size, 96.0);
        assert_eq!(overlay.lines.len(), 2);
        // measured max ~844 + padding exceeds the safe area, so the band
        // clamps to it and centers at (1080 - 896) / 2
        assert_eq!(overlay.band.w, 896.0);
        assert!((overlay.band.x - 92.0).abs() < 1e-3);
        assert_eq!(overlay.anchor, TextAnchor::Middle);
        assert!((overlay.text_x - (overlay.band.x + overlay.band.w / 2.0)).abs() < 1e-3);
    }

    #[test]
    fn left_positions_pin_to_safe_left() {
        let overlay = overlay_for(&["note it"], Role::Body, Position::TopLeft);
        assert_eq!(overlay.band.x, SAFE_LEFT);
        assert_eq!(overlay.anchor, TextAnchor::Start);
        assert_eq!(overlay.text_x, SAFE_LEFT + BAND_PAD_X);
    }

    #[test]
    fn right_positions_pin_to_safe_right() {
        let overlay = overlay_for(&["note it"], Role::Body, Position::BottomRight);
        assert!((overlay.band.x + overlay.band.w - (CANVAS_W - SAFE_RIGHT)).abs() < 1e-3);
        assert_eq!(overlay.anchor, TextAnchor::End);
        assert!((overlay.text_x - (overlay.band.x + overlay.band.w - BAND_PAD_X)).abs() < 1e-3);
    }

    #[test]
    fn top_band_sits_below_top_margin() {
        let overlay = overlay_for(&["short"], Role::Body, Position::TopCenter);
        assert_eq!(overlay.band.y, SAFE_TOP + 12.0);
        assert_eq!(
            overlay.first_baseline_y,
            overlay.band.y + BAND_PAD_Y + overlay.font_size
        );
    }

    #[test]
    fn bottom_band_sits_above_bottom_margin() {
        let overlay = overlay_for(&["short"], Role::Body, Position::BottomCenter);
        assert!((overlay.band.y + overlay.band.h - (CANVAS_H - SAFE_BOTTOM - 12.0)).abs() < 1e-3);
    }

    #[test]
    fn three_line_band_gets_widened() {
        let lines = ["alpha beta gamma", "delta epsilon zeta", "eta theta iota"];
        let wrap = autofit(&owned(&lines), Role::Cta, 896.0);
        assert_eq!(wrap.lines.len(), 3);
        let expected = (wrap.max_line_width + 2.0 * BAND_PAD_X) * 1.05;
        let overlay = place_band(wrap, Position::BottomCenter);
        assert!((overlay.band.w - expected.clamp(BAND_MIN_W, 896.0)).abs() < 1e-3);
    }

    #[test]
    fn band_height_tracks_line_count() {
        let one = overlay_for(&["one line"], Role::Body, Position::TopCenter);
        let two = overlay_for(&["one line", "two lines"], Role::Body, Position::TopCenter);
        assert!((two.band.h - one.band.h - one.line_height).abs() < 1e-3);
    }
}
