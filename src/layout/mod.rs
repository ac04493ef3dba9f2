mod band;
mod crop;
mod fit;
mod measure;
mod wrap;

pub use band::{Band, SlideOverlay, TextAnchor, place_band};
pub use crop::{CropRegion, TARGET_RATIO, crop_region};
pub use fit::{WrapResult, autofit};
pub use measure::estimate_width;
pub use wrap::wrap_lines;

pub const CANVAS_W: f32 = 1080.0;
pub const CANVAS_H: f32 = 1920.0;

pub const SAFE_LEFT: f32 = 64.0;
pub const SAFE_RIGHT: f32 = 120.0;
pub const SAFE_TOP: f32 = 140.0;
pub const SAFE_BOTTOM: f32 = 280.0;

pub const BAND_PAD_X: f32 = 40.0;
pub const BAND_PAD_Y: f32 = 28.0;
pub const BAND_RADIUS: f32 = 16.0;
pub const BAND_MIN_W: f32 = 320.0;

pub const MAX_TEXT_LINES: usize = 3;
pub const LINE_HEIGHT_FACTOR: f32 = 1.35;

const HOOK_LADDER: [f32; 4] = [96.0, 80.0, 64.0, 48.0];
const BODY_LADDER: [f32; 4] = [76.0, 64.0, 52.0, 42.0];
const CTA_LADDER: [f32; 4] = [68.0, 56.0, 46.0, 38.0];

/// Semantic position of a slide's text within the sequence; selects the
/// font-size ladder tried by the auto-fit search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Hook,
    Body,
    Cta,
}

impl Role {
    pub fn ladder(&self) -> &'static [f32] {
        match self {
            Role::Hook => &HOOK_LADDER,
            Role::Body => &BODY_LADDER,
            Role::Cta => &CTA_LADDER,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Hook => "hook",
            Role::Body => "body",
            Role::Cta => "cta",
        }
    }

    pub fn parse(name: &str) -> Option<Role> {
        match name.trim().to_lowercase().as_str() {
            "hook" => Some(Role::Hook),
            "body" => Some(Role::Body),
            "cta" | "call-to-action" => Some(Role::Cta),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HAlign {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VAlign {
    Top,
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    TopLeft,
    TopCenter,
    TopRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

pub const ALL_POSITIONS: [Position; 6] = [
    Position::TopLeft,
    Position::TopCenter,
    Position::TopRight,
    Position::BottomLeft,
    Position::BottomCenter,
    Position::BottomRight,
];

impl Position {
    pub fn h_align(&self) -> HAlign {
        match self {
            Position::TopLeft | Position::BottomLeft => HAlign::Left,
            Position::TopCenter | Position::BottomCenter => HAlign::Center,
            Position::TopRight | Position::BottomRight => HAlign::Right,
        }
    }

    pub fn v_align(&self) -> VAlign {
        match self {
            Position::TopLeft | Position::TopCenter | Position::TopRight => VAlign::Top,
            _ => VAlign::Bottom,
        }
    }

    pub fn safe_area(&self) -> SafeArea {
        SafeArea {
            max_w: CANVAS_W - SAFE_LEFT - SAFE_RIGHT,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Position::TopLeft => "top-left",
            Position::TopCenter => "top-center",
            Position::TopRight => "top-right",
            Position::BottomLeft => "bottom-left",
            Position::BottomCenter => "bottom-center",
            Position::BottomRight => "bottom-right",
        }
    }

    pub fn parse(name: &str) -> Option<Position> {
        match name.trim().to_lowercase().as_str() {
            "top-left" => Some(Position::TopLeft),
            "top-center" => Some(Position::TopCenter),
            "top-right" => Some(Position::TopRight),
            "bottom-left" => Some(Position::BottomLeft),
            "bottom-center" => Some(Position::BottomCenter),
            "bottom-right" => Some(Position::BottomRight),
            _ => None,
        }
    }
}

/// Usable region of the canvas once platform UI chrome is excluded.
#[derive(Debug, Clone, Copy)]
pub struct SafeArea {
    pub max_w: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CropStrategy {
    Wide,
    ZoomIn,
    LeftFocus,
    RightFocus,
}

pub const ALL_CROP_STRATEGIES: [CropStrategy; 4] = [
    CropStrategy::Wide,
    CropStrategy::ZoomIn,
    CropStrategy::LeftFocus,
    CropStrategy::RightFocus,
];

impl CropStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            CropStrategy::Wide => "wide",
            CropStrategy::ZoomIn => "zoom-in",
            CropStrategy::LeftFocus => "left-focus",
            CropStrategy::RightFocus => "right-focus",
        }
    }

    pub fn parse(name: &str) -> Option<CropStrategy> {
        match name.trim().to_lowercase().as_str() {
            "wide" => Some(CropStrategy::Wide),
            "zoom-in" | "zoom" => Some(CropStrategy::ZoomIn),
            "left-focus" | "left" => Some(CropStrategy::LeftFocus),
            "right-focus" | "right" => Some(CropStrategy::RightFocus),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_ladders_descend() {
        for role in [Role::Hook, Role::Body, Role::Cta] {
            let ladder = role.ladder();
            for pair in ladder.windows(2) {
                assert!(pair[0] > pair[1], "{:?} ladder not descending", role);
            }
        }
    }

    #[test]
    fn position_roundtrip() {
        for position in ALL_POSITIONS {
            assert_eq!(Position::parse(position.as_str()), Some(position));
        }
        assert_eq!(Position::parse("middle-center"), None);
    }

    #[test]
    fn crop_strategy_roundtrip() {
        for strategy in ALL_CROP_STRATEGIES {
            assert_eq!(CropStrategy::parse(strategy.as_str()), Some(strategy));
        }
        assert_eq!(CropStrategy::parse("pan"), None);
    }

    #[test]
    fn safe_area_width_excludes_margins() {
        assert_eq!(Position::TopCenter.safe_area().max_w, 896.0);
    }
}
