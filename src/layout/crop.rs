use super::CropStrategy;

/// Output aspect ratio, width over height.
pub const TARGET_RATIO: f64 = 1080.0 / 1920.0;

const ZOOM_FRACTION: f64 = 0.65;

/// Region of a source image matching the output aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRegion {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

/// Compute the extract rectangle for `strategy` within a `src_w` x `src_h`
/// source. The result never exceeds the source bounds.
pub fn crop_region(src_w: u32, src_h: u32, strategy: CropStrategy) -> CropRegion {
    let src_w = src_w.max(1);
    let src_h = src_h.max(1);
    let (width, height) = match strategy {
        CropStrategy::Wide => wide_extract(src_w, src_h),
        CropStrategy::ZoomIn => zoom_extract(src_w, src_h),
        CropStrategy::LeftFocus | CropStrategy::RightFocus => edge_extract(src_w, src_h),
    };

    let width = width.min(src_w);
    let height = height.min(src_h);

    let left = match strategy {
        CropStrategy::LeftFocus => 0,
        CropStrategy::RightFocus => src_w - width,
        _ => (src_w - width) / 2,
    };
    let top = (src_h - height) / 2;

    CropRegion {
        left,
        top,
        width,
        height,
    }
}

fn wide_extract(src_w: u32, src_h: u32) -> (u32, u32) {
    let src_ratio = src_w as f64 / src_h as f64;
    if src_ratio > TARGET_RATIO {
        // wider than target: full height, horizontal slice
        let width = (src_h as f64 * TARGET_RATIO).round() as u32;
        (width.max(1), src_h)
    } else {
        // taller than target: full width, vertical slice
        let height = (src_w as f64 / TARGET_RATIO).round() as u32;
        (src_w, height.max(1))
    }
}

fn zoom_extract(src_w: u32, src_h: u32) -> (u32, u32) {
    let mut width = (src_w as f64 * ZOOM_FRACTION).round();
    let mut height = (width / TARGET_RATIO).round();
    let max_height = src_h as f64 * ZOOM_FRACTION;
    if height > max_height {
        height = max_height.round();
        width = (height * TARGET_RATIO).round();
    }
    ((width as u32).max(1), (height as u32).max(1))
}

fn edge_extract(src_w: u32, src_h: u32) -> (u32, u32) {
    let mut height = src_h as f64;
    let mut width = (height * TARGET_RATIO).round();
    if width > src_w as f64 {
        width = src_w as f64;
        height = (width / TARGET_RATIO).round();
    }
    ((width as u32).max(1), (height as u32).max(1))
}
