use serde::{Deserialize, Serialize};

use crate::models::AspectRatio;

pub const MIN_SIDE: u32 = 64;
pub const SIDE_STEP: u32 = 8;
/// Largest multiple of `SIDE_STEP` a `u32` holds.
pub const MAX_SIDE: u32 = u32::MAX - u32::MAX % SIDE_STEP;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Pixel size for `aspect` with `resolution` as the longer side.
pub fn resolve_dimensions(aspect: AspectRatio, resolution: u32) -> Dimensions {
    let (w_ratio, h_ratio) = aspect.ratio();
    let long_is_width = w_ratio >= h_ratio;
    let long = resolution;
    let short = (f64::from(resolution) * f64::from(w_ratio.min(h_ratio))
        / f64::from(w_ratio.max(h_ratio)))
    .round() as u32;

    let (width, height) = if long_is_width {
        (long, short)
    } else {
        (short, long)
    };

    Dimensions {
        width: snap(width),
        height: snap(height),
    }
}

/// Nearest multiple of 8, half rounding up, clamped to `MIN_SIDE..=MAX_SIDE`.
fn snap(side: u32) -> u32 {
    let steps = (f64::from(side) / f64::from(SIDE_STEP)).round() as u64;
    let snapped = (steps * u64::from(SIDE_STEP)).min(u64::from(MAX_SIDE)) as u32;
    snapped.max(MIN_SIDE)
}
