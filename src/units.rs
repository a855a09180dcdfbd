//! Unit conversions between CSS pixels and flow-document units.
//!
//! CSS pixels are 1/96 inch. At 96 DPI one pixel is 15 twips
//! (twentieths of a point) and 1.5 half-points.

/// Twips per CSS pixel.
pub const TWIPS_PER_PX: f64 = 15.0;

/// Half-points per CSS pixel.
pub const HALF_POINTS_PER_PX: f64 = 1.5;

/// English Metric Units per CSS pixel (914400 EMU per inch / 96).
pub const EMU_PER_PX: f64 = 9525.0;

/// Smallest font size emitted, in half-points.
pub const MIN_HALF_POINTS: u32 = 2;

/// Convert pixels to twips: `round(px * 15)`.
pub fn px_to_twip(px: f64) -> i64 {
    (px * TWIPS_PER_PX).round() as i64
}

/// Convert a font size in pixels to half-points, never below [`MIN_HALF_POINTS`].
pub fn px_to_half_point(px: f64) -> u32 {
    let hp = (px * HALF_POINTS_PER_PX).round();
    if hp.is_nan() || hp < MIN_HALF_POINTS as f64 {
        MIN_HALF_POINTS
    } else {
        hp as u32
    }
}

/// Convert pixels to EMU for drawing extents.
pub fn px_to_emu(px: f64) -> i64 {
    (px * EMU_PER_PX).round() as i64
}
