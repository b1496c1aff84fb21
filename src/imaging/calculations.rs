//! Pure calculation functions for image geometry.
//!
//! All functions here are pure and testable without any I/O or images.

use super::backend::Dimensions;

/// Crop window along one axis when fitting `source` pixels into `target`.
///
/// Returns `(offset, length)`. When the source fits, the whole axis is kept
/// (`(0, source)`). When it overflows, the window is `target` long and starts
/// at 0, or at `(source - target) / 2` (floored) when the axis is centred.
pub fn crop_axis(source: u32, target: u32, centered: bool) -> (u32, u32) {
    if source > target {
        let offset = if centered { (source - target) / 2 } else { 0 };
        (offset, target)
    } else {
        (0, source)
    }
}

/// Offset that centres `inner` inside `outer`.
///
/// Integer division truncates toward zero, so an `inner` larger than `outer`
/// by an odd amount rounds toward the origin (`outer=3, inner=6` → `-1`).
pub fn center_offset(outer: u32, inner: u32) -> i64 {
    (i64::from(outer) - i64::from(inner)) / 2
}

/// Fold any angle into `[0, 360)`.
pub fn normalize_degrees(degrees: f64) -> f64 {
    let folded = degrees.rem_euclid(360.0);
    // rem_euclid can return exactly 360.0 for tiny negative inputs
    if folded >= 360.0 { 0.0 } else { folded }
}

/// Number of clockwise quarter turns if `degrees` is a multiple of 90.
pub fn quarter_turns(degrees: f64) -> Option<u8> {
    let normalized = normalize_degrees(degrees);
    let turns = normalized / 90.0;
    if (turns - turns.round()).abs() < 1e-9 {
        Some((turns.round() as u8) % 4)
    } else {
        None
    }
}

/// Bounding box of a `width` × `height` image rotated by `degrees`.
///
/// Right angles are exact (90/270 swap the sides); anything else grows to
/// the smallest box containing the rotated rectangle, rounded up.
pub fn rotated_bounds(width: u32, height: u32, degrees: f64) -> Dimensions {
    if let Some(turns) = quarter_turns(degrees) {
        return if turns % 2 == 1 {
            Dimensions {
                width: height,
                height: width,
            }
        } else {
            Dimensions { width, height }
        };
    }

    let (sin, cos) = degrees.to_radians().sin_cos();
    let (w, h) = (f64::from(width), f64::from(height));
    let bound = |v: f64| ((v - 1e-6).ceil().max(1.0)) as u32;
    Dimensions {
        width: bound(w * cos.abs() + h * sin.abs()),
        height: bound(w * sin.abs() + h * cos.abs()),
    }
}

/// Fill in a missing side so the result keeps the source aspect ratio.
///
/// Returns `None` when neither side is given.
pub fn resize_dimensions(
    source: Dimensions,
    width: Option<u32>,
    height: Option<u32>,
) -> Option<Dimensions> {
    let ratio = |num: u32, scale: u32, den: u32| -> u32 {
        let v = (f64::from(num) * f64::from(scale) / f64::from(den.max(1))).round();
        v.max(1.0) as u32
    };
    match (width, height) {
        (Some(width), Some(height)) => Some(Dimensions { width, height }),
        (Some(width), None) => Some(Dimensions {
            width,
            height: ratio(source.height, width, source.width),
        }),
        (None, Some(height)) => Some(Dimensions {
            width: ratio(source.width, height, source.height),
            height,
        }),
        (None, None) => None,
    }
}
