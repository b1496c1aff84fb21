//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait is the only way transformations touch pixels:
//! decode, blank canvas, crop, paste, rotate, flip, resize, encode and colour
//! parsing. Every call takes a self-contained buffer and returns a new one,
//! so a backend holds no state between calls and can be shared across
//! worker threads.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate.

use super::color::Color;
use image::DynamicImage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Failed to decode image: {0}")]
    Decode(String),
    #[error("Failed to encode image: {0}")]
    Encode(String),
    #[error("Invalid color: {0}")]
    InvalidColor(String),
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),
    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Width and height of a decoded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn of(image: &DynamicImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
        }
    }
}

/// A rectangle inside a decoded image, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipAxis {
    /// Mirror left-right.
    Horizontal,
    /// Mirror top-bottom.
    Vertical,
}

/// Trait for image processing backends.
///
/// Object safe: transformations receive `&dyn ImageBackend` so the registry
/// of transformations stays independent of the backend type.
pub trait ImageBackend: Sync {
    /// Decode an encoded payload.
    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, BackendError>;

    /// Blank canvas, transparent unless `background` is given.
    ///
    /// Takes signed sizes so that zero or negative requests are rejected here
    /// rather than by the caller.
    fn create_canvas(
        &self,
        width: i64,
        height: i64,
        background: Option<Color>,
    ) -> Result<DynamicImage, BackendError>;

    /// Copy out `region`, which must lie inside `image`.
    fn crop(&self, image: &DynamicImage, region: Region) -> Result<DynamicImage, BackendError>;

    /// Paste `source` onto `canvas` with its top-left corner at `(x, y)`.
    /// Offsets may be negative or overflow; out-of-canvas pixels are dropped.
    fn paste(
        &self,
        canvas: DynamicImage,
        source: &DynamicImage,
        x: i64,
        y: i64,
    ) -> Result<DynamicImage, BackendError>;

    /// Rotate clockwise by `degrees`, growing to the rotated bounding box.
    fn rotate(
        &self,
        image: &DynamicImage,
        degrees: f64,
        background: Option<Color>,
    ) -> Result<DynamicImage, BackendError>;

    fn flip(&self, image: &DynamicImage, axis: FlipAxis) -> Result<DynamicImage, BackendError>;

    fn resize(
        &self,
        image: &DynamicImage,
        width: u32,
        height: u32,
    ) -> Result<DynamicImage, BackendError>;

    /// Encode as `format` (a file extension). `quality` is passed through
    /// unchecked; range enforcement belongs to the backend.
    fn encode(
        &self,
        image: &DynamicImage,
        format: &str,
        quality: Option<i64>,
    ) -> Result<Vec<u8>, BackendError>;

    fn parse_color(&self, value: &str) -> Result<Color, BackendError>;
}
