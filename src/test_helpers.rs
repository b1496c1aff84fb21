//! Shared test utilities for the imgxform test suite.
//!
//! Fixtures are synthetic and built in memory, so tests never depend on
//! image files on disk.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let mut image = png_image(100, 50);
//! Pipeline::with_defaults(RustBackend::new())
//!     .apply_chain(&mut image, &[Invocation::new("rotate").param("angle", "360")])
//!     .unwrap();
//! assert_pixels_eq(&decode(&image), &gradient(100, 50));
//! ```

use crate::imaging::{ImageBackend, RustBackend};
use crate::types::Image;
use image::{DynamicImage, GenericImageView, Rgba, RgbaImage};

// =========================================================================
// Fixture builders
// =========================================================================

/// Opaque RGBA image where every pixel is distinct for images up to 256×256
/// and asymmetric on both axes, so flips and rotations are detectable.
pub fn gradient(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x % 256) as u8, (y % 256) as u8, ((x * 7 + y * 3) % 256) as u8, 255])
    }))
}

/// PNG-encoded [`gradient`].
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    RustBackend::new()
        .encode(&gradient(width, height), "png", None)
        .unwrap()
}

/// Image model holding a PNG [`gradient`].
pub fn png_image(width: u32, height: u32) -> Image {
    Image::new(png_bytes(width, height), width, height, "png")
}

/// Decode the model's current payload.
pub fn decode(image: &Image) -> DynamicImage {
    RustBackend::new().decode(image.bytes()).unwrap()
}

// =========================================================================
// Assertions
// =========================================================================

/// Assert two images are pixel-identical after RGBA normalization.
pub fn assert_pixels_eq(actual: &DynamicImage, expected: &DynamicImage) {
    assert_eq!(
        actual.dimensions(),
        expected.dimensions(),
        "dimension mismatch"
    );
    assert!(
        actual.to_rgba8() == expected.to_rgba8(),
        "pixel content differs"
    );
}

/// Assert the model's dimensions match what its bytes decode to.
pub fn assert_model_consistent(image: &Image) {
    let decoded = decode(image);
    assert_eq!(
        (image.width(), image.height()),
        decoded.dimensions(),
        "model dimensions out of sync with payload"
    );
}
