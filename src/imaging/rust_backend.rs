//! Pure Rust image processing backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, GIF, BMP, TIFF, WebP) | `image::load_from_memory` |
//! | Canvas | `image::RgbaImage::from_pixel` |
//! | Crop | `DynamicImage::crop_imm` |
//! | Paste | `image::imageops::replace` |
//! | Rotate (right angles) | `DynamicImage::rotate90/180/270` |
//! | Rotate (other angles) | `imageproc::geometric_transformations::rotate_about_center`, bilinear |
//! | Flip | `DynamicImage::fliph/flipv` |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` |
//! | Encode | `image::codecs::{jpeg, png}` with quality, `DynamicImage::write_to` otherwise |

use super::backend::{BackendError, FlipAxis, ImageBackend, Region};
use super::calculations::{center_offset, quarter_turns, rotated_bounds};
use super::color::Color;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use imageproc::geometric_transformations::{Interpolation, rotate_about_center};
use std::io::Cursor;
use std::sync::LazyLock;

/// Largest canvas we agree to allocate (roughly 400 MB of RGBA).
const MAX_CANVAS_PIXELS: u64 = 100_000_000;

/// Quality used for JPEG when the caller does not ask for one.
const DEFAULT_JPEG_QUALITY: u8 = 90;

const FORMAT_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("gif", ImageFormat::Gif),
    ("bmp", ImageFormat::Bmp),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    FORMAT_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled() && fmt.writing_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Returns the file extensions this backend can both decode and encode.
pub fn supported_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

fn format_for(ext: &str) -> Option<ImageFormat> {
    FORMAT_CANDIDATES
        .iter()
        .find(|(candidate, _)| candidate.eq_ignore_ascii_case(ext))
        .map(|(_, fmt)| *fmt)
}

/// Whether two extensions name the same encoding (`jpg` and `jpeg` do).
pub fn same_format(a: &str, b: &str) -> bool {
    match (format_for(a), format_for(b)) {
        (Some(x), Some(y)) => x == y,
        _ => a.eq_ignore_ascii_case(b),
    }
}

/// Pure Rust backend using the `image` crate.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Rotate clockwise by an angle that is not a multiple of 90°.
///
/// The source is first centred on a `background` canvas the size of the
/// rotated bounding box, so nothing is clipped by the rotation itself.
fn rotate_free(image: &DynamicImage, degrees: f64, background: Color) -> DynamicImage {
    let src = image.to_rgba8();
    let bounds = rotated_bounds(src.width(), src.height(), degrees);
    let fill: Rgba<u8> = background.into();

    let mut padded = RgbaImage::from_pixel(bounds.width, bounds.height, fill);
    imageops::replace(
        &mut padded,
        &src,
        center_offset(bounds.width, src.width()),
        center_offset(bounds.height, src.height()),
    );
    DynamicImage::ImageRgba8(rotate_about_center(
        &padded,
        degrees.to_radians() as f32,
        Interpolation::Bilinear,
        fill,
    ))
}

/// Map a 0–100 quality onto PNG's zlib effort.
fn png_compression(quality: Option<i64>) -> CompressionType {
    match quality {
        None => CompressionType::Default,
        Some(q) if q < 30 => CompressionType::Fast,
        Some(q) if q < 70 => CompressionType::Default,
        Some(_) => CompressionType::Best,
    }
}

impl ImageBackend for RustBackend {
    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, BackendError> {
        image::load_from_memory(bytes).map_err(|e| BackendError::Decode(e.to_string()))
    }

    fn create_canvas(
        &self,
        width: i64,
        height: i64,
        background: Option<Color>,
    ) -> Result<DynamicImage, BackendError> {
        let invalid = || {
            BackendError::InvalidGeometry(format!(
                "canvas size must be positive, got {width}x{height}"
            ))
        };
        let w = u32::try_from(width).ok().filter(|w| *w > 0).ok_or_else(invalid)?;
        let h = u32::try_from(height).ok().filter(|h| *h > 0).ok_or_else(invalid)?;
        if u64::from(w) * u64::from(h) > MAX_CANVAS_PIXELS {
            return Err(BackendError::InvalidGeometry(format!(
                "canvas {w}x{h} exceeds {MAX_CANVAS_PIXELS} pixels"
            )));
        }
        let fill = background.unwrap_or(Color::TRANSPARENT).into();
        Ok(DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, fill)))
    }

    fn crop(&self, image: &DynamicImage, region: Region) -> Result<DynamicImage, BackendError> {
        let right = u64::from(region.x) + u64::from(region.width);
        let bottom = u64::from(region.y) + u64::from(region.height);
        if region.width == 0
            || region.height == 0
            || right > u64::from(image.width())
            || bottom > u64::from(image.height())
        {
            return Err(BackendError::InvalidGeometry(format!(
                "crop {}x{}+{}+{} is outside the {}x{} image",
                region.width,
                region.height,
                region.x,
                region.y,
                image.width(),
                image.height()
            )));
        }
        Ok(image.crop_imm(region.x, region.y, region.width, region.height))
    }

    fn paste(
        &self,
        canvas: DynamicImage,
        source: &DynamicImage,
        x: i64,
        y: i64,
    ) -> Result<DynamicImage, BackendError> {
        let mut base = canvas.into_rgba8();
        imageops::replace(&mut base, &source.to_rgba8(), x, y);
        Ok(DynamicImage::ImageRgba8(base))
    }

    fn rotate(
        &self,
        image: &DynamicImage,
        degrees: f64,
        background: Option<Color>,
    ) -> Result<DynamicImage, BackendError> {
        if !degrees.is_finite() {
            return Err(BackendError::InvalidGeometry(format!(
                "rotation angle must be finite, got {degrees}"
            )));
        }
        Ok(match quarter_turns(degrees) {
            Some(0) => image.clone(),
            Some(1) => image.rotate90(),
            Some(2) => image.rotate180(),
            Some(_) => image.rotate270(),
            None => rotate_free(image, degrees, background.unwrap_or(Color::TRANSPARENT)),
        })
    }

    fn flip(&self, image: &DynamicImage, axis: FlipAxis) -> Result<DynamicImage, BackendError> {
        Ok(match axis {
            FlipAxis::Horizontal => image.fliph(),
            FlipAxis::Vertical => image.flipv(),
        })
    }

    fn resize(
        &self,
        image: &DynamicImage,
        width: u32,
        height: u32,
    ) -> Result<DynamicImage, BackendError> {
        if width == 0 || height == 0 {
            return Err(BackendError::InvalidGeometry(format!(
                "resize target must be positive, got {width}x{height}"
            )));
        }
        Ok(image.resize_exact(width, height, FilterType::Lanczos3))
    }

    fn encode(
        &self,
        image: &DynamicImage,
        format: &str,
        quality: Option<i64>,
    ) -> Result<Vec<u8>, BackendError> {
        if let Some(q) = quality.filter(|q| !(0..=100).contains(q)) {
            return Err(BackendError::Encode(format!(
                "quality must be between 0 and 100, got {q}"
            )));
        }
        let fmt = format_for(format)
            .filter(|fmt| fmt.writing_enabled())
            .ok_or_else(|| BackendError::UnsupportedFormat(format.to_string()))?;
        let encode_err = |e: image::ImageError| BackendError::Encode(e.to_string());

        let mut buf = Vec::new();
        match fmt {
            ImageFormat::Jpeg => {
                let q = quality.map_or(DEFAULT_JPEG_QUALITY, |q| q.clamp(1, 100) as u8);
                let encoder = JpegEncoder::new_with_quality(&mut buf, q);
                DynamicImage::ImageRgb8(image.to_rgb8())
                    .write_with_encoder(encoder)
                    .map_err(encode_err)?;
            }
            ImageFormat::Png => {
                let encoder = PngEncoder::new_with_quality(
                    &mut buf,
                    png_compression(quality),
                    PngFilter::Adaptive,
                );
                image.write_with_encoder(encoder).map_err(encode_err)?;
            }
            other => {
                DynamicImage::ImageRgba8(image.to_rgba8())
                    .write_to(&mut Cursor::new(&mut buf), other)
                    .map_err(encode_err)?;
            }
        }
        Ok(buf)
    }

    fn parse_color(&self, value: &str) -> Result<Color, BackendError> {
        Color::from_hex(value).ok_or_else(|| BackendError::InvalidColor(value.to_string()))
    }
}
