//! Named, parameterized transformations.
//!
//! Each variant is built from a [`Params`] mapping (where all validation
//! happens) and then applied to an [`Image`] through the backend. `apply`
//! either swaps in a complete new payload with [`Image::replace`] or leaves
//! the image untouched.
//!
//! | Name | Type | Parameters |
//! |---|---|---|
//! | `canvas` | [`Canvas`] | `width`, `height`, `mode`, `x`, `y`, `bg` |
//! | `rotate` | [`Rotate`] | `angle`, `bg` |
//! | `flip-horizontally` | [`FlipHorizontally`] | none |
//! | `flip-vertically` | [`FlipVertically`] | none |
//! | `compress` | [`Compress`] | `quality` |
//! | `crop` | [`Crop`] | `width`, `height`, `x`, `y` |
//! | `resize` | [`Resize`] | `width` and/or `height` |

mod canvas;
mod compress;
mod crop;
mod flip;
mod resize;
mod rotate;

pub use canvas::{Canvas, PlacementMode};
pub use compress::Compress;
pub use crop::Crop;
pub use flip::{FlipHorizontally, FlipVertically};
pub use resize::Resize;
pub use rotate::Rotate;

use crate::imaging::{BackendError, ImageBackend};
use crate::types::Image;
use std::fmt;
use thiserror::Error;

/// A backend failure raised while a transformation was running.
///
/// Always a client fault: it stems from request data (a bad colour, an
/// out-of-range quality) or from the image content itself.
#[derive(Error, Debug)]
#[error("{transformation} failed: {source}")]
pub struct TransformationError {
    pub transformation: &'static str,
    #[source]
    pub source: BackendError,
}

impl TransformationError {
    /// Adapter for `map_err` that tags a backend error with its transformation.
    pub fn wrap(transformation: &'static str) -> impl Fn(BackendError) -> Self {
        move |source| Self {
            transformation,
            source,
        }
    }
}

/// One configured unit of work.
///
/// Instances own only their own, already validated, configuration.
pub trait Transformation: fmt::Debug + Send + Sync {
    /// Registry name, e.g. `"canvas"`.
    fn name(&self) -> &'static str;

    fn apply(
        &self,
        image: &mut Image,
        backend: &dyn ImageBackend,
    ) -> Result<(), TransformationError>;
}

/// Decode the model's payload, tagging failures with `name`.
fn decode(
    name: &'static str,
    image: &Image,
    backend: &dyn ImageBackend,
) -> Result<image::DynamicImage, TransformationError> {
    backend
        .decode(image.bytes())
        .map_err(TransformationError::wrap(name))
}

/// Encode `result` with the model's extension and swap it in.
fn store(
    name: &'static str,
    image: &mut Image,
    result: &image::DynamicImage,
    backend: &dyn ImageBackend,
) -> Result<(), TransformationError> {
    let bytes = backend
        .encode(result, image.extension(), None)
        .map_err(TransformationError::wrap(name))?;
    image.replace(bytes, result.width(), result.height());
    Ok(())
}

/// Parse an optional `bg` through the backend.
fn background(
    name: &'static str,
    value: Option<&str>,
    backend: &dyn ImageBackend,
) -> Result<Option<crate::imaging::Color>, TransformationError> {
    value
        .map(|s| backend.parse_color(s))
        .transpose()
        .map_err(TransformationError::wrap(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_carries_backend_message() {
        let err = TransformationError::wrap("canvas")(BackendError::InvalidColor("zzz".into()));
        assert_eq!(err.to_string(), "canvas failed: Invalid color: zzz");
        assert!(std::error::Error::source(&err).is_some());
    }
}
