//! Rotate clockwise by an arbitrary angle.

use super::{Transformation, TransformationError, background, decode, store};
use crate::imaging::ImageBackend;
use crate::params::{Params, ValidationError};
use crate::types::Image;

#[derive(Debug, Clone, PartialEq)]
pub struct Rotate {
    /// Degrees, positive is clockwise.
    pub angle: f64,
    /// Fill for the corners uncovered by non-right angles.
    pub bg: Option<String>,
}

impl Rotate {
    pub const NAME: &'static str = "rotate";

    pub fn from_params(params: &Params) -> Result<Self, ValidationError> {
        Ok(Self {
            angle: params.require_float("angle")?,
            bg: params.string("bg"),
        })
    }
}

impl Transformation for Rotate {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn apply(
        &self,
        image: &mut Image,
        backend: &dyn ImageBackend,
    ) -> Result<(), TransformationError> {
        let bg = background(Self::NAME, self.bg.as_deref(), backend)?;
        let source = decode(Self::NAME, image, backend)?;
        let rotated = backend
            .rotate(&source, self.angle, bg)
            .map_err(TransformationError::wrap(Self::NAME))?;
        store(Self::NAME, image, &rotated, backend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use crate::test_helpers::{assert_model_consistent, png_image};

    fn rotate(angle: &str) -> Rotate {
        Rotate::from_params(&Params::new().with("angle", angle).with("bg", "fff")).unwrap()
    }

    #[test]
    fn missing_angle_is_a_validation_error() {
        assert_eq!(
            Rotate::from_params(&Params::new().with("bg", "fff")),
            Err(ValidationError::Missing("angle".into()))
        );
    }

    #[test]
    fn angle_accepts_reals() {
        assert_eq!(rotate("-12.5").angle, -12.5);
    }

    #[test]
    fn rotate_90_swaps_dimensions() {
        let mut image = png_image(66, 46);
        rotate("90").apply(&mut image, &MockBackend::new()).unwrap();
        assert_eq!((image.width(), image.height()), (46, 66));
        assert!(image.is_transformed());
        assert_model_consistent(&image);
    }

    #[test]
    fn rotate_180_keeps_dimensions() {
        let mut image = png_image(66, 46);
        rotate("180").apply(&mut image, &MockBackend::new()).unwrap();
        assert_eq!((image.width(), image.height()), (66, 46));
    }

    #[test]
    fn arbitrary_angle_grows_bounding_box() {
        let backend = MockBackend::new();
        let mut image = png_image(40, 20);
        rotate("30").apply(&mut image, &backend).unwrap();
        assert!(image.width() > 40 && image.height() > 20);
        assert_model_consistent(&image);
        assert!(
            backend
                .get_operations()
                .contains(&RecordedOp::Rotate { degrees: 30.0 })
        );
    }

    #[test]
    fn invalid_background_is_wrapped() {
        let mut image = png_image(4, 4);
        let err = Rotate::from_params(&Params::new().with("angle", "45").with("bg", "blurple"))
            .unwrap()
            .apply(&mut image, &MockBackend::new())
            .unwrap_err();
        assert_eq!(err.to_string(), "rotate failed: Invalid color: blurple");
        assert!(!image.is_transformed());
    }
}
