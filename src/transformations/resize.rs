//! Scale to new dimensions, keeping the aspect ratio when one side is omitted.

use super::{Transformation, TransformationError, decode, store};
use crate::imaging::calculations::resize_dimensions;
use crate::imaging::{BackendError, Dimensions, ImageBackend};
use crate::params::{Params, ValidationError};
use crate::types::Image;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resize {
    pub width: Option<i64>,
    pub height: Option<i64>,
}

impl Resize {
    pub const NAME: &'static str = "resize";

    pub fn from_params(params: &Params) -> Result<Self, ValidationError> {
        let width = params.int("width")?;
        let height = params.int("height")?;
        if width.is_none() && height.is_none() {
            return Err(ValidationError::Conflict(
                "Missing both width and height. You need to specify at least one of them".into(),
            ));
        }
        Ok(Self { width, height })
    }
}

impl Transformation for Resize {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn apply(
        &self,
        image: &mut Image,
        backend: &dyn ImageBackend,
    ) -> Result<(), TransformationError> {
        let wrap = TransformationError::wrap(Self::NAME);
        let side = |v: Option<i64>| {
            v.map(|v| {
                u32::try_from(v).map_err(|_| {
                    BackendError::InvalidGeometry(format!("resize side out of range: {v}"))
                })
            })
            .transpose()
        };
        let width = side(self.width).map_err(&wrap)?;
        let height = side(self.height).map_err(&wrap)?;

        let source = decode(Self::NAME, image, backend)?;
        let Dimensions { width, height } =
            resize_dimensions(Dimensions::of(&source), width, height).ok_or_else(|| {
                wrap(BackendError::InvalidGeometry(
                    "resize needs a width or a height".into(),
                ))
            })?;
        let resized = backend.resize(&source, width, height).map_err(&wrap)?;
        store(Self::NAME, image, &resized, backend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use crate::test_helpers::{assert_model_consistent, png_image};

    #[test]
    fn one_side_is_required() {
        assert!(matches!(
            Resize::from_params(&Params::new()),
            Err(ValidationError::Conflict(_))
        ));
    }

    #[test]
    fn missing_height_keeps_aspect() {
        let backend = MockBackend::new();
        let mut image = png_image(80, 60);
        Resize::from_params(&Params::new().with("width", "40"))
            .unwrap()
            .apply(&mut image, &backend)
            .unwrap();
        assert_eq!((image.width(), image.height()), (40, 30));
        assert_model_consistent(&image);
        assert!(backend.get_operations().contains(&RecordedOp::Resize {
            width: 40,
            height: 30
        }));
    }

    #[test]
    fn zero_width_fails_in_backend() {
        let mut image = png_image(10, 10);
        let err = Resize {
            width: Some(0),
            height: Some(5),
        }
        .apply(&mut image, &MockBackend::new())
        .unwrap_err();
        assert!(err.to_string().contains("resize target must be positive"));
    }

    #[test]
    fn negative_side_is_rejected() {
        let mut image = png_image(10, 10);
        let result = Resize {
            width: Some(-10),
            height: None,
        }
        .apply(&mut image, &MockBackend::new());
        assert!(result.is_err());
        assert!(!image.is_transformed());
    }
}
