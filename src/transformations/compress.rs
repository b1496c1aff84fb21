//! Re-encode at a given quality.

use super::{Transformation, TransformationError, decode};
use crate::imaging::ImageBackend;
use crate::params::{Params, ValidationError};
use crate::types::Image;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Compress {
    /// Nominally 0–100. Range checks are left to the backend.
    pub quality: i64,
}

impl Compress {
    pub const NAME: &'static str = "compress";

    pub fn from_params(params: &Params) -> Result<Self, ValidationError> {
        Ok(Self {
            quality: params.require_int("quality")?,
        })
    }
}

impl Transformation for Compress {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn apply(
        &self,
        image: &mut Image,
        backend: &dyn ImageBackend,
    ) -> Result<(), TransformationError> {
        let source = decode(Self::NAME, image, backend)?;
        let bytes = backend
            .encode(&source, image.extension(), Some(self.quality))
            .map_err(TransformationError::wrap(Self::NAME))?;
        image.replace(bytes, source.width(), source.height());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use crate::test_helpers::{assert_model_consistent, png_image};

    #[test]
    fn missing_quality_names_the_parameter() {
        let err = Compress::from_params(&Params::new()).unwrap_err();
        assert_eq!(err, ValidationError::Missing("quality".into()));
        assert_eq!(err.to_string(), "Missing required parameter: quality");
    }

    #[test]
    fn compress_reencodes_with_quality() {
        let backend = MockBackend::new();
        let mut image = png_image(32, 24);
        image.set_extension("jpg");
        Compress { quality: 50 }.apply(&mut image, &backend).unwrap();

        assert!(image.is_transformed());
        assert_eq!((image.width(), image.height()), (32, 24));
        assert_model_consistent(&image);
        assert_eq!(
            backend.get_operations().last(),
            Some(&RecordedOp::Encode {
                format: "jpg".into(),
                quality: Some(50)
            })
        );
    }

    #[test]
    fn out_of_range_quality_surfaces_backend_error() {
        let mut image = png_image(8, 8);
        let before = image.clone();
        let err = Compress { quality: 250 }
            .apply(&mut image, &MockBackend::new())
            .unwrap_err();
        assert!(err.to_string().contains("quality must be between 0 and 100, got 250"));
        assert_eq!(image, before);
    }
}
