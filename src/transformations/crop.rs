//! Cut a region out of the image.

use super::{Transformation, TransformationError, decode, store};
use crate::imaging::{ImageBackend, Region};
use crate::params::{Params, ValidationError};
use crate::types::Image;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crop {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

impl Crop {
    pub const NAME: &'static str = "crop";

    pub fn from_params(params: &Params) -> Result<Self, ValidationError> {
        Ok(Self {
            width: params.require_int("width")?,
            height: params.require_int("height")?,
            x: params.int_or("x", 0)?,
            y: params.int_or("y", 0)?,
        })
    }

    /// The region as backend coordinates; negative parts clamp to zero and
    /// are then rejected by the backend as an empty or misplaced crop.
    fn region(&self) -> Region {
        let clamp = |v: i64| u32::try_from(v.max(0)).unwrap_or(u32::MAX);
        Region {
            x: clamp(self.x),
            y: clamp(self.y),
            width: clamp(self.width),
            height: clamp(self.height),
        }
    }
}

impl Transformation for Crop {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn apply(
        &self,
        image: &mut Image,
        backend: &dyn ImageBackend,
    ) -> Result<(), TransformationError> {
        let source = decode(Self::NAME, image, backend)?;
        let cropped = backend
            .crop(&source, self.region())
            .map_err(TransformationError::wrap(Self::NAME))?;
        store(Self::NAME, image, &cropped, backend)
    }
}
