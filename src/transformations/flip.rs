//! Mirror transformations. Neither takes parameters.

use super::{Transformation, TransformationError, decode, store};
use crate::imaging::{FlipAxis, ImageBackend};
use crate::params::{Params, ValidationError};
use crate::types::Image;

fn flip(
    name: &'static str,
    axis: FlipAxis,
    image: &mut Image,
    backend: &dyn ImageBackend,
) -> Result<(), TransformationError> {
    let source = decode(name, image, backend)?;
    let flipped = backend
        .flip(&source, axis)
        .map_err(TransformationError::wrap(name))?;
    store(name, image, &flipped, backend)
}

/// Mirror left-right.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlipHorizontally;

impl FlipHorizontally {
    pub const NAME: &'static str = "flip-horizontally";

    pub fn from_params(_params: &Params) -> Result<Self, ValidationError> {
        Ok(Self)
    }
}

impl Transformation for FlipHorizontally {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn apply(
        &self,
        image: &mut Image,
        backend: &dyn ImageBackend,
    ) -> Result<(), TransformationError> {
        flip(Self::NAME, FlipAxis::Horizontal, image, backend)
    }
}

/// Mirror top-bottom.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlipVertically;

impl FlipVertically {
    pub const NAME: &'static str = "flip-vertically";

    pub fn from_params(_params: &Params) -> Result<Self, ValidationError> {
        Ok(Self)
    }
}

impl Transformation for FlipVertically {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn apply(
        &self,
        image: &mut Image,
        backend: &dyn ImageBackend,
    ) -> Result<(), TransformationError> {
        flip(Self::NAME, FlipAxis::Vertical, image, backend)
    }
}
