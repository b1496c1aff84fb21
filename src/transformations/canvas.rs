//! Place the image on a new canvas, cropping it when it no longer fits.
//!
//! ```text
//! 1. blank canvas (width × height, bg)
//! 2. decode the source
//! 3. crop each overflowing axis (from 0, or centred in center / center-<axis>)
//! 4. placement from (x, y), re-centred per mode against the cropped size
//! 5. paste, encode with the image's extension
//! ```
//!
//! Axes are handled independently: `center-x` never moves or crops the
//! vertical axis away from its origin, and vice versa.

use super::{Transformation, TransformationError, background, decode, store};
use crate::imaging::calculations::{center_offset, crop_axis};
use crate::imaging::{Dimensions, ImageBackend, Region};
use crate::params::{Params, ValidationError};
use crate::types::Image;
use std::str::FromStr;
use tracing::debug;

/// How the existing image is positioned on the canvas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PlacementMode {
    /// Use `x` and `y` as given.
    #[default]
    Free,
    /// Centre on both axes.
    Center,
    /// Centre horizontally, `y` vertically.
    CenterX,
    /// Centre vertically, `x` horizontally.
    CenterY,
}

impl PlacementMode {
    pub fn centers_x(self) -> bool {
        matches!(self, Self::Center | Self::CenterX)
    }

    pub fn centers_y(self) -> bool {
        matches!(self, Self::Center | Self::CenterY)
    }
}

impl FromStr for PlacementMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "free" => Ok(Self::Free),
            "center" => Ok(Self::Center),
            "center-x" => Ok(Self::CenterX),
            "center-y" => Ok(Self::CenterY),
            other => Err(format!(
                "unknown placement mode '{other}'. Expected free, center, center-x or center-y"
            )),
        }
    }
}

/// Where the source is cropped and where it lands on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanvasPlan {
    pub crop: Option<Region>,
    pub x: i64,
    pub y: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Canvas {
    pub width: i64,
    pub height: i64,
    pub mode: PlacementMode,
    pub x: i64,
    pub y: i64,
    pub bg: Option<String>,
}

impl Canvas {
    pub const NAME: &'static str = "canvas";

    pub fn from_params(params: &Params) -> Result<Self, ValidationError> {
        let width = params.require_int("width")?;
        let height = params.require_int("height")?;
        let mode = match params.get("mode") {
            Some(raw) => raw.parse().map_err(|_| ValidationError::Invalid {
                name: "mode".into(),
                value: raw.to_string(),
                expected: "one of free, center, center-x, center-y",
            })?,
            None => PlacementMode::Free,
        };
        Ok(Self {
            width,
            height,
            mode,
            x: params.int_or("x", 0)?,
            y: params.int_or("y", 0)?,
            bg: params.string("bg"),
        })
    }

    /// Work out crop and placement for a `source` on a `canvas`.
    pub fn plan(&self, source: Dimensions, canvas: Dimensions) -> CanvasPlan {
        let (crop_x, crop_w) = crop_axis(source.width, canvas.width, self.mode.centers_x());
        let (crop_y, crop_h) = crop_axis(source.height, canvas.height, self.mode.centers_y());

        let crop = (source.width > canvas.width || source.height > canvas.height).then_some(
            Region {
                x: crop_x,
                y: crop_y,
                width: crop_w,
                height: crop_h,
            },
        );

        // Placement is computed against the cropped size.
        let x = if self.mode.centers_x() {
            center_offset(canvas.width, crop_w)
        } else {
            self.x
        };
        let y = if self.mode.centers_y() {
            center_offset(canvas.height, crop_h)
        } else {
            self.y
        };

        CanvasPlan { crop, x, y }
    }
}

impl Transformation for Canvas {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn apply(
        &self,
        image: &mut Image,
        backend: &dyn ImageBackend,
    ) -> Result<(), TransformationError> {
        let wrap = TransformationError::wrap(Self::NAME);

        let bg = background(Self::NAME, self.bg.as_deref(), backend)?;
        let canvas = backend
            .create_canvas(self.width, self.height, bg)
            .map_err(&wrap)?;
        let mut source = decode(Self::NAME, image, backend)?;

        let plan = self.plan(Dimensions::of(&source), Dimensions::of(&canvas));
        debug!(
            mode = ?self.mode,
            crop = ?plan.crop,
            x = plan.x,
            y = plan.y,
            "canvas placement"
        );
        if let Some(region) = plan.crop {
            source = backend.crop(&source, region).map_err(&wrap)?;
        }

        let result = backend
            .paste(canvas, &source, plan.x, plan.y)
            .map_err(&wrap)?;
        store(Self::NAME, image, &result, backend)
    }
}
