//! The in-flight image model shared by every transformation.
//!
//! An [`Image`] is created when an image enters the pipeline and is handed by
//! mutable reference to each transformation in turn. Transformations never
//! build a new model; they swap the payload through [`Image::replace`] so the
//! byte payload and its dimensions always move together.

use crate::imaging::{BackendError, Dimensions, ImageBackend};

/// One image under processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    bytes: Vec<u8>,
    width: u32,
    height: u32,
    /// Target encoding, e.g. `"png"` or `"jpg"`. Geometric transformations
    /// leave it alone; every re-encode reads it.
    extension: String,
    transformed: bool,
}

impl Image {
    /// Wrap an already-identified payload.
    pub fn new(bytes: Vec<u8>, width: u32, height: u32, extension: impl Into<String>) -> Self {
        Self {
            bytes,
            width,
            height,
            extension: normalize_extension(&extension.into()),
            transformed: false,
        }
    }

    /// Decode `bytes` once to learn the real dimensions, then wrap them.
    pub fn load(
        backend: &dyn ImageBackend,
        bytes: Vec<u8>,
        extension: impl Into<String>,
    ) -> Result<Self, BackendError> {
        let decoded = backend.decode(&bytes)?;
        Ok(Self::new(
            bytes,
            decoded.width(),
            decoded.height(),
            extension,
        ))
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.width,
            height: self.height,
        }
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Change the encoding used by the next re-encode.
    pub fn set_extension(&mut self, extension: impl Into<String>) {
        self.extension = normalize_extension(&extension.into());
    }

    pub fn is_transformed(&self) -> bool {
        self.transformed
    }

    pub fn mark_transformed(&mut self) {
        self.transformed = true;
    }

    /// Swap in a new payload together with the dimensions it decodes to.
    ///
    /// This is the only way to change `bytes`, `width` or `height` after
    /// construction.
    pub fn replace(&mut self, bytes: Vec<u8>, width: u32, height: u32) {
        self.bytes = bytes;
        self.width = width;
        self.height = height;
        self.transformed = true;
    }
}

fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_ascii_lowercase()
}
