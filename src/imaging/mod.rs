//! Image processing capability used by the transformations.
//!
//! | Concern | Where |
//! |---|---|
//! | **Backend trait** | [`ImageBackend`]: decode, canvas, crop, paste, rotate, flip, resize, encode, colour parsing |
//! | **Production backend** | [`RustBackend`] on the `image` crate |
//! | **Colours** | [`Color`] and hex parsing |
//! | **Geometry** | pure functions in `calculations` (crop windows, centring, rotated bounds) |
//!
//! Transformations only ever see `&dyn ImageBackend`, which keeps them
//! testable against a recording mock.

pub mod backend;
pub(crate) mod calculations;
pub mod color;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, FlipAxis, ImageBackend, Region};
pub use color::Color;
pub use rust_backend::{RustBackend, same_format, supported_extensions};
