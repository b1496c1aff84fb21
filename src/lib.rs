//! # imgxform
//!
//! Named, parameterized image transformations applied as a chain to an
//! in-flight image. A request names an ordered list of steps, each with its
//! own parameters; the pipeline validates the whole chain, then runs every
//! step against one shared [`types::Image`] model.
//!
//! # Architecture
//!
//! ```text
//! "canvas:width=200,height=200,mode=center"   (query)
//!        │ parse
//!        ▼
//! Invocation { name, params }                  (pipeline)
//!        │ registry lookup + validation
//!        ▼
//! Box<dyn Transformation>                      (transformations)
//!        │ apply(&mut Image, &dyn ImageBackend)
//!        ▼
//! ImageBackend: decode / canvas / crop / paste / rotate / flip / encode   (imaging)
//! ```
//!
//! Transformations never touch pixels themselves; every pixel operation goes
//! through the [`imaging::ImageBackend`] trait. The production backend is
//! [`imaging::RustBackend`] (pure Rust, on the `image` crate); tests swap in a
//! recording mock to assert what was, and was not, called.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`types`] | The image model: payload bytes, dimensions, extension, transformed flag |
//! | [`params`] | String parameter mappings, coercion, [`params::ValidationError`] |
//! | [`imaging`] | Backend trait, colour parsing, pure geometry, the `image`-crate backend |
//! | [`transformations`] | Canvas, Rotate, FlipHorizontally, FlipVertically, Compress, Crop, Resize |
//! | [`pipeline`] | Name → factory registry and the chain dispatcher |
//! | [`query`] | `name:key=value,...` step syntax |
//! | [`config`] | `pipeline.toml`: output format, workers, allow-list, presets |
//! | [`batch`] | One chain over a directory tree, in parallel |
//! | [`output`] | CLI output formatting |
//!
//! # Error Model
//!
//! Three failure kinds reach the caller of a chain, all wrapped in
//! [`pipeline::PipelineError`]:
//!
//! - **Validation**: missing or malformed parameters. Detected before any
//!   backend call, for every step of the chain.
//! - **Transformation**: the backend rejected the work (bad colour,
//!   out-of-range quality, undecodable payload).
//! - **Configuration**: a step names a transformation the registry does not
//!   know.
//!
//! The first two are client faults (400), the last is a server fault (500);
//! see [`pipeline::PipelineError::status`].
//!
//! # Example
//!
//! ```no_run
//! use imgxform::imaging::RustBackend;
//! use imgxform::pipeline::Pipeline;
//! use imgxform::query::parse_chain;
//! use imgxform::types::Image;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let pipeline = Pipeline::with_defaults(RustBackend::new());
//! let bytes = std::fs::read("photo.png")?;
//! let mut image = Image::load(pipeline.backend(), bytes, "png")?;
//! let chain = parse_chain(["rotate:angle=90", "canvas:width=200,height=200,mode=center"])?;
//! pipeline.apply_chain(&mut image, &chain)?;
//! std::fs::write("thumb.png", image.bytes())?;
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod config;
pub mod imaging;
pub mod output;
pub mod params;
pub mod pipeline;
pub mod query;
pub mod transformations;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
