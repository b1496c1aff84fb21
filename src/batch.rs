//! Apply one chain to a whole directory of images.
//!
//! Every supported image under the input directory gets its own [`Image`]
//! model and runs the same prepared chain. Files are processed in parallel
//! with [rayon](https://docs.rs/rayon); results keep the walk order, which
//! is sorted by file name.
//!
//! ```text
//! in/                        out/
//! ├── a.png       ──chain──▶ ├── a.png      (or a.<format>)
//! ├── notes.txt   (skipped)  └── nested/
//! └── nested/                    └── b.jpg
//!     └── b.jpg
//! ```
//!
//! A chain that fails validation aborts the batch before any file is read.
//! A file that fails to decode or transform is recorded in the report and
//! the rest of the batch carries on.

use crate::imaging::{
    BackendError, Dimensions, ImageBackend, same_format, supported_extensions,
};
use crate::pipeline::{Invocation, Pipeline, PipelineError};
use crate::transformations::Transformation;
use crate::types::Image;
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;
use tracing::{info, warn};
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to walk input directory: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Image error: {0}")]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Input directory not found: {0}")]
    InputNotFound(PathBuf),
    #[error("Unsupported image file: {0}")]
    Unsupported(PathBuf),
    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),
}

/// Progress notifications sent while a batch runs.
#[derive(Debug, Clone)]
pub enum BatchEvent {
    Started { total: usize },
    Finished(FileOutcome),
}

/// What happened to one input file.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FileOutcome {
    pub source: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    pub width: u32,
    pub height: u32,
    pub transformed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileOutcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Outcome of a whole batch, in walk order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub files: Vec<FileOutcome>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.files.iter().filter(|f| f.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.files.len() - self.succeeded()
    }

    /// Write the report as pretty JSON.
    pub fn write_json(&self, path: &Path) -> Result<(), BatchError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Collect every supported image under `dir`, sorted by path.
pub fn collect_images(dir: &Path) -> Result<Vec<PathBuf>, BatchError> {
    if !dir.is_dir() {
        return Err(BatchError::InputNotFound(dir.to_path_buf()));
    }
    let mut images = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_file() && extension_of(entry.path()).is_some() {
            images.push(entry.into_path());
        }
    }
    Ok(images)
}

/// Lowercased extension of `path`, if it names a supported format.
pub fn extension_of(path: &Path) -> Option<String> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    supported_extensions()
        .contains(&ext.as_str())
        .then_some(ext)
}

/// Re-encode `image` as `format` unless it already is one.
pub fn encode_as(
    image: &mut Image,
    format: &str,
    backend: &dyn ImageBackend,
) -> Result<(), BackendError> {
    if same_format(image.extension(), format) {
        return Ok(());
    }
    let decoded = backend.decode(image.bytes())?;
    let bytes = backend.encode(&decoded, format, None)?;
    image.set_extension(format);
    image.replace(bytes, decoded.width(), decoded.height());
    Ok(())
}

/// Load `source`, run `steps`, and write the result to `target`.
///
/// The target's extension selects the output format. Returns the source
/// dimensions alongside the final image.
pub fn process_file<B: ImageBackend>(
    pipeline: &Pipeline<B>,
    steps: &[Box<dyn Transformation>],
    source: &Path,
    target: &Path,
) -> Result<(Dimensions, Image), BatchError> {
    let source_ext =
        extension_of(source).ok_or_else(|| BatchError::Unsupported(source.to_path_buf()))?;
    let target_ext =
        extension_of(target).ok_or_else(|| BatchError::Unsupported(target.to_path_buf()))?;

    let bytes = std::fs::read(source)?;
    let mut image = Image::load(pipeline.backend(), bytes, source_ext)?;
    let before = image.dimensions();
    pipeline.run(&mut image, steps)?;
    encode_as(&mut image, &target_ext, pipeline.backend())?;

    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(target, image.bytes())?;
    Ok((before, image))
}

/// Reject an output extension no backend can encode.
pub fn check_output_format(ext: &str) -> Result<(), BatchError> {
    if supported_extensions().contains(&ext.to_ascii_lowercase().as_str()) {
        Ok(())
    } else {
        Err(BatchError::UnsupportedFormat(ext.to_string()))
    }
}

/// Where `source` lands under `output_dir`.
fn target_path(input_dir: &Path, output_dir: &Path, source: &Path, format: Option<&str>) -> PathBuf {
    let relative = source.strip_prefix(input_dir).unwrap_or(source);
    let target = output_dir.join(relative);
    match format {
        Some(ext) => target.with_extension(ext.to_ascii_lowercase()),
        None => target,
    }
}

/// Run `chain` over every image under `input_dir`, mirroring the tree into
/// `output_dir`.
pub fn run_batch<B: ImageBackend>(
    pipeline: &Pipeline<B>,
    chain: &[Invocation],
    input_dir: &Path,
    output_dir: &Path,
    format: Option<&str>,
    progress: Option<Sender<BatchEvent>>,
) -> Result<BatchReport, BatchError> {
    if let Some(ext) = format {
        check_output_format(ext)?;
    }
    let steps = pipeline.prepare(chain)?;
    let sources = collect_images(input_dir)?;
    std::fs::create_dir_all(output_dir)?;

    if let Some(tx) = &progress {
        tx.send(BatchEvent::Started {
            total: sources.len(),
        })
        .ok();
    }
    info!(files = sources.len(), steps = steps.len(), "batch started");

    let files = sources
        .par_iter()
        .map(|source| {
            let target = target_path(input_dir, output_dir, source, format);
            let outcome = match process_file(pipeline, &steps, source, &target) {
                Ok((_, image)) => {
                    info!(file = %source.display(), width = image.width(), height = image.height(), "processed");
                    FileOutcome {
                        source: source.clone(),
                        output: Some(target),
                        width: image.width(),
                        height: image.height(),
                        transformed: image.is_transformed(),
                        error: None,
                    }
                }
                Err(e) => {
                    warn!(file = %source.display(), error = %e, "failed");
                    FileOutcome {
                        source: source.clone(),
                        output: None,
                        width: 0,
                        height: 0,
                        transformed: false,
                        error: Some(e.to_string()),
                    }
                }
            };
            if let Some(tx) = &progress {
                tx.send(BatchEvent::Finished(outcome.clone())).ok();
            }
            outcome
        })
        .collect();

    Ok(BatchReport { files })
}
