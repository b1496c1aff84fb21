//! CLI output formatting for every command.
//!
//! Each command has a pure `format_*` function returning display lines and a
//! thin `print_*` wrapper that writes them to stdout. Diagnostics go through
//! `tracing`; only the report a user asked for is printed here.
//!
//! # Output Format
//!
//! ## List
//!
//! ```text
//! canvas              width, height, mode, x, y, bg
//! compress            quality
//! flip-horizontally   (no parameters)
//! ```
//!
//! ## Apply
//!
//! ```text
//! photo.png → out.jpg
//!     463x665 → 665x463 (transformed)
//! ```
//!
//! ## Batch
//!
//! ```text
//! Processing 3 images
//! 001 a.png → out/a.png (665x463)
//! 002 b.png FAILED: Image error: Failed to decode image: ...
//! Done: 2 succeeded, 1 failed
//! ```

use crate::batch::{BatchEvent, BatchReport, FileOutcome};
use crate::imaging::Dimensions;
use crate::pipeline::Registry;
use crate::types::Image;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Parameter summary shown by `list` for each built-in name.
const PARAMETERS: &[(&str, &str)] = &[
    ("canvas", "width, height, mode, x, y, bg"),
    ("compress", "quality"),
    ("crop", "width, height, x, y"),
    ("flip-horizontally", "(no parameters)"),
    ("flip-vertically", "(no parameters)"),
    ("resize", "width and/or height"),
    ("rotate", "angle, bg"),
];

const NAME_COLUMN: usize = 20;

fn parameters_of(name: &str) -> &'static str {
    PARAMETERS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, p)| *p)
        .unwrap_or("")
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn format_index(pos: usize) -> String {
    format!("{:03}", pos)
}

// ============================================================================
// list
// ============================================================================

/// One line per registered transformation, in name order.
pub fn format_transformation_list(registry: &Registry) -> Vec<String> {
    registry
        .names()
        .map(|name| {
            format!("{name:<width$}{}", parameters_of(name), width = NAME_COLUMN)
                .trim_end()
                .to_string()
        })
        .collect()
}

pub fn print_transformation_list(registry: &Registry) {
    for line in format_transformation_list(registry) {
        println!("{}", line);
    }
}

// ============================================================================
// apply
// ============================================================================

/// Summary of a single-file run.
pub fn format_apply_output(
    source: &Path,
    target: &Path,
    before: Dimensions,
    image: &Image,
) -> Vec<String> {
    let status = if image.is_transformed() {
        "transformed"
    } else {
        "unchanged"
    };
    vec![
        format!("{} \u{2192} {}", file_name(source), target.display()),
        format!(
            "    {}x{} \u{2192} {}x{} ({})",
            before.width,
            before.height,
            image.width(),
            image.height(),
            status
        ),
    ]
}

pub fn print_apply_output(source: &Path, target: &Path, before: Dimensions, image: &Image) {
    for line in format_apply_output(source, target, before, image) {
        println!("{}", line);
    }
}

// ============================================================================
// batch
// ============================================================================

fn outcome_line(index: usize, outcome: &FileOutcome) -> String {
    let name = file_name(&outcome.source);
    match (&outcome.error, &outcome.output) {
        (Some(error), _) => format!("{} {} FAILED: {}", format_index(index), name, error),
        (None, Some(output)) => format!(
            "{} {} \u{2192} {} ({}x{})",
            format_index(index),
            name,
            output.display(),
            outcome.width,
            outcome.height
        ),
        (None, None) => format!("{} {}", format_index(index), name),
    }
}

/// Format a single batch progress event.
///
/// Events arrive in completion order, so the running `counter` numbers them.
pub fn format_batch_event(event: &BatchEvent, counter: &AtomicUsize) -> Vec<String> {
    match event {
        BatchEvent::Started { total } => vec![format!("Processing {} images", total)],
        BatchEvent::Finished(outcome) => {
            let index = counter.fetch_add(1, Ordering::Relaxed) + 1;
            vec![outcome_line(index, outcome)]
        }
    }
}

/// Final tally of a batch, listing failures again so they are not lost in
/// the progress stream.
pub fn format_batch_summary(report: &BatchReport) -> Vec<String> {
    let mut lines = Vec::new();
    let failures: Vec<&FileOutcome> = report.files.iter().filter(|f| !f.is_ok()).collect();
    if !failures.is_empty() {
        lines.push("Failures".to_string());
        for failure in failures {
            lines.push(format!(
                "    {}: {}",
                failure.source.display(),
                failure.error.as_deref().unwrap_or_default()
            ));
        }
    }
    lines.push(format!(
        "Done: {} succeeded, {} failed",
        report.succeeded(),
        report.failed()
    ));
    lines
}

pub fn print_batch_summary(report: &BatchReport) {
    for line in format_batch_summary(report) {
        println!("{}", line);
    }
}
