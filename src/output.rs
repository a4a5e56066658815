//! CLI output formatting for every command.
//!
//! # Output Format
//!
//! ## Fit
//!
//! ```text
//! 1920x1080 → 800x600
//!     Crop: 1440x1080+240+0 (auto)
//!     Output: 800x600 (shrink)
//! ```
//!
//! ## Formats
//!
//! ```text
//! Formats
//! 001 detail 600x400 (flexible to 800)
//!     Quality: 85
//! 002 listing 200x150 stretch
//!     Quality: 75
//! ```
//!
//! ## Process
//!
//! ```text
//! dawn.jpg (4000x3000)
//!     detail: 600x399 → out/dawn-detail.jpg
//!     listing: 200x150 → out/dawn-listing.jpg
//!     thumbnail: 80x60 → out/dawn.thumb.jpg
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::config::Config;
use crate::fitting::{FitResult, FormatSpec, Resize, SourceImage};
use crate::process::ProcessManifest;
use std::path::Path;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn resize_label(resize: Resize) -> &'static str {
    match resize {
        Resize::None => "unchanged",
        Resize::Stretch => "stretch",
        Resize::Shrink => "shrink",
    }
}

fn file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

// ============================================================================
// Fit
// ============================================================================

/// Format a single fit: source and output size, then crop and resize path.
pub fn format_fit_result(source: SourceImage, format: &FormatSpec, fit: &FitResult) -> Vec<String> {
    let (width, height) = fit.output_size();
    let mut lines = vec![
        format!("{} → {}x{}", source, width, height),
        format!(
            "{}Crop: {} ({})",
            indent(1),
            fit.crop,
            if fit.auto { "auto" } else { "manual" }
        ),
        format!("{}Output: {}x{} ({})", indent(1), width, height, resize_label(fit.resize)),
    ];
    if fit.flex
        && let Some(h) = format.flexible_target()
    {
        lines.push(format!("{}Flexible height: {}", indent(1), h));
    }
    lines
}

pub fn print_fit_result(source: SourceImage, format: &FormatSpec, fit: &FitResult) {
    for line in format_fit_result(source, format, fit) {
        println!("{}", line);
    }
}

// ============================================================================
// Formats
// ============================================================================

/// Format the configured formats in name order, with their effective quality.
pub fn format_formats(config: &Config) -> Vec<String> {
    if config.formats.is_empty() {
        return vec!["No formats configured".to_string()];
    }

    let mut lines = vec!["Formats".to_string()];
    for (i, (name, format)) in config.formats.iter().enumerate() {
        lines.push(format!("{} {} {}", format_index(i + 1), name, format.spec()));
        lines.push(format!(
            "{}Quality: {}",
            indent(1),
            config.quality_for(format).value()
        ));
    }
    lines
}

pub fn print_formats(config: &Config) {
    for line in format_formats(config) {
        println!("{}", line);
    }
}

// ============================================================================
// Process
// ============================================================================

/// Format a process manifest: the source, then one line per written file.
pub fn format_process_manifest(manifest: &ProcessManifest) -> Vec<String> {
    let mut lines = vec![format!(
        "{} ({})",
        file_name(&manifest.source),
        manifest.dimensions
    )];

    for (name, photo) in &manifest.formats {
        let (width, height) = photo.fit.output_size();
        lines.push(format!(
            "{}{}: {}x{} → {}",
            indent(1),
            name,
            width,
            height,
            photo.output
        ));
    }
    if let Some(thumb) = &manifest.thumbnail {
        lines.push(format!(
            "{}thumbnail: {}x{} → {}",
            indent(1),
            thumb.width,
            thumb.height,
            thumb.path
        ));
    }
    lines
}

pub fn print_process_manifest(manifest: &ProcessManifest) {
    for line in format_process_manifest(manifest) {
        println!("{}", line);
    }
}

// ============================================================================
// Render and thumb
// ============================================================================

/// One line for a single written file.
pub fn format_written(output: &Path, size: (u32, u32)) -> String {
    format!("{}x{} → {}", size.0, size.1, output.display())
}

pub fn print_written(output: &Path, size: (u32, u32)) {
    println!("{}", format_written(output, size));
}
