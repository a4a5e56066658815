//! Batch processing: one source photo into every configured format.
//!
//! Identifies the source once, fits it into each `[formats.NAME]` from the
//! config, renders every format plus a thumbnail, and returns a manifest with
//! one record per format.
//!
//! ## Output Structure
//!
//! ```text
//! out/
//! ├── manifest.json              # Written by the CLI from the returned manifest
//! ├── dawn-detail.jpg            # <stem>-<format>.<ext>
//! ├── dawn-listing.jpg
//! └── dawn.thumb.jpg             # Thumbnail within [thumbnail].size
//! ```
//!
//! Formats and the thumbnail use different separators after the stem, so no
//! format name can collide with the thumbnail file. The output extension
//! follows the source when the backend can encode it, and falls back to JPEG
//! otherwise.
//!
//! ## Parallel Processing
//!
//! Formats are rendered in parallel using [rayon](https://docs.rs/rayon). Each
//! format writes only its own output file.

use crate::config::Config;
use crate::fitting::{Crop, CropRect, SourceImage};
use crate::render::{
    FormattedPhoto, RenderBackend, RenderError, RustBackend, can_encode, execute_render,
    get_dimensions, plan_render, plan_thumbnail,
};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// A render step failed; `format` names the format, or `identify` /
    /// `thumbnail` for the shared steps.
    #[error("{format}: {source}")]
    Render {
        format: String,
        #[source]
        source: RenderError,
    },
    #[error("Source image not found: {0}")]
    SourceNotFound(PathBuf),
    #[error("Unknown format: {0}")]
    UnknownFormat(String),
}

/// Thumbnail written alongside the formats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedThumbnail {
    pub path: String,
    pub width: u32,
    pub height: u32,
}

/// Result of processing one source photo.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessManifest {
    pub source: String,
    /// Source dimensions every format was fitted from.
    pub dimensions: SourceImage,
    /// One record per format, keyed by format name.
    pub formats: BTreeMap<String, FormattedPhoto>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<GeneratedThumbnail>,
}

impl ProcessManifest {
    /// Write the manifest as pretty JSON.
    pub fn write(&self, path: &Path) -> Result<(), ProcessError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

fn render_error(step: &str) -> impl FnOnce(RenderError) -> ProcessError + '_ {
    move |source| ProcessError::Render {
        format: step.to_string(),
        source,
    }
}

/// Stem and encodable extension of a source file name.
fn stem_and_ext(source: &Path) -> (String, String) {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "photo".to_string());
    let ext = source
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .filter(|e| can_encode(Path::new(&format!("x.{e}"))))
        .unwrap_or_else(|| "jpg".to_string());
    (stem, ext)
}

/// `<dir>/<stem>-<format>.<ext>`
pub fn format_output_path(source: &Path, output_dir: &Path, format: &str) -> PathBuf {
    let (stem, ext) = stem_and_ext(source);
    output_dir.join(format!("{stem}-{format}.{ext}"))
}

/// `<dir>/<stem>.thumb.<ext>`
pub fn thumbnail_path(source: &Path, output_dir: &Path) -> PathBuf {
    let (stem, ext) = stem_and_ext(source);
    output_dir.join(format!("{stem}.thumb.{ext}"))
}

pub fn process(
    source: &Path,
    output_dir: &Path,
    config: &Config,
    crops: &BTreeMap<String, CropRect>,
) -> Result<ProcessManifest, ProcessError> {
    let backend = RustBackend::new();
    process_with_backend(&backend, source, output_dir, config, crops)
}

/// Process a source using a specific backend (allows testing with mock).
///
/// `crops` holds manual crops by format name; formats without an entry are
/// auto-cropped. The source is identified once and every format and the
/// thumbnail are sized from that. Any failing format fails the whole run.
pub fn process_with_backend(
    backend: &impl RenderBackend,
    source: &Path,
    output_dir: &Path,
    config: &Config,
    crops: &BTreeMap<String, CropRect>,
) -> Result<ProcessManifest, ProcessError> {
    if let Some(name) = crops.keys().find(|name| !config.formats.contains_key(*name)) {
        return Err(ProcessError::UnknownFormat(name.clone()));
    }
    if !source.exists() {
        return Err(ProcessError::SourceNotFound(source.to_path_buf()));
    }

    std::fs::create_dir_all(output_dir)?;

    let dimensions = get_dimensions(backend, source).map_err(render_error("identify"))?;
    info!(source = %source.display(), %dimensions, "Processing photo");

    let fitter = config.fitter();
    let formats = config
        .formats
        .par_iter()
        .map(|(name, format)| {
            let output = format_output_path(source, output_dir, name);
            let crop = Crop::from(crops.get(name).copied());
            let photo = plan_render(
                &fitter,
                source,
                &output,
                dimensions,
                crop,
                &format.spec(),
                config.quality_for(format),
            )
            .and_then(|params| execute_render(backend, &params, dimensions))
            .map_err(render_error(name))?;
            info!(format = %name, output = %photo.output, "Rendered format");
            Ok((name.clone(), photo))
        })
        .collect::<Result<BTreeMap<_, _>, ProcessError>>()?;

    let thumb_path = thumbnail_path(source, output_dir);
    let thumb = plan_thumbnail(source, &thumb_path, dimensions, &config.thumbnail_config());
    backend
        .thumbnail(&thumb)
        .map_err(RenderError::from)
        .map_err(render_error("thumbnail"))?;

    Ok(ProcessManifest {
        source: source.to_string_lossy().to_string(),
        dimensions,
        formats,
        thumbnail: Some(GeneratedThumbnail {
            path: thumb_path.to_string_lossy().to_string(),
            width: thumb.width,
            height: thumb.height,
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FormatConfig;
    use crate::fitting::{FitError, Resize};
    use crate::render::backend::tests::{MockBackend, RecordedOp};
    use std::fs;
    use tempfile::TempDir;

    fn format(max_width: u32, max_height: u32) -> FormatConfig {
        FormatConfig {
            max_width,
            max_height,
            flexible_height: false,
            flexible_max_height: None,
            stretch: false,
            quality: None,
        }
    }

    fn test_config() -> Config {
        let mut config = Config::default();
        config.formats.insert("square".into(), format(100, 100));
        config.formats.insert(
            "detail".into(),
            FormatConfig {
                flexible_height: true,
                flexible_max_height: Some(800),
                quality: Some(95),
                ..format(600, 400)
            },
        );
        config
    }

    /// A source file that exists on disk; the mock never decodes it.
    fn touch_source(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, b"not really an image").unwrap();
        path
    }

    // =========================================================================
    // Output naming
    // =========================================================================

    #[test]
    fn format_output_path_keeps_encodable_extension() {
        let path = format_output_path(Path::new("/in/dawn.PNG"), Path::new("/out"), "square");
        assert_eq!(path, Path::new("/out/dawn-square.png"));
    }

    #[test]
    fn output_paths_fall_back_to_jpg() {
        let path = format_output_path(Path::new("/in/dawn.gif"), Path::new("/out"), "square");
        assert_eq!(path, Path::new("/out/dawn-square.jpg"));

        let path = thumbnail_path(Path::new("/in/dawn"), Path::new("/out"));
        assert_eq!(path, Path::new("/out/dawn.thumb.jpg"));
    }

    #[test]
    fn format_named_thumb_does_not_share_thumbnail_path() {
        let source = Path::new("/in/dawn.jpg");
        let out = Path::new("/out");
        assert_ne!(
            format_output_path(source, out, "thumb"),
            thumbnail_path(source, out)
        );
    }

    // =========================================================================
    // Processing with the mock backend
    // =========================================================================

    #[test]
    fn process_renders_every_format() {
        let tmp = TempDir::new().unwrap();
        let source = touch_source(tmp.path(), "dawn.jpg");
        let out = tmp.path().join("out");
        let backend = MockBackend::with_dimensions(SourceImage::new(4000, 3000));

        let manifest =
            process_with_backend(&backend, &source, &out, &test_config(), &BTreeMap::new())
                .unwrap();

        assert!(out.is_dir());
        assert_eq!(manifest.dimensions, SourceImage::new(4000, 3000));
        assert_eq!(
            manifest.formats.keys().collect::<Vec<_>>(),
            vec!["detail", "square"]
        );

        let square = &manifest.formats["square"];
        assert_eq!(square.fit.crop, CropRect::new(500, 0, 3000, 3000));
        assert_eq!(square.fit.output_size(), (100, 100));
        assert_eq!(square.quality, 85);
        assert!(square.output.ends_with("dawn-square.jpg"));

        let detail = &manifest.formats["detail"];
        assert_eq!(detail.fit.crop, CropRect::new(0, 167, 4000, 2666));
        assert_eq!(detail.fit.output_size(), (600, 399));
        assert_eq!(detail.quality, 95);

        let thumb = manifest.thumbnail.unwrap();
        assert_eq!((thumb.width, thumb.height), (80, 60));
        assert!(thumb.path.ends_with("dawn.thumb.jpg"));

        assert_eq!(backend.renders().len(), 2);
        let thumbs = backend
            .get_operations()
            .into_iter()
            .filter(|op| matches!(op, RecordedOp::Thumbnail { .. }))
            .count();
        assert_eq!(thumbs, 1);
    }

    #[test]
    fn process_identifies_source_once() {
        let tmp = TempDir::new().unwrap();
        let source = touch_source(tmp.path(), "dawn.jpg");
        let backend = MockBackend::with_dimensions(SourceImage::new(4000, 3000));

        let manifest =
            process_with_backend(&backend, &source, tmp.path(), &test_config(), &BTreeMap::new())
                .unwrap();

        let identifies = backend
            .get_operations()
            .into_iter()
            .filter(|op| matches!(op, RecordedOp::Identify(_)))
            .count();
        assert_eq!(identifies, 1);
        assert!(
            manifest
                .formats
                .values()
                .all(|photo| photo.source == manifest.dimensions)
        );
    }

    #[test]
    fn format_named_thumb_keeps_its_own_file() {
        let tmp = TempDir::new().unwrap();
        let source = touch_source(tmp.path(), "dawn.jpg");
        let backend = MockBackend::with_dimensions(SourceImage::new(4000, 3000));
        let mut config = Config::default();
        config.formats.insert("thumb".into(), format(600, 400));

        let manifest =
            process_with_backend(&backend, &source, tmp.path(), &config, &BTreeMap::new())
                .unwrap();

        let formatted = &manifest.formats["thumb"];
        let thumb = manifest.thumbnail.unwrap();
        assert_ne!(formatted.output, thumb.path);
        assert!(formatted.output.ends_with("dawn-thumb.jpg"));
        assert!(thumb.path.ends_with("dawn.thumb.jpg"));

        let outputs: Vec<String> = backend
            .get_operations()
            .into_iter()
            .filter_map(|op| match op {
                RecordedOp::Render { output, .. } | RecordedOp::Thumbnail { output, .. } => {
                    Some(output)
                }
                RecordedOp::Identify(_) => None,
            })
            .collect();
        assert_eq!(outputs.len(), 2);
        assert_ne!(outputs[0], outputs[1]);
    }

    #[test]
    fn process_applies_manual_crops() {
        let tmp = TempDir::new().unwrap();
        let source = touch_source(tmp.path(), "dawn.jpg");
        let backend = MockBackend::with_dimensions(SourceImage::new(4000, 3000));
        let crops = BTreeMap::from([("square".to_string(), CropRect::new(100, 100, 2000, 2000))]);

        let manifest =
            process_with_backend(&backend, &source, tmp.path(), &test_config(), &crops).unwrap();

        let square = &manifest.formats["square"];
        assert!(!square.fit.auto);
        assert_eq!(square.fit.crop, CropRect::new(100, 100, 2000, 2000));
        assert_eq!(square.fit.resize, Resize::Shrink);
        assert!(manifest.formats["detail"].fit.auto);
    }

    #[test]
    fn process_reports_failing_format() {
        let tmp = TempDir::new().unwrap();
        let source = touch_source(tmp.path(), "dawn.jpg");
        let backend = MockBackend::with_dimensions(SourceImage::new(4000, 3000));
        let crops = BTreeMap::from([("square".to_string(), CropRect::new(0, 0, 2000, 1000))]);

        let result = process_with_backend(&backend, &source, tmp.path(), &test_config(), &crops);

        match result {
            Err(ProcessError::Render { format, source }) => {
                assert_eq!(format, "square");
                assert!(matches!(
                    source,
                    RenderError::Fit(FitError::RatioMismatch { .. })
                ));
            }
            other => panic!("expected render error, got {other:?}"),
        }
    }

    #[test]
    fn process_rejects_crop_for_unknown_format() {
        let tmp = TempDir::new().unwrap();
        let source = touch_source(tmp.path(), "dawn.jpg");
        let backend = MockBackend::with_dimensions(SourceImage::new(4000, 3000));
        let crops = BTreeMap::from([("poster".to_string(), CropRect::new(0, 0, 10, 10))]);

        let result = process_with_backend(&backend, &source, tmp.path(), &test_config(), &crops);
        assert!(matches!(result, Err(ProcessError::UnknownFormat(name)) if name == "poster"));
        assert!(backend.get_operations().is_empty());
    }

    #[test]
    fn process_missing_source() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::with_dimensions(SourceImage::new(10, 10));

        let result = process_with_backend(
            &backend,
            &tmp.path().join("missing.jpg"),
            tmp.path(),
            &test_config(),
            &BTreeMap::new(),
        );
        assert!(matches!(result, Err(ProcessError::SourceNotFound(_))));
    }

    #[test]
    fn process_without_formats_still_thumbnails() {
        let tmp = TempDir::new().unwrap();
        let source = touch_source(tmp.path(), "dawn.jpg");
        let backend = MockBackend::with_dimensions(SourceImage::new(600, 800));

        let manifest = process_with_backend(
            &backend,
            &source,
            tmp.path(),
            &Config::default(),
            &BTreeMap::new(),
        )
        .unwrap();

        assert!(manifest.formats.is_empty());
        let thumb = manifest.thumbnail.unwrap();
        assert_eq!((thumb.width, thumb.height), (60, 80));
    }

    #[test]
    fn manifest_round_trips_through_json() {
        let tmp = TempDir::new().unwrap();
        let source = touch_source(tmp.path(), "dawn.jpg");
        let backend = MockBackend::with_dimensions(SourceImage::new(200, 100));
        let mut config = Config::default();
        config.formats.insert("square".into(), format(100, 100));

        let manifest =
            process_with_backend(&backend, &source, tmp.path(), &config, &BTreeMap::new())
                .unwrap();
        let manifest_path = tmp.path().join("manifest.json");
        manifest.write(&manifest_path).unwrap();

        let content = fs::read_to_string(&manifest_path).unwrap();
        let parsed: ProcessManifest = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed.formats, manifest.formats);
        assert_eq!(parsed.dimensions, SourceImage::new(200, 100));

        let raw: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(raw["formats"]["square"]["fit"]["resize"], "shrink");
    }
}
