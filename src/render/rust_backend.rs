//! Pure Rust render backend on the `image` crate.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP) | `image::ImageReader` |
//! | Crop | `image::DynamicImage::crop_imm` |
//! | Stretch | `resize_exact` with `CatmullRom` (bicubic) |
//! | Shrink, thumbnail | `resize_exact` with `Lanczos3` |
//! | Encode → JPEG | `JpegEncoder::new_with_quality` |
//! | Encode → PNG, TIFF, WebP (lossless) | `DynamicImage::write_to` |

use super::backend::{BackendError, RenderBackend};
use super::params::{RenderParams, ThumbnailParams};
use crate::fitting::{Resize, SourceImage};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::path::Path;
use tracing::debug;

/// Output extensions this backend can encode.
const OUTPUT_FORMATS: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
];

fn output_format(path: &Path) -> Option<ImageFormat> {
    let ext = path.extension()?.to_str()?;
    OUTPUT_FORMATS
        .iter()
        .find(|(e, _)| e.eq_ignore_ascii_case(ext))
        .map(|(_, fmt)| *fmt)
}

/// Whether the backend can write an image to `path`, judged by extension.
pub fn can_encode(path: &Path) -> bool {
    output_format(path).is_some()
}

/// Resampling filter for a resize path. `None` means no resampling.
///
/// Stretching uses bicubic interpolation; shrinking uses Lanczos3, the
/// high-quality antialiasing filter.
pub fn filter_for(resize: Resize) -> Option<FilterType> {
    match resize {
        Resize::None => None,
        Resize::Stretch => Some(FilterType::CatmullRom),
        Resize::Shrink => Some(FilterType::Lanczos3),
    }
}

/// Pure Rust backend using the `image` crate.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Load and decode an image from disk.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    ImageReader::open(path)
        .map_err(BackendError::Io)?
        .with_guessed_format()
        .map_err(BackendError::Io)?
        .decode()
        .map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to decode {}: {}", path.display(), e))
        })
}

/// Encode `img` to `path`, choosing the format from the extension.
///
/// Quality applies to JPEG only; the other formats are lossless.
fn save_image(img: &DynamicImage, path: &Path, quality: u32) -> Result<(), BackendError> {
    let format = output_format(path).ok_or_else(|| {
        BackendError::ProcessingFailed(format!("Unsupported output format: {}", path.display()))
    })?;

    // Encoded in memory so a failed encode leaves nothing on disk.
    let mut buffer = std::io::Cursor::new(Vec::new());
    let encoded = match format {
        ImageFormat::Jpeg => {
            // JPEG has no alpha channel.
            let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
            let encoder =
                image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality as u8);
            rgb.write_with_encoder(encoder)
        }
        other => img.write_to(&mut buffer, other),
    };
    encoded.map_err(|e| {
        BackendError::ProcessingFailed(format!("Failed to encode {}: {}", path.display(), e))
    })?;

    std::fs::write(path, buffer.into_inner())?;
    Ok(())
}

impl RenderBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<SourceImage, BackendError> {
        let (width, height) = image::image_dimensions(path).map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to read dimensions: {}", e))
        })?;
        Ok(SourceImage::new(width, height))
    }

    fn render(&self, params: &RenderParams) -> Result<(), BackendError> {
        let img = load_image(&params.source)?;
        let crop = params.fit.crop;

        if !crop.fits_in(SourceImage::new(img.width(), img.height())) {
            return Err(BackendError::ProcessingFailed(format!(
                "Crop {} is outside the decoded {}x{} image",
                crop,
                img.width(),
                img.height()
            )));
        }

        let cropped = img.crop_imm(crop.left, crop.top, crop.width, crop.height);
        let output = match filter_for(params.fit.resize) {
            Some(filter) => {
                debug!(
                    crop = %crop,
                    width = params.fit.output_width,
                    height = params.fit.output_height,
                    ?filter,
                    "Resampling crop"
                );
                cropped.resize_exact(params.fit.output_width, params.fit.output_height, filter)
            }
            None => cropped,
        };

        save_image(&output, &params.output, params.quality.value())
    }

    fn thumbnail(&self, params: &ThumbnailParams) -> Result<(), BackendError> {
        let img = load_image(&params.source)?;
        debug!(
            width = params.width,
            height = params.height,
            "Creating thumbnail"
        );
        let thumb = img.resize_exact(params.width, params.height, FilterType::Lanczos3);
        save_image(&thumb, &params.output, params.quality.value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fitting::{CropRect, FitResult};
    use crate::render::Quality;
    use image::{ImageEncoder, RgbImage};

    /// Create a small valid JPEG file with the given dimensions.
    fn create_test_jpeg(path: &Path, width: u32, height: u32) {
        let img = RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        });
        let file = std::fs::File::create(path).unwrap();
        let writer = std::io::BufWriter::new(file);
        image::codecs::jpeg::JpegEncoder::new(writer)
            .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
            .unwrap();
    }

    fn fit(crop: CropRect, size: (u32, u32), resize: Resize) -> FitResult {
        FitResult {
            crop,
            auto: true,
            output_width: size.0,
            output_height: size.1,
            resize,
            flex: false,
        }
    }

    #[test]
    fn filter_matches_resize_path() {
        assert_eq!(filter_for(Resize::None), None);
        assert_eq!(filter_for(Resize::Stretch), Some(FilterType::CatmullRom));
        assert_eq!(filter_for(Resize::Shrink), Some(FilterType::Lanczos3));
    }

    #[test]
    fn encodable_extensions() {
        assert!(can_encode(Path::new("a.jpg")));
        assert!(can_encode(Path::new("a.JPEG")));
        assert!(can_encode(Path::new("a.png")));
        assert!(can_encode(Path::new("a.webp")));
        assert!(!can_encode(Path::new("a.gif")));
        assert!(!can_encode(Path::new("noext")));
    }

    #[test]
    fn identify_synthetic_jpeg() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("test.jpg");
        create_test_jpeg(&path, 200, 150);

        let dims = RustBackend::new().identify(&path).unwrap();
        assert_eq!(dims, SourceImage::new(200, 150));
    }

    #[test]
    fn identify_nonexistent_file_errors() {
        let result = RustBackend::new().identify(Path::new("/nonexistent/image.jpg"));
        assert!(result.is_err());
    }

    #[test]
    fn render_crops_and_shrinks() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("source.jpg");
        create_test_jpeg(&source, 200, 100);

        let output = tmp.path().join("square.png");
        RustBackend::new()
            .render(&RenderParams {
                source,
                output: output.clone(),
                fit: fit(CropRect::new(50, 0, 100, 100), (40, 40), Resize::Shrink),
                quality: Quality::default(),
            })
            .unwrap();

        assert_eq!(image::image_dimensions(&output).unwrap(), (40, 40));
    }

    #[test]
    fn render_stretches_to_jpeg() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("source.jpg");
        create_test_jpeg(&source, 80, 60);

        let output = tmp.path().join("big.jpg");
        RustBackend::new()
            .render(&RenderParams {
                source,
                output: output.clone(),
                fit: fit(CropRect::new(0, 0, 80, 60), (100, 75), Resize::Stretch),
                quality: Quality::new(95),
            })
            .unwrap();

        assert_eq!(image::image_dimensions(&output).unwrap(), (100, 75));
    }

    #[test]
    fn render_without_resize_keeps_crop_size() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("source.jpg");
        create_test_jpeg(&source, 64, 48);

        let output = tmp.path().join("same.png");
        RustBackend::new()
            .render(&RenderParams {
                source,
                output: output.clone(),
                fit: fit(CropRect::new(4, 4, 32, 24), (32, 24), Resize::None),
                quality: Quality::default(),
            })
            .unwrap();

        assert_eq!(image::image_dimensions(&output).unwrap(), (32, 24));
    }

    #[test]
    fn render_rejects_crop_outside_image() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("source.jpg");
        create_test_jpeg(&source, 50, 50);

        let result = RustBackend::new().render(&RenderParams {
            source,
            output: tmp.path().join("out.png"),
            fit: fit(CropRect::new(40, 0, 20, 20), (20, 20), Resize::None),
            quality: Quality::default(),
        });
        assert!(matches!(result, Err(BackendError::ProcessingFailed(_))));
    }

    #[test]
    fn render_unsupported_format_errors() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("source.jpg");
        create_test_jpeg(&source, 100, 100);

        let result = RustBackend::new().render(&RenderParams {
            source,
            output: tmp.path().join("output.gif"),
            fit: fit(CropRect::new(0, 0, 100, 100), (50, 50), Resize::Shrink),
            quality: Quality::default(),
        });
        assert!(result.is_err());
    }

    #[test]
    fn thumbnail_exact_dimensions() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("source.jpg");
        create_test_jpeg(&source, 800, 600);

        let output = tmp.path().join("thumb.jpg");
        RustBackend::new()
            .thumbnail(&ThumbnailParams {
                source,
                output: output.clone(),
                width: 80,
                height: 60,
                quality: Quality::new(85),
            })
            .unwrap();

        assert_eq!(image::image_dimensions(&output).unwrap(), (80, 60));
    }

    #[test]
    fn failed_encode_leaves_no_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let output = tmp.path().join("out.png");
        // PNG has no 32-bit float color type.
        let img = DynamicImage::ImageRgb32F(image::ImageBuffer::new(4, 4));

        assert!(save_image(&img, &output, 85).is_err());
        assert!(!output.exists());
    }
}
