//! Photo format normalization
//!
//! HEIC/HEIF photos are re-encoded as JPEG when they move to a platform
//! without native support for the container. Decoding needs the `heif`
//! cargo feature; without it conversion is reported unavailable and files
//! pass through untouched.

use crate::core::error::{Result, TransferError};
use crate::device::Platform;
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// Extensions that trigger conversion
pub const CONVERTIBLE_EXTENSIONS: &[&str] = &["heic", "heif"];

/// JPEG quality used for converted photos
pub const JPEG_QUALITY: u8 = 95;

static HEIF_AVAILABLE: Lazy<bool> = Lazy::new(|| {
    let available = cfg!(feature = "heif");
    if available {
        debug!("HEIF decoder available");
    } else {
        warn!("HEIF decoder not compiled in; HEIC photos will be copied unconverted");
    }
    available
});

/// Whether HEIF decoding is available in this build
pub fn heif_conversion_available() -> bool {
    *HEIF_AVAILABLE
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default()
}

/// Whether a file must be converted before landing on `target`
pub fn needs_conversion(path: &Path, target: Platform) -> bool {
    target == Platform::Android && CONVERTIBLE_EXTENSIONS.contains(&extension_of(path).as_str())
}

/// Convert the file if `target` requires it
///
/// Returns the path to push: the JPEG sibling on success, or `path` itself
/// when no conversion is needed or conversion fails.
pub fn convert_if_needed(path: &Path, target: Platform) -> PathBuf {
    if !needs_conversion(path, target) {
        return path.to_path_buf();
    }

    if !heif_conversion_available() {
        warn!("Skipping conversion of {}: HEIF support unavailable", path.display());
        return path.to_path_buf();
    }

    match convert_to_jpeg(path) {
        Ok(converted) => {
            info!("Converted {} -> {}", path.display(), converted.display());
            converted
        }
        Err(e) => {
            warn!("Failed to convert {}: {}", path.display(), e);
            path.to_path_buf()
        }
    }
}

/// Decode `path` and write a JPEG sibling next to it
pub fn convert_to_jpeg(path: &Path) -> Result<PathBuf> {
    let image = decode_heif(path)?;
    let output_path = path.with_extension("jpg");

    let file = File::create(&output_path)?;
    let mut writer = BufWriter::new(file);
    let mut encoder = JpegEncoder::new_with_quality(&mut writer, JPEG_QUALITY);

    if let Err(e) = encoder.encode_image(&image.to_rgb8()) {
        let _ = std::fs::remove_file(&output_path);
        return Err(TransferError::ConversionError(format!(
            "Failed to encode JPEG: {}",
            e
        )));
    }

    Ok(output_path)
}

#[cfg(feature = "heif")]
fn decode_heif(path: &Path) -> Result<DynamicImage> {
    use libheif_rs::{ColorSpace, HeifContext, LibHeif, RgbChroma};

    let heif_err = |e: libheif_rs::HeifError| TransferError::ConversionError(e.to_string());

    let path_str = path
        .to_str()
        .ok_or_else(|| TransferError::ConversionError("Invalid path (non UTF-8)".to_string()))?;

    let ctx = HeifContext::read_from_file(path_str).map_err(heif_err)?;
    let lib = LibHeif::new();
    let handle = ctx.primary_image_handle().map_err(heif_err)?;
    let decoded = lib
        .decode(&handle, ColorSpace::Rgb(RgbChroma::Rgb), None)
        .map_err(heif_err)?;

    let planes = decoded.planes();
    let plane = planes.interleaved.ok_or_else(|| {
        TransferError::ConversionError("HEIF image has no interleaved RGB plane".to_string())
    })?;

    let width = plane.width as usize;
    let height = plane.height as usize;
    let row_bytes = width * 3;

    // Rows are padded to `stride`
    let mut pixels = Vec::with_capacity(row_bytes * height);
    for y in 0..height {
        let start = y * plane.stride;
        let row = plane.data.get(start..start + row_bytes).ok_or_else(|| {
            TransferError::ConversionError("HEIF plane shorter than expected".to_string())
        })?;
        pixels.extend_from_slice(row);
    }

    image::RgbImage::from_raw(plane.width, plane.height, pixels)
        .map(DynamicImage::ImageRgb8)
        .ok_or_else(|| TransferError::ConversionError("Invalid HEIF dimensions".to_string()))
}

#[cfg(not(feature = "heif"))]
fn decode_heif(_path: &Path) -> Result<DynamicImage> {
    Err(TransferError::Unsupported(
        "HEIF decoding (build with the `heif` feature)".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_needs_conversion() {
        assert!(needs_conversion(Path::new("IMG_0001.HEIC"), Platform::Android));
        assert!(needs_conversion(Path::new("a/b/photo.heif"), Platform::Android));
        assert!(!needs_conversion(Path::new("IMG_0001.HEIC"), Platform::Ios));
        assert!(!needs_conversion(Path::new("IMG_0001.jpg"), Platform::Android));
        assert!(!needs_conversion(Path::new("no_extension"), Platform::Android));
    }

    #[test]
    fn test_jpeg_never_altered() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("IMG_0001.jpg");
        fs::write(&path, b"\xFF\xD8\xFFjpeg bytes").unwrap();

        for target in [Platform::Android, Platform::Ios, Platform::Unknown] {
            let result = convert_if_needed(&path, target);
            assert_eq!(result, path);
        }
        assert_eq!(fs::read(&path).unwrap(), b"\xFF\xD8\xFFjpeg bytes");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_heic_to_ios_untouched() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("IMG_0002.HEIC");
        fs::write(&path, b"heic").unwrap();
        assert_eq!(convert_if_needed(&path, Platform::Ios), path);
    }

    #[test]
    fn test_undecodable_heic_falls_back_to_original() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.heic");
        fs::write(&path, b"not really a heic file").unwrap();

        let result = convert_if_needed(&path, Platform::Android);
        assert_eq!(result, path);
        assert!(path.exists());
        assert!(!dir.path().join("broken.jpg").exists());
    }

    #[test]
    fn test_convert_to_jpeg_reports_failure() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.heic");
        fs::write(&path, b"garbage").unwrap();
        assert!(convert_to_jpeg(&path).is_err());
    }
}
