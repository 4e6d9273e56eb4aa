use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, ImageError, ImageFormat, RgbaImage};
use std::fs;
use std::io::Cursor;
use std::path::Path;
use std::str::FromStr;

use crate::error::IntakeError;

/// Quality used when the caller does not pick one.
pub const DEFAULT_EXPORT_QUALITY: f32 = 0.95;

// ============================================================================
// INTAKE
// ============================================================================

/// Accepted source encodings.  Everything else is turned away at intake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Png,
    Jpeg,
}

impl SourceFormat {
    pub fn from_mime(mime: &str) -> Result<Self, IntakeError> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/png" => Ok(SourceFormat::Png),
            "image/jpg" | "image/jpeg" => Ok(SourceFormat::Jpeg),
            other => Err(IntakeError::Unsupported(other.to_string())),
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, IntakeError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "png" => Ok(SourceFormat::Png),
            "jpg" | "jpeg" => Ok(SourceFormat::Jpeg),
            _ => Err(IntakeError::Unsupported(path.display().to_string())),
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            SourceFormat::Png => "image/png",
            SourceFormat::Jpeg => "image/jpeg",
        }
    }

    fn image_format(&self) -> ImageFormat {
        match self {
            SourceFormat::Png => ImageFormat::Png,
            SourceFormat::Jpeg => ImageFormat::Jpeg,
        }
    }
}

/// A decoded source photo plus what it was decoded from.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub image: RgbaImage,
    pub format: SourceFormat,
    /// File name as given (used for the export name).
    pub name: String,
}

/// Decode in-memory bytes of a known format.
pub fn decode_source(bytes: &[u8], format: SourceFormat) -> Result<RgbaImage, IntakeError> {
    let img = image::load_from_memory_with_format(bytes, format.image_format())?;
    Ok(img.to_rgba8())
}

/// Read and decode a PNG or JPEG file.  The extension decides the format.
pub fn load_source(path: &Path) -> Result<LoadedImage, IntakeError> {
    let format = SourceFormat::from_path(path)?;
    let bytes = fs::read(path)?;
    let image = decode_source(&bytes, format)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    log::debug!("loaded {} ({}x{}, {})", name, image.width(), image.height(), format.mime());
    Ok(LoadedImage { image, format, name })
}

// ============================================================================
// EXPORT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Png,
    Jpeg,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpeg => "jpeg",
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            ExportFormat::Png => "image/png",
            ExportFormat::Jpeg => "image/jpeg",
        }
    }
}

/// Exports default to the format the photo arrived in.
impl From<SourceFormat> for ExportFormat {
    fn from(f: SourceFormat) -> Self {
        match f {
            SourceFormat::Png => ExportFormat::Png,
            SourceFormat::Jpeg => ExportFormat::Jpeg,
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(ExportFormat::Png),
            "jpg" | "jpeg" => Ok(ExportFormat::Jpeg),
            other => Err(format!("unknown format '{}' (expected png or jpeg)", other)),
        }
    }
}

/// Map a 0..1 quality onto the JPEG encoder's 1..100 scale.
pub fn jpeg_quality(quality: f32) -> u8 {
    let q = if quality.is_finite() { quality } else { DEFAULT_EXPORT_QUALITY };
    (q * 100.0).round().clamp(1.0, 100.0) as u8
}

/// Encode to PNG or JPEG bytes.  `quality` only affects JPEG; alpha is
/// dropped there.
pub fn encode_image(image: &RgbaImage, format: ExportFormat, quality: f32) -> Result<Vec<u8>, ImageError> {
    let mut out = Cursor::new(Vec::new());
    match format {
        ExportFormat::Png => {
            let encoder = PngEncoder::new(&mut out);
            #[allow(deprecated)]
            encoder.encode(
                image.as_raw(),
                image.width(),
                image.height(),
                image::ColorType::Rgba8,
            )?;
        }
        ExportFormat::Jpeg => {
            let rgb_image = DynamicImage::ImageRgba8(image.clone()).to_rgb8();
            let mut encoder = JpegEncoder::new_with_quality(&mut out, jpeg_quality(quality));
            encoder.encode(
                rgb_image.as_raw(),
                rgb_image.width(),
                rgb_image.height(),
                image::ColorType::Rgb8,
            )?;
        }
    }
    Ok(out.into_inner())
}

/// `filmstock-<stem>.<ext>` for a source file name.  When the export keeps
/// the source's format, the source's own extension spelling is reused
/// (`.jpg` stays `.jpg`).
pub fn export_file_name(original: &str, format: ExportFormat) -> String {
    let path = Path::new(original);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "image".to_string());
    let ext = match SourceFormat::from_path(path) {
        Ok(src) if ExportFormat::from(src) == format => path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_else(|| format.extension().to_string()),
        _ => format.extension().to_string(),
    };
    format!("filmstock-{}.{}", stem, ext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn mime_allow_list() {
        assert_eq!(SourceFormat::from_mime("image/png").unwrap(), SourceFormat::Png);
        assert_eq!(SourceFormat::from_mime("image/jpg").unwrap(), SourceFormat::Jpeg);
        assert_eq!(SourceFormat::from_mime("IMAGE/JPEG").unwrap(), SourceFormat::Jpeg);
        for bad in ["image/gif", "image/webp", "text/plain", ""] {
            assert!(matches!(SourceFormat::from_mime(bad), Err(IntakeError::Unsupported(_))));
        }
    }

    #[test]
    fn extension_allow_list() {
        assert_eq!(SourceFormat::from_path(Path::new("a/b.PNG")).unwrap(), SourceFormat::Png);
        assert_eq!(SourceFormat::from_path(Path::new("x.jpeg")).unwrap(), SourceFormat::Jpeg);
        assert!(SourceFormat::from_path(Path::new("x.tiff")).is_err());
        assert!(SourceFormat::from_path(Path::new("noext")).is_err());
    }

    #[test]
    fn png_export_is_lossless() {
        let mut img = RgbaImage::new(3, 2);
        for (i, p) in img.pixels_mut().enumerate() {
            *p = Rgba([i as u8 * 40, 255 - i as u8 * 30, 7, 255]);
        }
        let bytes = encode_image(&img, ExportFormat::Png, DEFAULT_EXPORT_QUALITY).unwrap();
        let back = decode_source(&bytes, SourceFormat::Png).unwrap();
        assert_eq!(back, img);
    }

    #[test]
    fn jpeg_export_decodes_with_same_size() {
        let img = RgbaImage::from_pixel(8, 4, Rgba([200, 120, 40, 255]));
        let bytes = encode_image(&img, ExportFormat::Jpeg, 0.9).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
        let back = decode_source(&bytes, SourceFormat::Jpeg).unwrap();
        assert_eq!(back.dimensions(), (8, 4));
    }

    #[test]
    fn quality_maps_onto_jpeg_scale() {
        assert_eq!(jpeg_quality(0.95), 95);
        assert_eq!(jpeg_quality(0.0), 1);
        assert_eq!(jpeg_quality(3.0), 100);
        assert_eq!(jpeg_quality(f32::NAN), 95);
    }

    #[test]
    fn export_names() {
        assert_eq!(export_file_name("holiday.jpg", ExportFormat::Jpeg), "filmstock-holiday.jpg");
        assert_eq!(export_file_name("holiday.JPEG", ExportFormat::Jpeg), "filmstock-holiday.jpeg");
        assert_eq!(export_file_name("holiday.png", ExportFormat::Jpeg), "filmstock-holiday.jpeg");
        assert_eq!(export_file_name("holiday.jpg", ExportFormat::Png), "filmstock-holiday.png");
        assert_eq!(export_file_name("scan.final.png", ExportFormat::Png), "filmstock-scan.final.png");
        assert_eq!(export_file_name("", ExportFormat::Png), "filmstock-image.png");
        assert_eq!("JPG".parse::<ExportFormat>().unwrap(), ExportFormat::Jpeg);
        assert_eq!(ExportFormat::from(SourceFormat::Jpeg), ExportFormat::Jpeg);
    }
}
