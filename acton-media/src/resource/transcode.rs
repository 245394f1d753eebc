//! Image re-encoding for image data URIs
//!
//! Decoding and re-encoding strips whatever travelled along with the pixels
//! (metadata chunks, trailing bytes) and normalizes the output format.

use crate::error::{MediaError, MediaResult};
use image::{codecs::jpeg::JpegEncoder, DynamicImage, ImageFormat, ImageReader};
use std::io::Cursor;

/// An image re-encoded into one of the supported output formats
#[derive(Debug, Clone)]
pub struct TranscodedImage {
    /// Encoded image bytes
    pub data: Vec<u8>,
    /// Canonical mimetype of `data`
    pub mimetype: &'static str,
    /// File extension for `mimetype`
    pub extension: &'static str,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

/// Output formats images can be re-encoded into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JPEG at full quality
    Jpeg,
    /// Lossless PNG
    Png,
    /// GIF
    Gif,
}

impl OutputFormat {
    /// Maps a mimetype onto an output format; `image/jpg` is accepted as an alias
    #[must_use]
    pub fn from_mimetype(mimetype: &str) -> Option<Self> {
        match mimetype.trim().to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            "image/gif" => Some(Self::Gif),
            _ => None,
        }
    }

    /// Canonical mimetype
    #[must_use]
    pub const fn mimetype(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Gif => "image/gif",
        }
    }

    /// File extension
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Gif => "gif",
        }
    }
}

/// Decodes `raw` as an image and re-encodes it as `mimetype`
///
/// # Errors
///
/// Returns `MediaError::UnsupportedMimetype` if `mimetype` is not JPEG, PNG
/// or GIF, and `MediaError::InvalidImage` if `raw` is not a decodable image
/// or encoding fails.
pub fn transcode(raw: &[u8], mimetype: &str) -> MediaResult<TranscodedImage> {
    let format = OutputFormat::from_mimetype(mimetype).ok_or_else(|| {
        MediaError::UnsupportedMimetype {
            mimetype: mimetype.to_string(),
        }
    })?;

    let image = ImageReader::new(Cursor::new(raw))
        .with_guessed_format()
        .map_err(|e| MediaError::InvalidImage(e.to_string()))?
        .decode()
        .map_err(|e| MediaError::InvalidImage(e.to_string()))?;

    let data = encode(&image, format)?;

    tracing::debug!(
        width = image.width(),
        height = image.height(),
        format = format.mimetype(),
        size = data.len(),
        "Re-encoded image"
    );

    Ok(TranscodedImage {
        data,
        mimetype: format.mimetype(),
        extension: format.extension(),
        width: image.width(),
        height: image.height(),
    })
}

fn encode(image: &DynamicImage, format: OutputFormat) -> MediaResult<Vec<u8>> {
    let mut buffer = Vec::new();
    let result = match format {
        // JPEG has no alpha channel
        OutputFormat::Jpeg => DynamicImage::ImageRgb8(image.to_rgb8())
            .write_with_encoder(JpegEncoder::new_with_quality(&mut buffer, 100)),
        OutputFormat::Png => image.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png),
        OutputFormat::Gif => DynamicImage::ImageRgba8(image.to_rgba8())
            .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Gif),
    };
    result.map_err(|e| MediaError::InvalidImage(format!("failed to encode image: {e}")))?;
    Ok(buffer)
}
