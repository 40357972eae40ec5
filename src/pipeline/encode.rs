//! Image encoding: pixmap → compressed PNG or JPEG byte stream.
//!
//! This is the alternate output path for callers that want files on disk or
//! bytes on the wire instead of raw arrays. PNG is lossless and is the
//! fallback for any format token we do not recognise.

use crate::config::ChannelOrder;
use crate::engine::Pixmap;
use crate::pipeline::render::decode_pixmap;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use tracing::{debug, warn};

/// JPEG quality used for the encoded path.
const JPEG_QUALITY: u8 = 90;

/// Compressed output encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Png,
    Jpeg,
}

impl OutputFormat {
    /// Parse a format token, falling back to PNG with a warning.
    pub fn from_token(token: &str) -> Self {
        match token.trim().to_ascii_lowercase().as_str() {
            "png" => OutputFormat::Png,
            "jpeg" | "jpg" => OutputFormat::Jpeg,
            other => {
                warn!("could not convert to {other}, returning png");
                OutputFormat::Png
            }
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpg",
        }
    }
}

/// Encode a rendered pixmap as PNG or JPEG.
pub fn encode_pixmap(pixmap: &Pixmap, format: OutputFormat) -> Result<Vec<u8>, String> {
    let rgb = decode_pixmap(pixmap, ChannelOrder::Rgb)?
        .to_rgb_image()
        .ok_or_else(|| format!("{}x{} page is too large to encode", pixmap.width, pixmap.height))?;

    let mut buf = Vec::new();
    match format {
        OutputFormat::Png => DynamicImage::ImageRgb8(rgb)
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .map_err(|e| e.to_string())?,
        OutputFormat::Jpeg => JpegEncoder::new_with_quality(&mut buf, JPEG_QUALITY)
            .encode_image(&rgb)
            .map_err(|e| e.to_string())?,
    }

    debug!("Encoded page → {} bytes {:?}", buf.len(), format);
    Ok(buf)
}
