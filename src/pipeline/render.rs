//! Page rasterisation: render one page at a scale and decode the pixmap.
//!
//! pdfium hands back BGRA rows. Decoding drops the alpha channel, expands
//! grayscale, strips any row padding and writes the three colour channels in
//! the requested [`ChannelOrder`]. Native order for BGR(A) buffers is BGR, so
//! an RGB request reverses the channel axis; RGB(A) buffers are the mirror
//! case.

use crate::config::ChannelOrder;
use crate::engine::{PdfSource, PixelLayout, Pixmap};
use crate::error::ReaderError;
use crate::output::PageImage;
use tracing::debug;

/// Render 0-based page `index` at `scale` and decode it.
pub fn rasterize_page(
    source: &dyn PdfSource,
    index: usize,
    scale: f64,
    order: ChannelOrder,
) -> Result<PageImage, ReaderError> {
    let pixmap = source.render(index, scale)?;
    debug!(
        "Rendered page {} at scale {:.3} → {}x{} px",
        index + 1,
        scale,
        pixmap.width,
        pixmap.height
    );
    decode_pixmap(&pixmap, order).map_err(|detail| ReaderError::DecodeError {
        page: index + 1,
        detail,
    })
}

/// Decode a raw pixmap into a 3-channel image.
///
/// The error is a plain description; callers attach the page number.
pub fn decode_pixmap(pixmap: &Pixmap, order: ChannelOrder) -> Result<PageImage, String> {
    let (width, height) = (pixmap.width, pixmap.height);
    if width == 0 || height == 0 {
        return Err(format!("empty pixmap ({width}x{height})"));
    }
    if pixmap.samples.is_empty() {
        return Err("empty pixel buffer".to_string());
    }

    let bpp = pixmap.layout.channels();
    let row_len = width * bpp;
    let stride = pixmap.samples.len() / height;
    if stride < row_len {
        return Err(format!(
            "buffer of {} bytes is too short for {width}x{height} {:?}",
            pixmap.samples.len(),
            pixmap.layout
        ));
    }

    // Offsets of the red, green and blue samples within one source pixel.
    let (r, g, b) = match pixmap.layout {
        PixelLayout::Bgra | PixelLayout::Bgr => (2, 1, 0),
        PixelLayout::Rgba | PixelLayout::Rgb => (0, 1, 2),
        PixelLayout::Gray => (0, 0, 0),
    };
    let picks = match order {
        ChannelOrder::Rgb => [r, g, b],
        ChannelOrder::Bgr => [b, g, r],
    };

    let mut data = Vec::with_capacity(width * height * 3);
    for row in pixmap.samples.chunks_exact(stride).take(height) {
        for px in row[..row_len].chunks_exact(bpp) {
            data.extend(picks.iter().map(|&c| px[c]));
        }
    }

    PageImage::from_raw(height, width, order, data)
        .ok_or_else(|| "decoded size does not match pixmap dimensions".to_string())
}
