//! Output types: decoded page images, per-document and per-batch results.

use crate::config::ChannelOrder;
use crate::engine::MediaBox;
use crate::error::ReaderError;
use image::RgbImage;
use serde::{Deserialize, Serialize};

/// A decoded page: `height × width × 3` bytes, row-major, 8 bits per channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageImage {
    height: usize,
    width: usize,
    channel_order: ChannelOrder,
    data: Vec<u8>,
}

impl PageImage {
    /// Wrap a buffer of exactly `height * width * 3` bytes.
    pub fn from_raw(
        height: usize,
        width: usize,
        channel_order: ChannelOrder,
        data: Vec<u8>,
    ) -> Option<Self> {
        (data.len() == height * width * 3).then_some(Self {
            height,
            width,
            channel_order,
            data,
        })
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// `[height, width, 3]`.
    pub fn shape(&self) -> [usize; 3] {
        [self.height, self.width, 3]
    }

    pub fn channel_order(&self) -> ChannelOrder {
        self.channel_order
    }

    /// Row-major flattened pixel data.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    /// Channels of the pixel at row `y`, column `x`, in this image's order.
    pub fn pixel(&self, y: usize, x: usize) -> Option<[u8; 3]> {
        if y >= self.height || x >= self.width {
            return None;
        }
        let i = (y * self.width + x) * 3;
        Some([self.data[i], self.data[i + 1], self.data[i + 2]])
    }

    /// The same pixels with the channel axis reversed (RGB ↔ BGR).
    pub fn reversed_channels(&self) -> PageImage {
        let mut data = self.data.clone();
        for px in data.chunks_exact_mut(3) {
            px.swap(0, 2);
        }
        PageImage {
            height: self.height,
            width: self.width,
            channel_order: match self.channel_order {
                ChannelOrder::Rgb => ChannelOrder::Bgr,
                ChannelOrder::Bgr => ChannelOrder::Rgb,
            },
            data,
        }
    }

    /// Convert to an `image` RGB buffer, reordering channels if needed.
    ///
    /// Returns `None` if a side does not fit in `u32`.
    pub fn to_rgb_image(&self) -> Option<RgbImage> {
        let width = u32::try_from(self.width).ok()?;
        let height = u32::try_from(self.height).ok()?;
        let data = match self.channel_order {
            ChannelOrder::Rgb => self.data.clone(),
            ChannelOrder::Bgr => self.reversed_channels().data,
        };
        RgbImage::from_raw(width, height, data)
    }
}

/// Pages of one document, index-aligned with their names.
#[derive(Debug, Clone, Default)]
pub struct DocumentResult {
    pub pages: Vec<PageImage>,
    /// `<stem>-p<NNN>` per page.
    pub names: Vec<String>,
}

impl DocumentResult {
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// `(height, width)` per page.
    pub fn shapes(&self) -> Vec<(usize, usize)> {
        self.pages.iter().map(|p| (p.height(), p.width())).collect()
    }

    /// Iterate `(name, image)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PageImage)> {
        self.names.iter().map(String::as_str).zip(self.pages.iter())
    }
}

/// Encoded (compressed) pages of one document.
#[derive(Debug, Clone, Default)]
pub struct EncodedDocument {
    pub images: Vec<Vec<u8>>,
    pub names: Vec<String>,
    /// File extension of the encoding actually used (`png`, `jpg`).
    pub extension: &'static str,
}

impl EncodedDocument {
    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

/// One result per input document, in input order.
#[derive(Debug, Clone, Default)]
pub struct BatchResult {
    pub documents: Vec<DocumentResult>,
}

impl BatchResult {
    /// Per document, per page `(height, width)`.
    pub fn shapes(&self) -> Vec<Vec<(usize, usize)>> {
        self.documents.iter().map(DocumentResult::shapes).collect()
    }

    /// Per document, per page flattened pixel bytes.
    pub fn raw_buffers(&self) -> Vec<Vec<&[u8]>> {
        self.documents
            .iter()
            .map(|d| d.pages.iter().map(PageImage::as_bytes).collect())
            .collect()
    }

    /// Per document, per page names.
    pub fn names(&self) -> Vec<Vec<String>> {
        self.documents.iter().map(|d| d.names.clone()).collect()
    }

    pub fn page_count(&self) -> usize {
        self.documents.iter().map(DocumentResult::len).sum()
    }

    /// Split into the `(shapes, raw_buffers, names)` transport form.
    pub fn into_transport(self) -> TransportBatch {
        let mut shapes = Vec::with_capacity(self.documents.len());
        let mut raw = Vec::with_capacity(self.documents.len());
        let mut names = Vec::with_capacity(self.documents.len());

        for doc in self.documents {
            shapes.push(doc.shapes());
            raw.push(doc.pages.into_iter().map(PageImage::into_raw).collect());
            names.push(doc.names);
        }

        TransportBatch { shapes, raw, names }
    }
}

/// Lightweight `(shape, bytes)` form of a batch for handing to another process.
///
/// Serialises with byte buffers as base64 strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportBatch {
    pub shapes: Vec<Vec<(usize, usize)>>,
    #[serde(with = "base64_pages")]
    pub raw: Vec<Vec<Vec<u8>>>,
    pub names: Vec<Vec<String>>,
}

impl TransportBatch {
    /// Rebuild page images from `(shape, bytes)` pairs.
    pub fn to_images(&self, order: ChannelOrder) -> Result<Vec<Vec<PageImage>>, ReaderError> {
        self.shapes
            .iter()
            .zip(&self.raw)
            .map(|(shapes, buffers)| {
                shapes
                    .iter()
                    .zip(buffers)
                    .map(|(&(h, w), bytes)| {
                        PageImage::from_raw(h, w, order, bytes.clone()).ok_or_else(|| {
                            ReaderError::Internal(format!(
                                "buffer of {} bytes does not match shape {h}x{w}x3",
                                bytes.len()
                            ))
                        })
                    })
                    .collect()
            })
            .collect()
    }
}

/// Page count and media boxes, gathered without rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub path: String,
    pub stem: String,
    pub size_bytes: u64,
    pub mime: String,
    pub page_count: usize,
    pub media_boxes: Vec<MediaBox>,
}

mod base64_pages {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{de::Error, Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(raw: &[Vec<Vec<u8>>], s: S) -> Result<S::Ok, S::Error> {
        let encoded: Vec<Vec<String>> = raw
            .iter()
            .map(|doc| doc.iter().map(|page| STANDARD.encode(page)).collect())
            .collect();
        encoded.serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Vec<Vec<u8>>>, D::Error> {
        let encoded: Vec<Vec<String>> = Vec::deserialize(d)?;
        encoded
            .into_iter()
            .map(|doc| {
                doc.into_iter()
                    .map(|page| STANDARD.decode(page).map_err(D::Error::custom))
                    .collect()
            })
            .collect()
    }
}
