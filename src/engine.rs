//! PDF engine seam: open a document, query pages, render a page to a pixmap.
//!
//! The reader only needs five things from a PDF renderer: open a file, count
//! pages, report a page's media box, render a page at a uniform scale, and
//! hand back the raw pixel buffer. [`PdfEngine`] and [`PdfSource`] capture
//! exactly that, and [`PdfiumEngine`] implements them with `pdfium-render`.
//! Tests plug in in-memory engines through the same traits.
//!
//! pdfium uses thread-local state internally. A [`PdfSource`] is tied to the
//! engine that opened it and must stay on the thread that owns the engine.

use crate::error::ReaderError;
use pdfium_render::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Native page dimensions in PDF points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MediaBox {
    pub width: f64,
    pub height: f64,
}

impl MediaBox {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Memory layout of a rendered pixel buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelLayout {
    /// pdfium's native layout: blue, green, red, alpha.
    Bgra,
    Bgr,
    Rgba,
    Rgb,
    Gray,
}

impl PixelLayout {
    /// Bytes per pixel.
    pub fn channels(self) -> usize {
        match self {
            PixelLayout::Bgra | PixelLayout::Rgba => 4,
            PixelLayout::Bgr | PixelLayout::Rgb => 3,
            PixelLayout::Gray => 1,
        }
    }
}

/// Raw pixel buffer produced by rendering one page.
///
/// Rows may carry trailing padding; the stride is `samples.len() / height`.
#[derive(Debug, Clone)]
pub struct Pixmap {
    pub width: usize,
    pub height: usize,
    pub layout: PixelLayout,
    pub samples: Vec<u8>,
}

impl Pixmap {
    pub fn new(width: usize, height: usize, layout: PixelLayout, samples: Vec<u8>) -> Self {
        Self {
            width,
            height,
            layout,
            samples,
        }
    }
}

/// Opens PDF files.
pub trait PdfEngine {
    /// Open the PDF at `path`, optionally with a user password.
    ///
    /// The returned source may borrow both the engine and the password.
    fn open<'a>(
        &'a self,
        path: &Path,
        password: Option<&'a str>,
    ) -> Result<Box<dyn PdfSource + 'a>, ReaderError>;
}

/// An opened PDF document. Page indices here are 0-based.
pub trait PdfSource {
    fn page_count(&self) -> usize;

    fn media_box(&self, index: usize) -> Result<MediaBox, ReaderError>;

    /// Render page `index` magnified by `scale` on both axes.
    fn render(&self, index: usize, scale: f64) -> Result<Pixmap, ReaderError>;
}

// ── pdfium ───────────────────────────────────────────────────────────────

/// [`PdfEngine`] backed by a bound pdfium library.
pub struct PdfiumEngine {
    pdfium: Pdfium,
}

impl PdfiumEngine {
    /// Bind to pdfium, trying in order: `explicit`, `PDFIUM_LIB_PATH`, the
    /// working directory, then the system library path.
    pub fn bind(explicit: Option<&Path>) -> Result<Self, ReaderError> {
        let mut attempts: Vec<String> = Vec::new();

        let mut candidates: Vec<PathBuf> = Vec::new();
        if let Some(p) = explicit {
            candidates.push(p.to_path_buf());
        }
        if let Ok(p) = std::env::var("PDFIUM_LIB_PATH") {
            if !p.is_empty() {
                candidates.push(PathBuf::from(p));
            }
        }
        candidates.push(PathBuf::from(
            Pdfium::pdfium_platform_library_name_at_path("./"),
        ));

        for path in candidates {
            match Pdfium::bind_to_library(&path) {
                Ok(bindings) => {
                    info!("Bound pdfium from {}", path.display());
                    return Ok(Self::from_pdfium(Pdfium::new(bindings)));
                }
                Err(e) => attempts.push(format!("{}: {}", path.display(), e)),
            }
        }

        match Pdfium::bind_to_system_library() {
            Ok(bindings) => {
                info!("Bound system pdfium library");
                Ok(Self::from_pdfium(Pdfium::new(bindings)))
            }
            Err(e) => {
                attempts.push(format!("system library: {e}"));
                Err(ReaderError::PdfiumBindingFailed(attempts.join("; ")))
            }
        }
    }

    /// Wrap an already-bound pdfium instance.
    pub fn from_pdfium(pdfium: Pdfium) -> Self {
        Self { pdfium }
    }
}

impl PdfEngine for PdfiumEngine {
    fn open<'a>(
        &'a self,
        path: &Path,
        password: Option<&'a str>,
    ) -> Result<Box<dyn PdfSource + 'a>, ReaderError> {
        let document = self
            .pdfium
            .load_pdf_from_file(path, password)
            .map_err(|e| map_open_error(path, password, e))?;

        debug!(
            "Opened {} ({} pages)",
            path.display(),
            document.pages().len()
        );
        Ok(Box::new(PdfiumSource { document }))
    }
}

fn map_open_error(path: &Path, password: Option<&str>, e: PdfiumError) -> ReaderError {
    let err_str = format!("{:?}", e);
    if err_str.contains("Password") || err_str.contains("password") {
        if password.is_some() {
            ReaderError::WrongPassword {
                path: path.to_path_buf(),
            }
        } else {
            ReaderError::PasswordRequired {
                path: path.to_path_buf(),
            }
        }
    } else {
        ReaderError::CorruptPdf {
            path: path.to_path_buf(),
            detail: err_str,
        }
    }
}

struct PdfiumSource<'a> {
    document: PdfDocument<'a>,
}

impl PdfiumSource<'_> {
    fn page(&self, index: usize) -> Result<PdfPage<'_>, ReaderError> {
        self.document
            .pages()
            .get(index as u16)
            .map_err(|e| ReaderError::RasterisationFailed {
                page: index + 1,
                detail: format!("{:?}", e),
            })
    }
}

impl PdfSource for PdfiumSource<'_> {
    fn page_count(&self) -> usize {
        self.document.pages().len() as usize
    }

    fn media_box(&self, index: usize) -> Result<MediaBox, ReaderError> {
        let page = self.page(index)?;
        Ok(MediaBox::new(
            page.width().value as f64,
            page.height().value as f64,
        ))
    }

    fn render(&self, index: usize, scale: f64) -> Result<Pixmap, ReaderError> {
        let page = self.page(index)?;
        let render_config = PdfRenderConfig::new().scale_page_by_factor(scale as f32);

        let bitmap =
            page.render_with_config(&render_config)
                .map_err(|e| ReaderError::RasterisationFailed {
                    page: index + 1,
                    detail: format!("{:?}", e),
                })?;

        let width = bitmap.width().max(0) as usize;
        let height = bitmap.height().max(0) as usize;
        let samples = bitmap.as_raw_bytes().to_vec();

        Ok(Pixmap::new(width, height, PixelLayout::Bgra, samples))
    }
}
