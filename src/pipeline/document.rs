//! Document rasterisation: iterate a page selection and render every page.
//!
//! Pages come out in request order, which need not be ascending, and each
//! page is named `<stem>-p<NNN>` after its 1-based index. The selection is
//! validated against the page count before anything is rendered.

use crate::config::{ChannelOrder, PageSelection, ResolutionLimits, ResolutionSpec};
use crate::engine::{PdfSource, Pixmap};
use crate::error::ReaderError;
use crate::output::{DocumentResult, EncodedDocument, PageImage};
use crate::pipeline::encode::{encode_pixmap, OutputFormat};
use crate::pipeline::render::rasterize_page;
use crate::pipeline::resolution::plan_scale;
use tracing::debug;

/// Per-document rendering parameters.
#[derive(Debug, Clone, Copy)]
pub struct RasterOptions<'a> {
    pub resolution: Option<&'a ResolutionSpec>,
    pub limits: &'a ResolutionLimits,
    pub channel_order: ChannelOrder,
}

/// Name of a page: `<stem>-p<index zero-padded to 3 digits>`.
pub fn page_name(stem: &str, page: usize) -> String {
    format!("{stem}-p{page:03}")
}

/// Rasterise the selected pages of an opened document.
///
/// `on_page` is called after each page with its 1-based number and image.
pub fn rasterize_document(
    source: &dyn PdfSource,
    stem: &str,
    selection: &PageSelection,
    options: RasterOptions<'_>,
    on_page: impl FnMut(usize, &PageImage),
) -> Result<DocumentResult, ReaderError> {
    let pages = selection.resolve(source.page_count())?;
    rasterize_pages(source, stem, &pages, options, on_page)
}

/// Rasterise already-validated 1-based `pages`, in the given order.
pub(crate) fn rasterize_pages(
    source: &dyn PdfSource,
    stem: &str,
    pages: &[usize],
    options: RasterOptions<'_>,
    mut on_page: impl FnMut(usize, &PageImage),
) -> Result<DocumentResult, ReaderError> {
    let mut images = Vec::with_capacity(pages.len());
    for &page in pages {
        let scale = page_scale(source, page, &options)?;
        let image = rasterize_page(source, page - 1, scale, options.channel_order)?;
        on_page(page, &image);
        images.push(image);
    }

    Ok(DocumentResult {
        pages: images,
        names: pages.iter().map(|&p| page_name(stem, p)).collect(),
    })
}

/// Like [`rasterize_document`] but returns compressed image streams.
pub fn encode_document(
    source: &dyn PdfSource,
    stem: &str,
    selection: &PageSelection,
    options: RasterOptions<'_>,
    format: OutputFormat,
) -> Result<EncodedDocument, ReaderError> {
    let pages = selection.resolve(source.page_count())?;
    encode_pages(source, stem, &pages, options, format, |_, _| {})
}

/// Encode already-validated 1-based `pages`, in the given order.
///
/// `on_page` receives each page number and its rendered pixmap.
pub(crate) fn encode_pages(
    source: &dyn PdfSource,
    stem: &str,
    pages: &[usize],
    options: RasterOptions<'_>,
    format: OutputFormat,
    mut on_page: impl FnMut(usize, &Pixmap),
) -> Result<EncodedDocument, ReaderError> {
    let mut images = Vec::with_capacity(pages.len());
    for &page in pages {
        let scale = page_scale(source, page, &options)?;
        let pixmap = source.render(page - 1, scale)?;
        let bytes = encode_pixmap(&pixmap, format)
            .map_err(|detail| ReaderError::DecodeError { page, detail })?;
        on_page(page, &pixmap);
        images.push(bytes);
    }

    Ok(EncodedDocument {
        images,
        names: pages.iter().map(|&p| page_name(stem, p)).collect(),
        extension: format.extension(),
    })
}

fn page_scale(
    source: &dyn PdfSource,
    page: usize,
    options: &RasterOptions<'_>,
) -> Result<f64, ReaderError> {
    let media_box = source.media_box(page - 1)?;
    let scale = plan_scale(options.resolution, media_box, options.limits);
    debug!(
        "Page {}: media box {}x{} pt, scale {:.3}",
        page, media_box.width, media_box.height, scale
    );
    Ok(scale)
}
