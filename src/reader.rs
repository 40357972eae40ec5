//! Batch entry points: read one or many PDFs into page images.
//!
//! Documents are processed sequentially in input order. For each path the
//! reader checks the file exists, sniffs its MIME type, opens it with the
//! PDF engine and rasterises the selected pages. [`read_documents`] aborts
//! on the first failure and returns nothing for the documents already read;
//! [`read_documents_lenient`] keeps going and reports one result per path.
//!
//! Every `*_with` variant takes an explicit [`PdfEngine`]; the plain variants
//! bind pdfium through [`PdfiumEngine::bind`] first.

use crate::config::ReaderConfig;
use crate::engine::{PdfEngine, PdfSource, PdfiumEngine};
use crate::error::ReaderError;
use crate::output::{BatchResult, DocumentInfo, DocumentResult, EncodedDocument, TransportBatch};
use crate::pipeline::document::{encode_pages, rasterize_pages, RasterOptions};
use crate::pipeline::encode::OutputFormat;
use crate::pipeline::input::{self, ResolvedInput};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Read every document in `paths`, failing the whole batch on any error.
///
/// # Errors
/// - [`ReaderError::MissingInput`] if `paths` is empty
/// - the first error raised by any document; no partial result is returned
pub fn read_documents<I, P>(paths: I, config: &ReaderConfig) -> Result<BatchResult, ReaderError>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let paths = collect_paths(paths)?;
    let engine = bind_engine(config)?;
    read_paths(&engine, &paths, config)
}

/// [`read_documents`] with an explicit engine.
pub fn read_documents_with<I, P>(
    engine: &dyn PdfEngine,
    paths: I,
    config: &ReaderConfig,
) -> Result<BatchResult, ReaderError>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let paths = collect_paths(paths)?;
    read_paths(engine, &paths, config)
}

/// Read every document, keeping the outcome of each one.
///
/// Only batch-level problems (no input, pdfium not bindable) are returned as
/// `Err`; per-document failures sit in the returned vector at the position
/// of their path.
pub fn read_documents_lenient<I, P>(
    paths: I,
    config: &ReaderConfig,
) -> Result<Vec<Result<DocumentResult, ReaderError>>, ReaderError>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let paths = collect_paths(paths)?;
    let engine = bind_engine(config)?;
    Ok(read_paths_lenient(&engine, &paths, config))
}

/// [`read_documents_lenient`] with an explicit engine.
pub fn read_documents_lenient_with<I, P>(
    engine: &dyn PdfEngine,
    paths: I,
    config: &ReaderConfig,
) -> Result<Vec<Result<DocumentResult, ReaderError>>, ReaderError>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let paths = collect_paths(paths)?;
    Ok(read_paths_lenient(engine, &paths, config))
}

/// Read a single document.
pub fn read_document(
    path: impl AsRef<Path>,
    config: &ReaderConfig,
) -> Result<DocumentResult, ReaderError> {
    let engine = bind_engine(config)?;
    read_document_with(&engine, path, config)
}

/// [`read_document`] with an explicit engine.
pub fn read_document_with(
    engine: &dyn PdfEngine,
    path: impl AsRef<Path>,
    config: &ReaderConfig,
) -> Result<DocumentResult, ReaderError> {
    read_one(engine, 0, path.as_ref(), config)
}

/// Read PDF bytes held in memory.
///
/// The bytes are written to a managed temp file named after `name` (whose
/// stem becomes the page-name prefix) and removed on return.
pub fn read_document_bytes(
    bytes: &[u8],
    name: &str,
    config: &ReaderConfig,
) -> Result<DocumentResult, ReaderError> {
    let engine = bind_engine(config)?;
    read_document_bytes_with(&engine, bytes, name, config)
}

/// [`read_document_bytes`] with an explicit engine.
pub fn read_document_bytes_with(
    engine: &dyn PdfEngine,
    bytes: &[u8],
    name: &str,
    config: &ReaderConfig,
) -> Result<DocumentResult, ReaderError> {
    let (_temp_dir, path) = input::spool_bytes(bytes, name)?;
    read_one(engine, 0, &path, config)
}

/// Read documents and return the `(shapes, raw_buffers, names)` transport form.
pub fn document_reader<I, P>(paths: I, config: &ReaderConfig) -> Result<TransportBatch, ReaderError>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    Ok(read_documents(paths, config)?.into_transport())
}

/// Run [`read_documents`] on tokio's blocking thread pool.
///
/// pdfium is CPU-bound and keeps thread-local state, so the whole batch,
/// including binding the library, happens on one blocking thread.
pub async fn read_documents_async(
    paths: Vec<PathBuf>,
    config: ReaderConfig,
) -> Result<BatchResult, ReaderError> {
    tokio::task::spawn_blocking(move || read_documents(&paths, &config))
        .await
        .map_err(|e| ReaderError::Internal(format!("Reader task panicked: {}", e)))?
}

/// Read documents as compressed page images.
///
/// `format` is a token such as `"png"` or `"jpeg"`; unknown tokens log a
/// warning and produce PNG.
pub fn read_documents_encoded<I, P>(
    paths: I,
    format: &str,
    config: &ReaderConfig,
) -> Result<Vec<EncodedDocument>, ReaderError>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let paths = collect_paths(paths)?;
    let engine = bind_engine(config)?;
    encode_paths(&engine, &paths, format, config)
}

/// [`read_documents_encoded`] with an explicit engine.
pub fn read_documents_encoded_with<I, P>(
    engine: &dyn PdfEngine,
    paths: I,
    format: &str,
    config: &ReaderConfig,
) -> Result<Vec<EncodedDocument>, ReaderError>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let paths = collect_paths(paths)?;
    encode_paths(engine, &paths, format, config)
}

/// Encoded counterpart of [`read_documents_lenient`].
pub fn read_documents_encoded_lenient<I, P>(
    paths: I,
    format: &str,
    config: &ReaderConfig,
) -> Result<Vec<Result<EncodedDocument, ReaderError>>, ReaderError>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let paths = collect_paths(paths)?;
    let engine = bind_engine(config)?;
    Ok(encode_paths_lenient(&engine, &paths, format, config))
}

/// [`read_documents_encoded_lenient`] with an explicit engine.
pub fn read_documents_encoded_lenient_with<I, P>(
    engine: &dyn PdfEngine,
    paths: I,
    format: &str,
    config: &ReaderConfig,
) -> Result<Vec<Result<EncodedDocument, ReaderError>>, ReaderError>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let paths = collect_paths(paths)?;
    Ok(encode_paths_lenient(engine, &paths, format, config))
}

/// Page count and media boxes of a PDF, without rendering.
pub fn inspect(path: impl AsRef<Path>, config: &ReaderConfig) -> Result<DocumentInfo, ReaderError> {
    let engine = bind_engine(config)?;
    inspect_with(&engine, path, config)
}

/// [`inspect`] with an explicit engine.
pub fn inspect_with(
    engine: &dyn PdfEngine,
    path: impl AsRef<Path>,
    config: &ReaderConfig,
) -> Result<DocumentInfo, ReaderError> {
    let (resolved, source) = open(engine, path.as_ref(), config)?;
    let page_count = source.page_count();
    let media_boxes = (0..page_count)
        .map(|i| source.media_box(i))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(DocumentInfo {
        path: resolved.path.display().to_string(),
        stem: resolved.stem,
        size_bytes: resolved.size_bytes,
        mime: input::ALLOWED_PDF[0].to_string(),
        page_count,
        media_boxes,
    })
}

// ── Internal helpers ─────────────────────────────────────────────────────

fn bind_engine(config: &ReaderConfig) -> Result<PdfiumEngine, ReaderError> {
    PdfiumEngine::bind(config.pdfium_library.as_deref())
}

fn collect_paths<I, P>(paths: I) -> Result<Vec<PathBuf>, ReaderError>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let paths: Vec<PathBuf> = paths
        .into_iter()
        .map(|p| p.as_ref().to_path_buf())
        .collect();
    if paths.is_empty() {
        return Err(ReaderError::MissingInput);
    }
    Ok(paths)
}

fn read_paths(
    engine: &dyn PdfEngine,
    paths: &[PathBuf],
    config: &ReaderConfig,
) -> Result<BatchResult, ReaderError> {
    let start = Instant::now();
    let documents = run_strict(paths, config, DocumentResult::len, |doc_index, path| {
        read_one(engine, doc_index, path, config)
    })?;

    let batch = BatchResult { documents };
    info!(
        "Read {} documents ({} pages) in {}ms",
        batch.documents.len(),
        batch.page_count(),
        start.elapsed().as_millis()
    );
    Ok(batch)
}

fn read_paths_lenient(
    engine: &dyn PdfEngine,
    paths: &[PathBuf],
    config: &ReaderConfig,
) -> Vec<Result<DocumentResult, ReaderError>> {
    run_lenient(paths, config, DocumentResult::len, |doc_index, path| {
        read_one(engine, doc_index, path, config)
    })
}

fn encode_paths(
    engine: &dyn PdfEngine,
    paths: &[PathBuf],
    format: &str,
    config: &ReaderConfig,
) -> Result<Vec<EncodedDocument>, ReaderError> {
    let format = OutputFormat::from_token(format);
    run_strict(paths, config, EncodedDocument::len, |doc_index, path| {
        encode_one(engine, doc_index, path, format, config)
    })
}

fn encode_paths_lenient(
    engine: &dyn PdfEngine,
    paths: &[PathBuf],
    format: &str,
    config: &ReaderConfig,
) -> Vec<Result<EncodedDocument, ReaderError>> {
    let format = OutputFormat::from_token(format);
    run_lenient(paths, config, EncodedDocument::len, |doc_index, path| {
        encode_one(engine, doc_index, path, format, config)
    })
}

/// Process documents in order and stop at the first failure.
fn run_strict<T>(
    paths: &[PathBuf],
    config: &ReaderConfig,
    page_count: impl Fn(&T) -> usize,
    mut read: impl FnMut(usize, &Path) -> Result<T, ReaderError>,
) -> Result<Vec<T>, ReaderError> {
    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_start(paths.len());
    }

    let mut documents = Vec::with_capacity(paths.len());
    for (doc_index, path) in paths.iter().enumerate() {
        let doc = read(doc_index, path).inspect_err(|e| {
            if let Some(ref cb) = config.progress_callback {
                cb.on_document_error(doc_index, path, &e.to_string());
            }
        })?;
        documents.push(doc);
    }

    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_complete(documents.len(), documents.iter().map(&page_count).sum());
    }
    Ok(documents)
}

/// Process every document, keeping one result per path.
fn run_lenient<T>(
    paths: &[PathBuf],
    config: &ReaderConfig,
    page_count: impl Fn(&T) -> usize,
    mut read: impl FnMut(usize, &Path) -> Result<T, ReaderError>,
) -> Vec<Result<T, ReaderError>> {
    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_start(paths.len());
    }

    let results: Vec<_> = paths
        .iter()
        .enumerate()
        .map(|(doc_index, path)| {
            read(doc_index, path).inspect_err(|e| {
                warn!("Skipping {}: {}", path.display(), e);
                if let Some(ref cb) = config.progress_callback {
                    cb.on_document_error(doc_index, path, &e.to_string());
                }
            })
        })
        .collect();

    if let Some(ref cb) = config.progress_callback {
        let ok: Vec<&T> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
        cb.on_batch_complete(ok.len(), ok.iter().map(|d| page_count(d)).sum());
    }
    results
}

fn read_one(
    engine: &dyn PdfEngine,
    doc_index: usize,
    path: &Path,
    config: &ReaderConfig,
) -> Result<DocumentResult, ReaderError> {
    let (resolved, source) = open(engine, path, config)?;
    let pages = config.pages.resolve(source.page_count())?;
    if let Some(ref cb) = config.progress_callback {
        cb.on_document_start(doc_index, path, pages.len());
    }

    let doc = rasterize_pages(
        source.as_ref(),
        &resolved.stem,
        &pages,
        raster_options(config),
        |page, image| {
            if let Some(ref cb) = config.progress_callback {
                cb.on_page_complete(doc_index, page, image.height(), image.width());
            }
        },
    )?;

    info!("Rasterised {} → {} pages", path.display(), doc.len());
    Ok(doc)
}

fn encode_one(
    engine: &dyn PdfEngine,
    doc_index: usize,
    path: &Path,
    format: OutputFormat,
    config: &ReaderConfig,
) -> Result<EncodedDocument, ReaderError> {
    let (resolved, source) = open(engine, path, config)?;
    let pages = config.pages.resolve(source.page_count())?;
    if let Some(ref cb) = config.progress_callback {
        cb.on_document_start(doc_index, path, pages.len());
    }

    let doc = encode_pages(
        source.as_ref(),
        &resolved.stem,
        &pages,
        raster_options(config),
        format,
        |page, pixmap| {
            if let Some(ref cb) = config.progress_callback {
                cb.on_page_complete(doc_index, page, pixmap.height, pixmap.width);
            }
        },
    )?;

    info!("Encoded {} → {} pages", path.display(), doc.len());
    Ok(doc)
}

fn open<'e>(
    engine: &'e dyn PdfEngine,
    path: &Path,
    config: &'e ReaderConfig,
) -> Result<(ResolvedInput, Box<dyn PdfSource + 'e>), ReaderError> {
    let resolved = input::resolve_local(path)?;
    debug!(
        "Opening {} ({} bytes)",
        resolved.path.display(),
        resolved.size_bytes
    );
    let source = engine.open(&resolved.path, config.password.as_deref())?;
    Ok((resolved, source))
}

fn raster_options(config: &ReaderConfig) -> RasterOptions<'_> {
    RasterOptions {
        resolution: config.resolution.as_ref(),
        limits: &config.limits,
        channel_order: config.channel_order,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_batch_is_missing_input() {
        let paths: Vec<PathBuf> = Vec::new();
        let err = collect_paths(&paths).unwrap_err();
        assert!(matches!(err, ReaderError::MissingInput));
    }

    #[test]
    fn single_path_is_a_batch_of_one() {
        let paths = collect_paths(["a.pdf"]).unwrap();
        assert_eq!(paths, vec![PathBuf::from("a.pdf")]);
    }
}
