//! Progress-callback trait for per-document and per-page reader events.
//!
//! Inject an [`Arc<dyn ReadProgressCallback>`] via
//! [`crate::config::ReaderConfigBuilder::progress_callback`] to receive
//! events while a batch is rasterised. The reader itself is synchronous, so
//! events arrive in order: one `on_batch_start`, then for each document one
//! `on_document_start` followed by its `on_page_complete` calls, then one
//! `on_batch_complete`.
//!
//! # Example
//!
//! ```rust
//! use edgequake_pdf2img::{ReadProgressCallback, ReaderConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct PageCounter {
//!     pages: AtomicUsize,
//! }
//!
//! impl ReadProgressCallback for PageCounter {
//!     fn on_page_complete(&self, _doc: usize, page_num: usize, height: usize, width: usize) {
//!         self.pages.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("page {page_num}: {width}x{height}");
//!     }
//! }
//!
//! let config = ReaderConfig::builder()
//!     .progress_callback(Arc::new(PageCounter { pages: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use std::path::Path;
use std::sync::Arc;

/// Called by the batch reader as it processes each document and page.
///
/// Implementations must be `Send + Sync` so a config can be moved into
/// [`crate::reader::read_documents_async`]. All methods have default no-op
/// implementations so callers only override what they care about.
pub trait ReadProgressCallback: Send + Sync {
    /// Called once before the first document is opened.
    ///
    /// # Arguments
    /// * `total_documents` — number of input paths in the batch
    fn on_batch_start(&self, total_documents: usize) {
        let _ = total_documents;
    }

    /// Called after a document is opened and its page selection resolved.
    ///
    /// # Arguments
    /// * `doc_index`  — 0-based position of the document in the batch
    /// * `path`       — input path of the document
    /// * `page_count` — number of pages that will be rendered
    fn on_document_start(&self, doc_index: usize, path: &Path, page_count: usize) {
        let _ = (doc_index, path, page_count);
    }

    /// Called when a page has been rendered and decoded.
    ///
    /// # Arguments
    /// * `doc_index` — 0-based position of the document in the batch
    /// * `page_num`  — 1-based page number within the document
    /// * `height`, `width` — shape of the produced image in pixels
    fn on_page_complete(&self, doc_index: usize, page_num: usize, height: usize, width: usize) {
        let _ = (doc_index, page_num, height, width);
    }

    /// Called when a document fails. In abort mode this is the last event.
    fn on_document_error(&self, doc_index: usize, path: &Path, error: &str) {
        let _ = (doc_index, path, error);
    }

    /// Called once after the last document has been processed.
    ///
    /// # Arguments
    /// * `documents` — documents that were read successfully
    /// * `pages`     — total pages produced across those documents
    fn on_batch_complete(&self, documents: usize, pages: usize) {
        let _ = (documents, pages);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ReadProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ReaderConfig`].
pub type ProgressCallback = Arc<dyn ReadProgressCallback>;
