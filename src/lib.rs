//! # edgequake-pdf2img
//!
//! Rasterise PDF documents into validated RGB (or BGR) page images at a
//! computed target resolution, ready to feed OCR and text-recognition models.
//!
//! ## Pipeline Overview
//!
//! ```text
//! paths
//!  │
//!  ├─ 1. Input       check the file exists and sniff that it is a PDF
//!  ├─ 2. Open        load the document with pdfium
//!  ├─ 3. Select      resolve 1-based page indices (order kept, validated)
//!  ├─ 4. Plan        target pixel count → clamped render scale per page
//!  ├─ 5. Render      pixmap at that scale → H×W×3 array, RGB or BGR
//!  └─ 6. Output      images + `<stem>-pNNN` names, or (shape, bytes) pairs
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_pdf2img::{read_documents, ReaderConfig, ResolutionSpec};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ReaderConfig::builder()
//!         .resolution(ResolutionSpec::pixels(1_500_000.0)?)
//!         .build()?;
//!     let batch = read_documents(["invoice.pdf", "receipt.pdf"], &config)?;
//!     for doc in &batch.documents {
//!         for (name, page) in doc.iter() {
//!             println!("{name}: {:?}", page.shape());
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Resolution policy
//!
//! | Request | Target pixel count |
//! |---------|--------------------|
//! | none | native page size (scale 1.0) |
//! | scalar `N` | `N` clamped to `[800 000, 3 000 000]` |
//! | pair `W×H` | `W * H`, unclamped by default |
//!
//! The scale is `target / native`, capped at 20.0. All three bounds live in
//! [`ResolutionLimits`] and can be overridden per call.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2img` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod engine;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod reader;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    ChannelOrder, PageSelection, ReaderConfig, ReaderConfigBuilder, ResolutionLimits,
    ResolutionSpec, DEFAULT_MAX_SCALE, DEFAULT_RES_MAX, DEFAULT_RES_MIN,
};
pub use engine::{MediaBox, PdfEngine, PdfSource, PdfiumEngine, PixelLayout, Pixmap};
pub use error::ReaderError;
pub use output::{BatchResult, DocumentInfo, DocumentResult, EncodedDocument, PageImage, TransportBatch};
pub use pipeline::encode::OutputFormat;
pub use progress::{NoopProgressCallback, ProgressCallback, ReadProgressCallback};
pub use reader::{
    document_reader, inspect, inspect_with, read_document, read_document_bytes,
    read_document_bytes_with, read_document_with, read_documents, read_documents_async,
    read_documents_encoded, read_documents_encoded_lenient, read_documents_encoded_lenient_with,
    read_documents_encoded_with, read_documents_lenient,
    read_documents_lenient_with, read_documents_with,
};
