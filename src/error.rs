//! Error types for the edgequake-pdf2img library.
//!
//! Every failure is reported through [`ReaderError`]. The batch entry points
//! abort on the first error: a single unreadable file fails the whole call
//! and no partial output is returned. Callers that prefer to keep the good
//! documents use [`crate::reader::read_documents_lenient`], which stores one
//! `Result<DocumentResult, ReaderError>` per input instead.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the edgequake-pdf2img library.
#[derive(Debug, Error)]
pub enum ReaderError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// No file path was supplied to a batch call.
    #[error("No input files provided")]
    MissingInput,

    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// Content sniffing says the file is not a PDF, whatever its extension.
    #[error("Unsupported format for '{path}': detected {mime}, expected application/pdf")]
    UnsupportedFormat { path: PathBuf, mime: String },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}\nTry repairing with: qpdf --decrypt input.pdf output.pdf")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// A requested 1-based page index is outside `[1, total]`.
    #[error("Page {page} is out of range (document has {total} pages)")]
    PageIndexError { page: usize, total: usize },

    /// The rendering engine returned an error for a specific page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    /// The rendered pixel buffer could not be turned into an image.
    #[error("Could not decode rendered buffer for page {page}: {detail}")]
    DecodeError { page: usize, detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// A resolution value is non-positive, non-finite, or unparsable.
    #[error("Invalid resolution: {0}")]
    InvalidResolution(String),

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
You can:\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy.\n\
  • Pass --pdfium-lib /path/to/libpdfium on the command line.\n\
  • Install pdfium system-wide (e.g. from bblanchon/pdfium-binaries).\n"
    )]
    PdfiumBindingFailed(String),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output image file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ReaderError {
    /// Short machine-friendly name of the error category.
    ///
    /// Used by the CLI's JSON output for lenient batches.
    pub fn kind(&self) -> &'static str {
        match self {
            ReaderError::MissingInput => "missing_input",
            ReaderError::FileNotFound { .. } => "file_not_found",
            ReaderError::PermissionDenied { .. } => "permission_denied",
            ReaderError::UnsupportedFormat { .. } => "unsupported_format",
            ReaderError::CorruptPdf { .. } => "corrupt_pdf",
            ReaderError::PasswordRequired { .. } => "password_required",
            ReaderError::WrongPassword { .. } => "wrong_password",
            ReaderError::PageIndexError { .. } => "page_index",
            ReaderError::RasterisationFailed { .. } => "rasterisation_failed",
            ReaderError::DecodeError { .. } => "decode_error",
            ReaderError::InvalidResolution(_) => "invalid_resolution",
            ReaderError::InvalidConfig(_) => "invalid_config",
            ReaderError::PdfiumBindingFailed(_) => "pdfium_binding_failed",
            ReaderError::OutputWriteFailed { .. } => "output_write_failed",
            ReaderError::Internal(_) => "internal",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_index_display() {
        let e = ReaderError::PageIndexError { page: 7, total: 2 };
        let msg = e.to_string();
        assert!(msg.contains("Page 7"), "got: {msg}");
        assert!(msg.contains("2 pages"), "got: {msg}");
    }

    #[test]
    fn unsupported_format_display() {
        let e = ReaderError::UnsupportedFormat {
            path: PathBuf::from("/tmp/scan.pdf"),
            mime: "image/png".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("scan.pdf"));
        assert!(msg.contains("image/png"));
    }

    #[test]
    fn decode_error_display() {
        let e = ReaderError::DecodeError {
            page: 3,
            detail: "empty buffer".into(),
        };
        assert!(e.to_string().contains("page 3"));
        assert!(e.to_string().contains("empty buffer"));
    }

    #[test]
    fn kind_is_stable() {
        assert_eq!(ReaderError::MissingInput.kind(), "missing_input");
        assert_eq!(
            ReaderError::PageIndexError { page: 0, total: 1 }.kind(),
            "page_index"
        );
    }
}
