//! Input resolution: validate a user-supplied path and sniff its content type.
//!
//! The file extension is never trusted. We read the first bytes of the file
//! and classify them by signature; only `application/pdf` is handed to the
//! PDF engine, so a mislabeled PNG or an empty file fails early with
//! [`ReaderError::UnsupportedFormat`] rather than as an opaque engine error.

use crate::error::ReaderError;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::debug;

/// MIME types accepted as PDF input.
pub const ALLOWED_PDF: &[&str] = &["application/pdf"];

/// Number of leading bytes inspected by [`sniff_mime`].
const SNIFF_LEN: usize = 1024;

/// A local PDF that passed existence, permission and MIME checks.
#[derive(Debug, Clone)]
pub struct ResolvedInput {
    pub path: PathBuf,
    /// File base name without extension, used to name pages.
    pub stem: String,
    pub size_bytes: u64,
}

/// Resolve a local file path, validating existence, readability and content.
pub fn resolve_local(path: &Path) -> Result<ResolvedInput, ReaderError> {
    if !path.is_file() {
        return Err(ReaderError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let size_bytes = std::fs::metadata(path)
        .map(|m| m.len())
        .map_err(|e| open_error(path, e))?;

    let mime = sniff_mime(path)?;
    debug!(
        "Sniffed {} ({} bytes) as {}",
        path.display(),
        size_bytes,
        mime
    );

    if !ALLOWED_PDF.contains(&mime) {
        return Err(ReaderError::UnsupportedFormat {
            path: path.to_path_buf(),
            mime: mime.to_string(),
        });
    }

    Ok(ResolvedInput {
        path: path.to_path_buf(),
        stem: document_stem(path),
        size_bytes,
    })
}

/// Classify a file by its leading bytes.
pub fn sniff_mime(path: &Path) -> Result<&'static str, ReaderError> {
    let file = File::open(path).map_err(|e| open_error(path, e))?;

    let mut head = Vec::with_capacity(SNIFF_LEN);
    file.take(SNIFF_LEN as u64)
        .read_to_end(&mut head)
        .map_err(|e| open_error(path, e))?;

    Ok(mime_from_bytes(&head))
}

/// Map a file signature to a MIME type string.
pub fn mime_from_bytes(head: &[u8]) -> &'static str {
    const SIGNATURES: &[(&[u8], &str)] = &[
        (b"%PDF-", "application/pdf"),
        (b"\x89PNG\r\n\x1a\n", "image/png"),
        (b"\xff\xd8\xff", "image/jpeg"),
        (b"GIF87a", "image/gif"),
        (b"GIF89a", "image/gif"),
        (b"II*\x00", "image/tiff"),
        (b"MM\x00*", "image/tiff"),
        (b"BM", "image/bmp"),
        (b"PK\x03\x04", "application/zip"),
        (b"\x1f\x8b", "application/gzip"),
        (b"%!PS", "application/postscript"),
    ];

    if head.is_empty() {
        return "application/x-empty";
    }
    if let Some((_, mime)) = SIGNATURES.iter().find(|(sig, _)| head.starts_with(sig)) {
        return mime;
    }
    if head.len() >= 12 && &head[..4] == b"RIFF" && &head[8..12] == b"WEBP" {
        return "image/webp";
    }
    if std::str::from_utf8(head).is_ok_and(|s| {
        s.chars()
            .all(|c| !c.is_control() || c.is_ascii_whitespace())
    }) {
        return "text/plain";
    }
    "application/octet-stream"
}

/// Base name of `path` without its final extension.
pub fn document_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string())
}

/// Write in-memory PDF bytes to a temp directory as `<name>.pdf`.
///
/// The returned `TempDir` must be kept alive until the file has been read;
/// dropping it removes the file.
pub fn spool_bytes(bytes: &[u8], name: &str) -> Result<(TempDir, PathBuf), ReaderError> {
    let temp_dir = TempDir::new().map_err(|e| ReaderError::Internal(format!("tempdir: {e}")))?;

    let stem = document_stem(Path::new(name));
    let path = temp_dir.path().join(format!("{stem}.pdf"));

    let mut file =
        File::create(&path).map_err(|e| ReaderError::Internal(format!("tempfile: {e}")))?;
    file.write_all(bytes)
        .map_err(|e| ReaderError::Internal(format!("tempfile write: {e}")))?;

    Ok((temp_dir, path))
}

fn open_error(path: &Path, e: std::io::Error) -> ReaderError {
    match e.kind() {
        std::io::ErrorKind::PermissionDenied => ReaderError::PermissionDenied {
            path: path.to_path_buf(),
        },
        std::io::ErrorKind::NotFound => ReaderError::FileNotFound {
            path: path.to_path_buf(),
        },
        _ => ReaderError::Internal(format!("reading {}: {e}", path.display())),
    }
}
