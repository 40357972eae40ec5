//! Pipeline stages for PDF rasterisation.
//!
//! Each submodule implements exactly one transformation step and is testable
//! on its own, with the PDF engine behind the [`crate::engine`] traits.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ document ──▶ resolution ──▶ render ──▶ (encode)
//! (MIME)    (pages)      (scale)        (pixmap → array)
//! ```
//!
//! 1. [`input`]      — check the path exists and sniff that it really is a PDF
//! 2. [`document`]   — resolve the page selection and name each page
//! 3. [`resolution`] — derive a clamped render scale from the media box
//! 4. [`render`]     — render a page and decode the pixmap in RGB or BGR
//! 5. [`encode`]     — alternate output: compressed PNG/JPEG bytes

pub mod document;
pub mod encode;
pub mod input;
pub mod render;
pub mod resolution;
