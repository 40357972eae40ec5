//! Integration tests for the batch reader, driven through an in-memory engine.
//!
//! Inputs are real temp files (the reader checks existence and sniffs MIME
//! types on disk), but "opening" them goes through `FakeEngine`, so no
//! pdfium library is needed.

use edgequake_pdf2img::{
    document_reader, inspect_with, read_document_bytes_with, read_document_with,
    read_documents_encoded_lenient_with, read_documents_encoded_with, read_documents_lenient_with, read_documents_with, ChannelOrder,
    MediaBox, PageSelection, PdfEngine, PdfSource, PixelLayout, Pixmap, ReadProgressCallback,
    ReaderConfig, ReaderError, ResolutionSpec,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Every document it opens has `pages` pages of size `media_box`.
/// Files whose body contains `BROKEN` fail to open as corrupt.
struct FakeEngine {
    pages: usize,
    media_box: MediaBox,
    opened: Mutex<Vec<PathBuf>>,
    passwords: Mutex<Vec<Option<String>>>,
    page_count_calls: AtomicUsize,
}

impl FakeEngine {
    fn new(pages: usize, width: f64, height: f64) -> Self {
        Self {
            pages,
            media_box: MediaBox::new(width, height),
            opened: Mutex::new(Vec::new()),
            passwords: Mutex::new(Vec::new()),
            page_count_calls: AtomicUsize::new(0),
        }
    }

    fn opened(&self) -> Vec<PathBuf> {
        self.opened.lock().unwrap().clone()
    }
}

struct FakeSource<'a> {
    pages: usize,
    media_box: MediaBox,
    page_count_calls: &'a AtomicUsize,
}

impl PdfEngine for FakeEngine {
    fn open<'a>(
        &'a self,
        path: &Path,
        password: Option<&'a str>,
    ) -> Result<Box<dyn PdfSource + 'a>, ReaderError> {
        self.opened.lock().unwrap().push(path.to_path_buf());
        self.passwords
            .lock()
            .unwrap()
            .push(password.map(str::to_string));
        let body = std::fs::read(path).unwrap();
        if body.windows(6).any(|w| w == b"BROKEN") {
            return Err(ReaderError::CorruptPdf {
                path: path.to_path_buf(),
                detail: "no xref table".into(),
            });
        }
        Ok(Box::new(FakeSource {
            pages: self.pages,
            media_box: self.media_box,
            page_count_calls: &self.page_count_calls,
        }))
    }
}

impl PdfSource for FakeSource<'_> {
    fn page_count(&self) -> usize {
        self.page_count_calls.fetch_add(1, Ordering::SeqCst);
        self.pages
    }

    fn media_box(&self, _index: usize) -> Result<MediaBox, ReaderError> {
        Ok(self.media_box)
    }

    fn render(&self, index: usize, scale: f64) -> Result<Pixmap, ReaderError> {
        let w = (self.media_box.width * scale).round() as usize;
        let h = (self.media_box.height * scale).round() as usize;
        // BGRA: blue = page index, green = 100, red = 200
        let px = [index as u8, 100, 200, 255];
        Ok(Pixmap::new(w, h, PixelLayout::Bgra, px.repeat(w * h)))
    }
}

fn write_pdf(dir: &TempDir, name: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, b"%PDF-1.4\n%fake body\n%%EOF\n").unwrap();
    path
}

fn write_file(dir: &TempDir, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

#[derive(Default)]
struct RecordingCallback {
    events: Mutex<Vec<String>>,
}

impl RecordingCallback {
    fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl ReadProgressCallback for RecordingCallback {
    fn on_batch_start(&self, total_documents: usize) {
        self.events
            .lock()
            .unwrap()
            .push(format!("batch_start {total_documents}"));
    }

    fn on_document_start(&self, doc_index: usize, _path: &Path, page_count: usize) {
        self.events
            .lock()
            .unwrap()
            .push(format!("doc_start {doc_index} {page_count}"));
    }

    fn on_page_complete(&self, doc_index: usize, page_num: usize, height: usize, width: usize) {
        self.events
            .lock()
            .unwrap()
            .push(format!("page {doc_index} {page_num} {height}x{width}"));
    }

    fn on_document_error(&self, doc_index: usize, _path: &Path, _error: &str) {
        self.events
            .lock()
            .unwrap()
            .push(format!("doc_error {doc_index}"));
    }

    fn on_batch_complete(&self, documents: usize, pages: usize) {
        self.events
            .lock()
            .unwrap()
            .push(format!("batch_complete {documents} {pages}"));
    }
}

// ── Batch reading ────────────────────────────────────────────────────────────

#[test]
fn two_page_document_at_native_size() {
    let dir = TempDir::new().unwrap();
    let x = write_pdf(&dir, "x.pdf");
    let engine = FakeEngine::new(2, 1000.0, 500.0);

    let batch = read_documents_with(&engine, [&x], &ReaderConfig::default()).unwrap();

    assert_eq!(batch.documents.len(), 1);
    let doc = &batch.documents[0];
    assert_eq!(doc.names, vec!["x-p001", "x-p002"]);
    assert_eq!(doc.shapes(), vec![(500, 1000), (500, 1000)]);
    assert_eq!(doc.pages[0].shape(), [500, 1000, 3]);
    assert_eq!(doc.pages[0].pixel(0, 0), Some([200, 100, 0]));
}

#[test]
fn results_follow_input_order() {
    let dir = TempDir::new().unwrap();
    let a = write_pdf(&dir, "alpha.pdf");
    let b = write_pdf(&dir, "beta.pdf");
    let engine = FakeEngine::new(1, 10.0, 10.0);

    let batch = read_documents_with(&engine, [&b, &a], &ReaderConfig::default()).unwrap();

    assert_eq!(
        batch.names(),
        vec![vec!["beta-p001".to_string()], vec!["alpha-p001".to_string()]]
    );
    assert_eq!(engine.opened(), vec![b, a]);
}

#[test]
fn non_pdf_aborts_the_whole_batch() {
    let dir = TempDir::new().unwrap();
    let a = write_pdf(&dir, "a.pdf");
    let b = write_file(&dir, "b.pdf", b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR");
    let engine = FakeEngine::new(1, 10.0, 10.0);

    let err = read_documents_with(&engine, [&a, &b], &ReaderConfig::default()).unwrap_err();

    match err {
        ReaderError::UnsupportedFormat { path, mime } => {
            assert_eq!(path, b);
            assert_eq!(mime, "image/png");
        }
        other => panic!("expected UnsupportedFormat, got {other:?}"),
    }
    // the non-PDF is never handed to the engine
    assert_eq!(engine.opened(), vec![a]);
}

#[test]
fn empty_input_is_missing_input() {
    let engine = FakeEngine::new(1, 10.0, 10.0);
    let none: Vec<PathBuf> = Vec::new();

    let err = read_documents_with(&engine, &none, &ReaderConfig::default()).unwrap_err();
    assert!(matches!(err, ReaderError::MissingInput));
}

#[test]
fn missing_file_is_reported_with_its_path() {
    let dir = TempDir::new().unwrap();
    let ghost = dir.path().join("ghost.pdf");
    let engine = FakeEngine::new(1, 10.0, 10.0);

    let err = read_document_with(&engine, &ghost, &ReaderConfig::default()).unwrap_err();
    match err {
        ReaderError::FileNotFound { path } => assert_eq!(path, ghost),
        other => panic!("expected FileNotFound, got {other:?}"),
    }
    assert!(engine.opened().is_empty());
}

#[test]
fn corrupt_document_surfaces_engine_error() {
    let dir = TempDir::new().unwrap();
    let bad = write_file(&dir, "bad.pdf", b"%PDF-1.7\nBROKEN\n");
    let engine = FakeEngine::new(1, 10.0, 10.0);

    let err = read_document_with(&engine, &bad, &ReaderConfig::default()).unwrap_err();
    assert_eq!(err.kind(), "corrupt_pdf");
}

#[test]
fn lenient_mode_keeps_going() {
    let dir = TempDir::new().unwrap();
    let a = write_pdf(&dir, "a.pdf");
    let b = write_file(&dir, "b.pdf", b"plain text, not a pdf\n");
    let c = write_pdf(&dir, "c.pdf");
    let engine = FakeEngine::new(2, 10.0, 10.0);

    let results =
        read_documents_lenient_with(&engine, [&a, &b, &c], &ReaderConfig::default()).unwrap();

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].as_ref().unwrap().names, vec!["a-p001", "a-p002"]);
    assert!(matches!(
        results[1],
        Err(ReaderError::UnsupportedFormat { .. })
    ));
    assert_eq!(results[2].as_ref().unwrap().len(), 2);
}

// ── Page selection and resolution ────────────────────────────────────────────

#[test]
fn page_order_and_channel_order_are_honoured() {
    let dir = TempDir::new().unwrap();
    let x = write_pdf(&dir, "x.pdf");
    let engine = FakeEngine::new(3, 20.0, 10.0);
    let config = ReaderConfig::builder()
        .pages(PageSelection::Set(vec![3, 1]))
        .channel_order(ChannelOrder::Bgr)
        .build()
        .unwrap();

    let doc = read_document_with(&engine, &x, &config).unwrap();

    assert_eq!(doc.names, vec!["x-p003", "x-p001"]);
    assert_eq!(doc.pages[0].pixel(0, 0), Some([2, 100, 200]));
    assert_eq!(doc.pages[1].pixel(0, 0), Some([0, 100, 200]));
    assert_eq!(doc.pages[0].channel_order(), ChannelOrder::Bgr);
}

#[test]
fn out_of_range_page_is_an_error() {
    let dir = TempDir::new().unwrap();
    let x = write_pdf(&dir, "x.pdf");
    let engine = FakeEngine::new(2, 20.0, 10.0);
    let config = ReaderConfig::builder()
        .pages(PageSelection::Single(5))
        .build()
        .unwrap();

    let err = read_document_with(&engine, &x, &config).unwrap_err();
    assert!(matches!(
        err,
        ReaderError::PageIndexError { page: 5, total: 2 }
    ));
}

#[test]
fn scalar_resolution_is_clamped_to_floor() {
    let dir = TempDir::new().unwrap();
    let x = write_pdf(&dir, "x.pdf");
    // 1000 is raised to the 800 000 floor; 800 000 / 20 000 = 40, capped at 20
    let engine = FakeEngine::new(1, 200.0, 100.0);
    let config = ReaderConfig::builder()
        .resolution(ResolutionSpec::pixels(1000.0).unwrap())
        .build()
        .unwrap();

    let doc = read_document_with(&engine, &x, &config).unwrap();
    assert_eq!(doc.shapes(), vec![(2000, 4000)]);
}

#[test]
fn dimension_resolution_sets_the_scale() {
    let dir = TempDir::new().unwrap();
    let x = write_pdf(&dir, "x.pdf");
    let engine = FakeEngine::new(1, 1000.0, 500.0);
    let config = ReaderConfig::builder()
        .resolution("200x100".parse().unwrap())
        .build()
        .unwrap();

    let doc = read_document_with(&engine, &x, &config).unwrap();
    // 20 000 / 500 000 = 0.04
    assert_eq!(doc.shapes(), vec![(20, 40)]);
}

// ── Progress, bytes, transport, encoding, inspect ───────────────────────────

#[test]
fn progress_events_in_order() {
    let dir = TempDir::new().unwrap();
    let a = write_pdf(&dir, "a.pdf");
    let b = write_pdf(&dir, "b.pdf");
    let engine = FakeEngine::new(2, 4.0, 2.0);
    let cb = Arc::new(RecordingCallback::default());
    let config = ReaderConfig::builder()
        .progress_callback(cb.clone())
        .build()
        .unwrap();

    read_documents_with(&engine, [&a, &b], &config).unwrap();

    assert_eq!(
        cb.events(),
        vec![
            "batch_start 2",
            "doc_start 0 2",
            "page 0 1 2x4",
            "page 0 2 2x4",
            "doc_start 1 2",
            "page 1 1 2x4",
            "page 1 2 2x4",
            "batch_complete 2 4",
        ]
    );
}

#[test]
fn failed_document_fires_error_event() {
    let dir = TempDir::new().unwrap();
    let bad = write_file(&dir, "bad.pdf", b"%PDF-1.7\nBROKEN\n");
    let engine = FakeEngine::new(1, 4.0, 2.0);
    let cb = Arc::new(RecordingCallback::default());
    let config = ReaderConfig::builder()
        .progress_callback(cb.clone())
        .build()
        .unwrap();

    assert!(read_documents_with(&engine, [&bad], &config).is_err());
    assert_eq!(cb.events(), vec!["batch_start 1", "doc_error 0"]);
}

#[test]
fn bytes_are_named_after_the_given_name() {
    let engine = FakeEngine::new(1, 4.0, 2.0);
    let doc = read_document_bytes_with(
        &engine,
        b"%PDF-1.5\n%in memory\n",
        "upload.pdf",
        &ReaderConfig::default(),
    )
    .unwrap();

    assert_eq!(doc.names, vec!["upload-p001"]);
    // the spooled file is gone once the call returns
    let spooled = &engine.opened()[0];
    assert_eq!(spooled.file_name().unwrap(), "upload.pdf");
    assert!(!spooled.exists());
}

#[test]
fn transport_form_matches_batch() {
    let dir = TempDir::new().unwrap();
    let x = write_pdf(&dir, "x.pdf");
    let engine = FakeEngine::new(2, 4.0, 2.0);

    let batch = read_documents_with(&engine, [&x], &ReaderConfig::default()).unwrap();
    let transport = batch.into_transport();

    assert_eq!(transport.shapes, vec![vec![(2, 4), (2, 4)]]);
    assert_eq!(transport.raw[0][1].len(), 2 * 4 * 3);
    assert_eq!(transport.names[0], vec!["x-p001", "x-p002"]);

    let json = serde_json::to_string(&transport).unwrap();
    let back: edgequake_pdf2img::TransportBatch = serde_json::from_str(&json).unwrap();
    assert_eq!(back, transport);
}

#[test]
fn encoded_documents_fall_back_to_png() {
    let dir = TempDir::new().unwrap();
    let x = write_pdf(&dir, "x.pdf");
    let engine = FakeEngine::new(2, 4.0, 2.0);

    let docs =
        read_documents_encoded_with(&engine, [&x], "tiff", &ReaderConfig::default()).unwrap();
    assert_eq!(docs[0].extension, "png");
    assert_eq!(docs[0].names, vec!["x-p001", "x-p002"]);
    assert!(docs[0].images.iter().all(|i| i.starts_with(b"\x89PNG")));

    let jpegs =
        read_documents_encoded_with(&engine, [&x], "jpeg", &ReaderConfig::default()).unwrap();
    assert_eq!(jpegs[0].extension, "jpg");
    assert!(jpegs[0].images[0].starts_with(&[0xFF, 0xD8]));
}

#[test]
fn encoded_batch_reports_progress() {
    let dir = TempDir::new().unwrap();
    let x = write_pdf(&dir, "x.pdf");
    let engine = FakeEngine::new(2, 4.0, 2.0);
    let cb = Arc::new(RecordingCallback::default());
    let config = ReaderConfig::builder()
        .progress_callback(cb.clone())
        .build()
        .unwrap();

    read_documents_encoded_with(&engine, [&x], "png", &config).unwrap();

    assert_eq!(
        cb.events(),
        vec![
            "batch_start 1",
            "doc_start 0 2",
            "page 0 1 2x4",
            "page 0 2 2x4",
            "batch_complete 1 2",
        ]
    );
}

#[test]
fn lenient_encoded_batch_keeps_going() {
    let dir = TempDir::new().unwrap();
    let bad = write_file(&dir, "bad.pdf", b"%PDF-1.7\nBROKEN\n");
    let good = write_pdf(&dir, "good.pdf");
    let engine = FakeEngine::new(1, 4.0, 2.0);
    let cb = Arc::new(RecordingCallback::default());
    let config = ReaderConfig::builder()
        .progress_callback(cb.clone())
        .build()
        .unwrap();

    let results =
        read_documents_encoded_lenient_with(&engine, [&bad, &good], "jpg", &config).unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].as_ref().unwrap_err().kind(), "corrupt_pdf");
    let doc = results[1].as_ref().unwrap();
    assert_eq!(doc.names, vec!["good-p001"]);
    assert_eq!(doc.extension, "jpg");
    assert_eq!(cb.events().last().unwrap(), "batch_complete 1 1");
}

#[test]
fn password_reaches_the_engine() {
    let dir = TempDir::new().unwrap();
    let x = write_pdf(&dir, "locked.pdf");
    let engine = FakeEngine::new(1, 4.0, 2.0);
    let config = ReaderConfig::builder().password("s3cret").build().unwrap();

    read_document_with(&engine, &x, &config).unwrap();
    read_document_with(&engine, &x, &ReaderConfig::default()).unwrap();

    assert_eq!(
        *engine.passwords.lock().unwrap(),
        vec![Some("s3cret".to_string()), None]
    );
}

#[test]
fn page_count_is_read_once_per_document() {
    let dir = TempDir::new().unwrap();
    let a = write_pdf(&dir, "a.pdf");
    let b = write_pdf(&dir, "b.pdf");
    let engine = FakeEngine::new(3, 4.0, 2.0);
    let config = ReaderConfig::builder()
        .progress_callback(Arc::new(RecordingCallback::default()))
        .pages(PageSelection::Range(2, 3))
        .build()
        .unwrap();

    read_documents_with(&engine, [&a, &b], &config).unwrap();
    assert_eq!(engine.page_count_calls.load(Ordering::SeqCst), 2);
}

#[test]
fn huge_page_range_is_an_index_error() {
    let dir = TempDir::new().unwrap();
    let x = write_pdf(&dir, "x.pdf");
    let engine = FakeEngine::new(3, 4.0, 2.0);
    let config = ReaderConfig::builder()
        .pages(PageSelection::Range(1, usize::MAX))
        .build()
        .unwrap();

    let err = read_document_with(&engine, &x, &config).unwrap_err();
    assert!(matches!(err, ReaderError::PageIndexError { total: 3, .. }));
}

#[test]
fn zero_pixel_dimensions_render_at_native_size() {
    let dir = TempDir::new().unwrap();
    let x = write_pdf(&dir, "x.pdf");
    let engine = FakeEngine::new(1, 40.0, 20.0);
    let config = ReaderConfig::builder()
        .resolution("0.5x1".parse().unwrap())
        .build()
        .unwrap();

    let doc = read_document_with(&engine, &x, &config).unwrap();
    assert_eq!(doc.shapes(), vec![(20, 40)]);
}

#[test]
fn inspect_reports_pages_without_rendering() {
    let dir = TempDir::new().unwrap();
    let x = write_pdf(&dir, "report.pdf");
    let engine = FakeEngine::new(3, 612.0, 792.0);

    let info = inspect_with(&engine, &x, &ReaderConfig::default()).unwrap();
    assert_eq!(info.stem, "report");
    assert_eq!(info.mime, "application/pdf");
    assert_eq!(info.page_count, 3);
    assert_eq!(info.media_boxes, vec![MediaBox::new(612.0, 792.0); 3]);
}

#[test]
fn document_reader_without_pdfium_reports_missing_input_first() {
    // input validation happens before the engine is bound
    let none: Vec<PathBuf> = Vec::new();
    let err = document_reader(&none, &ReaderConfig::default()).unwrap_err();
    assert!(matches!(err, ReaderError::MissingInput));
}

#[tokio::test]
async fn async_reader_validates_input_on_the_blocking_pool() {
    let err = edgequake_pdf2img::read_documents_async(Vec::new(), ReaderConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ReaderError::MissingInput));
}
