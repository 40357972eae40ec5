//! CLI binary for edgequake-pdf2img.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ReaderConfig`, writes page images and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_pdf2img::{
    inspect, read_documents, read_documents_encoded, read_documents_encoded_lenient,
    read_documents_lenient, ChannelOrder, DocumentResult, EncodedDocument, PageSelection,
    ReadProgressCallback, ReaderConfig, ReaderError, ResolutionSpec, TransportBatch,
};
use std::collections::HashSet;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar per document, one log line per page.
struct CliProgressCallback {
    bar: ProgressBar,
    started: Instant,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(TICKS),
        );
        bar.set_prefix("Preparing");
        bar.set_message("Opening PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            started: Instant::now(),
            errors: AtomicUsize::new(0),
        })
    }
}

impl ReadProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_documents: usize) {
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Reading {total_documents} document(s)…"))
        ));
    }

    fn on_document_start(&self, _doc_index: usize, path: &Path, page_count: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_style(style);
        self.bar.set_length(page_count as u64);
        self.bar.set_position(0);
        self.bar.set_prefix(
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        );
    }

    fn on_page_complete(&self, _doc_index: usize, page_num: usize, height: usize, width: usize) {
        self.bar.println(format!(
            "  {} Page {:>3}  {}",
            green("✓"),
            page_num,
            dim(&format!("{width}x{height} px")),
        ));
        self.bar.inc(1);
    }

    fn on_document_error(&self, _doc_index: usize, path: &Path, error: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);
        let msg = error.lines().next().unwrap_or(error);
        self.bar
            .println(format!("  {} {}  {}", red("✗"), path.display(), red(msg)));
    }

    fn on_batch_complete(&self, documents: usize, pages: usize) {
        self.bar.finish_and_clear();
        let failed = self.errors.load(Ordering::SeqCst);
        eprintln!(
            "{} {} document(s), {} page(s)  {}{}",
            if failed == 0 { green("✔") } else { cyan("⚠") },
            bold(&documents.to_string()),
            bold(&pages.to_string()),
            dim(&format!("{:.1}s", self.started.elapsed().as_secs_f64())),
            if failed > 0 {
                format!("  ({} failed)", red(&failed.to_string()))
            } else {
                String::new()
            },
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Rasterise every page at native size, print shapes
  pdf2img document.pdf

  # Target ~1.5 megapixels per page and save PNGs
  pdf2img --resolution 1500000 --output-dir pages/ document.pdf

  # Fixed width x height target (not clamped unless --clamp-dimensions)
  pdf2img --resolution 1240x1754 -o pages/ scan.pdf

  # Pages 3 then 1, BGR order, transport JSON on stdout
  pdf2img --pages 3,1 --channel-order bgr --json document.pdf > batch.json

  # Several documents; keep going when one is broken
  pdf2img --lenient a.pdf b.pdf c.pdf

  # Inspect page count and media boxes only
  pdf2img --inspect-only document.pdf

RESOLUTION POLICY:
  none      render at native page size (scale 1.0)
  N         target N pixels, clamped to [--min-pixels, --max-pixels]
  WxH       target W*H pixels
  The render scale is target / native pixels, capped at --max-scale.

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH         Path to an existing libpdfium
  RUST_LOG                Override the log filter (e.g. edgequake_pdf2img=debug)
"#;

/// Rasterise PDF documents into page images.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2img",
    version,
    about = "Rasterise PDF documents into RGB/BGR page images at a computed resolution",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// PDF file paths.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Target resolution: total pixels (1500000) or WIDTHxHEIGHT (1240x1754).
    #[arg(short, long, env = "PDF2IMG_RESOLUTION")]
    resolution: Option<String>,

    /// Page selection: all, 5, 3-15, or 3,1,2 (order kept).
    #[arg(long, env = "PDF2IMG_PAGES", default_value = "all")]
    pages: String,

    /// Channel order of decoded images.
    #[arg(long, env = "PDF2IMG_CHANNEL_ORDER", value_enum, default_value = "rgb")]
    channel_order: ChannelArg,

    /// Write one image file per page into this directory.
    #[arg(short, long, env = "PDF2IMG_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Image format for --output-dir: png or jpeg (others fall back to png).
    #[arg(long, env = "PDF2IMG_FORMAT", default_value = "png")]
    format: String,

    /// Print the (shapes, raw, names) transport form as JSON.
    #[arg(long, env = "PDF2IMG_JSON", conflicts_with = "output_dir")]
    json: bool,

    /// Floor for scalar resolution targets.
    #[arg(long, env = "PDF2IMG_MIN_PIXELS", default_value_t = edgequake_pdf2img::DEFAULT_RES_MIN)]
    min_pixels: f64,

    /// Ceiling for scalar resolution targets.
    #[arg(long, env = "PDF2IMG_MAX_PIXELS", default_value_t = edgequake_pdf2img::DEFAULT_RES_MAX)]
    max_pixels: f64,

    /// Maximum render scale.
    #[arg(long, env = "PDF2IMG_MAX_SCALE", default_value_t = edgequake_pdf2img::DEFAULT_MAX_SCALE)]
    max_scale: f64,

    /// Apply the min/max pixel clamp to WIDTHxHEIGHT targets too.
    #[arg(long, env = "PDF2IMG_CLAMP_DIMENSIONS")]
    clamp_dimensions: bool,

    /// Report failed documents and continue instead of aborting the batch.
    #[arg(long, env = "PDF2IMG_LENIENT")]
    lenient: bool,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDF2IMG_PASSWORD")]
    password: Option<String>,

    /// Path to the pdfium shared library.
    #[arg(long)]
    pdfium_lib: Option<PathBuf>,

    /// Print page count and media boxes only, no rendering.
    #[arg(long)]
    inspect_only: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDF2IMG_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2IMG_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2IMG_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum ChannelArg {
    Rgb,
    Bgr,
}

impl From<ChannelArg> for ChannelOrder {
    fn from(v: ChannelArg) -> Self {
        match v {
            ChannelArg::Rgb => ChannelOrder::Rgb,
            ChannelArg::Bgr => ChannelOrder::Bgr,
        }
    }
}

/// JSON line for one document in lenient mode.
#[derive(Serialize)]
struct DocumentReport {
    path: String,
    names: Vec<String>,
    shapes: Vec<(usize, usize)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorReport>,
}

#[derive(Serialize)]
struct ErrorReport {
    kind: &'static str,
    message: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.inspect_only;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    check_flags(&cli)?;
    let mut config = build_config(&cli)?;

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        for input in &cli.inputs {
            let info = inspect(input, &config)
                .with_context(|| format!("Failed to inspect {}", input.display()))?;
            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&info).context("Failed to serialise info")?
                );
            } else {
                println!("File:   {}", info.path);
                println!("Size:   {} bytes", info.size_bytes);
                println!("Pages:  {}", info.page_count);
                for (i, mb) in info.media_boxes.iter().enumerate() {
                    println!("  p{:03}  {:.1} x {:.1} pt", i + 1, mb.width, mb.height);
                }
            }
        }
        return Ok(());
    }

    if show_progress {
        config.progress_callback = Some(CliProgressCallback::new());
    }

    // ── Encoded output to disk ───────────────────────────────────────────
    if let Some(ref dir) = cli.output_dir {
        let mut failed = 0usize;
        let docs = if cli.lenient {
            let results = read_documents_encoded_lenient(&cli.inputs, &cli.format, &config)
                .context("Rasterisation failed")?;
            let mut docs = Vec::with_capacity(results.len());
            for (path, result) in cli.inputs.iter().zip(results) {
                match result {
                    Ok(doc) => docs.push(doc),
                    Err(e) => {
                        failed += 1;
                        if !show_progress && !cli.quiet {
                            eprintln!("{}  {} {}", bold(&path.display().to_string()), red("✗"), e);
                        }
                    }
                }
            }
            docs
        } else {
            read_documents_encoded(&cli.inputs, &cli.format, &config)
                .context("Rasterisation failed")?
        };

        let files = output_files(dir, &docs)?;
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        for (path, bytes) in &files {
            write_atomic(path, bytes)?;
        }

        if !cli.quiet {
            eprintln!(
                "{}  {} page image(s)  →  {}{}",
                if failed == 0 { green("✔") } else { cyan("⚠") },
                files.len(),
                bold(&dir.display().to_string()),
                if failed > 0 {
                    format!("  ({} document(s) failed)", red(&failed.to_string()))
                } else {
                    String::new()
                },
            );
        }
        return Ok(());
    }

    // ── Lenient batch ────────────────────────────────────────────────────
    if cli.lenient {
        let results =
            read_documents_lenient(&cli.inputs, &config).context("Rasterisation failed")?;
        let reports: Vec<DocumentReport> = cli
            .inputs
            .iter()
            .zip(results)
            .map(|(path, r)| report(path, r))
            .collect();

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&reports).context("Failed to serialise output")?
            );
        } else if !cli.quiet {
            for r in &reports {
                print_report(r);
            }
        }
        return Ok(());
    }

    // ── Strict batch ─────────────────────────────────────────────────────
    let batch = read_documents(&cli.inputs, &config).context("Rasterisation failed")?;

    if cli.json {
        write_transport(io::stdout().lock(), &batch.into_transport())?;
    } else if !cli.quiet {
        for (path, doc) in cli.inputs.iter().zip(batch.documents) {
            print_report(&report(path, Ok(doc)));
        }
    }

    Ok(())
}

/// Reject flag combinations that would be silently ignored.
fn check_flags(cli: &Cli) -> Result<()> {
    if cli.output_dir.is_some() && matches!(cli.channel_order, ChannelArg::Bgr) {
        anyhow::bail!(
            "--channel-order bgr has no effect with --output-dir: image files are always RGB"
        );
    }
    Ok(())
}

/// Map CLI args to `ReaderConfig`.
fn build_config(cli: &Cli) -> Result<ReaderConfig> {
    let resolution = cli
        .resolution
        .as_deref()
        .map(str::parse::<ResolutionSpec>)
        .transpose()
        .context("Invalid --resolution")?;

    let mut builder = ReaderConfig::builder()
        .maybe_resolution(resolution)
        .pages(parse_pages(&cli.pages)?)
        .channel_order(cli.channel_order.clone().into())
        .min_pixels(cli.min_pixels)
        .max_pixels(cli.max_pixels)
        .max_scale(cli.max_scale)
        .clamp_dimensions(cli.clamp_dimensions);

    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd.clone());
    }
    if let Some(ref lib) = cli.pdfium_lib {
        builder = builder.pdfium_library(lib.clone());
    }

    builder.build().context("Invalid configuration")
}

/// Parse `--pages` string into `PageSelection`.
fn parse_pages(s: &str) -> Result<PageSelection> {
    let s = s.trim().to_lowercase();

    if s == "all" {
        return Ok(PageSelection::All);
    }

    // Range: "3-15"
    if let Some((start, end)) = s.split_once('-') {
        let start: usize = start
            .trim()
            .parse()
            .context("Invalid start page in range")?;
        let end: usize = end.trim().parse().context("Invalid end page in range")?;

        if start < 1 {
            anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", start);
        }
        if start > end {
            anyhow::bail!(
                "Invalid page range '{}-{}': start must be <= end",
                start,
                end
            );
        }

        return Ok(PageSelection::Range(start, end));
    }

    // Set: "3,1,2", order kept
    if s.contains(',') {
        let pages: Vec<usize> = s
            .split(',')
            .map(|p| {
                p.trim()
                    .parse::<usize>()
                    .context(format!("Invalid page number: '{}'", p.trim()))
            })
            .collect::<Result<Vec<_>>>()?;

        if let Some(&p) = pages.iter().find(|&&p| p < 1) {
            anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", p);
        }

        return Ok(PageSelection::Set(pages));
    }

    // Single page: "5"
    let page: usize = s.parse().context("Invalid page number")?;
    if page < 1 {
        anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", page);
    }

    Ok(PageSelection::Single(page))
}

fn report(path: &Path, result: Result<DocumentResult, ReaderError>) -> DocumentReport {
    match result {
        Ok(doc) => DocumentReport {
            path: path.display().to_string(),
            shapes: doc.shapes(),
            names: doc.names,
            error: None,
        },
        Err(e) => DocumentReport {
            path: path.display().to_string(),
            names: Vec::new(),
            shapes: Vec::new(),
            error: Some(ErrorReport {
                kind: e.kind(),
                message: e.to_string(),
            }),
        },
    }
}

fn print_report(r: &DocumentReport) {
    match &r.error {
        None => {
            println!("{}  {} page(s)", bold(&r.path), r.names.len());
            for (name, (h, w)) in r.names.iter().zip(&r.shapes) {
                println!("  {name}  {}", dim(&format!("{w}x{h}x3")));
            }
        }
        Some(e) => println!("{}  {} {}", bold(&r.path), red("✗"), e.message),
    }
}

/// Target file per encoded page. Fails if two pages would share a file,
/// e.g. `a/x.pdf` and `b/x.pdf` both producing `x-p001.png`.
fn output_files<'d>(dir: &Path, docs: &'d [EncodedDocument]) -> Result<Vec<(PathBuf, &'d [u8])>> {
    let mut seen = HashSet::new();
    let mut files = Vec::new();
    for doc in docs {
        for (name, bytes) in doc.names.iter().zip(&doc.images) {
            let path = dir.join(format!("{name}.{}", doc.extension));
            if !seen.insert(path.clone()) {
                anyhow::bail!(
                    "Two inputs would both write {}; rename one of them",
                    path.display()
                );
            }
            files.push((path, bytes.as_slice()));
        }
    }
    Ok(files)
}

/// Serialise the transport form as one JSON line.
fn write_transport<W: Write>(mut out: W, transport: &TransportBatch) -> Result<()> {
    serde_json::to_writer(&mut out, transport).context("Failed to serialise output")?;
    out.write_all(b"\n").context("Failed to write to stdout")?;
    Ok(())
}

/// Write to a temp sibling then rename, so readers never see half a file.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp_path = path.with_extension("tmp");
    std::fs::write(&tmp_path, bytes).map_err(|source| ReaderError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    })?;
    std::fs::rename(&tmp_path, path).map_err(|source| ReaderError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}
