//! Configuration types for PDF rasterisation.
//!
//! All reader behaviour is controlled through [`ReaderConfig`], built via its
//! [`ReaderConfigBuilder`]. The resolution safety clamps live in
//! [`ResolutionLimits`] so they can be tuned per call instead of being baked
//! into the planner.

use crate::error::ReaderError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Lower bound for a scalar pixel-count target.
pub const DEFAULT_RES_MIN: f64 = 800_000.0;

/// Upper bound for a scalar pixel-count target.
pub const DEFAULT_RES_MAX: f64 = 3_000_000.0;

/// Ceiling on the render scale, for pages reporting a degenerate media box.
pub const DEFAULT_MAX_SCALE: f64 = 20.0;

/// Configuration for reading PDF documents into page images.
///
/// Built via [`ReaderConfig::builder()`] or using [`ReaderConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_pdf2img::{ChannelOrder, ReaderConfig, ResolutionSpec};
///
/// let config = ReaderConfig::builder()
///     .resolution(ResolutionSpec::pixels(1_500_000.0).unwrap())
///     .channel_order(ChannelOrder::Bgr)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone, Default)]
pub struct ReaderConfig {
    /// Target output resolution. `None` renders at the native page size.
    pub resolution: Option<ResolutionSpec>,

    /// Clamp policy applied by the resolution planner.
    pub limits: ResolutionLimits,

    /// Channel order of decoded page images. Default: RGB.
    pub channel_order: ChannelOrder,

    /// Page selection applied to every document. Default: all pages.
    pub pages: PageSelection,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Explicit path to a pdfium shared library.
    ///
    /// When `None` the engine looks at `PDFIUM_LIB_PATH`, the working
    /// directory, then the system library path.
    pub pdfium_library: Option<PathBuf>,

    /// Optional progress callback for per-document and per-page events.
    pub progress_callback: Option<ProgressCallback>,
}

impl fmt::Debug for ReaderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReaderConfig")
            .field("resolution", &self.resolution)
            .field("limits", &self.limits)
            .field("channel_order", &self.channel_order)
            .field("pages", &self.pages)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("pdfium_library", &self.pdfium_library)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ReadProgressCallback>"),
            )
            .finish()
    }
}

impl ReaderConfig {
    /// Create a new builder for `ReaderConfig`.
    pub fn builder() -> ReaderConfigBuilder {
        ReaderConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ReaderConfig`].
#[derive(Debug)]
pub struct ReaderConfigBuilder {
    config: ReaderConfig,
}

impl ReaderConfigBuilder {
    pub fn resolution(mut self, spec: ResolutionSpec) -> Self {
        self.config.resolution = Some(spec);
        self
    }

    /// Set or clear the resolution target.
    pub fn maybe_resolution(mut self, spec: Option<ResolutionSpec>) -> Self {
        self.config.resolution = spec;
        self
    }

    pub fn limits(mut self, limits: ResolutionLimits) -> Self {
        self.config.limits = limits;
        self
    }

    pub fn min_pixels(mut self, px: f64) -> Self {
        self.config.limits.min_pixels = px;
        self
    }

    pub fn max_pixels(mut self, px: f64) -> Self {
        self.config.limits.max_pixels = px;
        self
    }

    pub fn max_scale(mut self, scale: f64) -> Self {
        self.config.limits.max_scale = scale;
        self
    }

    pub fn clamp_dimensions(mut self, v: bool) -> Self {
        self.config.limits.clamp_dimensions = v;
        self
    }

    pub fn channel_order(mut self, order: ChannelOrder) -> Self {
        self.config.channel_order = order;
        self
    }

    pub fn pages(mut self, selection: PageSelection) -> Self {
        self.config.pages = selection;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn pdfium_library(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_library = Some(path.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ReaderConfig, ReaderError> {
        self.config.limits.validate()?;
        if let Some(spec) = &self.config.resolution {
            spec.validate()?;
        }
        if let PageSelection::Range(start, end) = self.config.pages {
            if start > end {
                return Err(ReaderError::InvalidConfig(format!(
                    "Invalid page range {start}-{end}: start must be <= end"
                )));
            }
        }
        Ok(self.config)
    }
}

// ── Resolution ───────────────────────────────────────────────────────────

/// Requested output resolution for rendered pages.
///
/// Absence (`Option::None` at the config level) means native page size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ResolutionSpec {
    /// Target total pixel count.
    Pixels(f64),
    /// Target width and height; their product is the pixel-count target.
    Dimensions { width: f64, height: f64 },
}

impl ResolutionSpec {
    /// Scalar pixel-count target. Fails unless `count` is finite and positive.
    pub fn pixels(count: f64) -> Result<Self, ReaderError> {
        let spec = ResolutionSpec::Pixels(count);
        spec.validate()?;
        Ok(spec)
    }

    /// Width × height target. Fails unless both are finite and positive.
    pub fn dimensions(width: f64, height: f64) -> Result<Self, ReaderError> {
        let spec = ResolutionSpec::Dimensions { width, height };
        spec.validate()?;
        Ok(spec)
    }

    fn validate(&self) -> Result<(), ReaderError> {
        let check = |name: &str, v: f64| {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(ReaderError::InvalidResolution(format!(
                    "{name} must be a positive number, got {v}"
                )))
            }
        };
        match *self {
            ResolutionSpec::Pixels(p) => check("pixel count", p),
            ResolutionSpec::Dimensions { width, height } => {
                check("width", width)?;
                check("height", height)
            }
        }
    }
}

impl FromStr for ResolutionSpec {
    type Err = ReaderError;

    /// Parse `"1500000"` as a pixel count or `"1200x1600"` as dimensions.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        let parse = |part: &str| {
            part.trim().parse::<f64>().map_err(|_| {
                ReaderError::InvalidResolution(format!("'{}' is not a number", part.trim()))
            })
        };

        match s.split_once(['x', '*']) {
            Some((w, h)) => ResolutionSpec::dimensions(parse(w)?, parse(h)?),
            None => ResolutionSpec::pixels(parse(&s)?),
        }
    }
}

impl fmt::Display for ResolutionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionSpec::Pixels(p) => write!(f, "{p}"),
            ResolutionSpec::Dimensions { width, height } => write!(f, "{width}x{height}"),
        }
    }
}

/// Safety clamps used by the resolution planner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolutionLimits {
    /// Floor for a scalar pixel-count target. Default: 800 000.
    pub min_pixels: f64,
    /// Ceiling for a scalar pixel-count target. Default: 3 000 000.
    pub max_pixels: f64,
    /// Maximum render scale on either axis. Default: 20.0.
    pub max_scale: f64,
    /// Also clamp width × height targets. Default: false (only scalars are clamped).
    pub clamp_dimensions: bool,
}

impl Default for ResolutionLimits {
    fn default() -> Self {
        Self {
            min_pixels: DEFAULT_RES_MIN,
            max_pixels: DEFAULT_RES_MAX,
            max_scale: DEFAULT_MAX_SCALE,
            clamp_dimensions: false,
        }
    }
}

impl ResolutionLimits {
    pub fn validate(&self) -> Result<(), ReaderError> {
        if !(self.min_pixels.is_finite() && self.min_pixels > 0.0) {
            return Err(ReaderError::InvalidConfig(format!(
                "min_pixels must be positive, got {}",
                self.min_pixels
            )));
        }
        if !(self.max_pixels.is_finite() && self.max_pixels >= self.min_pixels) {
            return Err(ReaderError::InvalidConfig(format!(
                "max_pixels ({}) must be >= min_pixels ({})",
                self.max_pixels, self.min_pixels
            )));
        }
        if !(self.max_scale.is_finite() && self.max_scale > 0.0) {
            return Err(ReaderError::InvalidConfig(format!(
                "max_scale must be positive, got {}",
                self.max_scale
            )));
        }
        Ok(())
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Channel order of decoded page images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ChannelOrder {
    /// Red, green, blue (default).
    #[default]
    Rgb,
    /// Blue, green, red.
    Bgr,
}

impl FromStr for ChannelOrder {
    type Err = ReaderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "RGB" => Ok(ChannelOrder::Rgb),
            "BGR" => Ok(ChannelOrder::Bgr),
            other => Err(ReaderError::InvalidConfig(format!(
                "Invalid channel order '{other}': must be RGB or BGR"
            ))),
        }
    }
}

/// Specifies which pages of each PDF to rasterise.
///
/// Page numbers are 1-indexed. Unlike a plain page filter, the selection
/// keeps the caller's order and duplicates: `Set(vec![3, 1])` yields page 3
/// first. Any page outside the document is an error, not a silent skip.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageSelection {
    /// Every page in document order (default).
    #[default]
    All,
    /// A single page.
    Single(usize),
    /// A contiguous range, inclusive on both ends.
    Range(usize, usize),
    /// Specific pages in the given order.
    Set(Vec<usize>),
}

impl PageSelection {
    /// Expand the selection into 1-based page numbers for a document with
    /// `total_pages` pages, validating every entry.
    pub fn resolve(&self, total_pages: usize) -> Result<Vec<usize>, ReaderError> {
        match self {
            PageSelection::All => Ok((1..=total_pages).collect()),
            PageSelection::Single(p) => {
                check_page(*p, total_pages)?;
                Ok(vec![*p])
            }
            PageSelection::Range(start, end) => {
                // Both ends are checked before expanding, and an empty range
                // still has to name real pages.
                check_page(*start, total_pages)?;
                check_page(*end, total_pages)?;
                Ok((*start..=*end).collect())
            }
            PageSelection::Set(pages) => {
                for &p in pages {
                    check_page(p, total_pages)?;
                }
                Ok(pages.clone())
            }
        }
    }
}

impl From<usize> for PageSelection {
    fn from(page: usize) -> Self {
        PageSelection::Single(page)
    }
}

impl From<Vec<usize>> for PageSelection {
    fn from(pages: Vec<usize>) -> Self {
        PageSelection::Set(pages)
    }
}

fn check_page(page: usize, total: usize) -> Result<(), ReaderError> {
    if page == 0 || page > total {
        return Err(ReaderError::PageIndexError { page, total });
    }
    Ok(())
}
