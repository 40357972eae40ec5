//! Resolution planning: turn a target pixel count into a uniform render scale.
//!
//! A scalar target is clamped into `[min_pixels, max_pixels]`; a width ×
//! height target is used as-is unless [`ResolutionLimits::clamp_dimensions`]
//! is set. The resulting scale is `target / native` capped at `max_scale`, so
//! a page with a near-zero media box cannot request an unbounded render.

use crate::config::{ResolutionLimits, ResolutionSpec};
use crate::engine::MediaBox;

/// Pixel-count target after applying the clamp policy.
///
/// Returns `None` when no resolution was requested (native size).
pub fn effective_target(spec: Option<&ResolutionSpec>, limits: &ResolutionLimits) -> Option<f64> {
    let clamp = |px: f64| px.clamp(limits.min_pixels, limits.max_pixels);

    spec.map(|spec| match *spec {
        ResolutionSpec::Pixels(px) => clamp(px.trunc()),
        ResolutionSpec::Dimensions { width, height } => {
            let px = (width * height).trunc();
            if limits.clamp_dimensions {
                clamp(px)
            } else {
                px
            }
        }
    })
}

/// Pixel count of a media box, with both sides truncated to whole points.
pub fn native_pixel_count(media_box: MediaBox) -> f64 {
    media_box.width.trunc() * media_box.height.trunc()
}

/// Compute the render scale for one page.
pub fn plan_scale(
    spec: Option<&ResolutionSpec>,
    media_box: MediaBox,
    limits: &ResolutionLimits,
) -> f64 {
    // A target that truncates to zero pixels means native size.
    let target = match effective_target(spec, limits) {
        Some(target) if target > 0.0 => target,
        _ => return 1.0,
    };

    let native = native_pixel_count(media_box);
    if native.is_nan() || native <= 0.0 {
        return limits.max_scale;
    }
    (target / native).min(limits.max_scale)
}
