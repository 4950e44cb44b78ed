//! Post-processing: value-range rescaling into the encodable [0, 255] range,
//! plus optional color-formula adjustment for natural-color output.
use tracing::debug;

use crate::core::params::RenderRequest;
use crate::core::processing::color_formula;
use crate::error::{Error, Result};
use crate::mosaic::CompositeImage;
use crate::types::BandMode;

// Rescale defaults per branch. Natural-color data is assumed 8-bit unless
// the request says otherwise; expression output is index-like in [-1, 1].
const NATURAL_MIN: f64 = 0.0;
const NATURAL_MAX: f64 = 255.0;
const EXPRESSION_MIN: f64 = -1.0;
const EXPRESSION_MAX: f64 = 1.0;

/// Linear rescale of all bands from `[lo, hi]` into [0, 255], clipped at the
/// range boundaries.
fn rescale_bands(image: &CompositeImage, lo: f64, hi: f64) -> Result<CompositeImage> {
    if !(hi > lo) {
        return Err(Error::invalid_request(format!(
            "rescale range is degenerate: min_value={lo}, max_value={hi}"
        )));
    }
    let scale = 255.0 / (hi - lo);
    let data = image.data.mapv(|v| ((v - lo) * scale).clamp(0.0, 255.0));
    Ok(image.with_bands(data))
}

/// Run the post-processing branch selected by the band mode.
///
/// Natural-color (assets / RGB expression): requested `min_value`/`max_value`
/// rescale, then the optional color formula. Single-band expression output:
/// rescale with [-1, 1] defaults, no color formula.
pub fn post_process(
    image: &CompositeImage,
    mode: &BandMode,
    request: &RenderRequest,
) -> Result<CompositeImage> {
    if mode.is_natural_color() {
        let lo = request.min_value.unwrap_or(NATURAL_MIN);
        let hi = request.max_value.unwrap_or(NATURAL_MAX);
        debug!(lo, hi, "rescaling natural-color composite");
        let rescaled = rescale_bands(image, lo, hi)?;
        match request.color_formula.as_deref() {
            Some(formula) => color_formula::apply(&rescaled, formula),
            None => Ok(rescaled),
        }
    } else {
        let lo = request.min_value.unwrap_or(EXPRESSION_MIN);
        let hi = request.max_value.unwrap_or(EXPRESSION_MAX);
        debug!(lo, hi, "rescaling expression composite");
        rescale_bands(image, lo, hi)
    }
}
