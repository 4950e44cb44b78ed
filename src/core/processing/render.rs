//! Rendering: encode a post-processed composite into the requested output
//! format. Natural-color composites encode their bands directly; single-band
//! composites go through a registered colormap.
use image::{DynamicImage, GrayAlphaImage, RgbaImage};
use tracing::debug;

use crate::core::colormap;
use crate::error::{Error, Result};
use crate::io::codec;
use crate::mosaic::CompositeImage;
use crate::types::{BandMode, ImageFormat};

/// Default palette for single-band output.
pub const DEFAULT_COLORMAP: &str = "viridis";

fn quantize(v: f64) -> u8 {
    v.clamp(0.0, 255.0).round() as u8
}

/// Encode the composite. The validity mask becomes the alpha channel; JPEG
/// output flattens it away at the codec boundary.
pub fn render(
    image: &CompositeImage,
    mode: &BandMode,
    format: ImageFormat,
    colormap_name: Option<&str>,
) -> Result<Vec<u8>> {
    let rendered = if mode.is_natural_color() {
        render_natural(image)?
    } else {
        render_colormapped(image, colormap_name.unwrap_or(DEFAULT_COLORMAP))?
    };
    debug!(
        width = rendered.width(),
        height = rendered.height(),
        %format,
        "encoding rendered composite"
    );
    codec::encode(&rendered, format)
}

fn render_natural(image: &CompositeImage) -> Result<DynamicImage> {
    let (height, width) = (image.height(), image.width());
    match image.band_count() {
        1 => {
            let band = image.data.index_axis(ndarray::Axis(0), 0);
            let img = GrayAlphaImage::from_fn(width as u32, height as u32, |x, y| {
                let (row, col) = (y as usize, x as usize);
                image::LumaA([quantize(band[[row, col]]), image.mask[[row, col]]])
            });
            Ok(DynamicImage::ImageLumaA8(img))
        }
        3 => {
            let img = RgbaImage::from_fn(width as u32, height as u32, |x, y| {
                let (row, col) = (y as usize, x as usize);
                image::Rgba([
                    quantize(image.data[[0, row, col]]),
                    quantize(image.data[[1, row, col]]),
                    quantize(image.data[[2, row, col]]),
                    image.mask[[row, col]],
                ])
            });
            Ok(DynamicImage::ImageRgba8(img))
        }
        n => Err(Error::Processing(format!(
            "cannot encode a {n}-band composite as natural color"
        ))),
    }
}

fn render_colormapped(image: &CompositeImage, colormap_name: &str) -> Result<DynamicImage> {
    let palette = colormap::get(colormap_name)?;
    if image.band_count() != 1 {
        return Err(Error::Processing(format!(
            "colormap rendering expects a single band, got {}",
            image.band_count()
        )));
    }

    let (height, width) = (image.height(), image.width());
    let band = image.data.index_axis(ndarray::Axis(0), 0);
    let img = RgbaImage::from_fn(width as u32, height as u32, |x, y| {
        let (row, col) = (y as usize, x as usize);
        let [r, g, b, a] = palette.lookup(quantize(band[[row, col]]));
        image::Rgba([r, g, b, a.min(image.mask[[row, col]])])
    });
    Ok(DynamicImage::ImageRgba8(img))
}
