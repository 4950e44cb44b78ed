//! Iterative super-resolution enhancement of a rendered image.
//!
//! The model itself is an external collaborator behind [`SuperResolution`]:
//! a pretrained, immutable upscaler shared process-wide. Each pass decodes
//! the rendered bytes, splits off the alpha channel, upscales the RGB data
//! patch-wise, resizes alpha with nearest-neighbor interpolation (alpha is
//! categorical and must not be smoothed), restacks, and re-encodes.
use std::sync::{Arc, Mutex};

use fast_image_resize::{PixelType, ResizeAlg, ResizeOptions, Resizer, images::Image};
use image::{DynamicImage, RgbaImage};
use ndarray::{Array3, ArrayView3};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::io::codec;
use crate::types::ImageFormat;

/// Fixed patch side length handed to the model, bounding peak memory during
/// upscaling regardless of input size.
pub const PATCH_SIZE: usize = 50;

/// Narrow contract of the external super-resolution model: upsample the
/// spatial dimensions of an RGB pixel array (height x width x 3), keeping
/// the channel count. Weights are immutable; implementations never see
/// per-request state.
pub trait SuperResolution: Send + Sync {
    fn upscale(&self, rgb: ArrayView3<'_, u8>, patch_size: usize) -> Result<Array3<u8>>;
}

/// Enhancement stage wrapping the shared model.
///
/// The compute backend behind the model is not assumed reentrant, so
/// invocations are serialized behind one critical section. The model itself
/// is injected once at construction and shared across requests.
pub struct Enhancer {
    model: Arc<dyn SuperResolution>,
    backend_lock: Mutex<()>,
}

impl Enhancer {
    pub fn new(model: Arc<dyn SuperResolution>) -> Self {
        Self {
            model,
            backend_lock: Mutex::new(()),
        }
    }

    /// Run one enhancement pass over encoded image bytes, returning bytes in
    /// the same format. The input is read as RGBA; opaque alpha is
    /// synthesized for alpha-less formats.
    pub fn enhance(&self, bytes: &[u8], format: ImageFormat) -> Result<Vec<u8>> {
        let decoded = codec::decode(bytes)?.to_rgba8();
        let (width, height) = (decoded.width() as usize, decoded.height() as usize);

        let mut rgb = Array3::<u8>::zeros((height, width, 3));
        let mut alpha = vec![0u8; height * width];
        for (x, y, px) in decoded.enumerate_pixels() {
            let (row, col) = (y as usize, x as usize);
            rgb[[row, col, 0]] = px[0];
            rgb[[row, col, 1]] = px[1];
            rgb[[row, col, 2]] = px[2];
            alpha[row * width + col] = px[3];
        }

        let upscaled = {
            let _guard = self
                .backend_lock
                .lock()
                .map_err(|_| Error::Processing("super-resolution backend poisoned".to_string()))?;
            self.model.upscale(rgb.view(), PATCH_SIZE)?
        };
        let (new_height, new_width, channels) = upscaled.dim();
        if channels != 3 {
            return Err(Error::Processing(format!(
                "super-resolution model returned {channels} channels, expected 3"
            )));
        }

        let alpha_resized = resize_alpha_nearest(&alpha, width, height, new_width, new_height)?;

        let mut out = RgbaImage::new(new_width as u32, new_height as u32);
        for (x, y, px) in out.enumerate_pixels_mut() {
            let (row, col) = (y as usize, x as usize);
            *px = image::Rgba([
                upscaled[[row, col, 0]],
                upscaled[[row, col, 1]],
                upscaled[[row, col, 2]],
                alpha_resized[row * new_width + col],
            ]);
        }

        debug!(width, height, new_width, new_height, "enhanced image");
        codec::encode(&DynamicImage::ImageRgba8(out), format)
    }

    /// Run `passes` sequential enhancement passes, each consuming the
    /// previous pass's output. Upsampling compounds multiplicatively;
    /// bounding `passes` is the caller's policy, not this stage's.
    pub fn enhance_iterated(
        &self,
        bytes: Vec<u8>,
        format: ImageFormat,
        passes: usize,
    ) -> Result<Vec<u8>> {
        let mut current = bytes;
        for pass in 0..passes {
            info!(pass = pass + 1, passes, "running enhancement pass");
            current = self.enhance(&current, format)?;
        }
        Ok(current)
    }
}

/// Nearest-neighbor resize of the alpha plane to the upscaled dimensions.
fn resize_alpha_nearest(
    alpha: &[u8],
    src_width: usize,
    src_height: usize,
    dst_width: usize,
    dst_height: usize,
) -> Result<Vec<u8>> {
    let src = Image::from_vec_u8(
        src_width as u32,
        src_height as u32,
        alpha.to_vec(),
        PixelType::U8,
    )
    .map_err(Error::external)?;
    let mut dst = Image::new(dst_width as u32, dst_height as u32, PixelType::U8);

    let options = ResizeOptions::new().resize_alg(ResizeAlg::Nearest);
    let mut resizer = Resizer::new();
    resizer
        .resize(&src, &mut dst, &options)
        .map_err(Error::external)?;

    Ok(dst.into_vec())
}
