//! Image codec adapter: encode/decode between pixel buffers and the
//! requested output format. Format internals live in the `image` crate;
//! this module only pins the crate's conventions (JPEG has no alpha
//! channel, arrays are height x width x channels).
use std::io::Cursor;

use image::DynamicImage;
use ndarray::Array3;

use crate::error::{Error, Result};
use crate::types::ImageFormat;

/// Decode an encoded image from memory.
pub fn decode(bytes: &[u8]) -> Result<DynamicImage> {
    Ok(image::load_from_memory(bytes)?)
}

/// Encode to the requested format. JPEG cannot carry an alpha channel, so
/// images are flattened to RGB before JPEG encoding.
pub fn encode(img: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    match format {
        ImageFormat::PNG => img.write_to(&mut buffer, image::ImageFormat::Png)?,
        ImageFormat::JPEG => {
            let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
            rgb.write_to(&mut buffer, image::ImageFormat::Jpeg)?;
        }
    }
    Ok(buffer.into_inner())
}

/// View a decoded image as a height x width x channels u8 array, preserving
/// the image's native channel count.
pub fn to_pixel_array(img: &DynamicImage) -> Result<Array3<u8>> {
    let (width, height) = (img.width() as usize, img.height() as usize);
    let channels = img.color().channel_count() as usize;
    let bytes = match img.as_bytes().len() {
        n if n == width * height * channels => img.as_bytes().to_vec(),
        // 16-bit source; narrow through the RGBA8 view
        _ => return to_pixel_array(&DynamicImage::ImageRgba8(img.to_rgba8())),
    };
    Array3::from_shape_vec((height, width, channels), bytes)
        .map_err(|e| Error::Processing(format!("pixel buffer shape mismatch: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    fn checker(width: u32, height: u32) -> DynamicImage {
        let img = RgbaImage::from_fn(width, height, |x, y| {
            if (x + y) % 2 == 0 {
                image::Rgba([255, 0, 0, 255])
            } else {
                image::Rgba([0, 0, 255, 128])
            }
        });
        DynamicImage::ImageRgba8(img)
    }

    #[test]
    fn png_round_trip_preserves_dimensions_and_alpha() {
        let img = checker(4, 3);
        let bytes = encode(&img, ImageFormat::PNG).unwrap();
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded.width(), 4);
        assert_eq!(decoded.height(), 3);
        assert!(decoded.color().has_alpha());
    }

    #[test]
    fn jpeg_encoding_drops_alpha() {
        let img = checker(4, 4);
        let bytes = encode(&img, ImageFormat::JPEG).unwrap();
        let decoded = decode(&bytes).unwrap();
        assert!(!decoded.color().has_alpha());
        assert_eq!(decoded.width(), 4);
    }

    #[test]
    fn pixel_array_has_native_channel_count() {
        let img = checker(5, 2);
        let arr = to_pixel_array(&img).unwrap();
        assert_eq!(arr.dim(), (2, 5, 4));
        assert_eq!(arr[[0, 0, 0]], 255);
        assert_eq!(arr[[0, 1, 3]], 128);
    }
}
