//! Color-formula application for natural-color output.
//!
//! The formula is a whitespace-separated sequence of operations in the
//! rio-color vocabulary, applied left to right on values normalized to
//! [0, 1]:
//!
//! ```text
//! gamma <channels> <g>            e.g. gamma RGB 1.5
//! sigmoidal <channels> <c> <bias> e.g. sigmoidal RGB 6 0.35
//! saturation <factor>             e.g. saturation 1.2
//! ```
//!
//! `<channels>` is any combination of the letters r, g, b (case-insensitive).
use ndarray::{Array3, Axis};

use crate::error::{Error, Result};
use crate::mosaic::CompositeImage;

// Rec. 709 luma weights used for the saturation pivot
const LUMA_R: f64 = 0.2126;
const LUMA_G: f64 = 0.7152;
const LUMA_B: f64 = 0.0722;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ChannelMask {
    r: bool,
    g: bool,
    b: bool,
}

impl ChannelMask {
    fn parse(token: &str) -> Result<Self> {
        let mut mask = ChannelMask {
            r: false,
            g: false,
            b: false,
        };
        for c in token.chars() {
            match c.to_ascii_lowercase() {
                'r' => mask.r = true,
                'g' => mask.g = true,
                'b' => mask.b = true,
                other => {
                    return Err(Error::invalid_request(format!(
                        "color formula: invalid channel specifier {other:?} in {token:?}"
                    )));
                }
            }
        }
        Ok(mask)
    }

    fn applies_to(&self, band: usize) -> bool {
        match band {
            0 => self.r,
            1 => self.g,
            2 => self.b,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ColorOp {
    Gamma { channels: ChannelMask, g: f64 },
    Sigmoidal { channels: ChannelMask, contrast: f64, bias: f64 },
    Saturation { factor: f64 },
}

fn parse_number(tokens: &mut std::str::SplitWhitespace<'_>, op: &str) -> Result<f64> {
    let token = tokens
        .next()
        .ok_or_else(|| Error::invalid_request(format!("color formula: {op} is missing an argument")))?;
    token.parse::<f64>().map_err(|_| {
        Error::invalid_request(format!("color formula: {op} argument {token:?} is not a number"))
    })
}

fn parse(formula: &str) -> Result<Vec<ColorOp>> {
    let mut ops = Vec::new();
    let mut tokens = formula.split_whitespace();

    while let Some(op) = tokens.next() {
        match op.to_ascii_lowercase().as_str() {
            "gamma" => {
                let channels = ChannelMask::parse(tokens.next().ok_or_else(|| {
                    Error::invalid_request("color formula: gamma is missing a channel specifier")
                })?)?;
                let g = parse_number(&mut tokens, "gamma")?;
                if g <= 0.0 {
                    return Err(Error::invalid_request(format!(
                        "color formula: gamma must be positive, got {g}"
                    )));
                }
                ops.push(ColorOp::Gamma { channels, g });
            }
            "sigmoidal" => {
                let channels = ChannelMask::parse(tokens.next().ok_or_else(|| {
                    Error::invalid_request("color formula: sigmoidal is missing a channel specifier")
                })?)?;
                let contrast = parse_number(&mut tokens, "sigmoidal")?;
                let bias = parse_number(&mut tokens, "sigmoidal")?;
                ops.push(ColorOp::Sigmoidal { channels, contrast, bias });
            }
            "saturation" => {
                let factor = parse_number(&mut tokens, "saturation")?;
                if factor < 0.0 {
                    return Err(Error::invalid_request(format!(
                        "color formula: saturation must be non-negative, got {factor}"
                    )));
                }
                ops.push(ColorOp::Saturation { factor });
            }
            other => {
                return Err(Error::invalid_request(format!(
                    "color formula: unknown operation {other:?}"
                )));
            }
        }
    }

    Ok(ops)
}

fn sigmoid(beta: f64, alpha: f64, v: f64) -> f64 {
    1.0 / (1.0 + (beta * (alpha - v)).exp())
}

/// Sigmoidal contrast stretch around `bias`, the standard normalized form:
/// identity at contrast 0, steeper S-curve as contrast grows.
fn sigmoidal(v: f64, contrast: f64, bias: f64) -> f64 {
    if contrast == 0.0 {
        return v;
    }
    let numerator = sigmoid(contrast, bias, v) - sigmoid(contrast, bias, 0.0);
    let denominator = sigmoid(contrast, bias, 1.0) - sigmoid(contrast, bias, 0.0);
    if denominator.abs() < f64::EPSILON {
        v
    } else {
        numerator / denominator
    }
}

/// Apply a color formula to a composite holding [0, 255]-scaled values.
/// Saturation requires three bands; gamma and sigmoidal act per channel.
pub fn apply(image: &CompositeImage, formula: &str) -> Result<CompositeImage> {
    let ops = parse(formula)?;
    if ops.is_empty() {
        return Ok(image.clone());
    }

    let mut data = image.data.mapv(|v| (v / 255.0).clamp(0.0, 1.0));
    for op in &ops {
        match op {
            ColorOp::Gamma { channels, g } => {
                let exponent = 1.0 / *g;
                for (band, mut plane) in data.axis_iter_mut(Axis(0)).enumerate() {
                    if channels.applies_to(band) {
                        plane.mapv_inplace(|v| v.powf(exponent));
                    }
                }
            }
            ColorOp::Sigmoidal { channels, contrast, bias } => {
                for (band, mut plane) in data.axis_iter_mut(Axis(0)).enumerate() {
                    if channels.applies_to(band) {
                        plane.mapv_inplace(|v| sigmoidal(v, *contrast, *bias).clamp(0.0, 1.0));
                    }
                }
            }
            ColorOp::Saturation { factor } => {
                if data.dim().0 != 3 {
                    return Err(Error::invalid_request(format!(
                        "color formula: saturation needs 3 bands, composite has {}",
                        data.dim().0
                    )));
                }
                let (_, height, width) = data.dim();
                for row in 0..height {
                    for col in 0..width {
                        let r = data[[0, row, col]];
                        let g = data[[1, row, col]];
                        let b = data[[2, row, col]];
                        let luma = LUMA_R * r + LUMA_G * g + LUMA_B * b;
                        data[[0, row, col]] = (luma + factor * (r - luma)).clamp(0.0, 1.0);
                        data[[1, row, col]] = (luma + factor * (g - luma)).clamp(0.0, 1.0);
                        data[[2, row, col]] = (luma + factor * (b - luma)).clamp(0.0, 1.0);
                    }
                }
            }
        }
    }

    let rescaled: Array3<f64> = data.mapv(|v| v * 255.0);
    Ok(image.with_bands(rescaled))
}
