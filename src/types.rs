//! Shared types used across the pipeline.
//! Includes the output `ImageFormat` (with its world-file extension pairing),
//! the resolved `BandMode` selection, and the `RenderedImage` artifact.
use ndarray::Array3;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Supported output encodings. Each format is paired with the sidecar
/// world-file extension consumers expect next to it.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub enum ImageFormat {
    PNG,
    JPEG, // Lossy, preview only
}

impl ImageFormat {
    /// Parse the request's format string. The set is closed; anything else
    /// is rejected before any mosaic assembly happens.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "PNG" => Ok(ImageFormat::PNG),
            "JPEG" => Ok(ImageFormat::JPEG),
            other => Err(Error::invalid_request(format!(
                "image format not accepted: {other}"
            ))),
        }
    }

    /// File extension of the encoded image inside bundles and archives.
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::PNG => "png",
            ImageFormat::JPEG => "jpeg",
        }
    }

    /// Companion world-file extension (PNG -> pgw, JPEG -> jgw).
    pub fn world_extension(self) -> &'static str {
        match self {
            ImageFormat::PNG => "pgw",
            ImageFormat::JPEG => "jgw",
        }
    }
}

impl std::fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImageFormat::PNG => write!(f, "PNG"),
            ImageFormat::JPEG => write!(f, "JPEG"),
        }
    }
}

/// Band-selection mode, resolved exactly once at request validation and
/// threaded through every stage. Natural-color rendering applies to
/// `Assets` and `RgbExpression`; `Expression` takes the colormap path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BandMode {
    Assets(Vec<String>),
    Expression(String),
    RgbExpression {
        assets: Vec<String>,
        expression: String,
    },
}

impl BandMode {
    /// True for the modes rendered without a colormap.
    pub fn is_natural_color(&self) -> bool {
        matches!(self, BandMode::Assets(_) | BandMode::RgbExpression { .. })
    }

    /// The selector handed to the mosaic assembler. RGB expressions read
    /// their named assets as independent bands; the expression itself is
    /// evaluated after assembly.
    pub fn selection(&self) -> BandSelection<'_> {
        match self {
            BandMode::Assets(assets) => BandSelection::Assets(assets),
            BandMode::Expression(expression) => BandSelection::Expression(expression),
            BandMode::RgbExpression { assets, .. } => BandSelection::Assets(assets),
        }
    }
}

/// What the assembler is asked to read from each source: a list of named
/// assets (one output band each) or an expression it resolves itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BandSelection<'a> {
    Assets(&'a [String]),
    Expression(&'a str),
}

/// Encoded output image. `pixels` is only populated when the request asked
/// for the decoded array (`image_as_array`); shape is height x width x channels.
#[derive(Debug, Clone)]
pub struct RenderedImage {
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
    pub pixels: Option<Array3<u8>>,
}

impl RenderedImage {
    pub fn new(bytes: Vec<u8>, format: ImageFormat) -> Self {
        Self {
            bytes,
            format,
            pixels: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_parse_accepts_closed_set_only() {
        assert_eq!(ImageFormat::parse("PNG").unwrap(), ImageFormat::PNG);
        assert_eq!(ImageFormat::parse("JPEG").unwrap(), ImageFormat::JPEG);
        assert!(matches!(
            ImageFormat::parse("WEBP"),
            Err(Error::InvalidRequest { .. })
        ));
        // Case-sensitive, as the accepted set is an exact enumeration
        assert!(ImageFormat::parse("png").is_err());
    }

    #[test]
    fn format_world_file_pairing() {
        assert_eq!(ImageFormat::PNG.extension(), "png");
        assert_eq!(ImageFormat::PNG.world_extension(), "pgw");
        assert_eq!(ImageFormat::JPEG.extension(), "jpeg");
        assert_eq!(ImageFormat::JPEG.world_extension(), "jgw");
    }

    #[test]
    fn natural_color_branch_selection() {
        assert!(BandMode::Assets(vec!["red".into()]).is_natural_color());
        assert!(
            BandMode::RgbExpression {
                assets: vec!["a".into()],
                expression: "a,a,a".into()
            }
            .is_natural_color()
        );
        assert!(!BandMode::Expression("ndvi".into()).is_natural_color());
    }
}
