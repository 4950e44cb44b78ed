//! Request parameters suitable for config files and API payloads, plus the
//! validation that resolves them into a closed band-selection mode.
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::types::{BandMode, ImageFormat};

/// The RGB-expression pair: named assets read as independent bands, and a
/// comma-separated expression producing exactly three output bands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RgbExpression {
    pub assets: Vec<String>,
    pub expression: String,
}

/// Immutable per-request configuration for `render_mosaic`.
///
/// Exactly one of `assets`, `expression`, `rgb_expression` must be present;
/// validation resolves the choice once into [`BandMode`] so later stages
/// never re-inspect the request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderRequest {
    /// Region of interest geometry (GeoJSON).
    pub feature_geojson: Value,
    /// Ordered candidate STAC item documents handed to the assembler.
    pub stac_list: Vec<Value>,

    pub assets: Option<Vec<String>>,
    pub expression: Option<String>,
    #[serde(rename = "RGB-expression")]
    pub rgb_expression: Option<RgbExpression>,

    /// Long-side cap applied during mosaic assembly.
    pub max_size: Option<usize>,
    pub nodata: Option<f64>,

    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub color_formula: Option<String>,
    pub colormap: Option<String>,

    /// Output encoding; validated against the closed [`ImageFormat`] set.
    pub image_format: String,

    pub enhance_image: bool,
    /// Sequential enhancement passes; upscaling compounds per pass.
    pub enhance_passes: usize,

    pub zip_file: bool,
    pub image_as_array: bool,
}

impl Default for RenderRequest {
    fn default() -> Self {
        Self {
            feature_geojson: Value::Null,
            stac_list: Vec::new(),
            assets: None,
            expression: None,
            rgb_expression: None,
            max_size: None,
            nodata: None,
            min_value: None,
            max_value: None,
            color_formula: None,
            colormap: None,
            image_format: "PNG".to_string(),
            enhance_image: false,
            enhance_passes: 1,
            zip_file: false,
            image_as_array: false,
        }
    }
}

impl RenderRequest {
    /// Validate the output format. Runs before mosaic assembly so an
    /// unsupported format never costs any source I/O.
    pub fn format(&self) -> Result<ImageFormat> {
        ImageFormat::parse(&self.image_format)
    }

    /// Resolve the band-selection mode. Exactly one of the three fields may
    /// be present and non-empty.
    pub fn band_mode(&self) -> Result<BandMode> {
        let mut modes = Vec::new();
        if let Some(assets) = &self.assets {
            if !assets.is_empty() {
                modes.push(BandMode::Assets(assets.clone()));
            }
        }
        if let Some(expression) = &self.expression {
            if !expression.trim().is_empty() {
                modes.push(BandMode::Expression(expression.clone()));
            }
        }
        if let Some(rgb) = &self.rgb_expression {
            if !rgb.assets.is_empty() {
                modes.push(BandMode::RgbExpression {
                    assets: rgb.assets.clone(),
                    expression: rgb.expression.clone(),
                });
            }
        }

        match modes.len() {
            1 => Ok(modes.remove(0)),
            0 => Err(Error::invalid_request(
                "one of assets, expression, RGB-expression is required",
            )),
            n => Err(Error::invalid_request(format!(
                "band selection is ambiguous: {n} of assets/expression/RGB-expression present"
            ))),
        }
    }

    /// Enhancement pass count, validated. Bounding the count is the
    /// orchestrator's policy since upscaling compounds multiplicatively.
    pub fn enhancement_passes(&self) -> Result<usize> {
        if self.enhance_passes == 0 {
            return Err(Error::invalid_request(
                "enhance_passes must be a positive integer",
            ));
        }
        Ok(self.enhance_passes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_request_has_no_band_mode() {
        let request = RenderRequest::default();
        assert!(matches!(
            request.band_mode(),
            Err(Error::InvalidRequest { .. })
        ));
    }

    #[test]
    fn exactly_one_mode_resolves() {
        let request = RenderRequest {
            assets: Some(vec!["red".into(), "green".into(), "blue".into()]),
            ..Default::default()
        };
        assert_eq!(
            request.band_mode().unwrap(),
            BandMode::Assets(vec!["red".into(), "green".into(), "blue".into()])
        );
    }

    #[test]
    fn two_modes_are_contradictory() {
        let request = RenderRequest {
            assets: Some(vec!["red".into()]),
            expression: Some("(nir-red)/(nir+red)".into()),
            ..Default::default()
        };
        assert!(matches!(
            request.band_mode(),
            Err(Error::InvalidRequest { .. })
        ));
    }

    #[test]
    fn empty_asset_list_does_not_count_as_a_mode() {
        let request = RenderRequest {
            assets: Some(vec![]),
            expression: Some("(nir-red)/(nir+red)".into()),
            ..Default::default()
        };
        assert_eq!(
            request.band_mode().unwrap(),
            BandMode::Expression("(nir-red)/(nir+red)".into())
        );
    }

    #[test]
    fn unsupported_format_is_invalid() {
        let request = RenderRequest {
            image_format: "TIFF".into(),
            ..Default::default()
        };
        assert!(matches!(
            request.format(),
            Err(Error::InvalidRequest { .. })
        ));
    }

    #[test]
    fn zero_enhance_passes_is_invalid() {
        let request = RenderRequest {
            enhance_passes: 0,
            ..Default::default()
        };
        assert!(matches!(
            request.enhancement_passes(),
            Err(Error::InvalidRequest { .. })
        ));
    }

    #[test]
    fn deserializes_the_external_key_spelling() {
        let request: RenderRequest = serde_json::from_str(
            r#"{
                "RGB-expression": {
                    "assets": ["nir", "red", "green"],
                    "expression": "nir, red, green"
                },
                "image_format": "JPEG",
                "enhance_image": true,
                "enhance_passes": 2
            }"#,
        )
        .unwrap();
        assert!(matches!(
            request.band_mode().unwrap(),
            BandMode::RgbExpression { .. }
        ));
        assert_eq!(request.format().unwrap(), ImageFormat::JPEG);
        assert_eq!(request.enhancement_passes().unwrap(), 2);
    }
}
