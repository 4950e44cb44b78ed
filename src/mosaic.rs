//! Mosaic assembly seam: the composite raster handed to the pipeline and the
//! `MosaicAssembler` contract implemented by tile-source backends. Assembly
//! over overlapping STAC items (fetching, decoding, merging) lives behind this
//! trait; the pipeline only consumes its output.
use ndarray::{Array2, Array3};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::types::BandSelection;

/// In-memory composite produced by mosaic assembly: band-major pixel data,
/// a validity mask, and the native georeferencing of the merged coverage.
/// Pipeline stages consume and replace it; it is never mutated in place.
#[derive(Debug, Clone)]
pub struct CompositeImage {
    /// Pixel data, bands x height x width.
    pub data: Array3<f64>,
    /// Validity mask, height x width. 255 = valid, 0 = nodata.
    pub mask: Array2<u8>,
    /// EPSG code of the native coordinate reference.
    pub epsg: u32,
    /// Native spatial extent as (left, bottom, right, top).
    pub extent: [f64; 4],
}

impl CompositeImage {
    pub fn band_count(&self) -> usize {
        self.data.dim().0
    }

    pub fn height(&self) -> usize {
        self.data.dim().1
    }

    pub fn width(&self) -> usize {
        self.data.dim().2
    }

    /// New composite with replaced band data, reusing the mask and the
    /// native georeferencing of `self`.
    pub fn with_bands(&self, data: Array3<f64>) -> Self {
        debug_assert_eq!(data.dim().1, self.mask.dim().0);
        debug_assert_eq!(data.dim().2, self.mask.dim().1);
        Self {
            data,
            mask: self.mask.clone(),
            epsg: self.epsg,
            extent: self.extent,
        }
    }
}

/// Provenance record of one source item that contributed pixels to the
/// composite. Serializes back to the item's GeoJSON feature document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetRecord {
    pub id: String,
    #[serde(flatten)]
    pub feature: serde_json::Map<String, Value>,
}

impl AssetRecord {
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self {
            id: id.into(),
            feature: serde_json::Map::new(),
        }
    }
}

/// Joined, alphabetically sorted identifier list used for output naming.
/// Deterministic regardless of the order the assembler returned the records.
pub fn asset_usage_name(assets_used: &[AssetRecord]) -> String {
    let mut ids: Vec<&str> = assets_used.iter().map(|a| a.id.as_str()).collect();
    ids.sort_unstable();
    ids.join(", ")
}

/// Contract for mosaic assembly over candidate STAC items.
///
/// Implementations merge the overlapping sources into one coverage clipped to
/// `region`, reading `bands` from each item as independent output bands.
/// Source fetches, retries, and timeouts are the implementation's own policy;
/// the pipeline never retries. Failures surface as
/// [`Error::SourceUnavailable`](crate::error::Error::SourceUnavailable).
pub trait MosaicAssembler: Send + Sync {
    fn assemble(
        &self,
        region: &Value,
        items: &[Value],
        bands: &BandSelection<'_>,
        max_size: Option<usize>,
        nodata: Option<f64>,
    ) -> Result<(CompositeImage, Vec<AssetRecord>)>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array2, Array3};

    #[test]
    fn name_is_sorted_and_comma_space_joined() {
        let used = vec![
            AssetRecord::new("S2B_33UUU_20230710"),
            AssetRecord::new("S2A_33UUU_20230705"),
            AssetRecord::new("S2A_33UVU_20230705"),
        ];
        assert_eq!(
            asset_usage_name(&used),
            "S2A_33UUU_20230705, S2A_33UVU_20230705, S2B_33UUU_20230710"
        );
    }

    #[test]
    fn with_bands_keeps_mask_and_georeferencing() {
        let composite = CompositeImage {
            data: Array3::zeros((2, 3, 4)),
            mask: Array2::from_elem((3, 4), 255),
            epsg: 32633,
            extent: [500000.0, 5200000.0, 501000.0, 5201000.0],
        };
        let replaced = composite.with_bands(Array3::ones((3, 3, 4)));
        assert_eq!(replaced.band_count(), 3);
        assert_eq!(replaced.epsg, 32633);
        assert_eq!(replaced.extent, composite.extent);
        assert_eq!(replaced.mask, composite.mask);
    }
}
