//! High-level, ergonomic library API: the pipeline orchestrator that turns a
//! validated request into exactly one output bundle. Prefer this entry point
//! over the low-level processing modules when embedding the crate.
use std::sync::Arc;

use tracing::{debug, info};

use crate::core::bounds::{GeoBounds, geographic_bounds};
use crate::core::params::RenderRequest;
use crate::core::processing::enhance::{Enhancer, SuperResolution};
use crate::core::processing::expression::evaluate_rgb_expression;
use crate::core::processing::postprocess::post_process;
use crate::core::processing::render::render;
use crate::core::worldfile::world_file_content;
use crate::error::Result;
use crate::io::archive::create_zip_geoimage;
use crate::io::codec;
use crate::mosaic::{AssetRecord, MosaicAssembler, asset_usage_name};
use crate::types::{BandMode, RenderedImage};

/// Terminal artifact of one pipeline run. The two shapes are mutually
/// exclusive: either the world file and asset usage travel alongside the
/// image, or everything is folded into an archive.
#[derive(Debug)]
pub enum OutputBundle {
    Direct {
        image: RenderedImage,
        world_file: String,
        bounds: GeoBounds,
        assets_used: Vec<AssetRecord>,
        name: String,
    },
    Archive {
        image: RenderedImage,
        bounds: GeoBounds,
        archive: Vec<u8>,
        name: String,
    },
}

impl OutputBundle {
    pub fn name(&self) -> &str {
        match self {
            OutputBundle::Direct { name, .. } | OutputBundle::Archive { name, .. } => name,
        }
    }

    pub fn image(&self) -> &RenderedImage {
        match self {
            OutputBundle::Direct { image, .. } | OutputBundle::Archive { image, .. } => image,
        }
    }

    pub fn bounds(&self) -> &GeoBounds {
        match self {
            OutputBundle::Direct { bounds, .. } | OutputBundle::Archive { bounds, .. } => bounds,
        }
    }
}

/// Sequences mosaic assembly, bounds reprojection, band algebra,
/// post-processing, rendering, enhancement, and packaging for one request
/// at a time. Construct once and share: the assembler and the
/// super-resolution model are process-wide collaborators.
pub struct MosaicPipeline {
    assembler: Arc<dyn MosaicAssembler>,
    enhancer: Enhancer,
}

impl MosaicPipeline {
    pub fn new(assembler: Arc<dyn MosaicAssembler>, model: Arc<dyn SuperResolution>) -> Self {
        Self {
            assembler,
            enhancer: Enhancer::new(model),
        }
    }

    /// Produce exactly one [`OutputBundle`] or fail with one classified
    /// error. No partial output: every failure is terminal for the request.
    pub fn render_mosaic(&self, request: &RenderRequest) -> Result<OutputBundle> {
        // Request validation happens before any source I/O
        let format = request.format()?;
        let mode = request.band_mode()?;
        let passes = request.enhancement_passes()?;

        info!(%format, "assembling mosaic");
        let (composite, assets_used) = self.assembler.assemble(
            &request.feature_geojson,
            &request.stac_list,
            &mode.selection(),
            request.max_size,
            request.nodata,
        )?;
        debug!(
            bands = composite.band_count(),
            width = composite.width(),
            height = composite.height(),
            sources = assets_used.len(),
            "mosaic assembled"
        );

        // Bounds come from the native extent before any band algebra or
        // rendering discards the CRS metadata
        let bounds = geographic_bounds(composite.extent, composite.epsg)?;

        let composite = match &mode {
            BandMode::RgbExpression { assets, expression } => {
                evaluate_rgb_expression(&composite, assets, expression)?
            }
            _ => composite,
        };

        let composite = post_process(&composite, &mode, request)?;
        let mut bytes = render(&composite, &mode, format, request.colormap.as_deref())?;

        if request.enhance_image {
            bytes = self.enhancer.enhance_iterated(bytes, format, passes)?;
        }

        // World-file coefficients are derived from the final pixel
        // dimensions, which enhancement may have changed
        let decoded = codec::decode(&bytes)?;
        let world_file = world_file_content(
            &bounds,
            decoded.width() as usize,
            decoded.height() as usize,
        );

        let name = asset_usage_name(&assets_used);
        let pixels = if request.image_as_array {
            Some(codec::to_pixel_array(&decoded)?)
        } else {
            None
        };
        let image = RenderedImage {
            bytes,
            format,
            pixels,
        };

        if request.zip_file {
            let archive = create_zip_geoimage(
                &image.bytes,
                &world_file,
                format,
                &request.feature_geojson,
                &assets_used,
            )?;
            info!(name = %name, "rendered mosaic packaged as archive");
            Ok(OutputBundle::Archive {
                image,
                bounds,
                archive,
                name,
            })
        } else {
            info!(name = %name, "rendered mosaic");
            Ok(OutputBundle::Direct {
                image,
                world_file,
                bounds,
                assets_used,
                name,
            })
        }
    }
}
