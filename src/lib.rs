#![doc = r#"
STACMOSAIC — a mosaic compositing and rendering engine for STAC imagery.

This crate turns a set of overlapping geospatial tile sources (STAC items)
into one composited, post-processed, georeferenced raster image: band
selection or band algebra, value rescaling and color-formula adjustment,
colormap or natural-color encoding, optional learned super-resolution
enhancement, world-file derivation, and zip packaging.

Mosaic assembly itself (tile fetching, decoding, merging) and the
super-resolution model are external collaborators behind narrow traits;
this crate owns the orchestration, the numeric post-processing, and the
georeferencing of the output.

Stability
---------
The public library API is experimental in initial releases. Breaking
changes can occur.

Add dependency
--------------
```toml
[dependencies]
stacmosaic = "0.1"
```

Quick start: render a request through the pipeline
--------------------------------------------------
```rust,no_run
use std::sync::Arc;
use stacmosaic::{MosaicPipeline, OutputBundle, RenderRequest};
use stacmosaic::mosaic::MosaicAssembler;
use stacmosaic::enhance::SuperResolution;

fn run(
    assembler: Arc<dyn MosaicAssembler>,
    model: Arc<dyn SuperResolution>,
) -> stacmosaic::Result<()> {
    let pipeline = MosaicPipeline::new(assembler, model);

    let request = RenderRequest {
        assets: Some(vec!["red".into(), "green".into(), "blue".into()]),
        image_format: "PNG".into(),
        max_size: Some(1024),
        zip_file: true,
        ..Default::default()
    };

    match pipeline.render_mosaic(&request)? {
        OutputBundle::Archive { archive, name, .. } => {
            std::fs::write(format!("{name}.zip"), archive)?;
        }
        OutputBundle::Direct { image, world_file, .. } => {
            std::fs::write("mosaic.png", image.bytes)?;
            std::fs::write("mosaic.pgw", world_file)?;
        }
    }
    Ok(())
}
```

Band selection
--------------
A request carries exactly one of three band-selection modes:

- `assets` — named bands read from each source, rendered as natural color.
- `expression` — a single-band index expression resolved by the assembler
  and rendered through a registered colormap (default `viridis`).
- `RGB-expression` — named assets plus a three-part arithmetic expression
  evaluated per pixel by this crate, rendered as natural color.

Error handling
--------------
All public functions return [`Result`]; match on [`Error`] to handle
specific cases, e.g. request validation or colormap lookup failures.

Useful modules
--------------
- [`api`] — the pipeline orchestrator and `OutputBundle`.
- [`mosaic`] — the assembler contract and composite/provenance types.
- [`core`] — bounds, world file, colormaps, and processing stages.
- [`error`] — crate-level `Error` and `Result`.
"#]

// Core modules (public)
pub mod api;
pub mod core;
pub mod error;
pub mod io;
pub mod mosaic;
pub mod types;

// Curated public API surface
// Types
pub use core::params::{RenderRequest, RgbExpression};
pub use error::{Error, Result};
pub use types::{BandMode, BandSelection, ImageFormat, RenderedImage};

// Georeferencing
pub use core::bounds::{FLOAT_PRECISION, GEOGRAPHIC_EPSG, GeoBounds};
pub use core::worldfile::world_file_content;

// Collaborator seams
pub use core::processing::enhance::{self, Enhancer, PATCH_SIZE, SuperResolution};
pub use mosaic::{AssetRecord, CompositeImage, MosaicAssembler};

// Colormap registry
pub use core::colormap::{Colormap, get as get_colormap, list as list_colormaps};

// High-level API re-exports
pub use api::{MosaicPipeline, OutputBundle};
