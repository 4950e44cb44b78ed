//! Core pipeline building blocks: request parameters, bounds reprojection,
//! colormaps, world-file derivation, and the processing stages. These are
//! internal primitives consumed by the high-level `api` module.
pub mod bounds;
pub mod colormap;
pub mod params;
pub mod processing;
pub mod worldfile;
