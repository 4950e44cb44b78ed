//! Geographic bounds of a composite: native extent reprojected into the
//! canonical geographic reference (EPSG:4326) with fixed-precision rounding
//! for reproducibility across runs.
//!
//! The nested pair ordering of [`GeoBounds`] puts latitude before longitude,
//! `[[south, west], [north, east]]`. Callers and the world-file derivation
//! rely on this exact ordering.
use proj4rs::proj::Proj;
use proj4rs::transform::transform;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// Canonical geographic reference every output footprint is expressed in.
pub const GEOGRAPHIC_EPSG: u32 = 4326;

/// Decimal digits kept on every coordinate, before and after reprojection.
pub const FLOAT_PRECISION: i32 = 5;

/// Round a coordinate to [`FLOAT_PRECISION`] decimal digits.
pub fn round_coord(v: f64) -> f64 {
    let scale = 10f64.powi(FLOAT_PRECISION);
    (v * scale).round() / scale
}

/// Geographic corner pair, `[[south, west], [north, east]]`.
/// Latitude precedes longitude inside each pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds(pub [[f64; 2]; 2]);

impl GeoBounds {
    pub fn south(&self) -> f64 {
        self.0[0][0]
    }

    pub fn west(&self) -> f64 {
        self.0[0][1]
    }

    pub fn north(&self) -> f64 {
        self.0[1][0]
    }

    pub fn east(&self) -> f64 {
        self.0[1][1]
    }
}

/// Compute the geographic footprint of a native `(left, bottom, right, top)`
/// extent. Inputs are rounded before reprojection and the projected extent is
/// rounded again; the order matters for reproducibility and makes the whole
/// operation idempotent on already-geographic extents.
pub fn geographic_bounds(extent: [f64; 4], src_epsg: u32) -> Result<GeoBounds> {
    let [left, bottom, right, top] = extent.map(round_coord);

    let corners = [
        (left, bottom),
        (left, top),
        (right, bottom),
        (right, top),
    ];

    let mut west = f64::INFINITY;
    let mut south = f64::INFINITY;
    let mut east = f64::NEG_INFINITY;
    let mut north = f64::NEG_INFINITY;
    for (x, y) in corners {
        let (lon, lat) = project_point(src_epsg, GEOGRAPHIC_EPSG, x, y)?;
        west = west.min(lon);
        east = east.max(lon);
        south = south.min(lat);
        north = north.max(lat);
    }

    let bounds = GeoBounds([
        [round_coord(south), round_coord(west)],
        [round_coord(north), round_coord(east)],
    ]);
    debug!(
        src_epsg,
        south = bounds.south(),
        west = bounds.west(),
        north = bounds.north(),
        east = bounds.east(),
        "reprojected composite extent"
    );
    Ok(bounds)
}

/// Project a single point between EPSG codes using proj4rs backed by the
/// crs-definitions database. Geographic CRSs are handled in degrees at this
/// boundary; proj4rs itself works in radians.
fn project_point(src_epsg: u32, dst_epsg: u32, x: f64, y: f64) -> Result<(f64, f64)> {
    if src_epsg == dst_epsg {
        return Ok((x, y));
    }

    let src = proj_for(src_epsg)?;
    let dst = proj_for(dst_epsg)?;

    let (x_in, y_in) = if is_geographic(src_epsg)? {
        (x.to_radians(), y.to_radians())
    } else {
        (x, y)
    };

    let mut point = (x_in, y_in, 0.0);
    transform(&src, &dst, &mut point).map_err(|e| Error::Projection {
        reason: format!("transform EPSG:{src_epsg} -> EPSG:{dst_epsg} failed: {e:?}"),
    })?;

    if is_geographic(dst_epsg)? {
        Ok((point.0.to_degrees(), point.1.to_degrees()))
    } else {
        Ok((point.0, point.1))
    }
}

fn proj_string(epsg: u32) -> Result<&'static str> {
    u16::try_from(epsg)
        .ok()
        .and_then(crs_definitions::from_code)
        .map(|def| def.proj4)
        .ok_or_else(|| Error::Projection {
            reason: format!("EPSG:{epsg} is not in the crs-definitions database"),
        })
}

fn proj_for(epsg: u32) -> Result<Proj> {
    Proj::from_proj_string(proj_string(epsg)?).map_err(|e| Error::Projection {
        reason: format!("invalid projection EPSG:{epsg}: {e:?}"),
    })
}

fn is_geographic(epsg: u32) -> Result<bool> {
    Ok(proj_string(epsg)?.contains("+proj=longlat"))
}
