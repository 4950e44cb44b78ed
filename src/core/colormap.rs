//! Closed colormap registry for single-band rendering.
//!
//! Palettes are matplotlib-family sequential maps stored as evenly spaced
//! RGB anchors and linearly interpolated on lookup. The registry is closed:
//! names outside it are an error, never a silent fallback.
use std::collections::BTreeMap;

use once_cell::sync::Lazy;

use crate::error::{Error, Result};

/// A named palette: evenly spaced RGB anchors over the [0, 255] input range.
#[derive(Debug, Clone, Copy)]
pub struct Colormap {
    pub name: &'static str,
    anchors: &'static [[u8; 3]],
}

impl Colormap {
    /// Map an 8-bit value to RGBA by linear interpolation between anchors.
    /// Alpha is always opaque; transparency comes from the validity mask.
    pub fn lookup(&self, value: u8) -> [u8; 4] {
        let segments = (self.anchors.len() - 1) as f64;
        let t = value as f64 / 255.0 * segments;
        let idx = (t as usize).min(self.anchors.len() - 2);
        let frac = t - idx as f64;

        let lo = self.anchors[idx];
        let hi = self.anchors[idx + 1];
        let mut rgba = [0u8; 4];
        for c in 0..3 {
            let v = lo[c] as f64 + (hi[c] as f64 - lo[c] as f64) * frac;
            rgba[c] = v.round().clamp(0.0, 255.0) as u8;
        }
        rgba[3] = 255;
        rgba
    }
}

static VIRIDIS: Colormap = Colormap {
    name: "viridis",
    anchors: &[
        [68, 1, 84],
        [72, 40, 120],
        [62, 74, 137],
        [49, 104, 142],
        [38, 130, 142],
        [31, 158, 137],
        [53, 183, 121],
        [109, 205, 89],
        [180, 222, 44],
        [253, 231, 37],
    ],
};

static PLASMA: Colormap = Colormap {
    name: "plasma",
    anchors: &[
        [13, 8, 135],
        [84, 2, 163],
        [139, 10, 165],
        [185, 50, 137],
        [219, 92, 104],
        [244, 136, 73],
        [254, 188, 43],
        [240, 249, 33],
    ],
};

static MAGMA: Colormap = Colormap {
    name: "magma",
    anchors: &[
        [0, 0, 4],
        [28, 16, 68],
        [79, 18, 123],
        [129, 37, 129],
        [181, 54, 122],
        [229, 80, 100],
        [251, 135, 97],
        [254, 194, 135],
        [252, 253, 191],
    ],
};

static INFERNO: Colormap = Colormap {
    name: "inferno",
    anchors: &[
        [0, 0, 4],
        [31, 12, 72],
        [85, 15, 109],
        [136, 34, 106],
        [186, 54, 85],
        [227, 89, 51],
        [249, 140, 10],
        [249, 201, 50],
        [252, 255, 164],
    ],
};

static CIVIDIS: Colormap = Colormap {
    name: "cividis",
    anchors: &[
        [0, 32, 76],
        [0, 42, 102],
        [33, 62, 117],
        [66, 82, 118],
        [93, 103, 120],
        [120, 124, 120],
        [151, 147, 113],
        [185, 172, 97],
        [221, 199, 68],
        [255, 234, 70],
    ],
};

static GRAY: Colormap = Colormap {
    name: "gray",
    anchors: &[[0, 0, 0], [255, 255, 255]],
};

static REGISTRY: Lazy<BTreeMap<&'static str, &'static Colormap>> = Lazy::new(|| {
    let mut m = BTreeMap::new();
    for cm in [&VIRIDIS, &PLASMA, &MAGMA, &INFERNO, &CIVIDIS, &GRAY] {
        m.insert(cm.name, cm);
    }
    m
});

/// Registered palette names, sorted.
pub fn list() -> Vec<&'static str> {
    REGISTRY.keys().copied().collect()
}

/// Look up a palette by name.
pub fn get(name: &str) -> Result<&'static Colormap> {
    REGISTRY
        .get(name)
        .copied()
        .ok_or_else(|| Error::UnknownColormap {
            name: name.to_string(),
        })
}
