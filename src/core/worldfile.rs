//! World-file sidecar content: the six affine coefficients mapping pixel
//! coordinates of the rendered image to geographic coordinates, one value
//! per line.
use std::fmt::Write as _;

use crate::core::bounds::GeoBounds;

/// Derive the six world-file coefficients from geographic bounds and the
/// final image pixel dimensions, as newline-terminated text.
///
/// The index mapping into the `[[south, west], [north, east]]` pair structure
/// is load-bearing: line five is `bounds[0][1]` (west longitude) and line six
/// is `bounds[1][0]` (north latitude), the upper-left origin.
pub fn world_file_content(bounds: &GeoBounds, width: usize, height: usize) -> String {
    let b = &bounds.0;
    let pixel_size_x = (b[0][1] - b[1][1]).abs() / width as f64;
    let pixel_size_y = -(b[0][0] - b[1][0]).abs() / height as f64;

    let mut out = String::new();
    let _ = writeln!(out, "{pixel_size_x}");
    let _ = writeln!(out, "0.0");
    let _ = writeln!(out, "0.0");
    let _ = writeln!(out, "{pixel_size_y}");
    let _ = writeln!(out, "{}", b[0][1]);
    let _ = writeln!(out, "{}", b[1][0]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_lines(content: &str) -> Vec<f64> {
        content
            .lines()
            .map(|l| l.parse::<f64>().expect("world-file line parses as float"))
            .collect()
    }

    #[test]
    fn literal_index_mapping_is_pinned() {
        // south=10, west=20, north=12, east=23; 300x200 pixels
        let bounds = GeoBounds([[10.0, 20.0], [12.0, 23.0]]);
        let content = world_file_content(&bounds, 300, 200);
        let lines = parse_lines(&content);
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], 3.0 / 300.0); // |west - east| / width
        assert_eq!(lines[1], 0.0);
        assert_eq!(lines[2], 0.0);
        assert_eq!(lines[3], -(2.0 / 200.0)); // -|south - north| / height
        assert_eq!(lines[4], 20.0); // bounds[0][1]
        assert_eq!(lines[5], 12.0); // bounds[1][0]
    }

    #[test]
    fn coefficient_signs_for_non_degenerate_bounds() {
        let bounds = GeoBounds([[-33.9, 18.3], [-33.5, 18.9]]);
        let lines = parse_lines(&world_file_content(&bounds, 512, 256));
        assert!(lines[0] > 0.0, "pixel size x must be positive");
        assert_eq!(lines[1], 0.0);
        assert_eq!(lines[2], 0.0);
        assert!(lines[3] < 0.0, "pixel size y must be negative");
    }

    #[test]
    fn content_is_newline_terminated() {
        let bounds = GeoBounds([[0.0, 0.0], [1.0, 1.0]]);
        let content = world_file_content(&bounds, 10, 10);
        assert!(content.ends_with('\n'));
        assert_eq!(content.lines().count(), 6);
    }
}
