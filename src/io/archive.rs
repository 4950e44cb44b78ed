//! Archive packaging: bundle the rendered image, its world file, the request
//! geometry, and the asset-usage metadata into one distributable zip.
use std::io::{Cursor, Write};

use serde_json::{Value, json};
use zip::CompressionMethod;
use zip::write::{FileOptions, ZipWriter};

use crate::error::Result;
use crate::mosaic::AssetRecord;
use crate::types::ImageFormat;

/// Member order inside the archive is fixed: image, world file, polygon,
/// metadata.
pub fn create_zip_geoimage(
    image: &[u8],
    world_file: &str,
    format: ImageFormat,
    geometry: &Value,
    assets_used: &[AssetRecord],
) -> Result<Vec<u8>> {
    let metadata = json!({
        "type": "FeatureCollection",
        "features": assets_used,
    });

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    writer.start_file(format!("image.{}", format.extension()), options)?;
    writer.write_all(image)?;

    writer.start_file(format!("image.{}", format.world_extension()), options)?;
    writer.write_all(world_file.as_bytes())?;

    writer.start_file("polygon.geojson", options)?;
    writer.write_all(serde_json::to_string(geometry)?.as_bytes())?;

    writer.start_file("image_metadata.geojson", options)?;
    writer.write_all(serde_json::to_string(&metadata)?.as_bytes())?;

    Ok(writer.finish()?.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use zip::ZipArchive;

    fn sample_archive(format: ImageFormat) -> Vec<u8> {
        let geometry = json!({
            "type": "Polygon",
            "coordinates": [[[13.1, 52.3], [13.6, 52.3], [13.6, 52.7], [13.1, 52.3]]],
        });
        let assets = vec![AssetRecord::new("item-b"), AssetRecord::new("item-a")];
        create_zip_geoimage(b"not-really-pixels", "0.01\n0.0\n0.0\n-0.01\n13.1\n52.7\n", format, &geometry, &assets)
            .unwrap()
    }

    #[test]
    fn member_set_and_order_are_fixed() {
        let bytes = sample_archive(ImageFormat::PNG);
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect();
        assert_eq!(
            names,
            vec![
                "image.png",
                "image.pgw",
                "polygon.geojson",
                "image_metadata.geojson"
            ]
        );
    }

    #[test]
    fn jpeg_archive_pairs_jgw_world_file() {
        let bytes = sample_archive(ImageFormat::JPEG);
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert!(archive.by_name("image.jpeg").is_ok());
        assert!(archive.by_name("image.jgw").is_ok());
    }

    #[test]
    fn metadata_member_is_a_feature_collection() {
        let bytes = sample_archive(ImageFormat::PNG);
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut content = String::new();
        archive
            .by_name("image_metadata.geojson")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        let parsed: Value = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed["type"], "FeatureCollection");
        assert_eq!(parsed["features"].as_array().unwrap().len(), 2);
        assert_eq!(parsed["features"][0]["id"], "item-b");
    }

    #[test]
    fn archive_survives_a_disk_round_trip() {
        let bytes = sample_archive(ImageFormat::PNG);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bundle.zip");
        std::fs::write(&path, &bytes).unwrap();

        let file = std::fs::File::open(&path).unwrap();
        let mut archive = ZipArchive::new(file).unwrap();
        assert_eq!(archive.len(), 4);
        let mut image = Vec::new();
        archive
            .by_name("image.png")
            .unwrap()
            .read_to_end(&mut image)
            .unwrap();
        assert_eq!(image, b"not-really-pixels");
    }
}
