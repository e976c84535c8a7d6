//! Common test utilities for integration tests

use aemet_opendata::config::ResolvedConfig;
use std::io::{Cursor, Write};

/// Builds an uncompressed tar archive holding `files`
#[allow(dead_code)]
pub fn create_test_tar(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    for (name, content) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, name, *content).unwrap();
    }
    builder.into_inner().unwrap()
}

/// Builds a gzip-compressed tar archive holding `files`
#[allow(dead_code)]
pub fn create_test_tar_gz(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(&create_test_tar(files)).unwrap();
    encoder.finish().unwrap()
}

/// Builds a bzip2-compressed tar archive holding `files`
#[allow(dead_code)]
pub fn create_test_tar_bz2(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut encoder = bzip2::write::BzEncoder::new(Vec::new(), bzip2::Compression::default());
    encoder.write_all(&create_test_tar(files)).unwrap();
    encoder.finish().unwrap()
}

/// Builds an in-memory ZIP archive; names ending in `/` become directory entries
#[allow(dead_code)]
pub fn create_test_zip(files: &[(&str, &[u8])]) -> Vec<u8> {
    use zip::write::FileOptions;
    use zip::ZipWriter;

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(zip::CompressionMethod::Stored);

    for (name, content) in files {
        if name.ends_with('/') {
            zip.add_directory(*name, options).unwrap();
        } else {
            zip.start_file(*name, options).unwrap();
            zip.write_all(content).unwrap();
        }
    }

    zip.finish().unwrap().into_inner()
}

/// Configuration pointing at a mock server, with millisecond backoff
#[allow(dead_code)]
pub fn test_config(base_url: &str, keys: &[&str]) -> ResolvedConfig {
    ResolvedConfig {
        base_url: base_url.to_string(),
        api_keys: keys.iter().map(|k| k.to_string()).collect(),
        backoff_unit_ms: 1,
        ..ResolvedConfig::default()
    }
}

/// Successful metadata envelope pointing at `data_url`
#[allow(dead_code)]
pub fn envelope(data_url: &str) -> serde_json::Value {
    serde_json::json!({
        "descripcion": "exito",
        "estado": 200,
        "datos": data_url,
        "metadatos": format!("{data_url}/metadatos"),
    })
}

/// Sample daily climatology records as served by a data URL
#[allow(dead_code)]
pub const SAMPLE_DAILY_RECORDS: &str = r#"[
  {"fecha": "2022-01-01", "indicativo": "3195", "nombre": "MADRID, RETIRO", "tmed": "6,4"},
  {"fecha": "2022-01-02", "indicativo": "3195", "nombre": "MADRID, RETIRO", "tmed": "8,1"}
]"#;

/// Sample CAP warning
#[allow(dead_code)]
pub const SAMPLE_CAP_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<alert xmlns="urn:oasis:names:tc:emergency:cap:1.2">
  <identifier>2.49.0.0.724.0.ES.20260117103000.1</identifier>
  <status>Actual</status>
</alert>"#;
