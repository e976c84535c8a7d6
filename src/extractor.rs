use crate::constants::{FALLBACK_ENTRY_NAME, TAR_MAGIC_OFFSET};
use crate::errors::{AppError, AppResult};
use bzip2::read::BzDecoder;
use flate2::read::GzDecoder;
use std::collections::BTreeMap;
use std::io::{Cursor, Read};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;
use zip::ZipArchive;

/// Entry name to entry content: decoded text, or lowercase hex for binary entries.
pub type ExtractedArchive = BTreeMap<String, String>;

/// Container format recognized from the leading bytes of a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    TarGz,
    TarBz2,
    Zip,
    Tar,
    Unknown,
}

impl ArchiveFormat {
    /// Classifies `bytes` by magic bytes. Checks run in a fixed order and the first
    /// match wins.
    pub fn detect(bytes: &[u8]) -> Self {
        if bytes.starts_with(&[0x1f, 0x8b]) {
            Self::TarGz
        } else if bytes.starts_with(b"BZh") {
            Self::TarBz2
        } else if bytes.starts_with(b"PK") {
            Self::Zip
        } else if is_tar(bytes) {
            Self::Tar
        } else {
            Self::Unknown
        }
    }

    /// Returns a human-readable name for the format.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::TarGz => "tar.gz",
            Self::TarBz2 => "tar.bz2",
            Self::Zip => "zip",
            Self::Tar => "tar",
            Self::Unknown => "unknown",
        }
    }
}

// Both POSIX ("ustar\0") and GNU ("ustar  ") headers carry "ustar" at offset 257.
fn is_tar(bytes: &[u8]) -> bool {
    let at_offset = bytes
        .get(TAR_MAGIC_OFFSET..TAR_MAGIC_OFFSET + 5)
        .is_some_and(|magic| magic == b"ustar");
    let head = &bytes[..bytes.len().min(256)];
    at_offset || head.windows(5).any(|w| w == b"ustar")
}

/// Decodes entry bytes as UTF-8, falling back to lowercase hex for binary content.
pub fn decode_entry(bytes: Vec<u8>) -> String {
    String::from_utf8(bytes).unwrap_or_else(|e| hex::encode(e.into_bytes()))
}

/// Name of the single entry returned when a buffer is not a readable archive.
///
/// Uses the last non-empty path segment of `source_url`, ignoring query and fragment,
/// or `"descargado"` when there is none.
pub fn fallback_entry_name(source_url: &str) -> String {
    let segment = match Url::parse(source_url) {
        Ok(url) => url
            .path_segments()
            .and_then(|mut s| s.next_back())
            .map(str::to_string),
        Err(_) => source_url
            .split(['?', '#'])
            .next()
            .and_then(|path| path.rsplit('/').next())
            .map(str::to_string),
    };
    segment
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| FALLBACK_ENTRY_NAME.to_string())
}

/// Extracts a downloaded buffer into a flat name-to-content map.
///
/// The container format is detected from magic bytes (see [`ArchiveFormat::detect`]),
/// never from the URL. Directory entries are skipped and every file entry is decoded
/// with [`decode_entry`].
///
/// # Behavior
///
/// - **Unknown format**: the whole buffer is returned as one entry named after the last
///   URL path segment.
/// - **Broken archive**: if extraction fails before any entry is read, the same
///   single-entry fallback applies. If it fails after some entries were read, those
///   entries are returned and the failure is logged.
/// - **Empty archive**: a valid archive with no files yields an empty map.
///
/// # Example
///
/// ```
/// use aemet_opendata::extractor::extract_archive;
///
/// let entries = extract_archive(b"plain text", "https://example.com/files/notes.txt");
/// assert_eq!(entries.get("notes.txt").map(String::as_str), Some("plain text"));
/// ```
pub fn extract_archive(bytes: &[u8], source_url: &str) -> ExtractedArchive {
    let format = ArchiveFormat::detect(bytes);
    debug!(format = format.display_name(), bytes = bytes.len(), "Format detected");

    let mut entries = ExtractedArchive::new();
    let result = match format {
        ArchiveFormat::TarGz => read_tar(GzDecoder::new(bytes), &mut entries),
        ArchiveFormat::TarBz2 => read_tar(BzDecoder::new(bytes), &mut entries),
        ArchiveFormat::Tar => read_tar(bytes, &mut entries),
        ArchiveFormat::Zip => read_zip(bytes, &mut entries).map_err(|e| e.to_string()),
        ArchiveFormat::Unknown => {
            info!("Unknown format, returning content as a single entry");
            return single_entry(bytes, source_url);
        }
    };

    match result {
        Ok(()) => entries,
        Err(e) if entries.is_empty() => {
            warn!(
                format = format.display_name(),
                error = %e,
                "Extraction failed, returning content as a single entry"
            );
            single_entry(bytes, source_url)
        }
        Err(e) => {
            warn!(
                format = format.display_name(),
                extracted = entries.len(),
                error = %e,
                "Extraction stopped early, keeping entries read so far"
            );
            entries
        }
    }
}

fn single_entry(bytes: &[u8], source_url: &str) -> ExtractedArchive {
    let name = fallback_entry_name(source_url);
    debug!(entry = %name, "Extracted");
    ExtractedArchive::from([(name, decode_entry(bytes.to_vec()))])
}

fn read_tar<R: Read>(reader: R, entries: &mut ExtractedArchive) -> Result<(), String> {
    read_tar_entries(reader, entries).map_err(|e| e.to_string())
}

fn read_tar_entries<R: Read>(reader: R, entries: &mut ExtractedArchive) -> std::io::Result<()> {
    let mut archive = tar::Archive::new(reader);
    for entry in archive.entries()? {
        let mut entry = entry?;
        if !entry.header().entry_type().is_file() {
            continue;
        }
        let name = entry.path()?.to_string_lossy().into_owned();
        // Header sizes are untrusted; let the reader bound the length.
        let mut content = Vec::new();
        entry.read_to_end(&mut content)?;
        debug!(entry = %name, "Extracted");
        entries.insert(name, decode_entry(content));
    }
    Ok(())
}

fn read_zip(bytes: &[u8], entries: &mut ExtractedArchive) -> zip::result::ZipResult<()> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        if file.is_dir() {
            continue;
        }
        let name = file.name().to_string();
        let mut content = Vec::new();
        file.read_to_end(&mut content)?;
        debug!(entry = %name, "Extracted");
        entries.insert(name, decode_entry(content));
    }
    Ok(())
}

/// Downloads `url` and extracts it with [`extract_archive`].
///
/// Extraction runs on the blocking thread pool.
///
/// # Errors
///
/// Returns `NetworkError` if the request fails or returns a non-success status.
/// Extraction itself never fails.
pub async fn download_archive(
    client: &reqwest::Client,
    url: &str,
    timeout: Duration,
) -> AppResult<ExtractedArchive> {
    info!(url = url, "Downloading archive");

    let response = client
        .get(url)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| AppError::NetworkError(format!("Failed to download archive {url}: {e}")))?;

    let status = response.status();
    let response = response.error_for_status().map_err(|e| {
        AppError::NetworkError(format!(
            "HTTP {}: Failed to download archive {url}: {e}",
            status.as_u16()
        ))
    })?;

    let bytes = response.bytes().await?;
    info!(url = url, bytes = bytes.len(), "Archive downloaded");

    let source_url = url.to_string();
    tokio::task::spawn_blocking(move || extract_archive(&bytes, &source_url))
        .await
        .map_err(|e| AppError::IoError(format!("Task join error: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_formats_by_magic_bytes() {
        assert_eq!(ArchiveFormat::detect(&[0x1f, 0x8b, 0x08]), ArchiveFormat::TarGz);
        assert_eq!(ArchiveFormat::detect(b"BZh91AY"), ArchiveFormat::TarBz2);
        assert_eq!(ArchiveFormat::detect(b"PK\x03\x04"), ArchiveFormat::Zip);
        assert_eq!(ArchiveFormat::detect(b"hello"), ArchiveFormat::Unknown);
        assert_eq!(ArchiveFormat::detect(b""), ArchiveFormat::Unknown);
    }

    #[test]
    fn detects_tar_magic_at_offset() {
        let mut header = vec![0u8; 512];
        header[257..263].copy_from_slice(b"ustar\0");
        assert_eq!(ArchiveFormat::detect(&header), ArchiveFormat::Tar);

        let mut gnu = vec![0u8; 512];
        gnu[257..265].copy_from_slice(b"ustar  \0");
        assert_eq!(ArchiveFormat::detect(&gnu), ArchiveFormat::Tar);
    }

    #[test]
    fn detects_tar_magic_in_head() {
        let mut bytes = b"xxxxustarxxxx".to_vec();
        bytes.resize(100, 0);
        assert_eq!(ArchiveFormat::detect(&bytes), ArchiveFormat::Tar);
    }

    #[test]
    fn gzip_magic_wins_over_tar_marker() {
        let mut bytes = vec![0x1f, 0x8b];
        bytes.extend_from_slice(b"ustar");
        assert_eq!(ArchiveFormat::detect(&bytes), ArchiveFormat::TarGz);
    }

    #[test]
    fn decode_entry_keeps_text() {
        assert_eq!(decode_entry(b"hola".to_vec()), "hola");
    }

    #[test]
    fn decode_entry_hex_encodes_binary() {
        let bytes = vec![0xff, 0x00, 0xab];
        let encoded = decode_entry(bytes.clone());
        assert_eq!(encoded, "ff00ab");
        assert_eq!(hex::decode(encoded).unwrap(), bytes);
    }

    #[test]
    fn fallback_name_uses_last_segment() {
        assert_eq!(fallback_entry_name("https://example.com/a/foo.bin"), "foo.bin");
        assert_eq!(
            fallback_entry_name("https://example.com/a/foo.bin?x=1#frag"),
            "foo.bin"
        );
        assert_eq!(fallback_entry_name(".../foo.bin"), "foo.bin");
    }

    #[test]
    fn fallback_name_defaults_when_no_segment() {
        assert_eq!(fallback_entry_name("https://example.com/"), "descargado");
        assert_eq!(fallback_entry_name("https://example.com/dir/"), "descargado");
        assert_eq!(fallback_entry_name(""), "descargado");
    }

    #[test]
    fn unknown_buffer_is_single_entry() {
        let entries = extract_archive(&[0xde, 0xad, 0xbe, 0xef], "https://example.com/x/foo.bin");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries["foo.bin"], "deadbeef");
    }

    #[test]
    fn corrupt_zip_falls_back_to_single_entry() {
        let entries = extract_archive(b"PK not really a zip", "https://example.com/broken.zip");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries["broken.zip"], "PK not really a zip");
    }

    #[test]
    fn corrupt_gzip_falls_back_to_single_entry() {
        let bytes = [0x1f, 0x8b, 0x00, 0x01, 0x02];
        let entries = extract_archive(&bytes, "https://example.com/avisos.tar.gz");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries["avisos.tar.gz"], "1f8b000102");
    }
}
