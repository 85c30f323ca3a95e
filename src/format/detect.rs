//! File type sniffing for note containers and PDF sources.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// How a note container is encoded on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    /// Gzip-compressed JSON (what the codec writes)
    Gzip,
    /// Uncompressed JSON
    Json,
}

/// Gzip magic bytes.
const GZIP_MAGIC: &[u8] = &[0x1f, 0x8b];

/// PDF magic bytes: %PDF-
const PDF_MAGIC: &[u8] = b"%PDF-";
const PDF_MAGIC_LEN: usize = 5;
const VERSION_LEN: usize = 3; // e.g., "1.7"

/// Detect the container encoding from the leading bytes.
///
/// Leading whitespace is skipped before looking for a JSON object.
pub fn detect_container(data: &[u8]) -> Result<ContainerKind> {
    if data.starts_with(GZIP_MAGIC) {
        return Ok(ContainerKind::Gzip);
    }

    match data.iter().find(|b| !b.is_ascii_whitespace()) {
        Some(b'{') => Ok(ContainerKind::Json),
        Some(_) => Err(Error::Parse("unrecognized note container".to_string())),
        None => Err(Error::Parse("empty note container".to_string())),
    }
}

/// Return the PDF version (e.g., "1.7") if the data starts with a PDF header.
pub fn pdf_version(data: &[u8]) -> Option<String> {
    if data.len() < PDF_MAGIC_LEN + VERSION_LEN || !data.starts_with(PDF_MAGIC) {
        return None;
    }

    let version_bytes = &data[PDF_MAGIC_LEN..PDF_MAGIC_LEN + VERSION_LEN];
    let version = String::from_utf8_lossy(version_bytes).to_string();
    is_valid_version(&version).then_some(version)
}

/// Check if bytes start with a valid PDF header.
pub fn is_pdf_bytes(data: &[u8]) -> bool {
    pdf_version(data).is_some()
}

/// Check if a file starts with a valid PDF header.
pub fn is_pdf<P: AsRef<Path>>(path: P) -> bool {
    let mut header = [0u8; 16];
    let Ok(mut file) = File::open(path) else {
        return false;
    };
    match file.read(&mut header) {
        Ok(n) => is_pdf_bytes(&header[..n]),
        Err(_) => false,
    }
}

/// Check if a version string is valid.
fn is_valid_version(version: &str) -> bool {
    if version.len() != 3 {
        return false;
    }

    let chars: Vec<char> = version.chars().collect();
    chars[0].is_ascii_digit() && chars[1] == '.' && chars[2].is_ascii_digit()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_gzip() {
        let data = [0x1f, 0x8b, 0x08, 0x00];
        assert_eq!(detect_container(&data).unwrap(), ContainerKind::Gzip);
    }

    #[test]
    fn test_detect_json_with_whitespace() {
        assert_eq!(
            detect_container(b"  \n{\"format\":\"inkpage\"}").unwrap(),
            ContainerKind::Json
        );
    }

    #[test]
    fn test_detect_invalid_container() {
        assert!(matches!(detect_container(b""), Err(Error::Parse(_))));
        assert!(matches!(
            detect_container(b"<?xml version=\"1.0\"?>"),
            Err(Error::Parse(_))
        ));
    }

    #[test]
    fn test_pdf_version() {
        assert_eq!(pdf_version(b"%PDF-1.7\n%test").as_deref(), Some("1.7"));
        assert_eq!(pdf_version(b"%PDF-2.0\n").as_deref(), Some("2.0"));
        assert!(pdf_version(b"%PDF").is_none());
        assert!(!is_pdf_bytes(b"Not a PDF"));
    }

    #[test]
    fn test_version_validation() {
        assert!(is_valid_version("1.0"));
        assert!(is_valid_version("2.0"));
        assert!(!is_valid_version("10.0"));
        assert!(!is_valid_version("abc"));
    }
}
