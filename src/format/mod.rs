//! Persisted document format.

mod codec;
pub mod detect;

pub use codec::{DocumentCodec, NoteCodec, FORMAT_TAG, FORMAT_VERSION, NOTE_EXTENSION};
pub use detect::{detect_container, is_pdf, is_pdf_bytes, ContainerKind};

use std::ffi::OsString;
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

/// Write `bytes` to `path` through a sibling temp file and a rename, so
/// readers never observe a half-written file.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let file_name = path
        .file_name()
        .ok_or_else(|| Error::invalid(format!("'{}' is not a file path", path.display())))?;
    let mut tmp_name = OsString::from(".");
    tmp_name.push(file_name);
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    // A missing parent directory is a write failure, not a missing input
    fs::write(&tmp_path, bytes).map_err(|e| Error::write(path, e))?;
    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(Error::write(path, e));
    }
    Ok(())
}
