//! # inkpage
//!
//! Session and rendering core for handwritten notes.
//!
//! A [`DocumentStore`] owns a set of open documents, each made of pages,
//! layers and vector strokes. Documents can be created blank, loaded from a
//! note container, or built from the pages of a PDF, which then serve as
//! page backgrounds. Any page can be rasterized to PNG or JPEG at a chosen
//! resolution.
//!
//! ## Quick Start
//!
//! ```no_run
//! use inkpage::{CreateOptions, DocumentStore, RawPoint, RenderOptions, StoreConfig};
//! use std::path::Path;
//!
//! fn main() -> inkpage::Result<()> {
//!     let store = DocumentStore::new();
//!     store.init(StoreConfig::default());
//!
//!     let doc = store.create(&CreateOptions::default())?;
//!     store.ingest(doc, &[RawPoint::new(72.0, 72.0), RawPoint::new(200.0, 120.0)])?;
//!     store.render(doc, 0, Path::new("page.png"), 600, 800, &RenderOptions::default())?;
//!     store.save(doc, Path::new("note.inkp"))?;
//!     store.close(doc)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Stroke ingestion**: pen, eraser, highlighter and pencil input with
//!   optional pressure
//! - **PDF backgrounds**: import PDF pages, decoded once per page and cached
//! - **Raster export**: PNG/JPEG with ruled, graph and dotted paper
//! - **Parallel export**: Uses Rayon for multi-page documents
//! - **C ABI**: optional `ffi` feature for host applications

pub mod config;
pub mod error;
pub mod format;
pub mod ingest;
pub mod model;
pub mod pdf;
pub mod render;
pub mod store;

#[cfg(feature = "ffi")]
pub mod ffi;

// Re-export commonly used types
pub use config::{CreateOptions, PageFormat, StoreConfig, StrokeDefaults};
pub use error::{Error, ErrorKind, Result};
pub use format::{DocumentCodec, NoteCodec, NOTE_EXTENSION};
pub use ingest::{IngestTarget, Ingestor, Phase, RawPoint, ToolKind};
pub use model::{
    Background, Color, Document, Element, Layer, Metadata, Page, Point, RulingStyle, Stroke,
    StrokeTool,
};
pub use pdf::{
    AttachedPdf, LopdfDecoder, LopdfSource, PdfBackgroundCache, PdfDecoder, PdfSource,
};
pub use render::{
    compute_scale, export_pages, render_page, render_page_to_file, BackgroundFlags, ImageFormat,
    RenderOptions, Surface,
};
pub use store::{DocumentStore, DocumentStoreBuilder, Handle, PdfImportMode};

use std::path::Path;

/// Load a note container without registering it in a store.
///
/// # Example
///
/// ```no_run
/// let doc = inkpage::load_document("note.inkp").unwrap();
/// println!("Pages: {}", doc.page_count());
/// ```
pub fn load_document<P: AsRef<Path>>(path: P) -> Result<Document> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(Error::NotFound(path.to_path_buf()));
    }
    let bytes = std::fs::read(path)?;
    let mut doc = NoteCodec::new().parse(&bytes)?;
    doc.file_path = Some(path.to_path_buf());
    Ok(doc)
}

/// Write a document as a note container.
pub fn save_document<P: AsRef<Path>>(doc: &Document, path: P) -> Result<()> {
    let bytes = NoteCodec::new().serialize(doc)?;
    format::write_atomic(path.as_ref(), &bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_missing() {
        let err = load_document("/nonexistent/note.inkp").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("n.inkp");
        let doc = Document::with_page(Page::letter());
        save_document(&doc, &path).unwrap();

        let loaded = load_document(&path).unwrap();
        assert_eq!(loaded.pages, doc.pages);
        assert_eq!(loaded.file_path.as_deref(), Some(path.as_path()));
    }
}
