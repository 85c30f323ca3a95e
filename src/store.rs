//! The document store: open documents addressed by opaque handles.
//!
//! Locking is two-level. The handle table sits behind a `RwLock` that is
//! only held to look up, insert or remove a slot; each slot has its own
//! `Mutex` that an operation holds for its full duration. A lookup clones
//! the slot `Arc` and drops the table lock before taking the slot lock, so
//! operations on different documents never wait on each other.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::num::NonZeroU64;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::config::{CreateOptions, StoreConfig};
use crate::error::{Error, Result};
use crate::format::{write_atomic, DocumentCodec, NoteCodec};
use crate::ingest::{Ingestor, RawPoint};
use crate::model::{Document, Page};
use crate::pdf::{AttachedPdf, LopdfDecoder, PdfDecoder, PdfSource};
use crate::render::{self, RenderOptions, Surface};

/// Opaque identifier of an open document. Never zero, never reused by a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(NonZeroU64);

impl Handle {
    /// Rebuild a handle from its raw value. Zero is never a valid handle.
    pub fn from_raw(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(Handle)
    }

    /// The raw value, suitable for passing across the C ABI.
    pub fn as_raw(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How `import_pdf` combines PDF pages with existing ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PdfImportMode {
    /// The document's pages become exactly the PDF pages.
    #[default]
    Replace,
    /// PDF pages are appended after the existing pages.
    Append,
}

/// Everything the store keeps for one open document.
#[derive(Debug)]
pub struct DocumentSlot {
    pub document: Document,
    pub pdf: Option<AttachedPdf>,
}

impl DocumentSlot {
    fn new(document: Document) -> Self {
        Self { document, pdf: None }
    }

    /// Import `source` (loaded from `path`) into this slot.
    fn import_pdf(
        &mut self,
        path: &Path,
        source: Arc<dyn PdfSource>,
        mode: PdfImportMode,
    ) -> Result<()> {
        let pages = pdf_pages(source.as_ref())?;

        let same_pdf = self.document.pdf_path.as_deref() == Some(path);
        if mode == PdfImportMode::Append && self.document.has_pdf_pages() && !same_pdf {
            return Err(Error::InvalidParam(format!(
                "document already references PDF {}; cannot append pages of {}",
                self.document
                    .pdf_path
                    .as_deref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default(),
                path.display()
            )));
        }

        let added = pages.len();
        match mode {
            PdfImportMode::Replace => self.document.pages = pages,
            PdfImportMode::Append => self.document.pages.extend(pages),
        }
        self.document.pdf_path = Some(path.to_path_buf());
        self.document.touch();

        if source.page_count() == 0 {
            log::warn!("PDF {} has no pages; no background cache", path.display());
            self.pdf = None;
            return Ok(());
        }
        match self.pdf.as_mut() {
            // Appending the already attached PDF keeps its warm cache
            Some(attached) if mode == PdfImportMode::Append && attached.path() == path => {}
            Some(attached) => attached.replace_source(path, source),
            None => self.pdf = Some(AttachedPdf::new(path, source)),
        }
        log::debug!("Imported {} PDF pages from {} ({:?})", added, path.display(), mode);
        Ok(())
    }
}

/// Build one PDF-backed page per page of `source`, sized to the PDF page.
fn pdf_pages(source: &dyn PdfSource) -> Result<Vec<Page>> {
    (0..source.page_count())
        .map(|number| {
            let (width, height) = source.page_size(number)?;
            let page = Page::pdf_backed(width, height, number);
            if !page.has_valid_size() {
                return Err(Error::PdfDecode(format!(
                    "PDF page {} has invalid size {}x{}",
                    number, width, height
                )));
            }
            Ok(page)
        })
        .collect()
}

type SlotRef = Arc<Mutex<DocumentSlot>>;

/// Open documents keyed by handle, plus the collaborators used to load,
/// save and render them.
pub struct DocumentStore {
    codec: Box<dyn DocumentCodec>,
    decoder: Box<dyn PdfDecoder>,
    /// `None` until `init` and after `shutdown`
    config: RwLock<Option<StoreConfig>>,
    documents: RwLock<HashMap<Handle, SlotRef>>,
    next_handle: AtomicU64,
}

impl DocumentStore {
    /// A store using the gzip note codec and the lopdf decoder.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Start building a store with custom collaborators.
    pub fn builder() -> DocumentStoreBuilder {
        DocumentStoreBuilder::default()
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Initialize (or reconfigure) the store.
    pub fn init(&self, config: StoreConfig) {
        let mut slot = self.config.write();
        if slot.is_some() {
            log::info!("Document store reconfigured");
        } else {
            log::info!("Document store initialized");
        }
        *slot = Some(config);
    }

    /// Initialize from a configuration JSON object (blank means defaults).
    pub fn init_from_json(&self, json: &str) -> Result<()> {
        let config = StoreConfig::from_json(json)?;
        self.init(config);
        Ok(())
    }

    /// Close every document and return to the uninitialized state.
    pub fn shutdown(&self) {
        let mut config = self.config.write();
        let closed = {
            let mut documents = self.documents.write();
            let count = documents.len();
            documents.clear();
            count
        };
        *config = None;
        log::info!("Document store shut down ({} documents closed)", closed);
    }

    pub fn is_initialized(&self) -> bool {
        self.config.read().is_some()
    }

    /// Number of open documents.
    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }

    /// Handles of all open documents, in creation order.
    pub fn handles(&self) -> Vec<Handle> {
        let mut handles: Vec<Handle> = self.documents.read().keys().copied().collect();
        handles.sort();
        handles
    }

    /// A snapshot of the active configuration.
    pub fn config(&self) -> Result<StoreConfig> {
        self.config.read().clone().ok_or(Error::NotInitialized)
    }

    // -----------------------------------------------------------------------
    // Document lifecycle
    // -----------------------------------------------------------------------

    /// Create a document with one blank page.
    pub fn create(&self, options: &CreateOptions) -> Result<Handle> {
        let config = self.config()?;
        let page = options.build_page(&config)?;
        let mut document = Document::with_page(page);
        document.metadata.title = options.title.clone();
        let handle = self.register(DocumentSlot::new(document))?;
        log::info!("Created document {}", handle);
        Ok(handle)
    }

    /// Create a document from an options JSON object (blank means defaults).
    pub fn create_from_json(&self, json: &str) -> Result<Handle> {
        let options = CreateOptions::from_json(json)?;
        self.create(&options)
    }

    /// Open a saved note container.
    ///
    /// A referenced PDF that cannot be attached does not fail the open; its
    /// pages render without background.
    pub fn open(&self, path: &Path) -> Result<Handle> {
        self.config()?;
        if !path.exists() {
            return Err(Error::NotFound(path.to_path_buf()));
        }
        let bytes = fs::read(path)?;
        let mut document = self.codec.parse(&bytes)?;
        document.file_path = Some(path.to_path_buf());

        let mut slot = DocumentSlot::new(document);
        if let Some(pdf_path) = slot.document.pdf_path.clone() {
            let resolved = resolve_relative(&absolute_path(path)?, &pdf_path);
            slot.pdf = self.reattach_pdf(&slot.document, &resolved);
            // The document and its attached PDF must agree on the path
            slot.document.pdf_path = Some(resolved);
        }

        let handle = self.register(slot)?;
        log::info!("Opened document {} from {}", handle, path.display());
        Ok(handle)
    }

    fn reattach_pdf(&self, document: &Document, pdf_path: &Path) -> Option<AttachedPdf> {
        let source = match self.decoder.open(pdf_path) {
            Ok(source) => source,
            Err(e) => {
                log::warn!("Cannot attach PDF {}: {}", pdf_path.display(), e);
                return None;
            }
        };
        if source.page_count() == 0 {
            log::warn!("PDF {} has no pages; no background cache", pdf_path.display());
            return None;
        }
        if let Err(e) = document.validate_pdf_pages(source.page_count()) {
            log::warn!("Not attaching PDF {}: {}", pdf_path.display(), e);
            return None;
        }
        Some(AttachedPdf::new(pdf_path, source))
    }

    /// Open a PDF as a new document with one page per PDF page.
    ///
    /// `attach` selects append semantics for the import; for a fresh
    /// document both modes produce the same pages.
    pub fn open_pdf(&self, path: &Path, attach: bool) -> Result<Handle> {
        self.config()?;
        let path = &absolute_path(path)?;
        let source = self.decoder.open(path)?;
        let mode = if attach {
            PdfImportMode::Append
        } else {
            PdfImportMode::Replace
        };

        let mut slot = DocumentSlot::new(Document::new());
        slot.import_pdf(path, source, mode)?;
        let pages = slot.document.page_count();

        let handle = self.register(slot)?;
        log::info!(
            "Opened PDF {} as document {} ({} pages)",
            path.display(),
            handle,
            pages
        );
        Ok(handle)
    }

    /// Import a PDF into an open document.
    ///
    /// The document records the PDF by absolute path.
    pub fn import_pdf(&self, handle: Handle, path: &Path, mode: PdfImportMode) -> Result<()> {
        let slot = self.slot(handle)?;
        let path = absolute_path(path)?;
        let source = self.decoder.open(&path)?;
        let mut slot = slot.lock();
        slot.import_pdf(&path, source, mode)
    }

    /// Serialize a document to `path`.
    pub fn save(&self, handle: Handle, path: &Path) -> Result<()> {
        let slot = self.slot(handle)?;
        let mut slot = slot.lock();
        let document = &mut slot.document;

        let previous = document.metadata.modified;
        document.touch();
        let written = self
            .codec
            .serialize(document)
            .and_then(|bytes| write_atomic(path, &bytes));
        if let Err(e) = written {
            document.metadata.modified = previous;
            return Err(e);
        }
        document.file_path = Some(path.to_path_buf());
        log::info!("Saved document {} to {}", handle, path.display());
        Ok(())
    }

    /// Close a document and release its resources.
    pub fn close(&self, handle: Handle) -> Result<()> {
        self.documents
            .write()
            .remove(&handle)
            .ok_or(Error::InvalidHandle(handle))?;
        log::info!("Closed document {}", handle);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Queries and edits
    // -----------------------------------------------------------------------

    pub fn page_count(&self, handle: Handle) -> Result<usize> {
        self.with_document(handle, Document::page_count)
    }

    /// Page size in points.
    pub fn page_size(&self, handle: Handle, page_index: usize) -> Result<(f64, f64)> {
        self.with_document(handle, |doc| {
            doc.require_page(page_index).map(Page::dimensions)
        })?
    }

    /// Run `f` with read access to a document, under its lock.
    pub fn with_document<R>(&self, handle: Handle, f: impl FnOnce(&Document) -> R) -> Result<R> {
        let slot = self.slot(handle)?;
        let slot = slot.lock();
        Ok(f(&slot.document))
    }

    /// Number of PDF pages currently cached for a document.
    pub fn pdf_cache_len(&self, handle: Handle) -> Result<usize> {
        let slot = self.slot(handle)?;
        let slot = slot.lock();
        Ok(slot.pdf.as_ref().map_or(0, |pdf| pdf.cache().len()))
    }

    /// Append a blank page; returns its index.
    pub fn add_page(&self, handle: Handle, options: &CreateOptions) -> Result<usize> {
        let slot = self.slot(handle)?;
        let config = self.config()?;
        let page = options.build_page(&config)?;
        let mut slot = slot.lock();
        slot.document.add_page(page);
        slot.document.touch();
        Ok(slot.document.page_count() - 1)
    }

    /// Append one gesture as a stroke on the configured ingest target.
    pub fn ingest(&self, handle: Handle, points: &[RawPoint]) -> Result<()> {
        if points.is_empty() {
            return Err(Error::invalid("stroke batch is empty"));
        }
        let slot = self.slot(handle)?;
        let config = self.config()?;
        let mut slot = slot.lock();
        Ingestor::new(&config.strokes, config.ingest).commit(&mut slot.document, points)?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Rendering
    // -----------------------------------------------------------------------

    /// Render a page and write the encoded image to `path`.
    pub fn render(
        &self,
        handle: Handle,
        page_index: usize,
        path: &Path,
        width: u32,
        height: u32,
        options: &RenderOptions,
    ) -> Result<()> {
        let slot = self.slot(handle)?;
        let mut guard = slot.lock();
        let DocumentSlot { document, pdf } = &mut *guard;
        render::render_page_to_file(document, pdf.as_mut(), page_index, path, width, height, options)
    }

    /// Render a page to an in-memory surface.
    pub fn render_surface(
        &self,
        handle: Handle,
        page_index: usize,
        width: u32,
        height: u32,
        options: &RenderOptions,
    ) -> Result<Surface> {
        let slot = self.slot(handle)?;
        let mut guard = slot.lock();
        let DocumentSlot { document, pdf } = &mut *guard;
        render::render_page(document, pdf.as_mut(), page_index, width, height, options)
    }

    /// Render every page into `dir`; returns the written files in page order.
    pub fn export(
        &self,
        handle: Handle,
        dir: &Path,
        width: u32,
        height: u32,
        options: &RenderOptions,
    ) -> Result<Vec<PathBuf>> {
        let slot = self.slot(handle)?;
        let mut guard = slot.lock();
        let DocumentSlot { document, pdf } = &mut *guard;
        let paths = render::export_pages(document, pdf.as_mut(), dir, width, height, options)?;
        log::info!(
            "Exported {} pages of document {} to {}",
            paths.len(),
            handle,
            dir.display()
        );
        Ok(paths)
    }

    // -----------------------------------------------------------------------
    // Table access
    // -----------------------------------------------------------------------

    fn slot(&self, handle: Handle) -> Result<SlotRef> {
        self.documents
            .read()
            .get(&handle)
            .cloned()
            .ok_or(Error::InvalidHandle(handle))
    }

    fn register(&self, slot: DocumentSlot) -> Result<Handle> {
        // Holding the config lock keeps a concurrent shutdown from missing this insert
        let config = self.config.read();
        if config.is_none() {
            return Err(Error::NotInitialized);
        }
        let raw = self.next_handle.fetch_add(1, Ordering::Relaxed);
        let handle = Handle::from_raw(raw).ok_or_else(|| Error::Other("handle space exhausted".to_string()))?;
        self.documents
            .write()
            .insert(handle, Arc::new(Mutex::new(slot)));
        Ok(handle)
    }
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DocumentStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentStore")
            .field("initialized", &self.is_initialized())
            .field("documents", &self.len())
            .finish()
    }
}

/// Builder for [`DocumentStore`].
#[derive(Default)]
pub struct DocumentStoreBuilder {
    codec: Option<Box<dyn DocumentCodec>>,
    decoder: Option<Box<dyn PdfDecoder>>,
}

impl DocumentStoreBuilder {
    /// Use a custom container codec.
    pub fn codec(mut self, codec: impl DocumentCodec + 'static) -> Self {
        self.codec = Some(Box::new(codec));
        self
    }

    /// Use a custom PDF decoder.
    pub fn pdf_decoder(mut self, decoder: impl PdfDecoder + 'static) -> Self {
        self.decoder = Some(Box::new(decoder));
        self
    }

    pub fn build(self) -> DocumentStore {
        DocumentStore {
            codec: self.codec.unwrap_or_else(|| Box::new(NoteCodec::new())),
            decoder: self.decoder.unwrap_or_else(|| Box::new(LopdfDecoder::new())),
            config: RwLock::new(None),
            documents: RwLock::new(HashMap::new()),
            next_handle: AtomicU64::new(1),
        }
    }
}

/// `path` made absolute against the current directory.
fn absolute_path(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    Ok(std::env::current_dir()?.join(path))
}

/// Resolve `target` against the directory containing `base` when relative.
fn resolve_relative(base: &Path, target: &Path) -> PathBuf {
    if target.is_absolute() {
        return target.to_path_buf();
    }
    match base.parent() {
        Some(dir) => dir.join(target),
        None => target.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{RulingStyle, A4_HEIGHT, A4_WIDTH};

    fn store() -> DocumentStore {
        let store = DocumentStore::new();
        store.init(StoreConfig::default());
        store
    }

    #[test]
    fn test_handle_raw() {
        assert!(Handle::from_raw(0).is_none());
        let handle = Handle::from_raw(42).unwrap();
        assert_eq!(handle.as_raw(), 42);
        assert_eq!(handle.to_string(), "42");
    }

    #[test]
    fn test_create_requires_init() {
        let store = DocumentStore::new();
        assert!(!store.is_initialized());
        let err = store.create(&CreateOptions::default()).unwrap_err();
        assert!(matches!(err, Error::NotInitialized));
        assert!(store.is_empty());
    }

    #[test]
    fn test_create_defaults() {
        let store = store();
        let handle = store.create_from_json("").unwrap();
        assert_eq!(store.page_count(handle).unwrap(), 1);
        assert_eq!(store.page_size(handle, 0).unwrap(), (A4_WIDTH, A4_HEIGHT));
        assert!(matches!(store.page_size(handle, 1), Err(Error::InvalidParam(_))));
    }

    #[test]
    fn test_handles_are_not_reused() {
        let store = store();
        let a = store.create(&CreateOptions::default()).unwrap();
        store.close(a).unwrap();
        let b = store.create(&CreateOptions::default()).unwrap();
        assert_ne!(a, b);
        assert!(matches!(store.close(a), Err(Error::InvalidHandle(_))));
        assert_eq!(store.handles(), vec![b]);
    }

    #[test]
    fn test_shutdown_invalidates_handles() {
        let store = store();
        let handle = store.create(&CreateOptions::default()).unwrap();
        store.shutdown();
        assert!(!store.is_initialized());
        assert!(matches!(store.page_count(handle), Err(Error::InvalidHandle(_))));
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn test_add_page_uses_options() {
        let store = store();
        let handle = store.create(&CreateOptions::default()).unwrap();
        let options = CreateOptions::new()
            .with_size(100.0, 50.0)
            .with_ruling(RulingStyle::Dotted);
        assert_eq!(store.add_page(handle, &options).unwrap(), 1);
        assert_eq!(store.page_size(handle, 1).unwrap(), (100.0, 50.0));
    }

    #[test]
    fn test_ingest_empty_batch_checked_first() {
        let store = store();
        let bogus = Handle::from_raw(999).unwrap();
        assert!(matches!(store.ingest(bogus, &[]), Err(Error::InvalidParam(_))));
        assert!(matches!(
            store.ingest(bogus, &[RawPoint::new(1.0, 1.0)]),
            Err(Error::InvalidHandle(_))
        ));
    }

    #[test]
    fn test_absolute_path() {
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(absolute_path(Path::new("bg.pdf")).unwrap(), cwd.join("bg.pdf"));
        assert_eq!(
            absolute_path(Path::new("/pdfs/bg.pdf")).unwrap(),
            PathBuf::from("/pdfs/bg.pdf")
        );
    }

    #[test]
    fn test_resolve_relative() {
        assert_eq!(
            resolve_relative(Path::new("/notes/a.inkp"), Path::new("b.pdf")),
            PathBuf::from("/notes/b.pdf")
        );
        assert_eq!(
            resolve_relative(Path::new("/notes/a.inkp"), Path::new("/pdfs/b.pdf")),
            PathBuf::from("/pdfs/b.pdf")
        );
    }
}
