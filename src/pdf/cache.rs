//! Page-keyed cache of decoded PDF backgrounds.
//!
//! Surfaces are stored at the PDF's intrinsic resolution; render scale is
//! applied when the background is composited, so one entry serves every
//! output size. Entries are never evicted. The cache is owned by the
//! document slot and only mutated under the document lock.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::backend::PdfSource;
use crate::error::{Error, Result};
use crate::render::Surface;

/// Decoded PDF page surfaces keyed by 0-based page number.
#[derive(Debug, Default)]
pub struct PdfBackgroundCache {
    entries: HashMap<usize, Arc<Surface>>,
}

impl PdfBackgroundCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached surface for `page_number`, decoding it on a miss.
    ///
    /// A failed decode caches nothing, so the next call retries.
    pub fn get_or_render(
        &mut self,
        source: &dyn PdfSource,
        page_number: usize,
    ) -> Result<Arc<Surface>> {
        if let Some(surface) = self.entries.get(&page_number) {
            return Ok(Arc::clone(surface));
        }

        let surface = source.render_page(page_number).map_err(|e| match e {
            Error::PdfDecode(_) => e,
            other => Error::PdfDecode(format!("page {}: {}", page_number, other)),
        })?;
        log::debug!(
            "Cached PDF page {} ({}x{})",
            page_number,
            surface.width(),
            surface.height()
        );
        let surface = Arc::new(surface);
        self.entries.insert(page_number, Arc::clone(&surface));
        Ok(surface)
    }

    /// Cached surface for `page_number`, if present.
    pub fn get(&self, page_number: usize) -> Option<Arc<Surface>> {
        self.entries.get(&page_number).cloned()
    }

    pub fn contains(&self, page_number: usize) -> bool {
        self.entries.contains_key(&page_number)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every cached surface.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// A PDF source attached to a document, together with its background cache.
pub struct AttachedPdf {
    path: PathBuf,
    source: Arc<dyn PdfSource>,
    cache: PdfBackgroundCache,
}

impl AttachedPdf {
    /// Attach `source`, loaded from `path`, with an empty cache.
    pub fn new(path: impl Into<PathBuf>, source: Arc<dyn PdfSource>) -> Self {
        Self {
            path: path.into(),
            source,
            cache: PdfBackgroundCache::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn source(&self) -> &dyn PdfSource {
        self.source.as_ref()
    }

    pub fn page_count(&self) -> usize {
        self.source.page_count()
    }

    pub fn cache(&self) -> &PdfBackgroundCache {
        &self.cache
    }

    /// Swap in a new source. Every cached surface belonged to the old one
    /// and is discarded.
    pub fn replace_source(&mut self, path: impl Into<PathBuf>, source: Arc<dyn PdfSource>) {
        self.path = path.into();
        self.source = source;
        self.cache.clear();
    }

    /// Background surface for `page_number`, decoding on a cache miss.
    pub fn background(&mut self, page_number: usize) -> Result<Arc<Surface>> {
        self.cache.get_or_render(self.source.as_ref(), page_number)
    }
}

impl std::fmt::Debug for AttachedPdf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttachedPdf")
            .field("path", &self.path)
            .field("pages", &self.source.page_count())
            .field("cached", &self.cache.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeSource {
        pages: usize,
        renders: AtomicUsize,
        fail: bool,
    }

    impl FakeSource {
        fn new(pages: usize) -> Self {
            Self {
                pages,
                renders: AtomicUsize::new(0),
                fail: false,
            }
        }
    }

    impl PdfSource for FakeSource {
        fn page_count(&self) -> usize {
            self.pages
        }

        fn page_size(&self, _page_number: usize) -> Result<(f64, f64)> {
            Ok((10.0, 20.0))
        }

        fn render_page(&self, page_number: usize) -> Result<Surface> {
            self.renders.fetch_add(1, Ordering::SeqCst);
            if self.fail || page_number >= self.pages {
                return Err(Error::Other("boom".to_string()));
            }
            Surface::new(10, 20)
        }
    }

    #[test]
    fn test_decodes_once_per_page() {
        let source = FakeSource::new(3);
        let mut cache = PdfBackgroundCache::new();

        let first = cache.get_or_render(&source, 1).unwrap();
        let second = cache.get_or_render(&source, 1).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(source.renders.load(Ordering::SeqCst), 1);
        assert!(cache.contains(1));
        assert!(!cache.contains(0));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_failure_is_not_cached() {
        let mut source = FakeSource::new(1);
        source.fail = true;
        let mut cache = PdfBackgroundCache::new();

        let err = cache.get_or_render(&source, 0).unwrap_err();
        assert!(matches!(err, Error::PdfDecode(_)));
        assert!(cache.is_empty());

        source.fail = false;
        assert!(cache.get_or_render(&source, 0).is_ok());
        assert_eq!(source.renders.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_replace_source_clears_cache() {
        let mut attached = AttachedPdf::new("a.pdf", Arc::new(FakeSource::new(2)));
        attached.background(0).unwrap();
        attached.background(1).unwrap();
        assert_eq!(attached.cache().len(), 2);

        attached.replace_source("b.pdf", Arc::new(FakeSource::new(5)));
        assert!(attached.cache().is_empty());
        assert_eq!(attached.page_count(), 5);
        assert_eq!(attached.path(), Path::new("b.pdf"));
    }
}
