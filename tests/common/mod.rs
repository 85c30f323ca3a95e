//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use lopdf::{dictionary, Object, Stream};

use inkpage::error::Result;
use inkpage::{
    Color, DocumentStore, LopdfDecoder, PdfDecoder, PdfSource, StoreConfig, Surface,
};

/// Content stream that fills the whole page with one RGB color.
pub fn solid_page(width: i64, height: i64, rgb: (f32, f32, f32)) -> (i64, i64, String) {
    let ops = format!(
        "{} {} {} rg 0 0 {} {} re f",
        rgb.0, rgb.1, rgb.2, width, height
    );
    (width, height, ops)
}

/// Build a PDF with one page per `(width, height, content)` entry.
pub fn build_pdf(pages: &[(i64, i64, String)]) -> Vec<u8> {
    let mut doc = lopdf::Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut kids: Vec<Object> = Vec::new();
    for (width, height, ops) in pages {
        let content_id = doc.add_object(Stream::new(dictionary! {}, ops.as_bytes().to_vec()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "MediaBox" => vec![0.into(), 0.into(), (*width).into(), (*height).into()],
        });
        kids.push(page_id.into());
    }
    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut out = Vec::new();
    doc.save_to(&mut out).unwrap();
    out
}

/// Write a generated PDF into `dir`.
pub fn write_pdf(dir: &Path, name: &str, pages: &[(i64, i64, String)]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, build_pdf(pages)).unwrap();
    path
}

/// Wraps the lopdf decoder and counts page rasterizations across all
/// sources it opens.
#[derive(Clone, Default)]
pub struct CountingDecoder {
    inner: LopdfDecoder,
    pub opens: Arc<AtomicUsize>,
    pub renders: Arc<AtomicUsize>,
}

impl CountingDecoder {
    pub fn renders(&self) -> usize {
        self.renders.load(Ordering::SeqCst)
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

struct CountingSource {
    inner: Arc<dyn PdfSource>,
    renders: Arc<AtomicUsize>,
}

impl PdfSource for CountingSource {
    fn page_count(&self) -> usize {
        self.inner.page_count()
    }

    fn page_size(&self, page_number: usize) -> Result<(f64, f64)> {
        self.inner.page_size(page_number)
    }

    fn render_page(&self, page_number: usize) -> Result<Surface> {
        self.renders.fetch_add(1, Ordering::SeqCst);
        self.inner.render_page(page_number)
    }
}

impl PdfDecoder for CountingDecoder {
    fn open(&self, path: &Path) -> Result<Arc<dyn PdfSource>> {
        let inner = self.inner.open(path)?;
        self.opens.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(CountingSource {
            inner,
            renders: Arc::clone(&self.renders),
        }))
    }
}

/// An initialized store with default configuration.
pub fn store() -> DocumentStore {
    let store = DocumentStore::new();
    store.init(StoreConfig::default());
    store
}

/// An initialized store whose PDF decodes are counted.
pub fn counting_store() -> (DocumentStore, CountingDecoder) {
    let decoder = CountingDecoder::default();
    let store = DocumentStore::builder()
        .pdf_decoder(decoder.clone())
        .build();
    store.init(StoreConfig::default());
    (store, decoder)
}

/// Assert two colors agree within a small per-channel tolerance, to absorb
/// filtering error from stretched backgrounds.
pub fn assert_near(actual: Option<Color>, expected: Color) {
    let actual = actual.expect("pixel out of bounds");
    let close = |a: u8, b: u8| a.abs_diff(b) <= 3;
    assert!(
        close(actual.r, expected.r)
            && close(actual.g, expected.g)
            && close(actual.b, expected.b)
            && close(actual.a, expected.a),
        "expected {:?}, got {:?}",
        expected,
        actual
    );
}
