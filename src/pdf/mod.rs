//! PDF backgrounds: decoding and per-document caching.

mod backend;
mod cache;

pub use backend::{LopdfDecoder, LopdfSource, PdfDecoder, PdfSource};
pub use cache::{AttachedPdf, PdfBackgroundCache};
