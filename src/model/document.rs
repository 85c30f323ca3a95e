//! Document-level types.

use super::Page;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One editable note: an ordered list of pages, optionally linked to a PDF.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Document metadata
    #[serde(default)]
    pub metadata: Metadata,

    /// Pages in the document
    #[serde(default)]
    pub pages: Vec<Page>,

    /// PDF file that `PdfPage` backgrounds refer to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_path: Option<PathBuf>,

    /// Where the document was last opened from or saved to
    #[serde(skip)]
    pub file_path: Option<PathBuf>,
}

impl Document {
    /// Create a new empty document.
    pub fn new() -> Self {
        Self {
            metadata: Metadata::now(),
            pages: Vec::new(),
            pdf_path: None,
            file_path: None,
        }
    }

    /// Create a document with a single page.
    pub fn with_page(page: Page) -> Self {
        let mut doc = Self::new();
        doc.add_page(page);
        doc
    }

    /// Get the number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Get a page by index (0-based).
    pub fn page(&self, index: usize) -> Option<&Page> {
        self.pages.get(index)
    }

    /// Get a mutable page by index (0-based).
    pub fn page_mut(&mut self, index: usize) -> Option<&mut Page> {
        self.pages.get_mut(index)
    }

    /// Get a page or fail with `InvalidParam`.
    pub fn require_page(&self, index: usize) -> Result<&Page> {
        self.pages.get(index).ok_or_else(|| {
            Error::invalid(format!(
                "page index {} out of range (document has {} pages)",
                index,
                self.pages.len()
            ))
        })
    }

    /// Add a page to the end of the document.
    pub fn add_page(&mut self, page: Page) {
        self.pages.push(page);
    }

    /// Check if the document has any pages.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Check if any page is backed by a PDF page.
    pub fn has_pdf_pages(&self) -> bool {
        self.pages.iter().any(|page| page.background.is_pdf())
    }

    /// Total number of strokes across all pages.
    pub fn stroke_count(&self) -> usize {
        self.pages.iter().map(Page::element_count).sum()
    }

    /// Verify that every PDF-backed page points inside the PDF.
    pub fn validate_pdf_pages(&self, pdf_page_count: usize) -> Result<()> {
        for (index, page) in self.pages.iter().enumerate() {
            if let Some(number) = page.pdf_page_number() {
                if number >= pdf_page_count {
                    return Err(Error::invalid(format!(
                        "page {} references PDF page {} but the PDF has {} pages",
                        index, number, pdf_page_count
                    )));
                }
            }
        }
        Ok(())
    }

    /// Record a modification.
    pub fn touch(&mut self) {
        self.metadata.modified = Some(Utc::now());
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// Document metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Document title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Creation date
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,

    /// Last modification date
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<DateTime<Utc>>,
}

impl Metadata {
    /// Metadata stamped with the current time.
    pub fn now() -> Self {
        let now = Utc::now();
        Self {
            title: None,
            created: Some(now),
            modified: Some(now),
        }
    }
}
