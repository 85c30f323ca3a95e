//! Page-level types.

use super::{Color, Layer};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A4 width in points (210 mm).
pub const A4_WIDTH: f64 = 595.275591;
/// A4 height in points (297 mm).
pub const A4_HEIGHT: f64 = 841.889764;
/// US Letter width in points (8.5 in).
pub const LETTER_WIDTH: f64 = 612.0;
/// US Letter height in points (11 in).
pub const LETTER_HEIGHT: f64 = 792.0;

/// A single sheet within a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Page width in points (1 point = 1/72 inch)
    pub width: f64,

    /// Page height in points
    pub height: f64,

    /// What is drawn underneath the layers
    pub background: Background,

    /// Layers in back-to-front order (at least one)
    pub layers: Vec<Layer>,
}

impl Page {
    /// Create a page with a plain white background and one empty layer.
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            background: Background::default(),
            layers: vec![Layer::new()],
        }
    }

    /// Create an A4 page.
    pub fn a4() -> Self {
        Self::new(A4_WIDTH, A4_HEIGHT)
    }

    /// Create a US Letter page.
    pub fn letter() -> Self {
        Self::new(LETTER_WIDTH, LETTER_HEIGHT)
    }

    /// Create a page backed by a PDF page.
    pub fn pdf_backed(width: f64, height: f64, page_number: usize) -> Self {
        Self::new(width, height).with_background(Background::PdfPage { page_number })
    }

    /// Set the background.
    pub fn with_background(mut self, background: Background) -> Self {
        self.background = background;
        self
    }

    /// Page dimensions as a `(width, height)` tuple.
    pub fn dimensions(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    /// Get a layer by index.
    pub fn layer(&self, index: usize) -> Option<&Layer> {
        self.layers.get(index)
    }

    /// Get a mutable layer by index.
    pub fn layer_mut(&mut self, index: usize) -> Option<&mut Layer> {
        self.layers.get_mut(index)
    }

    /// The PDF page number if this page is PDF-backed.
    pub fn pdf_page_number(&self) -> Option<usize> {
        match self.background {
            Background::PdfPage { page_number } => Some(page_number),
            _ => None,
        }
    }

    /// Total number of elements across all layers.
    pub fn element_count(&self) -> usize {
        self.layers.iter().map(Layer::len).sum()
    }

    /// Check that the geometry is usable.
    pub fn has_valid_size(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::a4()
    }
}

/// A page's underlying visual.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Background {
    /// Solid color with optional ruling
    Plain {
        #[serde(default)]
        ruling: RulingStyle,
        #[serde(default = "white")]
        color: Color,
    },

    /// Image file stretched to the page
    Image {
        /// Path of the image file
        source: PathBuf,
    },

    /// A page of the document's attached PDF (0-based)
    PdfPage { page_number: usize },
}

fn white() -> Color {
    Color::WHITE
}

impl Background {
    /// Plain white background with the given ruling.
    pub fn plain(ruling: RulingStyle) -> Self {
        Background::Plain {
            ruling,
            color: Color::WHITE,
        }
    }

    /// Check if this is a PDF background.
    pub fn is_pdf(&self) -> bool {
        matches!(self, Background::PdfPage { .. })
    }
}

impl Default for Background {
    fn default() -> Self {
        Background::plain(RulingStyle::Plain)
    }
}

/// Ruling drawn on a plain background.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RulingStyle {
    /// No lines
    #[default]
    Plain,
    /// Horizontal lines
    Lined,
    /// Horizontal lines plus a left margin line
    Ruled,
    /// Square grid
    Graph,
    /// Dot grid
    Dotted,
}
