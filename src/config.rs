//! Store and document configuration.
//!
//! Both configuration objects are plain serde structs; every field has a
//! default so callers may pass partial JSON (or an empty string).

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::ingest::IngestTarget;
use crate::model::{
    Background, Color, Page, RulingStyle, StrokeTool, A4_HEIGHT, A4_WIDTH, LETTER_HEIGHT,
    LETTER_WIDTH,
};

/// Parse a JSON object into `T`, treating a blank string as `T::default()`.
fn from_json_or_default<T>(json: &str, what: &str) -> Result<T>
where
    T: Default + for<'de> Deserialize<'de>,
{
    if json.trim().is_empty() {
        return Ok(T::default());
    }
    serde_json::from_str(json).map_err(|e| Error::InvalidParam(format!("invalid {}: {}", what, e)))
}

/// Standard paper sizes for new pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageFormat {
    /// ISO A4, 210 x 297 mm
    #[default]
    A4,
    /// US Letter, 8.5 x 11 in
    Letter,
}

impl PageFormat {
    /// Size in points.
    pub fn dimensions(self) -> (f64, f64) {
        match self {
            PageFormat::A4 => (A4_WIDTH, A4_HEIGHT),
            PageFormat::Letter => (LETTER_WIDTH, LETTER_HEIGHT),
        }
    }
}

/// Default width and color for newly ingested strokes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrokeDefaults {
    pub pen_width: f64,
    pub eraser_width: f64,
    pub highlighter_width: f64,
    pub pencil_width: f64,
    pub color: Color,
}

impl StrokeDefaults {
    /// Width used for strokes drawn with `tool`.
    pub fn width_for(&self, tool: StrokeTool) -> f64 {
        match tool {
            StrokeTool::Pen => self.pen_width,
            StrokeTool::Eraser => self.eraser_width,
            StrokeTool::Highlighter => self.highlighter_width,
            StrokeTool::Pencil => self.pencil_width,
        }
    }

    fn validate(&self) -> Result<()> {
        let widths = [
            ("pen_width", self.pen_width),
            ("eraser_width", self.eraser_width),
            ("highlighter_width", self.highlighter_width),
            ("pencil_width", self.pencil_width),
        ];
        for (name, width) in widths {
            if !(width.is_finite() && width > 0.0) {
                return Err(Error::InvalidParam(format!(
                    "{} must be positive, got {}",
                    name, width
                )));
            }
        }
        Ok(())
    }
}

impl Default for StrokeDefaults {
    fn default() -> Self {
        Self {
            pen_width: StrokeTool::Pen.default_width(),
            eraser_width: StrokeTool::Eraser.default_width(),
            highlighter_width: StrokeTool::Highlighter.default_width(),
            pencil_width: StrokeTool::Pencil.default_width(),
            color: Color::BLACK,
        }
    }
}

/// Configuration passed to `DocumentStore::init`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Where ingested strokes are appended
    pub ingest: IngestTarget,

    /// Stroke width and color defaults
    pub strokes: StrokeDefaults,

    /// Paper size for documents created without an explicit size
    pub page_format: PageFormat,

    /// Ruling for documents created without an explicit ruling
    pub ruling: RulingStyle,
}

impl StoreConfig {
    /// Create a configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration JSON object. A blank string yields defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = from_json_or_default(json, "store configuration")?;
        config.strokes.validate()?;
        Ok(config)
    }

    /// Set the ingestion target.
    pub fn with_ingest_target(mut self, target: IngestTarget) -> Self {
        self.ingest = target;
        self
    }

    /// Set stroke defaults.
    pub fn with_stroke_defaults(mut self, strokes: StrokeDefaults) -> Self {
        self.strokes = strokes;
        self
    }

    /// Set the default page format.
    pub fn with_page_format(mut self, format: PageFormat) -> Self {
        self.page_format = format;
        self
    }

    /// Set the default ruling.
    pub fn with_ruling(mut self, ruling: RulingStyle) -> Self {
        self.ruling = ruling;
        self
    }
}

/// Options for a new document or page.
///
/// Unset fields fall back to the store configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateOptions {
    /// Paper size
    pub format: Option<PageFormat>,

    /// Explicit page width in points; requires `height`
    pub width: Option<f64>,

    /// Explicit page height in points; requires `width`
    pub height: Option<f64>,

    /// Ruling style of the plain background
    pub ruling: Option<RulingStyle>,

    /// Paper color of the plain background
    pub background_color: Option<Color>,

    /// Document title
    pub title: Option<String>,
}

impl CreateOptions {
    /// Create options with every field unset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an options JSON object. A blank string yields defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        from_json_or_default(json, "document options")
    }

    /// Use a standard paper size.
    pub fn with_format(mut self, format: PageFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// Use an explicit page size in points.
    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    /// Set the ruling style.
    pub fn with_ruling(mut self, ruling: RulingStyle) -> Self {
        self.ruling = Some(ruling);
        self
    }

    /// Set the paper color.
    pub fn with_background_color(mut self, color: Color) -> Self {
        self.background_color = Some(color);
        self
    }

    /// Set the document title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Page size in points after applying `config` defaults.
    pub fn page_size(&self, config: &StoreConfig) -> Result<(f64, f64)> {
        let (width, height) = match (self.width, self.height) {
            (Some(w), Some(h)) => (w, h),
            (None, None) => self.format.unwrap_or(config.page_format).dimensions(),
            _ => {
                return Err(Error::invalid(
                    "page width and height must be given together",
                ))
            }
        };
        if !(width.is_finite() && width > 0.0 && height.is_finite() && height > 0.0) {
            return Err(Error::InvalidParam(format!(
                "invalid page size {}x{}",
                width, height
            )));
        }
        Ok((width, height))
    }

    /// Build the blank page these options describe.
    pub fn build_page(&self, config: &StoreConfig) -> Result<Page> {
        let (width, height) = self.page_size(config)?;
        let background = Background::Plain {
            ruling: self.ruling.unwrap_or(config.ruling),
            color: self.background_color.unwrap_or(Color::WHITE),
        };
        Ok(Page::new(width, height).with_background(background))
    }
}
