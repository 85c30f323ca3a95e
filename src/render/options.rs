//! Rendering options and configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Options for rasterizing a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Which background kinds are drawn
    pub background: BackgroundFlags,

    /// Output image encoding
    pub format: ImageFormat,

    /// Vary stroke width with pen pressure when every point has pressure
    pub pressure_sensitive: bool,
}

impl RenderOptions {
    /// Create new render options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse options from a JSON object. An empty or blank string yields defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        if json.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(json)
            .map_err(|e| Error::InvalidParam(format!("invalid render options: {}", e)))
    }

    /// Set the background flags.
    pub fn with_background(mut self, background: BackgroundFlags) -> Self {
        self.background = background;
        self
    }

    /// Set the output format.
    pub fn with_format(mut self, format: ImageFormat) -> Self {
        self.format = format;
        self
    }

    /// Enable or disable pressure-sensitive stroke widths.
    pub fn with_pressure(mut self, enabled: bool) -> Self {
        self.pressure_sensitive = enabled;
        self
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            background: BackgroundFlags::default(),
            format: ImageFormat::Png,
            pressure_sensitive: true,
        }
    }
}

/// Background layers to draw beneath the strokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackgroundFlags {
    /// Draw PDF page backgrounds
    pub show_pdf: bool,
    /// Draw image backgrounds
    pub show_image: bool,
    /// Draw ruling on plain backgrounds
    pub show_ruling: bool,
}

impl BackgroundFlags {
    /// All backgrounds enabled.
    pub const ALL: BackgroundFlags = BackgroundFlags {
        show_pdf: true,
        show_image: true,
        show_ruling: true,
    };

    /// Strokes only (plain fills are still drawn).
    pub const NONE: BackgroundFlags = BackgroundFlags {
        show_pdf: false,
        show_image: false,
        show_ruling: false,
    };
}

impl Default for BackgroundFlags {
    fn default() -> Self {
        Self::ALL
    }
}

/// Output image encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// Lossless PNG with alpha
    #[default]
    Png,
    /// Baseline JPEG, no alpha
    Jpeg,
}

impl ImageFormat {
    /// File extension without the leading dot.
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
        }
    }

    /// Guess the format from a file extension, case-insensitively.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(ImageFormat::Png),
            "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
            _ => None,
        }
    }
}

impl From<ImageFormat> for image::ImageFormat {
    fn from(format: ImageFormat) -> Self {
        match format {
            ImageFormat::Png => image::ImageFormat::Png,
            ImageFormat::Jpeg => image::ImageFormat::Jpeg,
        }
    }
}
