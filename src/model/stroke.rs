//! Vector strokes, tools and colors.

use super::Point;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The tool a stroke was drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrokeTool {
    #[default]
    Pen,
    Eraser,
    Highlighter,
    Pencil,
}

impl StrokeTool {
    /// Default stroke width in page points.
    pub fn default_width(self) -> f64 {
        match self {
            StrokeTool::Highlighter => 10.0,
            StrokeTool::Pen | StrokeTool::Eraser | StrokeTool::Pencil => 2.0,
        }
    }

    /// Lowercase tool name.
    pub fn as_str(self) -> &'static str {
        match self {
            StrokeTool::Pen => "pen",
            StrokeTool::Eraser => "eraser",
            StrokeTool::Highlighter => "highlighter",
            StrokeTool::Pencil => "pencil",
        }
    }
}

impl fmt::Display for StrokeTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An 8-bit RGBA color, serialized as `#rrggbbaa`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    /// Opaque color from RGB components.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Color from RGBA components.
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Same color with a different alpha.
    pub fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// Parse `#rrggbb` or `#rrggbbaa` (the leading `#` is optional).
    pub fn from_hex(s: &str) -> Result<Self> {
        let hex = s.trim().trim_start_matches('#');
        if !matches!(hex.len(), 6 | 8) || !hex.is_ascii() {
            return Err(Error::invalid(format!("invalid color '{}'", s)));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|_| Error::invalid(format!("invalid color '{}'", s)))
        };
        let a = if hex.len() == 8 { channel(6)? } else { 255 };
        Ok(Self::rgba(channel(0)?, channel(2)?, channel(4)?, a))
    }

    /// Format as `#rrggbbaa`.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

impl TryFrom<String> for Color {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Color::from_hex(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

/// A persisted vector path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    /// Tool used to draw the stroke
    pub tool: StrokeTool,

    /// Nominal width in page points
    pub width: f64,

    /// Stroke color
    pub color: Color,

    /// Samples in input order
    pub points: Vec<Point>,
}

impl Stroke {
    /// Create an empty stroke with the tool's default width in black.
    pub fn new(tool: StrokeTool) -> Self {
        Self {
            tool,
            width: tool.default_width(),
            color: Color::BLACK,
            points: Vec::new(),
        }
    }

    /// Set the width.
    pub fn with_width(mut self, width: f64) -> Self {
        self.width = width;
        self
    }

    /// Set the color.
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    /// Append a sample.
    pub fn push_point(&mut self, point: Point) {
        self.points.push(point);
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the stroke has no samples.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// True when every sample carries pressure.
    pub fn has_pressure(&self) -> bool {
        !self.points.is_empty() && self.points.iter().all(Point::has_pressure)
    }

    /// Axis-aligned bounds `(min_x, min_y, max_x, max_y)` including half the width.
    pub fn bounds(&self) -> Option<(f64, f64, f64, f64)> {
        let first = self.points.first()?;
        let init = (first.x, first.y, first.x, first.y);
        let (x0, y0, x1, y1) = self.points.iter().fold(init, |(x0, y0, x1, y1), p| {
            (x0.min(p.x), y0.min(p.y), x1.max(p.x), y1.max(p.y))
        });
        let half = self.width / 2.0;
        Some((x0 - half, y0 - half, x1 + half, y1 + half))
    }

    /// Check the invariants a committed stroke must hold.
    pub fn validate(&self) -> Result<()> {
        if self.points.is_empty() {
            return Err(Error::invalid("stroke has no points"));
        }
        if !(self.width.is_finite() && self.width > 0.0) {
            return Err(Error::invalid(format!(
                "stroke width must be positive, got {}",
                self.width
            )));
        }
        for (index, point) in self.points.iter().enumerate() {
            if !(point.x.is_finite() && point.y.is_finite()) {
                return Err(Error::invalid(format!(
                    "point {} has non-finite position ({}, {})",
                    index, point.x, point.y
                )));
            }
            if let Some(pressure) = point.pressure {
                if !(pressure > 0.0 && pressure <= 1.0) {
                    return Err(Error::invalid(format!(
                        "point {} pressure {} is outside (0, 1]",
                        index, pressure
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_widths() {
        assert_eq!(Stroke::new(StrokeTool::Pen).width, 2.0);
        assert_eq!(Stroke::new(StrokeTool::Eraser).width, 2.0);
        assert_eq!(Stroke::new(StrokeTool::Pencil).width, 2.0);
        assert_eq!(Stroke::new(StrokeTool::Highlighter).width, 10.0);
    }

    #[test]
    fn test_color_hex() {
        assert_eq!(Color::from_hex("#ff8000").unwrap(), Color::rgb(255, 128, 0));
        assert_eq!(
            Color::from_hex("11223344").unwrap(),
            Color::rgba(0x11, 0x22, 0x33, 0x44)
        );
        assert_eq!(Color::rgb(1, 2, 3).to_hex(), "#010203ff");
        assert!(Color::from_hex("#12345").is_err());
        assert!(Color::from_hex("#gg0000").is_err());
    }

    #[test]
    fn test_color_serde() {
        let json = serde_json::to_string(&Color::rgba(255, 0, 0, 128)).unwrap();
        assert_eq!(json, "\"#ff000080\"");
        let back: Color = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Color::rgba(255, 0, 0, 128));
        assert!(serde_json::from_str::<Color>("\"red\"").is_err());
    }

    #[test]
    fn test_validate() {
        let mut stroke = Stroke::new(StrokeTool::Pen);
        assert!(stroke.validate().is_err());
        stroke.push_point(Point::new(1.0, 1.0));
        assert!(stroke.validate().is_ok());
        assert!(stroke.clone().with_width(0.0).validate().is_err());
        assert!(stroke.with_width(f64::NAN).validate().is_err());
    }

    #[test]
    fn test_validate_points() {
        let with_point = |point: Point| {
            let mut stroke = Stroke::new(StrokeTool::Pen);
            stroke.push_point(Point::new(0.0, 0.0));
            stroke.push_point(point);
            stroke
        };
        assert!(with_point(Point::with_pressure(1.0, 1.0, 1.0)).validate().is_ok());
        assert!(with_point(Point::new(f64::INFINITY, 1.0)).validate().is_err());
        assert!(with_point(Point::new(1.0, f64::NAN)).validate().is_err());

        for pressure in [0.0, 1.5, -0.2, f64::NAN] {
            let point = Point {
                x: 1.0,
                y: 1.0,
                pressure: Some(pressure),
            };
            assert!(with_point(point).validate().is_err(), "pressure {}", pressure);
        }
    }

    #[test]
    fn test_bounds_and_pressure() {
        let mut stroke = Stroke::new(StrokeTool::Pen);
        assert!(stroke.bounds().is_none());
        assert!(!stroke.has_pressure());
        stroke.push_point(Point::with_pressure(10.0, 20.0, 0.5));
        stroke.push_point(Point::with_pressure(30.0, 5.0, 0.7));
        assert!(stroke.has_pressure());
        assert_eq!(stroke.bounds(), Some((9.0, 4.0, 31.0, 21.0)));
        stroke.push_point(Point::new(0.0, 0.0));
        assert!(!stroke.has_pressure());
    }
}
