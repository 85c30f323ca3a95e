//! Stroke sample points.

use serde::{Deserialize, Serialize};

/// One sample of a stroke: a position in page points plus optional pressure.
///
/// `pressure` is `None` for uniform-width strokes. When present it lies in
/// `(0.0, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate in page points
    pub x: f64,

    /// Y coordinate in page points (top-left origin)
    pub y: f64,

    /// Pen pressure, `None` when the device reported none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pressure: Option<f64>,
}

impl Point {
    /// Create a point without pressure.
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            pressure: None,
        }
    }

    /// Create a point, normalizing the raw pressure reading.
    pub fn with_pressure(x: f64, y: f64, pressure: f64) -> Self {
        Self {
            x,
            y,
            pressure: normalize_pressure(pressure),
        }
    }

    /// Whether this sample carries pressure.
    pub fn has_pressure(&self) -> bool {
        self.pressure.is_some()
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Map a raw device pressure to the model representation.
///
/// Values outside `(0, 1]` (including NaN) mean "no pressure".
pub fn normalize_pressure(raw: f64) -> Option<f64> {
    if raw > 0.0 && raw <= 1.0 {
        Some(raw)
    } else {
        None
    }
}
